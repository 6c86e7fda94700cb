//! Semantic context: symbols and diagnostics for a unit of source text.
//!
//! A context built for a copybook is merged into the context of the
//! document that includes it. Merging unions the symbol sets (so it is
//! associative and commutative on symbols) and appends diagnostics in
//! left-to-right order. The empty context is the identity of merge, which is
//! what a failed copybook contributes.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smol_str::SmolStr;

use crate::base::{Diagnostic, Location, Position};

/// What a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SymbolKind {
    Variable,
    Paragraph,
    Section,
    Copybook,
}

impl SymbolKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Paragraph => "paragraph",
            SymbolKind::Section => "section",
            SymbolKind::Copybook => "copybook",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Identity of a symbol: kind plus upper-cased name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolKey {
    pub kind: SymbolKind,
    pub name: SmolStr,
}

impl SymbolKey {
    pub fn new(kind: SymbolKind, name: &str) -> Self {
        Self {
            kind,
            name: SmolStr::new(name.to_ascii_uppercase()),
        }
    }
}

/// Where a symbol is defined and used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolEntry {
    pub definitions: BTreeSet<Location>,
    pub usages: BTreeSet<Location>,
}

impl SymbolEntry {
    fn union(&mut self, other: SymbolEntry) {
        self.definitions.extend(other.definitions);
        self.usages.extend(other.usages);
    }
}

/// Accumulated analysis result for a document and everything it includes.
///
/// Equality ignores symbol insertion order but not diagnostic order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SemanticContext {
    symbols: IndexMap<SymbolKey, SymbolEntry, FxBuildHasher>,
    diagnostics: Vec<Diagnostic>,
}

impl SemanticContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context carrying a single diagnostic and no symbols.
    pub fn from_diagnostic(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty() && self.diagnostics.is_empty()
    }

    pub fn define(&mut self, kind: SymbolKind, name: &str, location: Location) {
        self.entry(kind, name).definitions.insert(location);
    }

    pub fn add_usage(&mut self, kind: SymbolKind, name: &str, location: Location) {
        self.entry(kind, name).usages.insert(location);
    }

    fn entry(&mut self, kind: SymbolKind, name: &str) -> &mut SymbolEntry {
        self.symbols.entry(SymbolKey::new(kind, name)).or_default()
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn symbol(&self, kind: SymbolKind, name: &str) -> Option<&SymbolEntry> {
        self.symbols.get(&SymbolKey::new(kind, name))
    }

    pub fn symbols(&self) -> impl Iterator<Item = (&SymbolKey, &SymbolEntry)> {
        self.symbols.iter()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Names defined with `kind`, sorted.
    pub fn defined_names(&self, kind: SymbolKind) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .symbols
            .iter()
            .filter(|(key, entry)| key.kind == kind && !entry.definitions.is_empty())
            .map(|(key, _)| key.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Every symbol named `name`, whatever its kind.
    pub fn lookup(&self, name: &str) -> Vec<(&SymbolKey, &SymbolEntry)> {
        let upper = name.to_ascii_uppercase();
        self.symbols
            .iter()
            .filter(|(key, _)| key.name == upper.as_str())
            .collect()
    }

    /// The symbol whose definition or usage covers `position` in `uri`.
    pub fn symbol_at(&self, uri: &str, position: Position) -> Option<(&SymbolKey, &SymbolEntry)> {
        self.symbols.iter().find(|(_, entry)| {
            entry
                .definitions
                .iter()
                .chain(entry.usages.iter())
                .any(|loc| &*loc.uri == uri && loc.span.contains(position))
        })
    }

    /// Same symbols, no diagnostics.
    pub fn without_diagnostics(&self) -> Self {
        Self {
            symbols: self.symbols.clone(),
            diagnostics: Vec::new(),
        }
    }

    /// Merge `other` into `self`: symbol sets are unioned, `other`'s
    /// diagnostics are appended after ours.
    pub fn merge_from(&mut self, other: SemanticContext) {
        for (key, entry) in other.symbols {
            self.symbols.entry(key).or_default().union(entry);
        }
        self.diagnostics.extend(other.diagnostics);
    }

    /// Pure form of [`merge_from`](Self::merge_from).
    pub fn merge(mut self, other: SemanticContext) -> SemanticContext {
        self.merge_from(other);
        self
    }

    /// Left fold of [`merge`](Self::merge) starting from the empty context.
    pub fn merge_all(contexts: impl IntoIterator<Item = SemanticContext>) -> SemanticContext {
        contexts
            .into_iter()
            .fold(SemanticContext::new(), SemanticContext::merge)
    }
}
