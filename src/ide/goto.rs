//! Go-to-definition implementation.

use std::sync::Arc;

use crate::base::Location;
use crate::semantic::{SemanticContext, SymbolKind};

use super::cursor::symbols_at;

/// Result of a go-to-definition request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GotoResult {
    /// The targets to jump to.
    pub targets: Vec<GotoTarget>,
}

impl GotoResult {
    /// Create an empty result (no targets found).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// A target location for go-to-definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GotoTarget {
    pub location: Location,
    pub kind: SymbolKind,
    pub name: Arc<str>,
}

/// Find the definitions of the symbol at `line`/`col` (0-indexed) of `uri`.
///
/// On a `COPY` statement the target is the start of the copybook itself.
pub fn goto_definition(
    context: &SemanticContext,
    text: &str,
    uri: &str,
    line: u32,
    col: u32,
) -> GotoResult {
    let targets = symbols_at(context, text, uri, line, col)
        .into_iter()
        .flat_map(|(key, entry)| {
            let name: Arc<str> = Arc::from(key.name.as_str());
            entry.definitions.iter().map(move |location| GotoTarget {
                location: location.clone(),
                kind: key.kind,
                name: name.clone(),
            })
        })
        .collect();
    GotoResult { targets }
}
