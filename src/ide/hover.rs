//! Hover information implementation.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::base::{Position, Span};
use crate::semantic::{SemanticContext, SymbolKind};

use super::cursor::symbols_at;

/// Result of a hover request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoverResult {
    /// The hover content (markdown).
    pub contents: String,
    pub name: Arc<str>,
    pub kind: SymbolKind,
    /// The recorded occurrence under the cursor, if there is one.
    pub span: Option<Span>,
}

/// Describe the symbol at `line`/`col` (0-indexed) of `uri`.
pub fn hover(
    context: &SemanticContext,
    text: &str,
    uri: &str,
    line: u32,
    col: u32,
) -> Option<HoverResult> {
    let (key, entry) = symbols_at(context, text, uri, line, col)
        .into_iter()
        .next()?;
    let position = Position::new(line, col);

    let mut contents = format!("**{}** `{}`", key.kind, key.name);
    if entry.definitions.is_empty() {
        contents.push_str("\n\nNo definition found");
    } else {
        contents.push_str("\n\nDefined at:");
        for location in &entry.definitions {
            let _ = write!(contents, "\n- `{location}`");
        }
    }
    match entry.usages.len() {
        0 => {}
        1 => contents.push_str("\n\n1 usage"),
        n => {
            let _ = write!(contents, "\n\n{n} usages");
        }
    }

    let span = entry
        .definitions
        .iter()
        .chain(entry.usages.iter())
        .find(|loc| &*loc.uri == uri && loc.span.contains(position))
        .map(|loc| loc.span);

    Some(HoverResult {
        contents,
        name: Arc::from(key.name.as_str()),
        kind: key.kind,
        span,
    })
}
