//! Mapping a cursor position to symbols.

use crate::base::Position;
use crate::base::text_utils::extract_word_at_cursor;
use crate::semantic::{SemanticContext, SymbolEntry, SymbolKey};

/// Symbols under the cursor.
///
/// A recorded definition or usage covering the position wins. Otherwise the
/// word under the cursor is looked up by name, which finds symbols the parser
/// saw defined but not used at this spot (a variable in a `DISPLAY`).
pub(super) fn symbols_at<'c>(
    context: &'c SemanticContext,
    text: &str,
    uri: &str,
    line: u32,
    col: u32,
) -> Vec<(&'c SymbolKey, &'c SymbolEntry)> {
    if let Some(found) = context.symbol_at(uri, Position::new(line, col)) {
        return vec![found];
    }
    let Some(line_text) = text.lines().nth(line as usize) else {
        return Vec::new();
    };
    match extract_word_at_cursor(line_text, col as usize) {
        Some(word) => context.lookup(&word),
        None => Vec::new(),
    }
}
