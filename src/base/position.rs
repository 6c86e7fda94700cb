/// Position tracking for symbols and diagnostics
///
/// Stores the source location (line/column) of definitions, usages and
/// diagnostics for LSP features like hover, go-to-definition and error
/// reporting. All coordinates are 0-indexed for LSP compatibility.
use std::fmt;
use std::sync::Arc;

/// A position in source code (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// A span representing a range in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a span from line/column coordinates
    pub fn from_coords(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start: Position::new(start_line, start_col),
            end: Position::new(end_line, end_col),
        }
    }

    /// A span covering `len` columns of a single line.
    pub fn on_line(line: u32, column: u32, len: u32) -> Self {
        Self::from_coords(line, column, line, column + len)
    }

    /// Check if a position falls within this span
    pub fn contains(&self, position: Position) -> bool {
        if position.line < self.start.line || position.line > self.end.line {
            return false;
        }
        if position.line == self.start.line && position.column < self.start.column {
            return false;
        }
        if position.line == self.end.line && position.column > self.end.column {
            return false;
        }
        true
    }
}

/// A span inside a specific document.
///
/// Ordered by URI then span so that sets of locations iterate in source order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub uri: Arc<str>,
    pub span: Span,
}

impl Location {
    pub fn new(uri: impl Into<Arc<str>>, span: Span) -> Self {
        Self {
            uri: uri.into(),
            span,
        }
    }

    /// Location of the first character of a document.
    pub fn document_start(uri: impl Into<Arc<str>>) -> Self {
        Self::new(uri, Span::default())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.uri,
            self.span.start.line + 1,
            self.span.start.column + 1
        )
    }
}
