//! Semantic layer: symbols, merge, and the per-document parser.
//!
//! ## Key Types
//!
//! - [`SemanticContext`] - symbols and diagnostics; merged across copybooks
//! - [`SemanticParser`] - "preprocessed text in, semantic context out"
//! - [`CobolSemanticParser`] - default parser built on a logos lexer
//! - [`CopybookReference`] - a `COPY` statement discovered while parsing

mod context;
mod lexer;
mod parser;

pub use context::{SemanticContext, SymbolEntry, SymbolKey, SymbolKind};
pub use parser::{
    CobolSemanticParser, CopybookReference, ParseError, ParseOutput, ParserConfig, SemanticParser,
};
