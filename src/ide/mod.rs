//! IDE features: High-level APIs for LSP handlers.
//!
//! Each function corresponds to an LSP request and works on a merged
//! [`SemanticContext`](crate::semantic::SemanticContext), so symbols coming
//! from copybooks are found like any other.
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: Take data in, return data out
//! 2. **No LSP types**: Uses our own types, converted at LSP boundary
//!
//! The recommended entry point is [`AnalysisHost`].

mod analysis;
mod cursor;
mod goto;
mod hover;
mod references;

pub use analysis::{Analysis, AnalysisHost, CancelHandle};
pub use goto::{GotoResult, GotoTarget, goto_definition};
pub use hover::{HoverResult, hover};
pub use references::{Reference, ReferenceResult, find_references};
