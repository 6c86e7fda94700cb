//! Copybook resolution and recursive analysis.
//!
//! ## Key Types
//!
//! - [`CopybookAnalyzer`] - entry point; owns the worker pool
//! - [`ResolutionTask`] / [`PendingTask`] - one copybook request on the bus
//! - [`Resolution`] - how a request ended
//! - [`AnalyzerConfig`] - timeout, depth limit, dedup policy
//!
//! ## Diagnostics
//!
//! | Code  | Raised when                                   |
//! |-------|-----------------------------------------------|
//! | E0101 | the provider answered "not found"             |
//! | E0102 | no answer arrived before the timeout          |
//! | E0103 | the run was cancelled (info)                  |
//! | E0104 | the copybook failed to preprocess or parse    |
//! | E0105 | the copybook includes itself                  |
//! | E0106 | the nesting depth limit was reached           |

mod analyzer;
mod config;
mod error;
mod task;

#[cfg(test)]
mod tests;

pub use analyzer::{CopybookAnalyzer, copybook_uri};
pub use config::{AnalyzerConfig, DedupPolicy};
pub use error::AnalyzerError;
pub use task::{PendingTask, Resolution, ResolutionTask};
