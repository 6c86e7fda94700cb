//! Error types for copybook analysis.

use thiserror::Error;

use crate::preprocessor::PreprocessError;
use crate::semantic::ParseError;

/// Errors raised while building an analyzer or analyzing one document.
///
/// Document errors never escape an analysis run; they become diagnostics at
/// the reference site of the copybook that failed.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The worker pool could not be created.
    #[error("failed to build resolution pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("parsing failed: {0}")]
    Parse(#[from] ParseError),
}
