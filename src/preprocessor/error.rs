//! Error types for preprocessing.

use thiserror::Error;

/// Fatal preprocessing failures. Layout problems are diagnostics, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreprocessError {
    /// The text is not COBOL source at all.
    #[error("source contains binary data at line {line}")]
    BinaryContent { line: u32 },

    /// A transformation stage gave up on the document.
    #[error("{stage} stage failed: {message}")]
    Stage {
        stage: &'static str,
        message: String,
    },
}

impl PreprocessError {
    pub fn stage(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            message: message.into(),
        }
    }
}
