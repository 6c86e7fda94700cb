//! Line-oriented preprocessing.
//!
//! Raw text is split into reference-format lines ([`read_lines`]), run
//! through a [`Pipeline`] of [`LineTransformation`] stages, and rendered back
//! to text ([`write_text`]) with every line kept at its original position.
//!
//! ```text
//! text ──read_lines──▶ Vec<CobolLine> ──Pipeline──▶ Vec<CobolLine> ──write_text──▶ text
//! ```

mod error;
mod line;
mod stages;

pub use error::PreprocessError;
pub use line::{CobolLine, Indicator, SourceFormat, read_lines, write_text};
pub use stages::{
    CommentStage, ContinuationStage, DebugLineStage, LineTransformation, Pipeline,
};

use crate::base::ResultWithErrors;

/// Read, transform and render a whole document.
///
/// Reader warnings come first, followed by each stage's diagnostics in
/// stage order.
pub fn preprocess(
    transformation: &dyn LineTransformation,
    uri: &str,
    text: &str,
    format: SourceFormat,
) -> Result<ResultWithErrors<String>, PreprocessError> {
    let read = read_lines(uri, text, format)?;
    let transformed = transformation.transform_lines(uri, read.result)?;

    let mut errors = read.errors;
    errors.extend(transformed.errors);
    Ok(ResultWithErrors::new(write_text(&transformed.result), errors))
}
