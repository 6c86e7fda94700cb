//! Line transformation stages and the pipeline that chains them.

use crate::base::{Diagnostic, ResultWithErrors, codes};

use super::error::PreprocessError;
use super::line::{CobolLine, Indicator};

/// A transformation over the ordered lines of one document.
///
/// Stages know nothing about copybooks. They must return one line per input
/// line, in order, so that positions keep pointing into the source.
pub trait LineTransformation: Send + Sync {
    /// Short stage name used in logs and errors.
    fn name(&self) -> &'static str;

    fn transform_lines(
        &self,
        uri: &str,
        lines: Vec<CobolLine>,
    ) -> Result<ResultWithErrors<Vec<CobolLine>>, PreprocessError>;
}

/// Blanks comment lines and strips floating `*>` comments.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommentStage;

impl LineTransformation for CommentStage {
    fn name(&self) -> &'static str {
        "comment"
    }

    fn transform_lines(
        &self,
        _uri: &str,
        mut lines: Vec<CobolLine>,
    ) -> Result<ResultWithErrors<Vec<CobolLine>>, PreprocessError> {
        for line in &mut lines {
            if line.is_comment() {
                line.content.clear();
            } else if let Some(at) = floating_comment_start(&line.content) {
                line.content.truncate(at);
            }
        }
        Ok(ResultWithErrors::ok(lines))
    }
}

/// Byte offset of a `*>` that is not inside a literal.
fn floating_comment_start(content: &str) -> Option<usize> {
    let mut quote = None;
    let mut chars = content.char_indices().peekable();
    while let Some((at, ch)) = chars.next() {
        match (quote, ch) {
            (None, '"' | '\'') => quote = Some(ch),
            (Some(open), _) if ch == open => quote = None,
            (None, '*') if matches!(chars.peek(), Some((_, '>'))) => return Some(at),
            _ => {}
        }
    }
    None
}

/// Handles `D` lines: kept as code or blanked like comments.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebugLineStage {
    pub as_code: bool,
}

impl LineTransformation for DebugLineStage {
    fn name(&self) -> &'static str {
        "debug-line"
    }

    fn transform_lines(
        &self,
        _uri: &str,
        mut lines: Vec<CobolLine>,
    ) -> Result<ResultWithErrors<Vec<CobolLine>>, PreprocessError> {
        for line in lines.iter_mut().filter(|l| l.indicator == Indicator::Debug) {
            if self.as_code {
                line.indicator = Indicator::Normal;
            } else {
                line.content.clear();
            }
        }
        Ok(ResultWithErrors::ok(lines))
    }
}

/// Joins continuation lines onto the preceding code line.
///
/// The first non-blank character of a continuation line follows the last
/// non-blank character of the continued line directly. When the continued
/// line ends inside a literal, the opening quote on the continuation line is
/// dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContinuationStage;

impl LineTransformation for ContinuationStage {
    fn name(&self) -> &'static str {
        "continuation"
    }

    fn transform_lines(
        &self,
        uri: &str,
        mut lines: Vec<CobolLine>,
    ) -> Result<ResultWithErrors<Vec<CobolLine>>, PreprocessError> {
        let mut errors = Vec::new();
        let mut previous_code: Option<usize> = None;

        for index in 0..lines.len() {
            if !lines[index].is_continuation() {
                if !lines[index].is_comment() && !lines[index].is_blank() {
                    previous_code = Some(index);
                }
                continue;
            }

            let location = lines[index].location(uri);
            let continued = std::mem::take(&mut lines[index].content);
            let Some(target) = previous_code else {
                errors.push(
                    Diagnostic::warning(
                        location,
                        "Continuation line has no preceding line to continue",
                    )
                    .with_code(codes::ORPHAN_CONTINUATION),
                );
                continue;
            };

            let target_line = &mut lines[target];
            let head = target_line.content.trim_end().to_string();
            let mut tail = continued.trim();
            if let Some(open) = unclosed_quote(&head) {
                tail = tail.strip_prefix(open).unwrap_or(tail);
            }
            target_line.content = head + tail;
        }

        Ok(ResultWithErrors::new(lines, errors))
    }
}

/// The quote character left open at the end of `content`, if any.
fn unclosed_quote(content: &str) -> Option<char> {
    let mut quote = None;
    for ch in content.chars() {
        match quote {
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            Some(open) if ch == open => quote = None,
            _ => {}
        }
    }
    quote
}

/// An ordered chain of stages, itself a [`LineTransformation`].
pub struct Pipeline {
    stages: Vec<Box<dyn LineTransformation>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn LineTransformation>>) -> Self {
        Self { stages }
    }

    /// Comment stripping, debug-line handling, then continuation joining.
    pub fn standard(debug_lines_as_code: bool) -> Self {
        Self::new(vec![
            Box::new(CommentStage),
            Box::new(DebugLineStage {
                as_code: debug_lines_as_code,
            }),
            Box::new(ContinuationStage),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard(false)
    }
}

impl LineTransformation for Pipeline {
    fn name(&self) -> &'static str {
        "pipeline"
    }

    fn transform_lines(
        &self,
        uri: &str,
        lines: Vec<CobolLine>,
    ) -> Result<ResultWithErrors<Vec<CobolLine>>, PreprocessError> {
        let mut current = ResultWithErrors::ok(lines);
        for stage in &self.stages {
            let expected = current.result.len();
            let next = stage.transform_lines(uri, current.result)?;
            if next.result.len() != expected {
                return Err(PreprocessError::stage(
                    stage.name(),
                    format!(
                        "returned {} lines for {} input lines",
                        next.result.len(),
                        expected
                    ),
                ));
            }
            current.errors.extend(next.errors);
            current.result = next.result;
        }
        Ok(current)
    }
}
