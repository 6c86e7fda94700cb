//! Source lines and the reference-format reader.

use crate::base::constants::{
    INDICATOR_COLUMN, MAX_FIXED_LINE_LENGTH, PROGRAM_TEXT_END, SEQUENCE_AREA_END,
};
use crate::base::{Diagnostic, Location, ResultWithErrors, Span, codes};

use super::error::PreprocessError;

/// COBOL source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceFormat {
    /// Columns 1-6 sequence area, 7 indicator, 8-72 program text, 73-80 ignored.
    #[default]
    Fixed,
    /// Like [`SourceFormat::Fixed`] without the right margin.
    Variable,
    /// No column restrictions; `*>` starts a comment.
    Free,
}

/// Column 7 indicator values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Normal,
    /// `*` or `/`
    Comment,
    /// `-`
    Continuation,
    /// `D` or `d`
    Debug,
}

impl Indicator {
    pub fn from_char(ch: char) -> Self {
        match ch {
            '*' | '/' => Indicator::Comment,
            '-' => Indicator::Continuation,
            'D' | 'd' => Indicator::Debug,
            _ => Indicator::Normal,
        }
    }
}

/// One physical source line split into its reference-format areas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CobolLine {
    /// 0-indexed line number in the document.
    pub number: u32,
    /// Sequence number area (empty in free format).
    pub sequence: String,
    pub indicator: Indicator,
    /// Program text.
    pub content: String,
    /// Column at which `content` starts.
    pub content_offset: u32,
}

impl CobolLine {
    pub fn is_comment(&self) -> bool {
        self.indicator == Indicator::Comment
    }

    pub fn is_continuation(&self) -> bool {
        self.indicator == Indicator::Continuation
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Location of the whole program-text area of this line.
    pub fn location(&self, uri: &str) -> Location {
        let len = self.content.chars().count() as u32;
        Location::new(uri, Span::on_line(self.number, self.content_offset, len))
    }
}

/// Split `text` into [`CobolLine`]s according to `format`.
///
/// Fails only on binary content; layout problems are reported as warnings.
pub fn read_lines(
    uri: &str,
    text: &str,
    format: SourceFormat,
) -> Result<ResultWithErrors<Vec<CobolLine>>, PreprocessError> {
    let mut lines = Vec::new();
    let mut errors = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let number = index as u32;
        if raw.contains('\0') {
            return Err(PreprocessError::BinaryContent { line: number + 1 });
        }

        let chars: Vec<char> = raw.chars().collect();
        let line = match format {
            SourceFormat::Fixed | SourceFormat::Variable => {
                if format == SourceFormat::Fixed && chars.len() > MAX_FIXED_LINE_LENGTH {
                    let extra = (chars.len() - MAX_FIXED_LINE_LENGTH) as u32;
                    errors.push(
                        Diagnostic::warning(
                            Location::new(
                                uri,
                                Span::on_line(number, MAX_FIXED_LINE_LENGTH as u32, extra),
                            ),
                            "Source text cannot go past column 80",
                        )
                        .with_code(codes::LINE_TOO_LONG),
                    );
                }
                read_reference_line(number, &chars, format)
            }
            SourceFormat::Free => read_free_line(number, raw),
        };
        lines.push(line);
    }

    Ok(ResultWithErrors::new(lines, errors))
}

fn read_reference_line(number: u32, chars: &[char], format: SourceFormat) -> CobolLine {
    let sequence: String = chars.iter().take(SEQUENCE_AREA_END).collect();
    let indicator = chars
        .get(INDICATOR_COLUMN)
        .copied()
        .map_or(Indicator::Normal, Indicator::from_char);

    let content_start = INDICATOR_COLUMN + 1;
    let content_end = match format {
        SourceFormat::Fixed => chars.len().min(PROGRAM_TEXT_END),
        _ => chars.len(),
    };
    let content = if chars.len() > content_start {
        chars[content_start..content_end].iter().collect()
    } else {
        String::new()
    };

    CobolLine {
        number,
        sequence,
        indicator,
        content,
        content_offset: content_start as u32,
    }
}

fn read_free_line(number: u32, raw: &str) -> CobolLine {
    let indicator = if raw.trim_start().starts_with("*>") {
        Indicator::Comment
    } else {
        Indicator::Normal
    };
    CobolLine {
        number,
        sequence: String::new(),
        indicator,
        content: raw.to_string(),
        content_offset: 0,
    }
}

/// Render lines back to text, one output line per input line.
///
/// Program text is placed at its original column so positions found by the
/// parser map straight back to the source document.
pub fn write_text(lines: &[CobolLine]) -> String {
    let mut text = String::new();
    for (index, line) in lines.iter().enumerate() {
        if index > 0 {
            text.push('\n');
        }
        if !line.content.is_empty() {
            text.extend(std::iter::repeat_n(' ', line.content_offset as usize));
            text.push_str(line.content.trim_end());
        }
    }
    text
}
