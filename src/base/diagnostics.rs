//! Diagnostics: error reporting shared by every analysis layer.
//!
//! Preprocessing, parsing and copybook resolution all report problems as
//! [`Diagnostic`]s instead of failing, so one broken copybook never takes
//! down the analysis of the whole document.

use std::sync::Arc;

use super::position::{Location, Span};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// Convert to LSP severity number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Hint => 4,
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where the problem was found.
    pub location: Location,
    /// Severity level.
    pub severity: Severity,
    /// Error/warning code (e.g., "E0101").
    pub code: Option<Arc<str>>,
    /// The diagnostic message.
    pub message: Arc<str>,
    /// Optional related information.
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelatedInfo {
    pub location: Location,
    pub message: Arc<str>,
}

impl Diagnostic {
    fn new(location: Location, severity: Severity, message: impl Into<Arc<str>>) -> Self {
        Self {
            location,
            severity,
            code: None,
            message: message.into(),
            related: Vec::new(),
        }
    }

    /// Create a new error diagnostic.
    pub fn error(location: Location, message: impl Into<Arc<str>>) -> Self {
        Self::new(location, Severity::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(location: Location, message: impl Into<Arc<str>>) -> Self {
        Self::new(location, Severity::Warning, message)
    }

    /// Create a new informational diagnostic.
    pub fn info(location: Location, message: impl Into<Arc<str>>) -> Self {
        Self::new(location, Severity::Info, message)
    }

    /// Replace the span, keeping the document.
    pub fn with_span(mut self, span: Span) -> Self {
        self.location.span = span;
        self
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Add related information.
    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
///
/// ## Code Ranges
///
/// - **E0001-E0099**: Source format and syntax problems
/// - **E0101-E0199**: Copybook resolution problems
/// - **W0001-W0099**: Warnings
#[allow(dead_code)]
pub mod codes {
    /// Binary or otherwise unreadable source.
    pub const UNREADABLE_SOURCE: &str = "E0001";
    /// `COPY` statement without a copybook name.
    pub const MISSING_COPYBOOK_NAME: &str = "E0002";

    /// The provider reported the copybook as absent.
    pub const COPYBOOK_NOT_FOUND: &str = "E0101";
    /// No provider answered within the resolution timeout.
    pub const COPYBOOK_TIMEOUT: &str = "E0102";
    /// Resolution was cancelled before an answer arrived.
    pub const COPYBOOK_CANCELLED: &str = "E0103";
    /// Content was found but could not be preprocessed or parsed.
    pub const COPYBOOK_BROKEN: &str = "E0104";
    /// Copybook includes itself, directly or transitively.
    pub const CIRCULAR_COPYBOOK: &str = "E0105";
    /// Copybook nesting exceeds the configured depth.
    pub const COPYBOOK_TOO_DEEP: &str = "E0106";

    /// Text found after column 80 in fixed format.
    pub const LINE_TOO_LONG: &str = "W0001";
    /// Continuation line with nothing to continue.
    pub const ORPHAN_CONTINUATION: &str = "W0002";
    /// Level number outside 01-49, 66, 77, 88.
    pub const INVALID_LEVEL_NUMBER: &str = "W0003";
    /// Character the lexer does not recognize.
    pub const UNEXPECTED_CHARACTER: &str = "W0004";
}

// ============================================================================
// RESULT WITH ERRORS
// ============================================================================

/// A value together with the non-fatal diagnostics produced computing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultWithErrors<T> {
    pub result: T,
    pub errors: Vec<Diagnostic>,
}

impl<T> ResultWithErrors<T> {
    pub fn new(result: T, errors: Vec<Diagnostic>) -> Self {
        Self { result, errors }
    }

    /// A value with no diagnostics.
    pub fn ok(result: T) -> Self {
        Self::new(result, Vec::new())
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Apply `f` to the value, appending its diagnostics after the existing ones.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> ResultWithErrors<U>) -> ResultWithErrors<U> {
        let mut errors = self.errors;
        let next = f(self.result);
        errors.extend(next.errors);
        ResultWithErrors::new(next.result, errors)
    }
}
