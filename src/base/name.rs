//! Copybook names.
//!
//! A copybook is requested by a logical name rather than a path. Names are
//! compared case-insensitively in COBOL, so they are normalized once here and
//! compared by plain equality everywhere else (bus filtering, dedup, cycle
//! detection).

use std::borrow::Borrow;
use std::fmt;

use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised while building a [`LogicalName`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("copybook name is empty")]
    Empty,
    #[error("copybook name contains whitespace: {0:?}")]
    Whitespace(String),
}

/// A case-normalized copybook identifier. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalName(SmolStr);

impl LogicalName {
    /// Normalize a raw name as written in source.
    ///
    /// Surrounding whitespace and quotes are stripped and ASCII letters are
    /// upper-cased, so `'custrec'` and `CUSTREC` name the same copybook.
    pub fn new(raw: &str) -> Result<Self, NameError> {
        let trimmed = raw.trim().trim_matches(|c| c == '\'' || c == '"').trim();
        if trimmed.is_empty() {
            return Err(NameError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(NameError::Whitespace(trimmed.to_string()));
        }
        Ok(Self(SmolStr::new(trimmed.to_ascii_uppercase())))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for LogicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LogicalName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for LogicalName {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for LogicalName {
    type Error = NameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
