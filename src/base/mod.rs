//! Foundation types for the COBOL language server core.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`LogicalName`] - Case-normalized copybook names
//! - [`Position`], [`Span`] - Line/column positions (0-indexed, LSP compatible)
//! - [`Location`] - A span inside a document URI
//! - [`Diagnostic`], [`ResultWithErrors`] - Non-fatal problem reporting
//! - Domain constants (copybook folder, default limits)
//!
//! This module has NO dependencies on other crate modules.

pub mod constants;
pub mod diagnostics;
mod name;
mod position;
pub mod text_utils;

pub use diagnostics::{Diagnostic, RelatedInfo, ResultWithErrors, Severity, codes};
pub use name::{LogicalName, NameError};
pub use position::{Location, Position, Span};
