//! # cobol-lsp-base
//!
//! Copybook resolution and recursive preprocessing core for a COBOL
//! language server.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide           → IDE features (hover, goto-def, references)
//!   ↓
//! project       → Copybook providers (workspace folders, in-memory)
//!   ↓
//! copybook      → Resolution tasks, fork/join analysis, config
//!   ↓
//! semantic      → SemanticContext, merge, logos-based parser
//!   ↓
//! preprocessor  → Reference-format reader, line transformation stages
//!   ↓
//! bus           → Event bus, ScanRequest / FetchResult events
//!   ↓
//! base          → Primitives (LogicalName, Position, Location, Diagnostic)
//! ```

// ============================================================================
// MODULES (dependency order: base → bus → preprocessor → semantic → copybook → project → ide)
// ============================================================================

/// Foundation types: names, positions, diagnostics, constants
pub mod base;

/// Event bus connecting resolution tasks and copybook providers
pub mod bus;

/// Line-oriented preprocessing pipeline
pub mod preprocessor;

/// Semantic context and the per-document parser
pub mod semantic;

/// Copybook resolution tasks and the recursive analyzer
pub mod copybook;

/// Copybook providers
pub mod project;

/// IDE features: hover, goto-definition, find-references
pub mod ide;

// Re-export foundation types
pub use base::{Diagnostic, Location, LogicalName, Position, Severity, Span};
pub use bus::{Event, EventBus, FetchResult, ScanRequest};
pub use copybook::{AnalyzerConfig, CopybookAnalyzer, DedupPolicy};
pub use semantic::{SemanticContext, SymbolKind};
