//! Error types.
//!
//! Per the error-handling design (DESIGN.md), malformed directives,
//! redefinitions, missing includes, `#error`/`#warning` and similar are
//! *not* represented here — they are reported through [`crate::diagnostics::DiagnosticSink`]
//! and never stop processing. `PreprocessError` is reserved for the small
//! set of conditions that really do abort: the top-level input cannot be
//! read, or an include chain recurses past the configured depth limit.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreprocessError {
    /// The top-level input could not be opened or read.
    InputUnavailable { path: String, reason: String },
    /// Include nesting exceeded the configured limit (header-guard loops
    /// are the usual cause, but nothing here detects cycles directly —
    /// this is a depth backstop, not a graph check).
    IncludeDepthExceeded { path: String, limit: usize },
}

impl fmt::Display for PreprocessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreprocessError::InputUnavailable { path, reason } => {
                write!(f, "cannot read {path}: {reason}")
            }
            PreprocessError::IncludeDepthExceeded { path, limit } => {
                write!(f, "include depth exceeded ({limit}) while processing {path}")
            }
        }
    }
}

impl std::error::Error for PreprocessError {}
