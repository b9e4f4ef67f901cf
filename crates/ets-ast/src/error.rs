//! Errors raised while reading a unit from its interchange form.

use ets_span::Span;
use thiserror::Error;

/// A unit file could not be turned into a [`SourceUnit`](crate::SourceUnit).
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct LoadError {
    /// What went wrong.
    pub kind: LoadErrorKind,
    /// Location inside the interchange document.
    pub span: Span,
}

impl LoadError {
    pub fn new(kind: LoadErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of load error.
#[derive(Debug, Clone, Error)]
pub enum LoadErrorKind {
    /// The document is not valid JSON or does not match the tree shape.
    #[error("malformed unit at line {line}, column {column}: {message}")]
    Malformed {
        /// The underlying parser message.
        message: String,
        /// 1-based line in the document.
        line: usize,
        /// 1-based column in the document.
        column: usize,
    },

    /// The unit has no file name, so ids and page paths cannot be derived.
    #[error("unit has an empty file name")]
    MissingFileName,
}
