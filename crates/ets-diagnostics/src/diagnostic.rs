//! Diagnostic types.

use ets_span::Span;

/// A message about a position in a source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    /// The diagnostic code.
    pub code: DiagnosticCode,
    /// The severity level.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// The offending member or node.
    pub span: Span,
    /// Additional notes, printed after the message.
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a diagnostic with the code's default severity.
    pub fn new(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: code.default_severity(),
            code,
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Severity {
    Hint,
    Warning,
    /// Aborts lowering of the unit.
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Hint => "Hint",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// Codes for everything the lowering pipeline reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DiagnosticCode {
    // === Lowering ===
    /// `classification-conflict`: two mutually exclusive decorators on one member
    ClassificationConflict,
    /// `missing-key`: iteration without a key generator under partial update
    MissingKey,
    /// `unresolved-binding`: `$$` reference to an unknown name
    UnresolvedBinding,
    /// `structural-imbalance`: malformed composition tree
    StructuralImbalance,
    /// `invalid-iteration`: iteration arguments match no overload
    InvalidIteration,
    /// `unknown-trailing-closure`: trailing closure with no `@BuilderParam` to receive it
    UnknownTrailingClosure,

    // === Driver ===
    /// `load-error`: the unit file could not be read
    LoadError,
    /// `mode-override`: unit lowered in a different update mode than requested
    ModeOverride,
}

impl DiagnosticCode {
    /// Returns the default severity for this code.
    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticCode::ModeOverride => Severity::Warning,
            DiagnosticCode::ClassificationConflict
            | DiagnosticCode::MissingKey
            | DiagnosticCode::UnresolvedBinding
            | DiagnosticCode::StructuralImbalance
            | DiagnosticCode::InvalidIteration
            | DiagnosticCode::UnknownTrailingClosure
            | DiagnosticCode::LoadError => Severity::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::ClassificationConflict => "classification-conflict",
            DiagnosticCode::MissingKey => "missing-key",
            DiagnosticCode::UnresolvedBinding => "unresolved-binding",
            DiagnosticCode::StructuralImbalance => "structural-imbalance",
            DiagnosticCode::InvalidIteration => "invalid-iteration",
            DiagnosticCode::UnknownTrailingClosure => "unknown-trailing-closure",
            DiagnosticCode::LoadError => "load-error",
            DiagnosticCode::ModeOverride => "mode-override",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
