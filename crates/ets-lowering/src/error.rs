//! Lowering errors.

use ets_diagnostics::{Diagnostic, DiagnosticCode};
use ets_span::Span;
use smol_str::SmolStr;
use thiserror::Error;

/// A fatal error that aborts lowering of the current unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct LowerError {
    /// The kind of error.
    pub kind: LowerErrorKind,
    /// The offending member or node.
    pub span: Span,
}

impl LowerError {
    pub fn new(kind: LowerErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn code(&self) -> DiagnosticCode {
        match self.kind {
            LowerErrorKind::ClassificationConflict { .. } => DiagnosticCode::ClassificationConflict,
            LowerErrorKind::MissingKey { .. } => DiagnosticCode::MissingKey,
            LowerErrorKind::UnresolvedBinding { .. } => DiagnosticCode::UnresolvedBinding,
            LowerErrorKind::StructuralImbalance { .. } => DiagnosticCode::StructuralImbalance,
            LowerErrorKind::InvalidIteration { .. } => DiagnosticCode::InvalidIteration,
            LowerErrorKind::UnknownTrailingClosureTarget { .. } => {
                DiagnosticCode::UnknownTrailingClosure
            }
        }
    }

    /// Converts the error into a diagnostic for the sink.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::new(self.code(), self.kind.to_string(), self.span);
        match &self.kind {
            LowerErrorKind::StructuralImbalance { .. } => {
                diagnostic.with_note("the composition tree handed to the lowering pass is malformed")
            }
            LowerErrorKind::MissingKey { .. } => diagnostic
                .with_note("partial updates reuse items by key; pass a key generator as the third argument"),
            _ => diagnostic,
        }
    }
}

/// The kind of lowering error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerErrorKind {
    #[error("member '{member}' has conflicting decorators @{first} and @{second}")]
    ClassificationConflict {
        /// The member name.
        member: SmolStr,
        /// The decorator seen first.
        first: SmolStr,
        /// The conflicting decorator.
        second: SmolStr,
    },

    #[error("{construct} requires an explicit key generator in partial update mode")]
    MissingKey {
        /// `ForEach` or `LazyForEach`.
        construct: SmolStr,
    },

    #[error("two-way binding refers to unknown name '{name}'")]
    UnresolvedBinding {
        /// The unresolved name.
        name: SmolStr,
    },

    #[error("unbalanced composition tree: {detail}")]
    StructuralImbalance {
        /// What is wrong.
        detail: String,
    },

    #[error("invalid iteration call: {detail}")]
    InvalidIteration {
        /// Why the argument list matches no overload.
        detail: String,
    },

    #[error("trailing closure passed to '{component}' but no @BuilderParam receives it")]
    UnknownTrailingClosureTarget {
        /// The invoked component.
        component: SmolStr,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use ets_diagnostics::Severity;

    #[test]
    fn test_conflict_message() {
        let err = LowerError::new(
            LowerErrorKind::ClassificationConflict {
                member: "count".into(),
                first: "State".into(),
                second: "Link".into(),
            },
            Span::new(4u32, 9u32),
        );
        assert_eq!(
            err.to_string(),
            "member 'count' has conflicting decorators @State and @Link"
        );
        let diagnostic = err.to_diagnostic();
        assert_eq!(diagnostic.code.as_str(), "classification-conflict");
        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.span, Span::new(4u32, 9u32));
    }

    #[test]
    fn test_missing_key_has_note() {
        let err = LowerError::new(
            LowerErrorKind::MissingKey {
                construct: "ForEach".into(),
            },
            Span::default(),
        );
        assert_eq!(err.to_diagnostic().notes.len(), 1);
    }
}
