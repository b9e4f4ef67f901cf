//! Diagnostic records for the ETS lowering pipeline.
//!
//! The lowering core reports every fatal problem through a [`DiagnosticSink`]. The sink
//! only records; it never influences what the core does next, which is always to abandon
//! the current unit.
//!
//! # Example
//!
//! ```
//! use ets_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Span};
//!
//! let mut sink: Vec<Diagnostic> = Vec::new();
//! sink.report(Diagnostic::new(
//!     DiagnosticCode::MissingKey,
//!     "ForEach needs a key generator",
//!     Span::default(),
//! ));
//! assert!(sink.has_errors());
//! ```

mod diagnostic;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use ets_span::Span;

/// Receives diagnostics from the lowering core.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);

    /// Whether an error has been reported so far.
    fn has_errors(&self) -> bool;

    fn report_all(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>)
    where
        Self: Sized,
    {
        for diagnostic in diagnostics {
            self.report(diagnostic);
        }
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }

    fn has_errors(&self) -> bool {
        self.iter().any(Diagnostic::is_error)
    }
}

/// Orders diagnostics by position, then by code, for stable output.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then_with(|| a.code.as_str().cmp(b.code.as_str()))
    });
}
