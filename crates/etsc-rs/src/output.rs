//! Output formatting.

use crate::cli::OutputFormat;
use camino::Utf8Path;
use ets_diagnostics::{Diagnostic, Severity};
use ets_span::{ByteOffset, LineCol, LineIndex};
use serde::Serialize;

/// A formatted diagnostic for JSON output.
#[derive(Debug, Serialize)]
pub struct FormattedDiagnostic {
    /// Error, Warning or Hint.
    #[serde(rename = "type")]
    pub diagnostic_type: String,
    pub filename: String,
    pub start: Position,
    pub end: Position,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// A position in the `.ets` source.
#[derive(Debug, Serialize)]
pub struct Position {
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub column: u32,
    /// Byte offset.
    pub offset: u32,
}

/// Resolves offsets against the unit's source text, when the front end shipped it.
struct Locator(Option<LineIndex>);

impl Locator {
    fn new(source: Option<&str>) -> Self {
        Self(source.map(LineIndex::new))
    }

    fn locate(&self, offset: ByteOffset) -> LineCol {
        self.0
            .as_ref()
            .and_then(|index| index.line_col(offset))
            .unwrap_or_default()
    }
}

/// Formats diagnostics for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the diagnostics of one unit.
    ///
    /// JSON output is collected across units by the caller through
    /// [`Formatter::format_json_diagnostics`], so this returns an empty string for it.
    pub fn format(
        &self,
        diagnostics: &[Diagnostic],
        file_path: &Utf8Path,
        source: Option<&str>,
    ) -> String {
        match self.format {
            OutputFormat::Human => Self::format_human(diagnostics, file_path, source),
            OutputFormat::Machine => Self::format_machine(diagnostics, file_path, source),
            OutputFormat::Json => String::new(),
        }
    }

    fn format_human(diagnostics: &[Diagnostic], file_path: &Utf8Path, source: Option<&str>) -> String {
        let locator = Locator::new(source);
        let mut output = String::new();

        for diag in diagnostics {
            let start = locator.locate(diag.span.start);
            output.push_str(&format!(
                "{}:{}:{}\n{}: {} ({})\n",
                file_path,
                start.line_number(),
                start.column_number(),
                diag.severity.as_str(),
                diag.message,
                diag.code
            ));
            for note in &diag.notes {
                output.push_str(&format!("  note: {}\n", note));
            }
            output.push('\n');
        }

        output
    }

    /// Formats diagnostics into JSON-ready structs.
    pub fn format_json_diagnostics(
        diagnostics: &[Diagnostic],
        file_path: &Utf8Path,
        source: Option<&str>,
    ) -> Vec<FormattedDiagnostic> {
        let locator = Locator::new(source);
        diagnostics
            .iter()
            .map(|diag| {
                let start = locator.locate(diag.span.start);
                let end = locator.locate(diag.span.end);

                FormattedDiagnostic {
                    diagnostic_type: diag.severity.as_str().to_string(),
                    filename: file_path.to_string(),
                    start: Position {
                        line: start.line_number(),
                        column: start.column_number(),
                        offset: u32::from(diag.span.start),
                    },
                    end: Position {
                        line: end.line_number(),
                        column: end.column_number(),
                        offset: u32::from(diag.span.end),
                    },
                    message: diag.message.clone(),
                    code: diag.code.to_string(),
                    notes: diag.notes.clone(),
                }
            })
            .collect()
    }

    fn format_machine(diagnostics: &[Diagnostic], file_path: &Utf8Path, source: Option<&str>) -> String {
        let locator = Locator::new(source);
        let mut output = String::new();

        for diag in diagnostics {
            let start = locator.locate(diag.span.start);
            let end = locator.locate(diag.span.end);
            let severity = match diag.severity {
                Severity::Error => "ERROR",
                Severity::Warning => "WARNING",
                Severity::Hint => "HINT",
            };

            output.push_str(&format!(
                "{} {}:{}:{}:{}:{} {} ({})\n",
                severity,
                file_path,
                start.line_number(),
                start.column_number(),
                end.line_number(),
                end.column_number(),
                diag.message,
                diag.code
            ));
        }

        output
    }
}

/// Summary of a compile run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    /// Units found under the workspace.
    pub unit_count: usize,
    /// Units lowered and written.
    pub compiled_count: usize,
    /// Units not attempted because of `--fail-fast`.
    pub skipped_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

impl RunSummary {
    /// Whether any unit failed.
    pub fn failed(&self) -> bool {
        self.error_count > 0
    }

    /// Formats the summary line.
    pub fn format(&self) -> String {
        let plural = |count: usize, word: &str| {
            if count == 1 {
                format!("{} {}", count, word)
            } else {
                format!("{} {}s", count, word)
            }
        };

        let mut line = format!(
            "====================================\netsc-rs compiled {} of {} with {} and {}",
            self.compiled_count,
            plural(self.unit_count, "unit"),
            plural(self.error_count, "error"),
            plural(self.warning_count, "warning"),
        );
        if self.skipped_count > 0 {
            line.push_str(&format!(" ({} skipped)", self.skipped_count));
        }
        line
    }
}
