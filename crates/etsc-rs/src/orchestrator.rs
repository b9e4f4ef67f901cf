//! Main orchestration logic.

use crate::cli::{Args, OutputFormat};
use crate::config::{absolutize, EtsConfig, Settings};
use crate::output::{FormattedDiagnostic, Formatter, RunSummary};
use camino::{Utf8Path, Utf8PathBuf};
use ets_ast::SourceUnit;
use ets_diagnostics::{sort_diagnostics, Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
use ets_lowering::lower_unit;
use ets_span::Span;
use globset::{Glob, GlobSet, GlobSetBuilder};
use miette::Diagnostic as MietteDiagnostic;
use rayon::prelude::*;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use walkdir::WalkDir;

/// Extension of the unit files produced by the front end.
pub const UNIT_EXTENSION: &str = ".ets.json";

/// Orchestration errors. These abort the whole run; per-unit problems are reported
/// as diagnostics instead.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum OrchestratorError {
    #[error("workspace path is not valid UTF-8: {0}")]
    #[diagnostic(code(etsc::workspace))]
    NonUtf8Path(String),

    #[error("failed to determine the current directory: {0}")]
    #[diagnostic(code(etsc::workspace))]
    CurrentDir(#[source] std::io::Error),

    #[error("workspace {0} is not a directory")]
    #[diagnostic(code(etsc::workspace), help("pass an existing directory with --workspace"))]
    MissingWorkspace(Utf8PathBuf),

    #[error("invalid exclude pattern: {0}")]
    #[diagnostic(code(etsc::config), help("check the `exclude` list in etsc.config.json"))]
    InvalidGlob(String),

    #[error("failed to create output directory {path}: {source}")]
    #[diagnostic(code(etsc::io))]
    CreateOutDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to one unit file.
#[derive(Debug)]
struct UnitReport {
    /// Path relative to the workspace, as printed.
    display_path: Utf8PathBuf,
    /// The unit's `.ets` text, when the front end shipped it.
    source: Option<String>,
    diagnostics: Vec<Diagnostic>,
    code: Option<String>,
}

impl UnitReport {
    fn failed(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Compiles every unit under the workspace.
pub fn run(args: Args) -> Result<RunSummary, OrchestratorError> {
    let cwd = std::env::current_dir().map_err(OrchestratorError::CurrentDir)?;
    let cwd = Utf8PathBuf::try_from(cwd)
        .map_err(|e| OrchestratorError::NonUtf8Path(e.into_path_buf().display().to_string()))?;
    let workspace = absolutize(&cwd, &args.workspace);
    if !workspace.is_dir() {
        return Err(OrchestratorError::MissingWorkspace(workspace));
    }

    let config_path = args.config.as_deref().map(|path| absolutize(&cwd, path));
    let config = EtsConfig::load(&workspace, config_path.as_deref());
    let settings = Settings::resolve(&args, config, &workspace, &cwd);
    tracing::debug!(
        workspace = %workspace,
        out_dir = %settings.out_dir,
        mode = %settings.options.mode,
        "resolved settings"
    );

    let exclude = build_exclude_set(&settings.exclude)?;
    let files = find_units(&workspace, &settings.out_dir, &exclude);
    tracing::debug!(count = files.len(), "found units");

    fs::create_dir_all(&settings.out_dir).map_err(|source| OrchestratorError::CreateOutDir {
        path: settings.out_dir.clone(),
        source,
    })?;

    let stop = AtomicBool::new(false);
    let reports: Vec<Option<UnitReport>> = files
        .par_iter()
        .map(|path| {
            if args.fail_fast && stop.load(Ordering::Relaxed) {
                return None;
            }
            let report = compile_file(path, &workspace, &settings);
            if report.failed() {
                stop.store(true, Ordering::Relaxed);
            }
            Some(report)
        })
        .collect();

    Ok(report_all(&args, files.len(), reports))
}

fn build_exclude_set(patterns: &[String]) -> Result<GlobSet, OrchestratorError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))?;
        builder.add(glob);
    }
    for pattern in ["**/node_modules/**", "**/oh_modules/**", "**/.git/**"] {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder
        .build()
        .map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))
}

/// Finds unit files under `workspace`, skipping the output directory and excluded
/// paths. The result is sorted so output order does not depend on the file system.
fn find_units(workspace: &Utf8Path, out_dir: &Utf8Path, exclude: &GlobSet) -> Vec<Utf8PathBuf> {
    let mut files: Vec<Utf8PathBuf> = WalkDir::new(workspace)
        .into_iter()
        .filter_entry(|entry| entry.path() != out_dir.as_std_path())
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
        .filter(|p| p.as_str().ends_with(UNIT_EXTENSION))
        .filter(|p| {
            let relative = p.strip_prefix(workspace).unwrap_or(p);
            !exclude.is_match(relative.as_str())
        })
        .collect();
    files.sort();
    files
}

/// `pages/Index.ets.json` -> `pages/Index.js`
fn output_path(relative: &Utf8Path) -> Utf8PathBuf {
    let name = relative.file_name().unwrap_or_default();
    let stem = name.strip_suffix(UNIT_EXTENSION).unwrap_or(name);
    relative.with_file_name(format!("{}.js", stem))
}

fn compile_file(path: &Utf8Path, workspace: &Utf8Path, settings: &Settings) -> UnitReport {
    let relative = path.strip_prefix(workspace).unwrap_or(path).to_owned();
    let _span = tracing::debug_span!("unit", unit = %relative).entered();

    let mut report = UnitReport {
        display_path: relative.clone(),
        source: None,
        diagnostics: Vec::new(),
        code: None,
    };

    let unit = match read_unit(path) {
        Ok(unit) => unit,
        Err(diagnostic) => {
            report.diagnostics.report(diagnostic);
            return report;
        }
    };
    report.source = unit.source.clone();

    match lower_unit(&unit, &settings.options) {
        Ok(output) => {
            report.diagnostics.report_all(output.warnings);
            let target = settings.out_dir.join(output_path(&relative));
            match write_output(&target, &output.code) {
                Ok(()) => {
                    tracing::debug!(output = %target, mode = %output.mode, "wrote unit");
                    report.code = Some(output.code);
                }
                Err(e) => report.diagnostics.report(Diagnostic::new(
                    DiagnosticCode::LoadError,
                    format!("failed to write {}: {}", target, e),
                    Span::default(),
                )),
            }
        }
        Err(errors) => {
            tracing::debug!(count = errors.len(), "unit failed to lower");
            report
                .diagnostics
                .report_all(errors.iter().map(|error| error.to_diagnostic()));
        }
    }

    sort_diagnostics(&mut report.diagnostics);
    report
}

fn read_unit(path: &Utf8Path) -> Result<SourceUnit, Diagnostic> {
    let json = fs::read_to_string(path).map_err(|e| {
        Diagnostic::new(
            DiagnosticCode::LoadError,
            format!("failed to read unit: {}", e),
            Span::default(),
        )
    })?;
    ets_ast::load_unit(&json).map_err(|e| {
        Diagnostic::new(DiagnosticCode::LoadError, e.kind.to_string(), e.span)
    })
}

fn write_output(target: &Utf8Path, code: &str) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, code)
}

/// Prints every report in file order and tallies the summary.
fn report_all(args: &Args, unit_count: usize, reports: Vec<Option<UnitReport>>) -> RunSummary {
    let formatter = Formatter::new(args.output);
    let mut json_output: Vec<FormattedDiagnostic> = Vec::new();
    let mut summary = RunSummary {
        unit_count,
        ..RunSummary::default()
    };

    for report in reports {
        let Some(report) = report else {
            summary.skipped_count += 1;
            continue;
        };

        for diagnostic in &report.diagnostics {
            match diagnostic.severity {
                Severity::Error => summary.error_count += 1,
                Severity::Warning => summary.warning_count += 1,
                Severity::Hint => {}
            }
        }
        if report.code.is_some() {
            summary.compiled_count += 1;
        }

        if args.emit {
            if let Some(code) = &report.code {
                println!("=== JS for {} ===\n{}", report.display_path, code);
            }
        }

        if args.output == OutputFormat::Json {
            json_output.extend(Formatter::format_json_diagnostics(
                &report.diagnostics,
                &report.display_path,
                report.source.as_deref(),
            ));
        } else {
            let text = formatter.format(
                &report.diagnostics,
                &report.display_path,
                report.source.as_deref(),
            );
            if !text.is_empty() {
                print!("{}", text);
            }
        }
    }

    if args.output == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&json_output).unwrap_or_else(|_| "[]".to_string());
        println!("{}", json);
    } else {
        println!("{}", summary.format());
    }

    summary
}
