//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use ets_lowering::{RouteMode, UpdateMode};
use serde::Deserialize;

/// Lowers ETS component units into ArkUI runtime JavaScript.
#[derive(Debug, Parser)]
#[command(name = "etsc-rs")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directory scanned for `*.ets.json` units
    #[arg(long, default_value = ".")]
    pub workspace: Utf8PathBuf,

    /// Directory the generated `.js` files are written to
    #[arg(long = "out-dir")]
    pub out_dir: Option<Utf8PathBuf>,

    /// Update mode (overrides the config file)
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Start-up form of entry components without a route name
    #[arg(long, value_enum)]
    pub route: Option<Route>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Path to the config file (defaults to `etsc.config.json` in the workspace)
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Print the generated JavaScript to stdout
    #[arg(long)]
    pub emit: bool,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,

    /// Stop compiling new units after the first failing one
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,
}

/// Update mode as spelled on the command line and in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Eager re-rendering by generated id strings
    Legacy,
    /// Fine-grained updates keyed by element ids
    Partial,
}

impl From<Mode> for UpdateMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Legacy => UpdateMode::Legacy,
            Mode::Partial => UpdateMode::Partial,
        }
    }
}

/// Entry start-up form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// `loadDocument(...)`
    Load,
    /// `registerNamedRoute(...)`
    Named,
}

impl From<Route> for RouteMode {
    fn from(route: Route) -> Self {
        match route {
            Route::Load => RouteMode::Load,
            Route::Named => RouteMode::NamedRoute,
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output
    Json,
    /// Machine-readable (one line per diagnostic)
    Machine,
}
