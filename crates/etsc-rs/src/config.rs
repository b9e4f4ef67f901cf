//! Configuration loading.

use crate::cli::{Args, Mode, Route};
use camino::{Utf8Path, Utf8PathBuf};
use ets_lowering::LowerOptions;
use serde::Deserialize;
use std::fs;
use thiserror::Error;

/// File name looked up in the workspace root when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "etsc.config.json";

/// Output directory used when neither the flags nor the config name one.
const DEFAULT_OUT_DIR: &str = "build";

/// Contents of `etsc.config.json`. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EtsConfig {
    pub mode: Option<Mode>,
    pub route: Option<Route>,
    /// Relative to the workspace root.
    pub out_dir: Option<Utf8PathBuf>,
    pub bundle_name: Option<String>,
    pub module_name: Option<String>,
    /// Builtins closed with `pop()` on top of the known containers.
    pub extra_containers: Vec<String>,
    pub extra_info: Option<bool>,
    /// Glob patterns, relative to the workspace, of units to skip.
    pub exclude: Vec<String>,
}

/// Why a config file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl EtsConfig {
    /// Loads the config for a workspace.
    ///
    /// A missing default file yields the defaults silently; an explicit file that is
    /// missing, or any file that fails to parse, yields the defaults with a warning.
    pub fn load(workspace: &Utf8Path, explicit: Option<&Utf8Path>) -> Self {
        let path = match explicit {
            Some(path) => path.to_owned(),
            None => {
                let path = workspace.join(CONFIG_FILE_NAME);
                if !path.exists() {
                    return Self::default();
                }
                path
            }
        };

        match Self::parse_config(&path) {
            Ok(config) => {
                tracing::debug!(config = %path, "loaded config");
                config
            }
            Err(e) => {
                eprintln!("Warning: {}", e);
                Self::default()
            }
        }
    }

    fn parse_config(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

/// Effective settings after merging flags over the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Absolute output directory.
    pub out_dir: Utf8PathBuf,
    /// Options every unit starts from.
    pub options: LowerOptions,
    pub exclude: Vec<String>,
}

impl Settings {
    /// Merges `args` over `config`. Relative flag paths resolve against `cwd`, relative
    /// config paths against `workspace`.
    pub fn resolve(args: &Args, config: EtsConfig, workspace: &Utf8Path, cwd: &Utf8Path) -> Self {
        let out_dir = match (&args.out_dir, &config.out_dir) {
            (Some(flag), _) => absolutize(cwd, flag),
            (None, Some(configured)) => absolutize(workspace, configured),
            (None, None) => workspace.join(DEFAULT_OUT_DIR),
        };

        let mut options = LowerOptions::default();
        if let Some(mode) = args.mode.or(config.mode) {
            options.mode = mode.into();
        }
        if let Some(route) = args.route.or(config.route) {
            options.route = route.into();
        }
        options.bundle_name = config.bundle_name;
        options.module_name = config.module_name;
        options.extra_containers = config.extra_containers;
        if let Some(extra_info) = config.extra_info {
            options.extra_info = extra_info;
        }

        Self {
            out_dir,
            options,
            exclude: config.exclude,
        }
    }
}

pub fn absolutize(base: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_owned()
    } else {
        base.join(path)
    }
}
