//! Configuration file support for winclean.
//!
//! Loads optional `.winclean/config.toml` from the working directory. CLI
//! flags override anything set here.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::{Result, WincleanError};
use crate::types::ColorMode;

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct WincleanConfig {
    /// Declared root used when `--root` is not given.
    pub root: Option<String>,
    /// Exit with status 1 when any diagnostic is reported.
    pub fail_on_issues: bool,
    pub color: Option<ColorMode>,
    pub dynamic: DynamicConfig,
}

/// Settings for `--mode dynamic`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DynamicConfig {
    pub venv: Option<PathBuf>,
    /// Interpreter used to create the virtual environment.
    pub python: String,
    pub timeout_secs: u64,
}

impl Default for DynamicConfig {
    fn default() -> Self {
        Self {
            venv: None,
            python: if cfg!(windows) { "python" } else { "python3" }.to_string(),
            timeout_secs: 60,
        }
    }
}

impl WincleanConfig {
    /// Load `.winclean/config.toml` under `dir`.
    /// Returns defaults if the file doesn't exist or is invalid.
    pub fn load(dir: &Path) -> Self {
        Self::load_from_path(&dir.join(".winclean").join("config.toml"))
    }

    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_explicit(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    /// Load a config the user pointed at; unlike [`load`](Self::load) every
    /// problem is an error.
    pub fn load_explicit(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| WincleanError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| WincleanError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
