//! `rts.toml`: per-module configuration, every field defaulted.

use crate::domain::level::Granularity;
use crate::error::RtsError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const CONFIG_FILE: &str = "rts.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtsConfig {
    #[serde(default)]
    pub level: Granularity,
    /// Snapshot directory, relative to the module root.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
    /// Directory holding the parsed source model, relative to the module root.
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    /// Regex narrowing the test classes.
    #[serde(default)]
    pub test_filter: Option<String>,
    /// Ignore DI edges when selecting tests.
    #[serde(default)]
    pub standalone: bool,
    /// Persist the new snapshot at the end of the run.
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
    #[serde(default)]
    pub di: DiConfig,
}

/// DI frameworks whose edges are collected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiConfig {
    #[serde(default)]
    pub spring: bool,
    #[serde(default)]
    pub guice: bool,
    #[serde(default)]
    pub cdi: bool,
}

fn default_snapshot_dir() -> String {
    ".dirts".to_string()
}

fn default_source_dir() -> String {
    ".".to_string()
}

fn default_overwrite() -> bool {
    true
}

impl Default for RtsConfig {
    fn default() -> Self {
        Self {
            level: Granularity::default(),
            snapshot_dir: default_snapshot_dir(),
            source_dir: default_source_dir(),
            test_filter: None,
            standalone: false,
            overwrite: default_overwrite(),
            di: DiConfig::default(),
        }
    }
}

impl RtsConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Option<Self>, RtsError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RtsError::Config {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        };
        toml::from_str(&contents).map(Some).map_err(|e| RtsError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Loads `rts.toml` from the module root.
    pub fn for_module(root: &Path) -> Self {
        Self::load(&root.join(CONFIG_FILE))
    }

    pub fn resolve_snapshot_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.snapshot_dir)
    }

    pub fn resolve_source_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.source_dir)
    }

    pub fn settings(&self) -> RunSettings {
        RunSettings {
            level: self.level,
            standalone: self.standalone,
            overwrite: self.overwrite,
            test_filter: self.test_filter.clone(),
            di: self.di.clone(),
        }
    }
}

/// What one pipeline run does, after CLI overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub level: Granularity,
    pub standalone: bool,
    pub overwrite: bool,
    pub test_filter: Option<String>,
    pub di: DiConfig,
}

impl Default for RunSettings {
    fn default() -> Self {
        RtsConfig::default().settings()
    }
}
