//! Configuration system for stream.
//!
//! Run options come from three layers, highest precedence first:
//! 1. Command-line flags
//! 2. Config file (explicit path, .stream.yml, or ~/.config/stream/stream.yml)
//! 3. Built-in defaults

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub mod duration;
mod options;

pub use options::{DEFAULT_PROTOCOL, DEFAULT_RETRIES, RunOptions};

/// Project config file name, looked up in the current directory.
pub const PROJECT_CONFIG: &str = ".stream.yml";

/// Defaults for the run flags, as read from a YAML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FileConfig {
    /// Destination address.
    pub addr: Option<String>,

    /// Output protocol name.
    pub protocol: Option<String>,

    /// Start delay, e.g. `500ms`.
    pub delay: Option<String>,

    /// Connection retry attempts.
    pub retry: Option<u32>,

    /// Signal to wait for before starting.
    #[serde(rename = "start-signal")]
    pub start_signal: Option<String>,
}

/// Files consulted when no `--config` is given, highest priority first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(PROJECT_CONFIG)];
    paths.extend(dirs::config_dir().map(|dir| dir.join("stream").join("stream.yml")));
    paths
}

impl FileConfig {
    /// Read `config_path`, or the first usable file from [`search_paths`].
    ///
    /// An explicit path must load. Search candidates that fail to parse are
    /// skipped with a warning, and no candidate at all means defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        match config_path {
            Some(path) => Self::parse(path).with_context(|| format!("Failed to load config from {}", path.display())),
            None => Ok(Self::search(&search_paths())),
        }
    }

    fn search(candidates: &[PathBuf]) -> Self {
        let found = candidates.iter().filter(|path| path.is_file()).find_map(|path| {
            Self::parse(path)
                .inspect(|_| log::info!("Loaded config from {}", path.display()))
                .inspect_err(|e| log::warn!("Skipping {}: {:#}", path.display(), e))
                .ok()
        });
        found.unwrap_or_else(|| {
            log::debug!("No config file found, using defaults");
            Self::default()
        })
    }

    fn parse(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).context("Failed to parse config file")
    }
}
