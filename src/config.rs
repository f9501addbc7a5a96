//! Configuration management for crabline
//!
//! Handles loading and saving the input-core settings a host can tune: the
//! ignore-EOF threshold, the capture queue capacity, and where alias
//! definitions live.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::capture::DEFAULT_QUEUE_CAPACITY;

/// crabline configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Consecutive EOF keystrokes on an empty line tolerated before the
    /// session terminates
    #[serde(default)]
    pub ignore_eof: u32,

    /// Capture queue capacity in chunks
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Alias definitions file; if not set, aliases live only in memory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_file: Option<PathBuf>,
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignore_eof: 0,
            queue_capacity: default_queue_capacity(),
            alias_file: None,
        }
    }
}

impl Config {
    /// Get config directory path (~/.crabline)
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".crabline")
    }

    /// Get config file path (~/.crabline/config.toml)
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load config from an explicit path, or return default if not found
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(Self::config_path())
    }

    /// Save config to an explicit path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        // Atomic write: write to temp file then rename
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, &contents)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to rename config file to {}", path.display()))?;

        Ok(())
    }
}
