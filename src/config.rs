//! Kiln Configuration Module
//!
//! Runtime limits and prompt behaviour.
//! Config is stored in `~/.config/kiln/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`KILN_EXEC_TIMEOUT`, `KILN_FETCH_TIMEOUT`, `KILN_NON_INTERACTIVE`)
//! 2. Config file (`~/.config/kiln/config.toml`)
//! 3. Defaults (`util::constants`)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{KilnError, Result};
use crate::util::{CONNECT_TIMEOUT, EXEC_TIMEOUT, FETCH_TIMEOUT};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KilnConfig {
    /// Timeouts for commands and remote fetches
    #[serde(default)]
    pub runtime: RuntimeSettings,

    /// Prompt collection
    #[serde(default)]
    pub prompts: PromptSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuntimeSettings {
    /// `exec` checks, value specs and tasks
    pub exec_timeout_secs: Option<u64>,

    /// Whole-request timeout for remote documents
    pub fetch_timeout_secs: Option<u64>,

    pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PromptSettings {
    /// Answer every prompt with its default
    pub non_interactive: Option<bool>,
}

impl KilnConfig {
    /// Returns `~/.config/kiln/` on Unix, `%APPDATA%/kiln/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kiln")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from the default path
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| KilnError::ConfigError {
            reason: format!("Failed to read config file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| KilnError::ConfigError {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| KilnError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over config file values.
    /// Unparseable values are ignored with a warning.
    pub fn with_env(mut self) -> Self {
        if let Some(secs) = env_secs("KILN_EXEC_TIMEOUT") {
            self.runtime.exec_timeout_secs = Some(secs);
        }
        if let Some(secs) = env_secs("KILN_FETCH_TIMEOUT") {
            self.runtime.fetch_timeout_secs = Some(secs);
        }

        if let Ok(value) = std::env::var("KILN_NON_INTERACTIVE") {
            if !value.is_empty() {
                self.prompts.non_interactive = Some(matches!(
                    value.to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes"
                ));
            }
        }

        self
    }

    pub fn exec_timeout(&self) -> Duration {
        self.runtime
            .exec_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(EXEC_TIMEOUT)
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.runtime
            .fetch_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(FETCH_TIMEOUT)
    }

    pub fn connect_timeout(&self) -> Duration {
        self.runtime
            .connect_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(CONNECT_TIMEOUT)
    }

    pub fn non_interactive(&self) -> bool {
        self.prompts.non_interactive.unwrap_or(false)
    }
}

fn env_secs(name: &str) -> Option<u64> {
    let value = std::env::var(name).ok().filter(|v| !v.is_empty())?;
    match value.trim().parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(_) => {
            warn!(var = name, value = %value, "Ignoring non-numeric timeout");
            None
        }
    }
}
