//! Configuration management for the CLI

use crate::output::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI configuration, read from `~/.config/epc/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Calculator server URL; calculations run remotely when set
    pub api_url: Option<String>,
    /// Directory holding the model artifacts for local calculations
    pub model_dir: Option<PathBuf>,
    /// Default output format ("table" or "json")
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from file; a missing file yields the defaults
    pub fn load() -> Result<Self> {
        let config_path = match Self::config_path() {
            Some(path) => path,
            None => return Ok(Self::default()),
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {:?}", config_path))?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("epc").join("config.json"))
    }

    pub fn format(&self) -> Option<OutputFormat> {
        match self.default_format.as_deref() {
            Some("json") => Some(OutputFormat::Json),
            Some("table") => Some(OutputFormat::Table),
            _ => None,
        }
    }
}
