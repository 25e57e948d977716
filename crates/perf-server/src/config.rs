//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name reported in structured logs
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Address the form API binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port for the form API, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding bte_model, bmep_model and brake_power_model
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Inference latency that triggers a warning, in milliseconds
    #[serde(default = "default_slow_inference_ms")]
    pub slow_inference_ms: u64,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "engine-calculator".to_string())
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_model_dir() -> PathBuf {
    PathBuf::from(perf_lib::predictor::DEFAULT_MODEL_DIR)
}

fn default_slow_inference_ms() -> u64 {
    perf_lib::predictor::DEFAULT_SLOW_INFERENCE_MS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            bind_address: default_bind_address(),
            api_port: default_api_port(),
            model_dir: default_model_dir(),
            slow_inference_ms: default_slow_inference_ms(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `calculator.toml` (optional) and `CALC_*`
    /// environment variables
    pub fn load() -> Result<Self> {
        Self::load_from("calculator")
    }

    pub fn load_from(file: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(config::Environment::with_prefix("CALC"))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid calculator configuration")
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.api_port)
    }
}
