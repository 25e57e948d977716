//! ML prediction engine

mod engine;
mod features;
mod inference;
mod linear;
mod loader;
mod output;

pub use engine::{CalculateError, Calculation, PredictionEngine, DEFAULT_SLOW_INFERENCE_MS};
pub use features::assemble;
pub use inference::OnnxPredictor;
pub use linear::LinearPredictor;
pub use loader::{
    compute_checksum, load_artifact, ModelPaths, ModelSet, CHECKSUM_EXTENSION, DEFAULT_MODEL_DIR,
};
pub use output::{format_value, Reading};

use crate::models::FeatureVector;
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Trait for prediction implementations
///
/// One implementation per loaded artifact; each returns the single scalar it
/// was trained to predict.
pub trait Predictor: Send + Sync {
    /// Predict the target value for one feature vector
    fn predict(&self, features: &FeatureVector) -> Result<f64>;

    /// Short name of the model variant (e.g. "onnx", "linear")
    fn kind(&self) -> &str;
}

/// The three performance metrics the calculator predicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Bte,
    Bmep,
    BrakePower,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Bte, Metric::Bmep, Metric::BrakePower];

    /// File stem of the model artifact for this metric
    pub fn artifact_stem(&self) -> &'static str {
        match self {
            Metric::Bte => "bte_model",
            Metric::Bmep => "bmep_model",
            Metric::BrakePower => "brake_power_model",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Bte => "Brake Thermal Efficiency (BTE)",
            Metric::Bmep => "Brake Mean Effective Pressure (BMEP)",
            Metric::BrakePower => "Brake Power",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Bte => "%",
            Metric::Bmep => "bar",
            Metric::BrakePower => "kW",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.artifact_stem().trim_end_matches("_model"))
    }
}

/// Errors raised while loading model artifacts at startup
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error(
        "no model artifact for {metric} in {dir:?} (expected {}.onnx or {}.json)",
        .metric.artifact_stem(),
        .metric.artifact_stem()
    )]
    NotFound { metric: Metric, dir: PathBuf },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checksum mismatch for {path:?}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("invalid ONNX model {path:?}: {message}")]
    Onnx { path: PathBuf, message: String },

    #[error("invalid linear model {path:?}: {message}")]
    Linear { path: PathBuf, message: String },

    #[error("unsupported model format {path:?}")]
    UnsupportedFormat { path: PathBuf },
}

/// Errors raised while running the models for one calculation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("{metric} model failed: {message}")]
    Model { metric: Metric, message: String },

    #[error("{metric} model produced a non-finite value ({value})")]
    NonFinite { metric: Metric, value: f64 },
}
