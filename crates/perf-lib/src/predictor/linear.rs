//! Linear regressor loaded from JSON coefficients
//!
//! Artifact format:
//!
//! ```json
//! { "intercept": 12.4, "coefficients": [0.1, 0.02, -0.05, 0.01, 0.2, 1.3] }
//! ```
//!
//! Coefficients follow the feature slot order.

use super::Predictor;
use crate::models::{FeatureVector, NUM_FEATURES};
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LinearArtifact {
    intercept: f64,
    coefficients: Vec<f64>,
}

/// Ordinary linear regressor: `intercept + Σ coefficient_i * feature_i`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearPredictor {
    intercept: f64,
    coefficients: [f64; NUM_FEATURES],
}

impl LinearPredictor {
    pub fn new(intercept: f64, coefficients: [f64; NUM_FEATURES]) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }

    /// Predictor that ignores its input and always returns `value`
    pub fn constant(value: f64) -> Self {
        Self::new(value, [0.0; NUM_FEATURES])
    }

    /// Parse a JSON artifact
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let artifact: LinearArtifact =
            serde_json::from_slice(bytes).context("Failed to parse linear model JSON")?;
        ensure!(
            artifact.coefficients.len() == NUM_FEATURES,
            "expected {} coefficients, found {}",
            NUM_FEATURES,
            artifact.coefficients.len()
        );
        let mut coefficients = [0.0; NUM_FEATURES];
        coefficients.copy_from_slice(&artifact.coefficients);
        Ok(Self::new(artifact.intercept, coefficients))
    }

    pub fn to_json(&self) -> Result<String> {
        let artifact = LinearArtifact {
            intercept: self.intercept,
            coefficients: self.coefficients.to_vec(),
        };
        Ok(serde_json::to_string_pretty(&artifact)?)
    }
}

impl Predictor for LinearPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features.as_slice())
            .map(|(c, x)| c * x)
            .sum();
        Ok(self.intercept + dot)
    }

    fn kind(&self) -> &str {
        "linear"
    }
}
