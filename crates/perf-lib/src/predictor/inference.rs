//! ONNX inference using tract
//!
//! Runs a regressor exported to ONNX (e.g. from scikit-learn via skl2onnx)
//! on a single `[1, 6]` f32 input row.

use super::Predictor;
use crate::models::{FeatureVector, NUM_FEATURES};
use anyhow::{Context, Result};
use tract_onnx::prelude::*;
use tracing::debug;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based regressor using tract for lightweight inference
pub struct OnnxPredictor {
    model: TractModel,
}

impl OnnxPredictor {
    /// Create a new predictor from model bytes
    pub fn new(model_bytes: &[u8]) -> Result<Self> {
        let model = Self::load_model(model_bytes)?;
        Ok(Self { model })
    }

    /// Load and optimize an ONNX model from bytes
    ///
    /// The input fact is pinned to `[1, NUM_FEATURES]`, so a model trained on
    /// a different feature count is rejected here rather than at inference.
    fn load_model(model_bytes: &[u8]) -> Result<TractModel> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    /// Convert feature vector to tensor input
    fn features_to_tensor(features: &FeatureVector) -> Result<Tensor> {
        Tensor::from_shape(&[1, NUM_FEATURES], &features.to_f32()[..])
            .context("Failed to build input tensor")
    }
}

impl Predictor for OnnxPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let input = Self::features_to_tensor(features)?;

        let result = self.model.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;

        // Regressors may emit float or double; take the first row either way
        let values = output
            .cast_to::<f32>()
            .context("Model output is not numeric")?;
        let value = values
            .as_slice::<f32>()?
            .first()
            .copied()
            .context("Model output is empty")?;

        debug!(value, "ONNX inference completed");

        Ok(value as f64)
    }

    fn kind(&self) -> &str {
        "onnx"
    }
}
