//! Prediction orchestration
//!
//! Runs the three performance models on the same feature vector and ties
//! input resolution, feature assembly and inference together for one
//! calculation.

use super::features::assemble;
use super::{Metric, ModelSet, PredictError, Reading};
use crate::input::{Adjustments, BoundsPolicy, InputError, InputRequest};
use crate::models::{EngineParameters, FeatureVector, InputMode, PredictionResult};
use crate::observability::{CalculatorMetrics, StructuredLogger};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Inference latency above which a warning is logged
pub const DEFAULT_SLOW_INFERENCE_MS: u64 = 50;

/// Errors from a full calculation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculateError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Predict(#[from] PredictError),
}

/// Outcome of one calculation
#[derive(Debug, Clone, Serialize)]
pub struct Calculation {
    pub mode: InputMode,
    pub parameters: EngineParameters,
    pub features: FeatureVector,
    pub prediction: PredictionResult,
    pub readings: Vec<Reading>,
    #[serde(skip)]
    pub adjustments: Adjustments,
    pub manual_discarded: bool,
    /// Inference took longer than the engine's slow-inference threshold
    #[serde(skip)]
    pub slow_inference: bool,
}

/// Runs the loaded models; cheap to clone and safe to share across requests
#[derive(Clone)]
pub struct PredictionEngine {
    models: Arc<ModelSet>,
    metrics: CalculatorMetrics,
    logger: StructuredLogger,
    slow_inference: Duration,
}

impl PredictionEngine {
    pub fn new(models: Arc<ModelSet>, logger: StructuredLogger) -> Self {
        let metrics = CalculatorMetrics::new();
        metrics.set_models(&models.describe());
        Self {
            models,
            metrics,
            logger,
            slow_inference: Duration::from_millis(DEFAULT_SLOW_INFERENCE_MS),
        }
    }

    pub fn with_slow_inference_threshold(mut self, threshold: Duration) -> Self {
        self.slow_inference = threshold;
        self
    }

    fn run(&self, metric: Metric, features: &FeatureVector) -> Result<f64, PredictError> {
        let value = self
            .models
            .get(metric)
            .predict(features)
            .map_err(|e| PredictError::Model {
                metric,
                message: format!("{:#}", e),
            })?;

        if !value.is_finite() {
            return Err(PredictError::NonFinite { metric, value });
        }
        Ok(value)
    }

    /// Run all three models on one feature vector
    ///
    /// Models are called sequentially and independently; the first failure
    /// aborts the calculation.
    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult, PredictError> {
        self.predict_timed(features).0
    }

    /// Predict and report whether inference exceeded the slow threshold
    fn predict_timed(
        &self,
        features: &FeatureVector,
    ) -> (Result<PredictionResult, PredictError>, bool) {
        let start = Instant::now();

        let outcome = (|| -> Result<PredictionResult, PredictError> {
            Ok(PredictionResult {
                bte: self.run(Metric::Bte, features)?,
                bmep: self.run(Metric::Bmep, features)?,
                brake_power: self.run(Metric::BrakePower, features)?,
                generated_at: chrono::Utc::now().timestamp(),
            })
        })();

        let elapsed = start.elapsed();
        self.metrics.observe_prediction_latency(elapsed.as_secs_f64());

        let slow = elapsed > self.slow_inference;
        if slow {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.slow_inference.as_millis() as u64,
                "Inference exceeded latency target"
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros() as u64, "Inference completed");
        }

        if outcome.is_err() {
            self.metrics.inc_prediction_errors();
        }
        (outcome, slow)
    }

    /// Resolve input, assemble features and predict
    pub fn calculate(
        &self,
        request: &InputRequest,
        policy: BoundsPolicy,
    ) -> Result<Calculation, CalculateError> {
        let resolved = match request.resolve(policy) {
            Ok(resolved) => resolved,
            Err(e) => {
                self.metrics.inc_input_rejected(match &e {
                    InputError::Extract(_) => "extract",
                    InputError::OutOfRange(_) => "out_of_range",
                });
                self.logger.log_input_rejected(&e.to_string());
                return Err(e.into());
            }
        };

        if resolved.manual_discarded {
            self.logger.log_manual_discarded();
        }
        for adjustment in &resolved.adjustments.0 {
            self.logger.log_value_clamped(adjustment.field, adjustment.value);
        }

        let features = assemble(&resolved.parameters);
        let (outcome, slow_inference) = self.predict_timed(&features);
        let prediction = outcome?;

        self.metrics.inc_calculations(resolved.mode.as_str());
        self.logger
            .log_calculation(resolved.mode, &resolved.parameters, &prediction);

        Ok(Calculation {
            mode: resolved.mode,
            parameters: resolved.parameters,
            features,
            readings: prediction.readings(),
            prediction,
            adjustments: resolved.adjustments,
            manual_discarded: resolved.manual_discarded,
            slow_inference,
        })
    }
}
