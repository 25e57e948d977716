//! Observability infrastructure for the calculator
//!
//! Provides:
//! - Prometheus metrics (inference latency, calculations per input mode,
//!   rejected inputs, prediction errors, loaded model variants)
//! - Structured logging with tracing

use crate::models::{EngineParameters, InputMode, PredictionResult};
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<CalculatorMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct CalculatorMetricsInner {
    prediction_latency_seconds: Histogram,
    calculations: IntCounterVec,
    input_rejections: IntCounterVec,
    prediction_errors: IntCounter,
    model_info: GaugeVec,
}

impl CalculatorMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "engine_calculator_prediction_latency_seconds",
                "Time spent running the three performance models",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            calculations: register_int_counter_vec!(
                "engine_calculator_calculations_total",
                "Completed calculations by input mode",
                &["mode"]
            )
            .expect("Failed to register calculations_total"),

            input_rejections: register_int_counter_vec!(
                "engine_calculator_input_rejections_total",
                "Calculation requests rejected before inference",
                &["reason"]
            )
            .expect("Failed to register input_rejections_total"),

            prediction_errors: register_int_counter!(
                "engine_calculator_prediction_errors_total",
                "Total number of failed model invocations"
            )
            .expect("Failed to register prediction_errors_total"),

            model_info: register_gauge_vec!(
                "engine_calculator_model_info",
                "Model variant loaded for each metric",
                &["models"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Calculator metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct CalculatorMetrics {
    _private: (),
}

impl Default for CalculatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CalculatorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(CalculatorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &CalculatorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_calculations(&self, mode: &str) {
        self.inner().calculations.with_label_values(&[mode]).inc();
    }

    pub fn inc_input_rejected(&self, reason: &str) {
        self.inner().input_rejections.with_label_values(&[reason]).inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    /// Record which model variants are loaded
    pub fn set_models(&self, description: &str) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[description])
            .set(1.0);
    }

    pub fn calculations(&self, mode: &str) -> u64 {
        self.inner().calculations.with_label_values(&[mode]).get()
    }
}

/// Structured logger for calculator events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, models: &str) {
        info!(
            event = "calculator_started",
            instance = %self.instance,
            version = %version,
            models = %models,
            "Engine performance calculator started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "calculator_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Engine performance calculator shutting down"
        );
    }

    pub fn log_calculation(
        &self,
        mode: InputMode,
        params: &EngineParameters,
        result: &PredictionResult,
    ) {
        info!(
            event = "calculation_completed",
            instance = %self.instance,
            mode = %mode,
            injection_timing = params.injection_timing,
            injector_pressure = params.injector_pressure,
            temperature = params.temperature,
            egt = params.egt,
            volumetric_efficiency = params.volumetric_efficiency,
            coolant_load = params.coolant_load,
            bte = result.bte,
            bmep = result.bmep,
            brake_power = result.brake_power,
            "Calculated engine performance"
        );
    }

    pub fn log_input_rejected(&self, reason: &str) {
        warn!(
            event = "input_rejected",
            instance = %self.instance,
            reason = %reason,
            "Calculation input rejected"
        );
    }

    pub fn log_manual_discarded(&self) {
        info!(
            event = "manual_input_discarded",
            instance = %self.instance,
            "Description given, manual values ignored"
        );
    }

    pub fn log_value_clamped(&self, field: &str, value: f64) {
        warn!(
            event = "manual_value_clamped",
            instance = %self.instance,
            field = %field,
            value = value,
            "Manual value outside bounds, clamped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculator_metrics_creation() {
        let metrics = CalculatorMetrics::new();

        metrics.observe_prediction_latency(0.001);
        metrics.inc_input_rejected("extract");
        metrics.inc_prediction_errors();
        metrics.set_models("bte=linear,bmep=linear,brake_power=linear");

        let before = metrics.calculations("manual");
        metrics.inc_calculations("manual");
        assert!(metrics.calculations("manual") > before);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");
    }
}
