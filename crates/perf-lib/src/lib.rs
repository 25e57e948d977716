//! Engine performance calculator library
//!
//! This crate provides the core functionality for:
//! - Reading engine parameters from free-text descriptions
//! - Bounded manual entry and input mode selection
//! - Loading the BTE, BMEP and brake power models
//! - Running the three models on one operating point
//! - Health checks and observability

pub mod extract;
pub mod health;
pub mod input;
pub mod models;
pub mod observability;
pub mod predictor;

pub use extract::{extract_parameters, DescribedField, ExtractError, FieldError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use input::{BoundsPolicy, InputError, InputRequest, ManualEntry, ResolvedInput, FIELD_SPECS};
pub use models::*;
pub use observability::{CalculatorMetrics, StructuredLogger};
pub use predictor::{
    CalculateError, Calculation, Metric, ModelLoadError, ModelPaths, ModelSet, PredictError,
    PredictionEngine, Predictor, Reading, DEFAULT_MODEL_DIR,
};
