//! Feature assembly for ML inference
//!
//! Packs engine parameters into the fixed slot order the performance models
//! were trained with.

use crate::models::{EngineParameters, FeatureVector, NUM_FEATURES};

/// Build the model input vector from engine parameters
pub fn assemble(params: &EngineParameters) -> FeatureVector {
    FeatureVector([
        params.injection_timing as f64,
        params.injector_pressure as f64,
        params.temperature as f64,
        params.egt as f64,
        params.volumetric_efficiency,
        params.coolant_load,
    ])
}

impl From<&EngineParameters> for FeatureVector {
    fn from(params: &EngineParameters) -> Self {
        assemble(params)
    }
}
