//! Core data models for the engine performance calculator

use serde::{Deserialize, Serialize};

/// Ambient temperature used whenever the value is not supplied (°C)
pub const DEFAULT_TEMPERATURE: i32 = 30;

/// Number of features every model is trained on
pub const NUM_FEATURES: usize = 6;

/// Engine operating point fed to the performance models
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineParameters {
    /// Injection timing, degrees before TDC
    pub injection_timing: i32,
    /// Injector pressure, bar
    pub injector_pressure: i32,
    /// Ambient temperature, °C
    pub temperature: i32,
    /// Exhaust gas temperature, °C
    pub egt: i32,
    /// Volumetric efficiency, percent
    pub volumetric_efficiency: f64,
    /// Coolant load, units
    pub coolant_load: f64,
}

impl Default for EngineParameters {
    fn default() -> Self {
        Self {
            injection_timing: 27,
            injector_pressure: 270,
            temperature: DEFAULT_TEMPERATURE,
            egt: 190,
            volumetric_efficiency: 77.5,
            coolant_load: 3.0,
        }
    }
}

/// Ordered feature vector for ML inference
///
/// Slot order is `[injection timing, injector pressure, temperature, EGT, VE,
/// coolant load]` and must match the order the models were trained with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; NUM_FEATURES]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Single-precision copy for tensor inputs
    pub fn to_f32(&self) -> [f32; NUM_FEATURES] {
        self.0.map(|v| v as f32)
    }
}

/// Which source produced the parameters of a calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    Description,
    Manual,
    Defaults,
}

impl InputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Description => "description",
            InputMode::Manual => "manual",
            InputMode::Defaults => "defaults",
        }
    }
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicted performance metrics for one operating point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Brake thermal efficiency, percent
    pub bte: f64,
    /// Brake mean effective pressure, bar
    pub bmep: f64,
    /// Brake power, kW
    pub brake_power: f64,
    pub generated_at: i64,
}
