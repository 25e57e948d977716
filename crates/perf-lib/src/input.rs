//! Input mode selection
//!
//! Decides per calculation whether parameters come from a free-text
//! description, from the bounded manual form, or from the built-in defaults.
//! A non-empty description always wins; any manual values sent alongside it
//! are discarded.

use crate::extract::{extract_parameters, ExtractError};
use crate::models::{EngineParameters, InputMode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bounds and defaults of one manual form field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: Option<f64>,
    pub default: f64,
    pub step: f64,
    /// Whether the field only accepts whole numbers
    pub integer: bool,
}

impl FieldSpec {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && self.max.map_or(true, |max| value <= max)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        let lower = value.max(self.min);
        match self.max {
            Some(max) => lower.min(max),
            None => lower,
        }
    }
}

pub const INJECTION_TIMING: FieldSpec = FieldSpec {
    name: "injection_timing",
    label: "Injection Timing (degrees)",
    min: 0.0,
    max: Some(50.0),
    default: 27.0,
    step: 1.0,
    integer: true,
};

pub const INJECTOR_PRESSURE: FieldSpec = FieldSpec {
    name: "injector_pressure",
    label: "Injector Pressure (bar)",
    min: 100.0,
    max: Some(500.0),
    default: 270.0,
    step: 1.0,
    integer: true,
};

pub const TEMPERATURE: FieldSpec = FieldSpec {
    name: "temperature",
    label: "Ambient Temperature (°C)",
    min: 0.0,
    max: Some(50.0),
    default: 30.0,
    step: 1.0,
    integer: true,
};

pub const COOLANT_LOAD: FieldSpec = FieldSpec {
    name: "coolant_load",
    label: "Coolant Load (units)",
    min: 0.0,
    max: None,
    default: 3.0,
    step: 0.1,
    integer: false,
};

pub const EGT: FieldSpec = FieldSpec {
    name: "egt",
    label: "Exhaust Gas Temperature (°C)",
    min: 0.0,
    max: None,
    default: 190.0,
    step: 1.0,
    integer: true,
};

pub const VOLUMETRIC_EFFICIENCY: FieldSpec = FieldSpec {
    name: "volumetric_efficiency",
    label: "Volumetric Efficiency (%)",
    min: 0.0,
    max: None,
    default: 77.5,
    step: 0.1,
    integer: false,
};

/// All manual form fields in display order
pub const FIELD_SPECS: [FieldSpec; 6] = [
    INJECTION_TIMING,
    INJECTOR_PRESSURE,
    TEMPERATURE,
    COOLANT_LOAD,
    EGT,
    VOLUMETRIC_EFFICIENCY,
];

/// How out-of-range manual values are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundsPolicy {
    /// Pull the value into range
    Clamp,
    /// Refuse the whole entry
    #[default]
    Reject,
}

/// Manual form values; absent fields take their defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injection_timing: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injector_pressure: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egt: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumetric_efficiency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coolant_load: Option<f64>,
}

/// A manual value outside its field bounds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundsViolation {
    pub field: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: Option<f64>,
}

impl std::fmt::Display for BoundsViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) => write!(
                f,
                "{} = {} outside [{}, {}]",
                self.field, self.value, self.min, max
            ),
            None => write!(f, "{} = {} below minimum {}", self.field, self.value, self.min),
        }
    }
}

/// Errors produced while resolving calculation input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("manual values out of range: {}", join_violations(.0))]
    OutOfRange(Vec<BoundsViolation>),
}

fn join_violations(violations: &[BoundsViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Corrections applied while clamping a manual entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adjustments(pub Vec<BoundsViolation>);

impl ManualEntry {
    /// Build engine parameters, applying the bounds policy
    ///
    /// With [`BoundsPolicy::Clamp`] the returned adjustments list every
    /// value that was pulled into range.
    pub fn resolve(
        &self,
        policy: BoundsPolicy,
    ) -> Result<(EngineParameters, Adjustments), InputError> {
        let mut violations = Vec::new();

        let mut bounded = |spec: &FieldSpec, value: Option<f64>| -> f64 {
            let value = value.unwrap_or(spec.default);
            if !spec.contains(value) {
                violations.push(BoundsViolation {
                    field: spec.name,
                    value,
                    min: spec.min,
                    max: spec.max,
                });
            }
            spec.clamp(value)
        };

        let injection_timing = bounded(&INJECTION_TIMING, self.injection_timing.map(f64::from));
        let injector_pressure = bounded(&INJECTOR_PRESSURE, self.injector_pressure.map(f64::from));
        let temperature = bounded(&TEMPERATURE, self.temperature.map(f64::from));
        let coolant_load = bounded(&COOLANT_LOAD, self.coolant_load);
        let egt = bounded(&EGT, self.egt.map(f64::from));
        let volumetric_efficiency = bounded(&VOLUMETRIC_EFFICIENCY, self.volumetric_efficiency);

        if policy == BoundsPolicy::Reject && !violations.is_empty() {
            return Err(InputError::OutOfRange(violations));
        }

        let params = EngineParameters {
            injection_timing: injection_timing as i32,
            injector_pressure: injector_pressure as i32,
            temperature: temperature as i32,
            egt: egt as i32,
            volumetric_efficiency,
            coolant_load,
        };
        Ok((params, Adjustments(violations)))
    }
}

/// One calculation request as submitted by a form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub manual: Option<ManualEntry>,
}

/// Parameters chosen for a calculation and where they came from
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInput {
    pub mode: InputMode,
    pub parameters: EngineParameters,
    /// Manual values that were clamped into range
    pub adjustments: Adjustments,
    /// Manual values were supplied but ignored because a description was given
    pub manual_discarded: bool,
}

impl InputRequest {
    pub fn from_description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            manual: None,
        }
    }

    pub fn from_manual(manual: ManualEntry) -> Self {
        Self {
            description: None,
            manual: Some(manual),
        }
    }

    /// The description, if it carries any non-whitespace text
    fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
    }

    /// Choose the parameters for this request
    pub fn resolve(&self, policy: BoundsPolicy) -> Result<ResolvedInput, InputError> {
        if let Some(description) = self.description() {
            let parameters = extract_parameters(description)?;
            return Ok(ResolvedInput {
                mode: InputMode::Description,
                parameters,
                adjustments: Adjustments::default(),
                manual_discarded: self.manual.is_some(),
            });
        }

        if let Some(manual) = &self.manual {
            let (parameters, adjustments) = manual.resolve(policy)?;
            return Ok(ResolvedInput {
                mode: InputMode::Manual,
                parameters,
                adjustments,
                manual_discarded: false,
            });
        }

        Ok(ResolvedInput {
            mode: InputMode::Defaults,
            parameters: EngineParameters::default(),
            adjustments: Adjustments::default(),
            manual_discarded: false,
        })
    }
}
