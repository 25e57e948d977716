//! Parameter extraction from free-text engine descriptions
//!
//! Each numeric field is located by its own phrase pattern. All fields are
//! parsed independently so that a description missing several phrases is
//! reported in one pass instead of failing on the first gap.

use crate::models::{EngineParameters, DEFAULT_TEMPERATURE};
use regex::Regex;
use serde::Serialize;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Fields that can be read from a description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DescribedField {
    InjectionTiming,
    InjectorPressure,
    CoolantLoad,
    ExhaustGasTemperature,
    VolumetricEfficiency,
}

impl DescribedField {
    pub const ALL: [DescribedField; 5] = [
        DescribedField::InjectionTiming,
        DescribedField::InjectorPressure,
        DescribedField::CoolantLoad,
        DescribedField::ExhaustGasTemperature,
        DescribedField::VolumetricEfficiency,
    ];

    /// Human readable phrase the user is expected to write
    pub fn phrase(&self) -> &'static str {
        match self {
            DescribedField::InjectionTiming => "injection timing of <N> degrees",
            DescribedField::InjectorPressure => "injection pressure of <N> bar",
            DescribedField::CoolantLoad => "coolant load of <X> units",
            DescribedField::ExhaustGasTemperature => "exhaust gas temperature is <N>°C",
            DescribedField::VolumetricEfficiency => "volumetric efficiency is <X>%",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            DescribedField::InjectionTiming => r"injection timing of ([0-9]+) degrees",
            DescribedField::InjectorPressure => r"injection pressure of ([0-9]+) bar",
            DescribedField::CoolantLoad => r"coolant load of ([0-9.]+) units",
            DescribedField::ExhaustGasTemperature => r"exhaust gas temperature is ([0-9]+)°C",
            DescribedField::VolumetricEfficiency => r"volumetric efficiency is ([0-9.]+)%",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for DescribedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DescribedField::InjectionTiming => "injection timing",
            DescribedField::InjectorPressure => "injector pressure",
            DescribedField::CoolantLoad => "coolant load",
            DescribedField::ExhaustGasTemperature => "exhaust gas temperature",
            DescribedField::VolumetricEfficiency => "volumetric efficiency",
        };
        f.write_str(name)
    }
}

/// Why a single field could not be extracted
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldError {
    #[error("{field}: expected a phrase like \"{}\"", .field.phrase())]
    Missing { field: DescribedField },

    #[error("{field}: '{value}' is not a valid number")]
    Malformed { field: DescribedField, value: String },
}

impl FieldError {
    pub fn field(&self) -> DescribedField {
        match self {
            FieldError::Missing { field } | FieldError::Malformed { field, .. } => *field,
        }
    }
}

/// Extraction failed for one or more fields
#[derive(Error, Debug, Clone, PartialEq)]
#[error("could not read {} field(s) from description: {}", .errors.len(), summarize(.errors))]
pub struct ExtractError {
    pub errors: Vec<FieldError>,
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn patterns() -> &'static [Regex; 5] {
    static PATTERNS: OnceLock<[Regex; 5]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        DescribedField::ALL
            .map(|field| Regex::new(field.pattern()).expect("description pattern must compile"))
    })
}

/// Parse one field's captured text into its numeric type
fn parse_field<T: FromStr>(text: &str, field: DescribedField) -> Result<T, FieldError> {
    let captured = patterns()[field.index()]
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or(FieldError::Missing { field })?;

    captured.as_str().parse::<T>().map_err(|_| FieldError::Malformed {
        field,
        value: captured.as_str().to_string(),
    })
}

/// Extract engine parameters from a free-text description
///
/// Ambient temperature is never read from the text and is always set to
/// [`DEFAULT_TEMPERATURE`].
pub fn extract_parameters(text: &str) -> Result<EngineParameters, ExtractError> {
    let injection_timing = parse_field::<i32>(text, DescribedField::InjectionTiming);
    let injector_pressure = parse_field::<i32>(text, DescribedField::InjectorPressure);
    let coolant_load = parse_field::<f64>(text, DescribedField::CoolantLoad);
    let egt = parse_field::<i32>(text, DescribedField::ExhaustGasTemperature);
    let volumetric_efficiency = parse_field::<f64>(text, DescribedField::VolumetricEfficiency);

    match (
        injection_timing,
        injector_pressure,
        coolant_load,
        egt,
        volumetric_efficiency,
    ) {
        (
            Ok(injection_timing),
            Ok(injector_pressure),
            Ok(coolant_load),
            Ok(egt),
            Ok(volumetric_efficiency),
        ) => {
            Ok(EngineParameters {
                injection_timing,
                injector_pressure,
                temperature: DEFAULT_TEMPERATURE,
                egt,
                volumetric_efficiency,
                coolant_load,
            })
        }
        (a, b, c, d, e) => {
            let errors = [a.err(), b.err(), c.err(), d.err(), e.err()]
                .into_iter()
                .flatten()
                .collect();
            Err(ExtractError { errors })
        }
    }
}
