//! Prediction output formatting
//!
//! Turns a [`PredictionResult`] into labeled readings with units, rounded to
//! two decimal places for display.

use super::Metric;
use crate::models::PredictionResult;
use serde::Serialize;

/// One labeled metric ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub metric: Metric,
    pub label: &'static str,
    pub value: f64,
    pub unit: &'static str,
    /// Value with two decimals and unit, e.g. `"31.42 %"`
    pub display: String,
}

impl Reading {
    pub fn new(metric: Metric, value: f64) -> Self {
        Self {
            metric,
            label: metric.label(),
            value,
            unit: metric.unit(),
            display: format_value(value, metric.unit()),
        }
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label, self.display)
    }
}

/// Format a value with two decimals followed by its unit
pub fn format_value(value: f64, unit: &str) -> String {
    format!("{:.2} {}", value, unit)
}

impl PredictionResult {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Bte => self.bte,
            Metric::Bmep => self.bmep,
            Metric::BrakePower => self.brake_power,
        }
    }

    /// Readings in display order: BTE, BMEP, brake power
    pub fn readings(&self) -> Vec<Reading> {
        Metric::ALL
            .iter()
            .map(|m| Reading::new(*m, self.value(*m)))
            .collect()
    }
}
