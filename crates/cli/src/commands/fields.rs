//! Fields command: manual entry bounds

use perf_lib::FIELD_SPECS;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_table, OutputFormat};

/// Row for the manual fields table
#[derive(Tabled, Serialize)]
struct FieldRow {
    #[tabled(rename = "Field")]
    label: &'static str,
    #[tabled(rename = "Flag")]
    flag: String,
    #[tabled(rename = "Min")]
    min: f64,
    #[tabled(rename = "Max")]
    max: String,
    #[tabled(rename = "Default")]
    default: f64,
    #[tabled(rename = "Step")]
    step: f64,
}

pub fn show_fields(format: OutputFormat) {
    let rows: Vec<FieldRow> = FIELD_SPECS
        .iter()
        .map(|spec| FieldRow {
            label: spec.label,
            flag: format!("--{}", flag_name(spec.name)),
            min: spec.min,
            max: spec.max.map_or_else(|| "none".to_string(), |m| m.to_string()),
            default: spec.default,
            step: spec.step,
        })
        .collect();
    print_table(&rows, format);
}

/// Command-line flag for a field name
fn flag_name(name: &str) -> String {
    match name {
        "volumetric_efficiency" => "ve".to_string(),
        other => other.replace('_', "-"),
    }
}
