//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use perf_lib::{EngineParameters, InputMode, Metric, PredictionResult};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(&items),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string_pretty(value) {
        println!("{}", json);
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Row for the engine parameters table
#[derive(Tabled, Serialize)]
pub struct ParameterRow {
    #[tabled(rename = "Parameter")]
    pub name: &'static str,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub fn parameter_rows(params: &EngineParameters) -> Vec<ParameterRow> {
    vec![
        ParameterRow {
            name: "Injection Timing (degrees)",
            value: params.injection_timing.to_string(),
        },
        ParameterRow {
            name: "Injector Pressure (bar)",
            value: params.injector_pressure.to_string(),
        },
        ParameterRow {
            name: "Ambient Temperature (°C)",
            value: params.temperature.to_string(),
        },
        ParameterRow {
            name: "Exhaust Gas Temperature (°C)",
            value: params.egt.to_string(),
        },
        ParameterRow {
            name: "Volumetric Efficiency (%)",
            value: params.volumetric_efficiency.to_string(),
        },
        ParameterRow {
            name: "Coolant Load (units)",
            value: params.coolant_load.to_string(),
        },
    ]
}

/// Print parameters and the three readings
pub fn print_calculation(
    mode: InputMode,
    params: &EngineParameters,
    prediction: &PredictionResult,
) {
    println!("{} ({})", "Engine Parameters".bold(), mode.to_string().cyan());
    print_table(&parameter_rows(params), OutputFormat::Table);
    println!();

    println!("{}", "📊 Results".bold());
    for reading in prediction.readings() {
        let line = format!("{}: {}", reading.label.bold(), reading.display);
        match reading.metric {
            Metric::Bmep => print_info(&line),
            Metric::Bte | Metric::BrakePower => print_success(&line),
        }
    }
}
