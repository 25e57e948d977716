//! Calculation command: local models or a remote server

use anyhow::{Context, Result};
use perf_lib::{
    BoundsPolicy, EngineParameters, InputError, InputMode, InputRequest, ModelPaths, ModelSet,
    PredictionEngine, PredictionResult, Reading, StructuredLogger,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::client::ApiClient;
use crate::output::{print_calculation, print_error, print_json, print_warning, OutputFormat};

/// JSON shape shared by local and remote calculations
#[derive(Serialize)]
struct CalculationOutput<'a> {
    mode: InputMode,
    parameters: &'a EngineParameters,
    prediction: &'a PredictionResult,
    readings: Vec<Reading>,
    manual_discarded: bool,
}

fn render(
    mode: InputMode,
    parameters: &EngineParameters,
    prediction: &PredictionResult,
    manual_discarded: bool,
    format: OutputFormat,
) {
    if manual_discarded {
        print_warning("Description given; manual values were ignored");
    }
    match format {
        OutputFormat::Json => print_json(&CalculationOutput {
            mode,
            parameters,
            prediction,
            readings: prediction.readings(),
            manual_discarded,
        }),
        OutputFormat::Table => print_calculation(mode, parameters, prediction),
    }
}

/// Report input problems field by field before failing
fn report_input_error(err: &InputError) {
    match err {
        InputError::Extract(e) => {
            print_error("Could not read the engine description:");
            for field_error in &e.errors {
                print_error(&format!("  {}", field_error));
            }
        }
        InputError::OutOfRange(violations) => {
            for violation in violations {
                print_error(&violation.to_string());
            }
        }
    }
}

/// Calculate with models loaded from a local directory
///
/// Input is checked before any model is loaded. Out-of-range manual values
/// are clamped into their bounds with a warning.
pub fn calculate_local(
    model_dir: &Path,
    request: &InputRequest,
    format: OutputFormat,
) -> Result<()> {
    if let Err(e) = request.resolve(BoundsPolicy::Clamp) {
        report_input_error(&e);
        return Err(e).context("Invalid input");
    }

    let models = ModelSet::load(&ModelPaths::new(model_dir))
        .with_context(|| format!("Failed to load models from {:?}", model_dir))?;
    let engine = PredictionEngine::new(Arc::new(models), StructuredLogger::new("epc"));

    let calculation = engine
        .calculate(request, BoundsPolicy::Clamp)
        .context("Calculation failed")?;

    for adjustment in &calculation.adjustments.0 {
        print_warning(&format!("{}; clamped", adjustment));
    }

    render(
        calculation.mode,
        &calculation.parameters,
        &calculation.prediction,
        calculation.manual_discarded,
        format,
    );
    Ok(())
}

/// Calculate on a remote server
pub async fn calculate_remote(
    client: &ApiClient,
    request: &InputRequest,
    format: OutputFormat,
) -> Result<()> {
    let response = client.calculate(request).await?;
    render(
        response.mode,
        &response.parameters,
        &response.prediction,
        response.manual_discarded,
        format,
    );
    Ok(())
}
