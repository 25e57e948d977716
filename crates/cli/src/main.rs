//! Engine Performance Calculator CLI
//!
//! Estimates brake thermal efficiency, brake mean effective pressure and
//! brake power from an engine description or manual values, using local
//! model artifacts or a remote calculator server.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{calculate, fields, parse};
use perf_lib::{InputRequest, ManualEntry, DEFAULT_MODEL_DIR};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Engine Performance Calculator CLI
#[derive(Parser)]
#[command(name = "epc")]
#[command(author, version, about = "CLI for the Engine Performance Calculator", long_about = None)]
pub struct Cli {
    /// Calculator server URL; calculations run locally when unset
    #[arg(long, env = "EPC_API_URL")]
    pub api_url: Option<String>,

    /// Directory holding the model artifacts for local calculations
    #[arg(long, env = "EPC_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict engine performance
    Calculate(CalculateArgs),

    /// Extract engine parameters from a description without predicting
    Parse {
        /// Engine description text
        text: String,
    },

    /// Show the manual entry fields with their bounds and defaults
    Fields,
}

#[derive(Args)]
pub struct CalculateArgs {
    /// Engine description; takes precedence over manual values
    #[arg(long, short)]
    pub description: Option<String>,

    /// Use manual values (unset fields take their defaults)
    #[arg(long)]
    pub manual: bool,

    /// Injection timing in degrees
    #[arg(long, requires = "manual", allow_negative_numbers = true)]
    pub injection_timing: Option<i32>,

    /// Injector pressure in bar
    #[arg(long, requires = "manual", allow_negative_numbers = true)]
    pub injector_pressure: Option<i32>,

    /// Ambient temperature in °C
    #[arg(long, requires = "manual", allow_negative_numbers = true)]
    pub temperature: Option<i32>,

    /// Exhaust gas temperature in °C
    #[arg(long, requires = "manual", allow_negative_numbers = true)]
    pub egt: Option<i32>,

    /// Volumetric efficiency in percent
    #[arg(long, requires = "manual", allow_negative_numbers = true)]
    pub ve: Option<f64>,

    /// Coolant load
    #[arg(long, requires = "manual", allow_negative_numbers = true)]
    pub coolant_load: Option<f64>,
}

impl CalculateArgs {
    fn into_request(self) -> InputRequest {
        let manual = self.manual.then(|| ManualEntry {
            injection_timing: self.injection_timing,
            injector_pressure: self.injector_pressure,
            temperature: self.temperature,
            egt: self.egt,
            volumetric_efficiency: self.ve,
            coolant_load: self.coolant_load,
        });
        InputRequest {
            description: self.description,
            manual,
        }
    }
}

fn init_logging(verbose: bool) {
    if !verbose {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = config::Config::load()?;
    let format = cli.format.or_else(|| settings.format()).unwrap_or_default();

    match cli.command {
        Commands::Calculate(args) => {
            let request = args.into_request();
            match cli.api_url.or(settings.api_url) {
                Some(api_url) => {
                    let client = client::ApiClient::new(&api_url)?;
                    calculate::calculate_remote(&client, &request, format).await?;
                }
                None => {
                    let model_dir = cli
                        .model_dir
                        .or(settings.model_dir)
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR));
                    calculate::calculate_local(&model_dir, &request, format)?;
                }
            }
        }
        Commands::Parse { text } => {
            parse::parse_description(&text, format)?;
        }
        Commands::Fields => {
            fields::show_fields(format);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_manual_flags_build_entry() {
        let cli = Cli::try_parse_from([
            "epc",
            "calculate",
            "--manual",
            "--injection-timing",
            "-5",
            "--ve",
            "80",
        ])
        .unwrap();
        let Commands::Calculate(args) = cli.command else {
            panic!("expected calculate");
        };
        let request = args.into_request();
        let manual = request.manual.unwrap();
        assert_eq!(manual.injection_timing, Some(-5));
        assert_eq!(manual.volumetric_efficiency, Some(80.0));
        assert_eq!(manual.egt, None);
        assert!(request.description.is_none());
    }

    #[test]
    fn test_manual_field_requires_manual_flag() {
        let result = Cli::try_parse_from(["epc", "calculate", "--egt", "200"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_input_means_defaults() {
        let cli = Cli::try_parse_from(["epc", "calculate"]).unwrap();
        let Commands::Calculate(args) = cli.command else {
            panic!("expected calculate");
        };
        assert_eq!(args.into_request(), InputRequest::default());
    }
}
