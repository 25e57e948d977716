//! Engine performance calculator service
//!
//! Loads the three performance models once at startup and serves
//! calculations to the form over HTTP.

use anyhow::{Context, Result};
use perf_lib::{
    health::{components, HealthRegistry},
    observability::StructuredLogger,
    ModelPaths, ModelSet, PredictionEngine,
};
use perf_server::{api, config::ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting perf-server");

    let config = ServerConfig::load()?;
    info!(model_dir = %config.model_dir.display(), "Server configured");

    let health_registry = HealthRegistry::new();
    health_registry.register(components::API).await;

    let logger = StructuredLogger::new(&config.instance_name);

    // Models are loaded once; a failure here is fatal for the process
    let models = match ModelSet::load(&ModelPaths::new(&config.model_dir)) {
        Ok(models) => models,
        Err(e) => {
            error!(error = %e, "Failed to load model artifacts");
            return Err(e).context("Failed to load model artifacts");
        }
    };
    let description = models.describe();
    health_registry.set_models_loaded(description.clone()).await;
    logger.log_startup(SERVER_VERSION, &description);

    let engine = PredictionEngine::new(Arc::new(models), logger.clone())
        .with_slow_inference_threshold(Duration::from_millis(config.slow_inference_ms));

    let app_state = Arc::new(api::AppState::new(engine, health_registry));
    let addr = config.listen_addr();

    tokio::select! {
        result = api::serve(&addr, app_state) => {
            result.context("API server stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
