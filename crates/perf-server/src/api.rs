//! HTTP API: calculator form backend, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use perf_lib::{
    health::{components, HealthRegistry},
    input::FieldSpec,
    BoundsPolicy, CalculateError, EngineParameters, InputError, InputRequest, PredictionEngine,
    FIELD_SPECS,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: PredictionEngine,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(engine: PredictionEngine, health_registry: HealthRegistry) -> Self {
        Self {
            engine,
            health_registry,
        }
    }
}

/// Error body returned to the form
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<serde_json::Value>,
}

/// Maps request and calculation failures to HTTP responses
pub enum ApiError {
    /// Body was not a well-typed calculation request
    Request(JsonRejection),
    Calculate(CalculateError),
}

impl From<CalculateError> for ApiError {
    fn from(err: CalculateError) -> Self {
        Self::Calculate(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Request(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Request(rejection) => {
                let body = ErrorResponse {
                    error: rejection.body_text(),
                    code: "invalid_request",
                    fields: Vec::new(),
                };
                return (rejection.status(), Json(body)).into_response();
            }
            ApiError::Calculate(err) => err,
        };

        let message = err.to_string();
        let (status, code, fields) = match &err {
            CalculateError::Input(InputError::Extract(e)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_description",
                e.errors.iter().map(to_value).collect(),
            ),
            CalculateError::Input(InputError::OutOfRange(violations)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "out_of_range",
                violations.iter().map(to_value).collect(),
            ),
            CalculateError::Predict(_) => {
                error!(error = %message, "Prediction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "prediction_failed",
                    Vec::new(),
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            code,
            fields,
        };
        (status, Json(body)).into_response()
    }
}

fn to_value<T: Serialize>(item: &T) -> serde_json::Value {
    serde_json::to_value(item).unwrap_or(serde_json::Value::Null)
}

/// Run one calculation from the form
///
/// The models component turns degraded after a slow or failed inference and
/// healthy again after the next normal one.
async fn calculate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InputRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let health = &state.health_registry;

    match state.engine.calculate(&request, BoundsPolicy::Reject) {
        Ok(calculation) => {
            if calculation.slow_inference {
                health
                    .set_degraded(components::MODELS, "Inference exceeded latency target")
                    .await;
            } else {
                health.register(components::MODELS).await;
            }
            Ok(Json(calculation))
        }
        Err(CalculateError::Predict(e)) => {
            health
                .set_degraded(components::MODELS, format!("Last prediction failed: {}", e))
                .await;
            Err(CalculateError::Predict(e).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Manual form field bounds, defaults and steps
async fn fields() -> Json<&'static [FieldSpec]> {
    Json(&FIELD_SPECS[..])
}

async fn defaults() -> Json<EngineParameters> {
    Json(EngineParameters::default())
}

/// Liveness: a running process is alive; degraded models are reported in the body
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.health_registry.health().await)
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/calculate", post(calculate))
        .route("/api/v1/fields", get(fields))
        .route("/api/v1/defaults", get(defaults))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
