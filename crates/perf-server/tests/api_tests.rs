//! Integration tests for the calculator API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use perf_lib::{
    health::{components, HealthRegistry},
    observability::StructuredLogger,
    predictor::LinearPredictor,
    FeatureVector, ModelSet, PredictionEngine, Predictor,
};
use perf_server::api::{create_router, AppState};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const DESCRIPTION: &str = "I have an LHR engine with an injection timing of 28 degrees before \
    TDC (Top Dead Center), an injection pressure of 230 bar, and a coolant load of 3.2 units. \
    The exhaust gas temperature is 350°C, and the volumetric efficiency is 80%.";

fn test_models() -> ModelSet {
    // BTE echoes injection timing, BMEP echoes injector pressure, brake power
    // echoes coolant load; that makes the chosen parameters visible in output
    ModelSet::new(
        Box::new(LinearPredictor::new(0.0, [1.0, 0.0, 0.0, 0.0, 0.0, 0.0])),
        Box::new(LinearPredictor::new(0.0, [0.0, 1.0, 0.0, 0.0, 0.0, 0.0])),
        Box::new(LinearPredictor::new(0.0, [0.0, 0.0, 0.0, 0.0, 0.0, 1.0])),
    )
}

/// Model that sleeps, then answers with a fixed value
struct SlowPredictor {
    delay: Duration,
    value: f64,
}

impl Predictor for SlowPredictor {
    fn predict(&self, _features: &FeatureVector) -> anyhow::Result<f64> {
        std::thread::sleep(self.delay);
        Ok(self.value)
    }

    fn kind(&self) -> &str {
        "slow"
    }
}

fn app_with(models: ModelSet, health_registry: HealthRegistry) -> (Router, Arc<AppState>) {
    let engine = PredictionEngine::new(Arc::new(models), StructuredLogger::new("test"))
        .with_slow_inference_threshold(Duration::from_millis(2));
    let state = Arc::new(AppState::new(engine, health_registry));
    (create_router(state.clone()), state)
}

async fn setup_test_app(models_loaded: bool) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::API).await;
    let models = test_models();
    if models_loaded {
        health_registry.set_models_loaded(models.describe()).await;
    }

    let engine = PredictionEngine::new(Arc::new(models), StructuredLogger::new("test"));
    let state = Arc::new(AppState::new(engine, health_registry));
    let router = create_router(state.clone());

    (router, state)
}

async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_calculate_with_description() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = post_json(
        app,
        "/api/v1/calculate",
        serde_json::json!({ "description": DESCRIPTION }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "description");
    assert_eq!(body["parameters"]["injection_timing"], 28);
    assert_eq!(body["parameters"]["temperature"], 30);
    assert_eq!(body["prediction"]["bte"], 28.0);
    assert_eq!(body["prediction"]["bmep"], 230.0);
    assert_eq!(body["readings"][2]["display"], "3.20 kW");
}

#[tokio::test]
async fn test_calculate_description_overrides_manual() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = post_json(
        app,
        "/api/v1/calculate",
        serde_json::json!({
            "description": DESCRIPTION,
            "manual": { "injection_timing": 12 }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "description");
    assert_eq!(body["manual_discarded"], true);
    assert_eq!(body["parameters"]["injection_timing"], 28);
}

#[tokio::test]
async fn test_calculate_with_manual_values() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = post_json(
        app,
        "/api/v1/calculate",
        serde_json::json!({ "manual": { "injection_timing": 35, "coolant_load": 4.5 } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "manual");
    assert_eq!(body["parameters"]["injector_pressure"], 270);
    assert_eq!(body["prediction"]["bte"], 35.0);
    assert_eq!(body["prediction"]["brake_power"], 4.5);
}

#[tokio::test]
async fn test_calculate_without_input_uses_defaults() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = post_json(app, "/api/v1/calculate", serde_json::json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "defaults");
    assert_eq!(
        body["features"],
        serde_json::json!([27.0, 270.0, 30.0, 190.0, 77.5, 3.0])
    );
}

#[tokio::test]
async fn test_incomplete_description_lists_missing_fields() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = post_json(
        app,
        "/api/v1/calculate",
        serde_json::json!({ "description": "an injection timing of 28 degrees" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "invalid_description");
    let fields = body["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 4);
    assert_eq!(fields[0]["field"], "injector_pressure");
    assert_eq!(fields[0]["kind"], "missing");
}

#[tokio::test]
async fn test_out_of_range_manual_rejected() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = post_json(
        app,
        "/api/v1/calculate",
        serde_json::json!({ "manual": { "injection_timing": 60 } }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "out_of_range");
    assert_eq!(body["fields"][0]["field"], "injection_timing");
    assert_eq!(body["fields"][0]["max"], 50.0);
}

#[tokio::test]
async fn test_fields_endpoint() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = get_json(app, "/api/v1/fields").await;

    assert_eq!(status, StatusCode::OK);
    let fields = body.as_array().unwrap();
    assert_eq!(fields.len(), 6);
    assert_eq!(fields[0]["name"], "injection_timing");
    assert_eq!(fields[0]["max"], 50.0);
    assert!(fields[3]["max"].is_null());
}

#[tokio::test]
async fn test_defaults_endpoint() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = get_json(app, "/api/v1/defaults").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["egt"], 190);
    assert_eq!(body["volumetric_efficiency"], 77.5);
}

#[tokio::test]
async fn test_readyz_before_models_loaded() {
    let (app, _state) = setup_test_app(false).await;

    let (status, body) = get_json(app, "/readyz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);
}

#[tokio::test]
async fn test_readyz_and_healthz_when_loaded() {
    let (app, state) = setup_test_app(true).await;

    let (status, body) = get_json(app.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);

    state
        .health_registry
        .set_degraded(components::MODELS, "Slow inference")
        .await;
    let (status, body) = get_json(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_float_in_integer_field_gets_error_body() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = post_json(
        app,
        "/api/v1/calculate",
        serde_json::json!({ "manual": { "injection_timing": 27.5 } }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "invalid_request");
    assert!(body["error"].as_str().unwrap().contains("injection_timing"));
}

#[tokio::test]
async fn test_integer_overflow_gets_error_body() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = post_json(
        app,
        "/api/v1/calculate",
        serde_json::json!({ "manual": { "egt": 3_000_000_000_u64 } }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "invalid_request");
}

#[tokio::test]
async fn test_malformed_json_gets_error_body() {
    let (app, _state) = setup_test_app(true).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/calculate")
                .header("content-type", "application/json")
                .body(Body::from("{\"description\": "))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["code"], "invalid_request");
}

#[tokio::test]
async fn test_slow_inference_degrades_then_recovers() {
    let health_registry = HealthRegistry::new();
    health_registry.set_models_loaded("bte=slow").await;
    let models = ModelSet::new(
        Box::new(SlowPredictor {
            delay: Duration::from_millis(20),
            value: 30.0,
        }),
        Box::new(LinearPredictor::constant(6.0)),
        Box::new(LinearPredictor::constant(4.0)),
    );
    let (app, state) = app_with(models, health_registry);

    let (status, _) = post_json(app.clone(), "/api/v1/calculate", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_json(app.clone(), "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(
        body["components"]["models"]["message"],
        "Inference exceeded latency target"
    );

    let (status, body) = get_json(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);

    // A normal inference clears the degraded state
    let fast = test_models();
    let (app, _) = app_with(fast, state.health_registry.clone());
    post_json(app.clone(), "/api/v1/calculate", serde_json::json!({})).await;
    let (_, body) = get_json(app, "/healthz").await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_prediction_failure_degrades_models() {
    let health_registry = HealthRegistry::new();
    health_registry.set_models_loaded("bte=slow").await;
    let models = ModelSet::new(
        Box::new(SlowPredictor {
            delay: Duration::ZERO,
            value: f64::NAN,
        }),
        Box::new(LinearPredictor::constant(6.0)),
        Box::new(LinearPredictor::constant(4.0)),
    );
    let (app, _state) = app_with(models, health_registry);

    let (status, body) = post_json(app.clone(), "/api/v1/calculate", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "prediction_failed");

    let (_, body) = get_json(app, "/healthz").await;
    assert_eq!(body["status"], "degraded");
    assert!(body["components"]["models"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Last prediction failed"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _state) = setup_test_app(true).await;

    // Run one calculation so the counters have samples
    post_json(app.clone(), "/api/v1/calculate", serde_json::json!({})).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("engine_calculator_calculations_total"));
    assert!(text.contains("engine_calculator_prediction_latency_seconds"));
}
