//! Health check infrastructure for the calculator service
//!
//! Tracks whether the model set loaded and how recent inferences went, and
//! reports liveness and readiness. Model load failures abort startup, so a
//! running service is never worse than degraded.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Serving, but the last inference was slow or failed
    Degraded,
}

/// Information about a component's health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn with_status(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::with_status(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Degraded, Some(message.into()))
    }
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across all components
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        if components
            .values()
            .any(|h| h.status == ComponentStatus::Degraded)
        {
            ComponentStatus::Degraded
        } else {
            ComponentStatus::Healthy
        }
    }
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names for health tracking
pub mod components {
    pub const MODELS: &str = "models";
    pub const API: &str = "api";
}

/// Health registry shared between the startup phase and the HTTP handlers
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    models_loaded: Arc<RwLock<Option<String>>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn update(&self, name: &str, health: ComponentHealth) {
        self.components
            .write()
            .await
            .insert(name.to_string(), health);
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::degraded(message)).await;
    }

    /// Record a successful model load; the service becomes ready
    pub async fn set_models_loaded(&self, description: impl Into<String>) {
        *self.models_loaded.write().await = Some(description.into());
        self.register(components::MODELS).await;
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    /// Ready once the model set has loaded; a degraded model stays ready
    pub async fn readiness(&self) -> ReadinessResponse {
        let loaded = self.models_loaded.read().await.is_some();

        ReadinessResponse {
            ready: loaded,
            reason: (!loaded).then(|| "Models not yet loaded".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_registry_initial_state() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_degraded_status() {
        let registry = HealthRegistry::new();
        registry.register(components::MODELS).await;
        registry.register(components::API).await;

        registry.set_degraded(components::MODELS, "Slow inference").await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
    }

    #[tokio::test]
    async fn test_recovers_after_healthy_update() {
        let registry = HealthRegistry::new();
        registry.set_degraded(components::MODELS, "Slow inference").await;
        registry.register(components::MODELS).await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components[components::MODELS].message.is_none());
    }

    #[tokio::test]
    async fn test_readiness_not_ready_initially() {
        let registry = HealthRegistry::new();
        let readiness = registry.readiness().await;

        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Models not yet loaded"));
    }

    #[tokio::test]
    async fn test_readiness_after_models_loaded() {
        let registry = HealthRegistry::new();
        registry.set_models_loaded("bte=onnx,bmep=onnx,brake_power=onnx").await;

        let readiness = registry.readiness().await;
        assert!(readiness.ready);
        assert!(registry
            .health()
            .await
            .components
            .contains_key(components::MODELS));
    }

    #[tokio::test]
    async fn test_degraded_models_stay_ready() {
        let registry = HealthRegistry::new();
        registry.set_models_loaded("bte=linear").await;
        registry.set_degraded(components::MODELS, "Slow inference").await;

        let readiness = registry.readiness().await;
        assert!(readiness.ready);
        assert!(readiness.reason.is_none());
    }
}
