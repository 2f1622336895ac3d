//! Health check handlers for service monitoring.
//!
//! Provides liveness and health endpoints with a store connectivity
//! check for orchestration systems like Kubernetes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::server::AppState;

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health status
    pub status: HealthStatus,
    /// Timestamp when health check was performed
    pub timestamp: DateTime<Utc>,
    /// Individual component health checks
    pub checks: HealthChecks,
    /// Service version information
    pub version: String,
}

/// Overall health status enumeration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Critical systems failing
    Unhealthy,
}

/// Individual component health check results.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Transaction store connectivity
    pub store: ComponentHealth,
}

/// Health status for individual components.
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    /// Component status
    pub status: ComponentStatus,
    /// Optional error message if unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Component-level health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component is healthy
    Up,
    /// Component is experiencing issues
    Down,
}

/// Primary health check endpoint.
///
/// Probes the transaction store and reports structured JSON with the
/// overall status. Returns 200 when healthy, 503 otherwise.
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Response {
    debug!("Performing health check");

    let store_health = match state.store.health_check().await {
        Ok(()) => ComponentHealth { status: ComponentStatus::Up, message: None },
        Err(e) => {
            error!(error = %e, "Store health check failed");
            ComponentHealth { status: ComponentStatus::Down, message: Some(e.to_string()) }
        },
    };

    let healthy = matches!(store_health.status, ComponentStatus::Up);

    let response = HealthResponse {
        status: if healthy { HealthStatus::Healthy } else { HealthStatus::Unhealthy },
        timestamp: state.clock.now_utc(),
        checks: HealthChecks { store: store_health },
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let status_code =
        if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (status_code, Json(response)).into_response()
}

/// Liveness probe.
///
/// Always returns 200 while the process can serve requests. Used by
/// orchestrators to decide whether to restart the container.
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}
