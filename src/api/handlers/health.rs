use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use super::patient::SharedPatientStore;

/// Landing page
pub async fn welcome() -> &'static str {
    "Welcome to the PatientData API"
}

/// Health check endpoint - checks store connectivity
pub async fn health_check(State(store): State<SharedPatientStore>) -> (StatusCode, Json<Value>) {
    match store.ping().await {
        Ok(()) => {
            tracing::debug!("Health check passed - store reachable");
            (
                StatusCode::OK,
                Json(json!({
                    "status": "healthy",
                    "store": "connected",
                    "schema": store.schema().to_string(),
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
        }
        Err(e) => {
            tracing::error!("Health check failed - store error: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "store": "disconnected",
                    "error": "Store connection failed"
                })),
            )
        }
    }
}

/// Liveness check endpoint - indicates if server process is alive
pub async fn liveness_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "alive" })))
}
