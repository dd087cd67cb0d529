use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::startup::AppState;

/// Liveness plus a store ping. Unhealthy until the gateway is connected.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let result = match state.store() {
        Ok(store) => store.health_check().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "notification-service",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": "notification-service",
                "error": e.to_string()
            })),
        ),
    }
}

/// Readiness probe: 200 once the storage gateway is connected.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
