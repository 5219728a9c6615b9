//! Health check handler

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use crate::services::ServiceHealthStatus;
use crate::state::AppState;
use crate::utils::response::{success, ApiResponse};

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    checks: ServiceHealthStatus,
    issues: Vec<String>,
}

/// Liveness and dependency health; 503 when a backing store is down
pub async fn health_check(State(state): State<AppState>) -> Response {
    let checks = state.services.health_check().await;
    let healthy = checks.is_healthy();
    let payload = HealthPayload {
        status: if healthy { "ok" } else { "degraded" },
        service: "eventify-api",
        version: crate::VERSION,
        issues: checks.get_issues(),
        checks,
    };

    if healthy {
        success(payload, "Health check successful")
    } else {
        let body = ApiResponse {
            success: false,
            data: Some(payload),
            message: Some("One or more dependencies are unavailable".to_string()),
        };
        (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
    }
}
