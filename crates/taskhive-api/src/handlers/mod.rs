//! HTTP handlers.

pub mod ai;
pub mod tasks;

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use uuid::Uuid;

use crate::{ApiError, AppState};

/// Resolve the calling principal from the `X-User-Id` header.
///
/// Authentication itself happens upstream (gateway/identity service); this
/// API trusts the forwarded identity header.
pub fn principal(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing X-User-Id header".to_string()))?;
    raw.parse()
        .map_err(|_| ApiError::Unauthorized(format!("Invalid X-User-Id header: {}", raw)))
}

/// Parse a task id path segment. A malformed id behaves like a task that
/// does not exist rather than a client syntax error.
pub fn parse_task_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Core(taskhive_core::Error::TaskNotFound(raw.to_string())))
}

/// Liveness probe: checks database connectivity.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = sqlx::query("SELECT 1")
        .execute(&state.db.pool)
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };
    Json(serde_json::json!({
        "status": status,
        "database": db_ok,
    }))
}
