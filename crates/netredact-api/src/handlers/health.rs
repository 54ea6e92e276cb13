//! Liveness and readiness probes.

use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::Json;
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::models::HealthResponse;
use crate::state::AppState;

/// Liveness: the process is up and serving.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Readiness: the service accepts traffic and the mapping store answers.
pub async fn health_ready(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    if !state.ready.load(Ordering::SeqCst) {
        return Err(ApiError::NotReady);
    }

    match state.store.count().await {
        Ok(_) => Ok(Json(HealthResponse::ok())),
        Err(err) => {
            warn!(store = state.store.name(), error = %err, "mapping store probe failed");
            Err(ApiError::NotReady)
        }
    }
}
