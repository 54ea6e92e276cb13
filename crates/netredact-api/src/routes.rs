//! Router assembly.

use std::any::Any;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tracing::error;

use crate::error::ApiError;
use crate::handlers::{health, redact};
use crate::middleware;
use crate::state::AppState;

/// Converts a handler panic into the uniform internal-error body. The
/// panic payload is never logged; it can embed request content.
fn handle_panic(_err: Box<dyn Any + Send + 'static>) -> Response {
    error!("request handler panicked");
    ApiError::Internal.into_response()
}

/// Build the service router with the full request pipeline attached.
///
/// Layers apply outside-in in reverse order of registration, so the last
/// layer added here is the outermost stage. The panic boundary sits
/// directly around the handlers so the logging stage still records an
/// outcome for a converted panic.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .route("/redact", post(redact::redact))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn(middleware::request_logging))
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit))
        .layer(from_fn_with_state(state.clone(), middleware::request_timeout))
        .layer(from_fn_with_state(state.clone(), middleware::payload_guard))
        .layer(from_fn(middleware::request_context))
        .layer(CompressionLayer::new())
        .with_state(state)
}
