//! Request deadline.
//!
//! Aborts any request that exceeds the configured timeout and converts
//! the cancellation into a 504 response.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::error::ApiError;
use crate::middleware::context::request_id;
use crate::state::AppState;

pub async fn request_timeout(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let request_id = request_id(req.extensions()).to_string();
    let path = req.uri().path().to_string();

    match tokio::time::timeout(state.config.request_timeout, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(request_id = %request_id, path = %path, "request exceeded deadline");
            ApiError::Timeout.into_response()
        }
    }
}
