//! Payload size guard.
//!
//! Rejects oversized bodies before the handler sees them. A declared
//! `Content-Length` above the limit is refused immediately; otherwise the
//! body is buffered up to the limit so chunked uploads cannot sidestep it.

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn payload_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let max = state.config.max_payload_bytes;

    let declared = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if matches!(declared, Some(len) if len > max) {
        return ApiError::PayloadTooLarge.into_response();
    }

    let (parts, body) = req.into_parts();
    let bytes = match to_bytes(body, max).await {
        Ok(bytes) => bytes,
        Err(_) => return ApiError::PayloadTooLarge.into_response(),
    };

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
