//! Request completion logging.
//!
//! Emits one structured line per request with the request id, method,
//! path, status, and elapsed time. Bodies are never logged.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{error, info};

use crate::middleware::context::request_id;

pub async fn request_logging(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = request_id(req.extensions()).to_string();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();
    if status.is_server_error() {
        error!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms,
            "request failed"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms,
            "request completed"
        );
    }

    response
}
