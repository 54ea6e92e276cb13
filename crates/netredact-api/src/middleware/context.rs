//! Per-request identity.
//!
//! Assigns a request id to every incoming request, makes it available to
//! downstream stages through the request extensions, and echoes it back
//! to the client in the `X-Request-ID` response header.

use std::time::Instant;

use axum::extract::Request;
use axum::http::header::HeaderValue;
use axum::http::Extensions;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub started_at: Instant,
}

/// Look up the request id stored by [`request_context`].
pub fn request_id(extensions: &Extensions) -> &str {
    extensions
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.as_str())
        .unwrap_or("unknown")
}

pub async fn request_context(mut req: Request, next: Next) -> Response {
    let ctx = RequestContext {
        request_id: Uuid::new_v4().to_string(),
        started_at: Instant::now(),
    };
    let request_id = ctx.request_id.clone();
    req.extensions_mut().insert(ctx);

    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
