//! The redaction endpoint.
//!
//! Accepts either a JSON body (`{"text": ..., "mode": ...}`) or a raw
//! `text/plain` body, runs the matching engine over it, persists the
//! resulting mapping, and returns the redacted text. Original values are
//! never logged and never appear in the response.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::{Extension, Json};
use tracing::{error, info};

use netredact_core::{RedactMode, RedactorEngine, DEFAULT_CONTEXT};

use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestContext;
use crate::models::{RedactRequest, RedactResponse};
use crate::state::AppState;

fn parse_request(headers: &HeaderMap, body: &Bytes) -> ApiResult<RedactRequest> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("text/plain") {
        return Ok(RedactRequest {
            text: String::from_utf8_lossy(body).into_owned(),
            mode: RedactMode::Random,
        });
    }

    serde_json::from_slice(body).map_err(|_| ApiError::MalformedBody)
}

pub async fn redact(
    State(state): State<AppState>,
    ctx: Option<Extension<RequestContext>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<RedactResponse>> {
    let request_id = ctx
        .as_ref()
        .map(|Extension(ctx)| ctx.request_id.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let request = parse_request(&headers, &body)?;
    if request.text.is_empty() {
        return Err(ApiError::Validation("text must not be empty".to_string()));
    }

    let started = std::time::Instant::now();
    let mut engine = RedactorEngine::new(
        request.mode,
        Some(&state.config.deterministic_secret),
        DEFAULT_CONTEXT,
    )
    .map_err(|err| {
        error!(request_id = %request_id, error = %err, "engine construction failed");
        ApiError::Internal
    })?;

    let (redacted_text, mapping) = engine.redact(&request.text);
    let mapping_id = engine.mapping_id();
    let mapping_count = mapping.len();

    state.store.save(mapping_id, &mapping).await.map_err(|err| {
        error!(
            request_id = %request_id,
            store = state.store.name(),
            error = %err,
            "failed to persist mapping"
        );
        ApiError::Internal
    })?;

    info!(
        request_id = %request_id,
        redaction_mode = engine.mode().as_str(),
        mapping_count,
        elapsed_ms = started.elapsed().as_millis(),
        "redaction completed"
    );

    Ok(Json(RedactResponse {
        mapping_id,
        redacted_text,
        mapping_count,
    }))
}
