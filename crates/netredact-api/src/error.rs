//! Error surface for the HTTP layer.
//!
//! Every error leaving a handler is rendered as `{"detail": "..."}` with
//! an appropriate status code, so clients see one uniform error shape.

use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid request body")]
    MalformedBody,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Too many requests")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Request timed out")]
    Timeout,

    #[error("Service unavailable")]
    NotReady,

    #[error("Internal server error")]
    Internal,
}

/// JSON body used for every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedBody => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorBody {
            detail: self.to_string(),
        });

        if let ApiError::RateLimited {
            retry_after: Some(wait),
        } = &self
        {
            // Round up so a client that honors the header never retries early.
            let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
            return (status, [(header::RETRY_AFTER, secs.to_string())], body).into_response();
        }

        (status, body).into_response()
    }
}
