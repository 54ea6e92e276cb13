//! HTTP surface for the redaction service.
//!
//! Exposes the `/redact` endpoint plus liveness and readiness probes,
//! wrapped in a staged request pipeline: compression, request context,
//! payload guard, timeout, rate limiting, and completion logging.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use middleware::{RateDecision, SlidingWindowLimiter};
pub use routes::create_router;
pub use state::{ApiConfig, AppState};
