//! Request pipeline stages.
//!
//! Each stage is an `axum::middleware::from_fn` layer. Outermost to
//! innermost around the handlers: response compression, request context,
//! payload guard, timeout, rate limiting, request logging.

pub mod context;
pub mod logging;
pub mod payload;
pub mod rate_limit;
pub mod timeout;

pub use context::{request_context, RequestContext, REQUEST_ID_HEADER};
pub use logging::request_logging;
pub use payload::payload_guard;
pub use rate_limit::{rate_limit, RateDecision, SlidingWindowLimiter};
pub use timeout::request_timeout;
