//! Shared application state threaded through handlers and middleware.

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use netredact_storage::MappingStore;

use crate::middleware::rate_limit::SlidingWindowLimiter;

/// Knobs the HTTP layer needs at request time.
#[derive(Clone)]
pub struct ApiConfig {
    pub max_payload_bytes: usize,
    pub request_timeout: Duration,
    pub deterministic_secret: Vec<u8>,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("max_payload_bytes", &self.max_payload_bytes)
            .field("request_timeout", &self.request_timeout)
            .field("deterministic_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn MappingStore>,
    pub limiter: Arc<SlidingWindowLimiter>,
    pub ready: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn MappingStore>,
        limiter: Arc<SlidingWindowLimiter>,
    ) -> Self {
        Self {
            config,
            store,
            limiter,
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    /// A state wired to an in-memory store with generous limits, for tests.
    pub fn for_tests() -> Self {
        let limiter = SlidingWindowLimiter::new(1000, Duration::from_secs(60))
            .unwrap_or_else(|_| unreachable!("limits are non-zero"));
        Self::new(
            ApiConfig {
                max_payload_bytes: 1024 * 1024,
                request_timeout: Duration::from_secs(5),
                deterministic_secret: b"unit-test-deterministic-secret-000000".to_vec(),
            },
            Arc::new(netredact_storage::InMemoryMappingStore::new(
                None,
                Duration::from_secs(300),
            )),
            Arc::new(limiter),
        )
    }
}
