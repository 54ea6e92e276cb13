//! Sliding-window rate limiting.
//!
//! Requests are keyed by client address (honoring `X-Forwarded-For` when
//! present). Each key carries the timestamps of its requests inside the
//! current window; a request is refused while the window is full. All
//! per-key state lives behind a single async mutex, so admissions are
//! strictly ordered.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Error)]
#[error("rate limiter requires a non-zero request budget and window")]
pub struct InvalidLimiterConfig;

#[derive(Debug, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after: Duration },
}

pub struct SlidingWindowLimiter {
    max_requests: usize,
    window: Duration,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Result<Self, InvalidLimiterConfig> {
        if max_requests == 0 || window.is_zero() {
            return Err(InvalidLimiterConfig);
        }
        Ok(Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        })
    }

    /// Admit or refuse one request for `key`, recording it if admitted.
    pub async fn check(&self, key: &str) -> RateDecision {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let timestamps = windows.entry(key.to_string()).or_default();

        while let Some(&oldest) = timestamps.front() {
            if now.duration_since(oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_requests {
            // Oldest entry is guaranteed present when the window is full.
            let retry_after = timestamps
                .front()
                .map(|&oldest| self.window.saturating_sub(now.duration_since(oldest)))
                .unwrap_or(self.window);
            return RateDecision::Limited { retry_after };
        }

        timestamps.push_back(now);
        RateDecision::Allowed
    }

    /// Drop all recorded windows.
    pub async fn reset(&self) {
        self.windows.lock().await.clear();
    }
}

/// Client key for limiting: first `X-Forwarded-For` entry, then the peer
/// address, then a shared fallback bucket.
fn client_key(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let key = client_key(&req);
    match state.limiter.check(&key).await {
        RateDecision::Allowed => next.run(req).await,
        RateDecision::Limited { retry_after } => ApiError::RateLimited {
            retry_after: Some(retry_after),
        }
        .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_limits() {
        assert!(SlidingWindowLimiter::new(0, Duration::from_secs(1)).is_err());
        assert!(SlidingWindowLimiter::new(1, Duration::ZERO).is_err());
    }

    #[tokio::test]
    async fn admits_up_to_the_budget() {
        let limiter = SlidingWindowLimiter::new(3, Duration::from_secs(60)).unwrap();
        for _ in 0..3 {
            assert_eq!(limiter.check("10.0.0.1").await, RateDecision::Allowed);
        }
        assert!(matches!(
            limiter.check("10.0.0.1").await,
            RateDecision::Limited { .. }
        ));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60)).unwrap();
        assert_eq!(limiter.check("10.0.0.1").await, RateDecision::Allowed);
        assert_eq!(limiter.check("10.0.0.2").await, RateDecision::Allowed);
        assert!(matches!(
            limiter.check("10.0.0.1").await,
            RateDecision::Limited { .. }
        ));
    }

    #[tokio::test]
    async fn window_slides_and_frees_budget() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_millis(40)).unwrap();
        assert_eq!(limiter.check("k").await, RateDecision::Allowed);
        assert!(matches!(
            limiter.check("k").await,
            RateDecision::Limited { .. }
        ));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(limiter.check("k").await, RateDecision::Allowed);
    }

    #[tokio::test]
    async fn refusal_does_not_consume_budget() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_millis(50)).unwrap();
        assert_eq!(limiter.check("k").await, RateDecision::Allowed);
        // Hammering while limited must not push the recovery point out.
        for _ in 0..5 {
            assert!(matches!(
                limiter.check("k").await,
                RateDecision::Limited { .. }
            ));
        }
        tokio::time::sleep(Duration::from_millis(70)).await;
        assert_eq!(limiter.check("k").await, RateDecision::Allowed);
    }

    #[tokio::test]
    async fn retry_after_never_exceeds_the_window() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60)).unwrap();
        assert_eq!(limiter.check("k").await, RateDecision::Allowed);
        match limiter.check("k").await {
            RateDecision::Limited { retry_after } => {
                assert!(retry_after <= Duration::from_secs(60));
                assert!(retry_after > Duration::from_secs(59));
            }
            RateDecision::Allowed => panic!("expected a refusal"),
        }
    }

    #[tokio::test]
    async fn reset_clears_all_keys() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60)).unwrap();
        assert_eq!(limiter.check("k").await, RateDecision::Allowed);
        limiter.reset().await;
        assert_eq!(limiter.check("k").await, RateDecision::Allowed);
    }
}
