//! # Request Throttling
//!
//! A single process-wide token bucket in front of the router. Booking is a
//! race by design; the limiter keeps a flood of claim attempts from starving
//! the rest of the API.
//!
//! `EDNOVA_RATE_LIMIT` sets the budget in requests per second. Unset means
//! 100; `0` disables the layer entirely (the router then skips it).

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Budget used when the env var is unset or unparsable.
const FALLBACK_RPS: NonZeroU32 = NonZeroU32::new(100).unwrap();

// =============================================================================
// RATE LIMITER
// =============================================================================

/// The shared, unkeyed limiter handed to the middleware as state.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Build a limiter with the given per-second budget.
///
/// A zero budget cannot form a [`Quota`], so it falls back to
/// [`FALLBACK_RPS`]; callers that want no limiting skip the layer instead.
pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(FALLBACK_RPS);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// The configured budget from `EDNOVA_RATE_LIMIT`, or the default of 100.
pub fn get_rate_limit_from_env() -> u32 {
    std::env::var("EDNOVA_RATE_LIMIT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(100)
}

/// Reject the request with 429 once the bucket is empty.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    match limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!(event = "rate_limited", "Request budget exhausted");
            Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
