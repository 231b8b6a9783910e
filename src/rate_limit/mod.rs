//! Global request spacing for the upstream API.
//!
//! The free upstream tier throttles aggressively, so every outbound request, whatever
//! endpoint it targets, passes through one shared [`RateLimiter`] that keeps request
//! starts at least [`limits::REQUEST_DELAY`] apart.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use gecko_market_client::rate_limit::{RateLimitConfig, RateLimiter, RequestSpacer};
//!
//! // Pure spacing state, useful for custom scheduling.
//! let mut spacer = RequestSpacer::new(Duration::from_millis(1100));
//! let now = tokio::time::Instant::now();
//! assert_eq!(spacer.reserve(now), now);
//! assert_eq!(spacer.reserve(now), now + Duration::from_millis(1100));
//!
//! // Async limiter shared by all requests of a service.
//! let limiter = RateLimiter::new(RateLimitConfig::default());
//! # let _ = limiter;
//! ```

mod spacing;

pub use spacing::{RateLimiter, RequestSpacer};

use std::time::Duration;

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Minimum time between the starts of two upstream requests.
    pub min_spacing: Duration,
    /// Whether to enable rate limiting.
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_spacing: limits::REQUEST_DELAY,
            enabled: true,
        }
    }
}

/// Timing constants for the upstream free tier.
pub mod limits {
    use std::time::Duration;

    /// Minimum spacing between request starts, across all endpoints.
    pub const REQUEST_DELAY: Duration = Duration::from_millis(1100);
    /// Maximum age of a cached response before it is fetched again.
    pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(5 * 60);
    /// Wait before the single retry that follows a throttled request.
    pub const THROTTLE_COOLDOWN: Duration = Duration::from_secs(2);
    /// Attempts per operation, the first one included.
    pub const MAX_ATTEMPTS: u32 = 2;
}
