//! Start-to-start request spacing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::rate_limit::RateLimitConfig;

/// Spacing state for a single request stream.
///
/// Each call to [`reserve`](RequestSpacer::reserve) hands out the earliest start time
/// that is at least `min_spacing` after the previously handed out one. Slots are
/// handed out in call order.
#[derive(Debug)]
pub struct RequestSpacer {
    /// Start time of the most recently reserved request
    last_request: Option<Instant>,
    /// Minimum start-to-start distance
    min_spacing: Duration,
}

impl RequestSpacer {
    /// Create a new spacer with the given minimum distance between request starts.
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            last_request: None,
            min_spacing,
        }
    }

    /// Reserve the next start slot and record it as the last request.
    ///
    /// Returns `now` when the previous slot is far enough in the past, otherwise the
    /// previous slot plus the spacing.
    pub fn reserve(&mut self, now: Instant) -> Instant {
        let slot = match self.last_request {
            Some(last) => std::cmp::max(now, last + self.min_spacing),
            None => now,
        };
        self.last_request = Some(slot);
        slot
    }

    /// Get the time until a request started now would be allowed.
    ///
    /// Returns `None` if a request may start immediately.
    pub fn time_until_available(&self, now: Instant) -> Option<Duration> {
        let next = self.last_request? + self.min_spacing;
        let wait = next.saturating_duration_since(now);
        (!wait.is_zero()).then_some(wait)
    }

    /// Start time of the most recently reserved request.
    pub fn last_request(&self) -> Option<Instant> {
        self.last_request
    }

    /// Minimum start-to-start distance.
    pub fn min_spacing(&self) -> Duration {
        self.min_spacing
    }
}

impl Default for RequestSpacer {
    fn default() -> Self {
        Self::new(crate::rate_limit::limits::REQUEST_DELAY)
    }
}

/// Process-wide limiter that serializes request starts.
///
/// Cloning is cheap and every clone shares the same spacing state, so a single
/// limiter can be handed to every component that talks to the upstream API.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    spacer: Arc<Mutex<RequestSpacer>>,
    enabled: bool,
}

impl RateLimiter {
    /// Create a new limiter.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            spacer: Arc::new(Mutex::new(RequestSpacer::new(config.min_spacing))),
            enabled: config.enabled,
        }
    }

    /// Whether this limiter delays callers at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Wait until the caller may start an upstream request.
    ///
    /// The slot is reserved before waiting, so concurrent callers are released in
    /// the order they called `acquire`. Dropping the returned future while it waits
    /// does not give the slot back.
    pub async fn acquire(&self) {
        if !self.enabled {
            return;
        }

        let now = Instant::now();
        let slot = self.spacer.lock().await.reserve(now);
        if slot > now {
            tracing::debug!("Rate limiter delaying request by {:?}", slot - now);
            tokio::time::sleep_until(slot).await;
        }
    }

    /// Get the time until a request started now would be allowed.
    pub async fn time_until_available(&self) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        self.spacer.lock().await.time_until_available(Instant::now())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
