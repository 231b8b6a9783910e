//! Time-bounded memoization of upstream responses.
//!
//! [`ResponseCache::get_or_fetch`] returns a fresh cached value when one exists and
//! otherwise waits for the shared [`RateLimiter`](crate::rate_limit::RateLimiter)
//! before running the fetch. Failed fetches are never stored.

mod key;
mod response;
mod ttl_cache;

pub use key::CacheKey;
pub use response::ResponseCache;
pub use ttl_cache::TtlCache;
