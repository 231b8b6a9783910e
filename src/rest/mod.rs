//! Upstream REST API client.
//!
//! [`RestClient`] performs plain unauthenticated GETs against the upstream API and
//! maps HTTP statuses onto [`MarketError`](crate::error::MarketError). It does no
//! caching or rate limiting of its own; wrap it in a
//! [`MarketDataService`](crate::service::MarketDataService) for that.

mod client;
mod endpoints;
mod traits;
pub mod types;

pub use client::{RestClient, RestClientBuilder};
pub use endpoints::*;
pub use traits::MarketApi;
pub use types::*;
