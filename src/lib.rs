//! # Gecko Market Client
//!
//! An async Rust data-access layer for the CoinGecko market REST API.
//!
//! ## Features
//!
//! - Typed operations for coin listings, exchanges, coin detail and price history
//! - In-memory response cache with a five-minute freshness window
//! - Global request spacing shared by every endpoint
//! - One cooldown-and-retry when the upstream throttles
//! - Coalescing of concurrent identical requests, with cancellation once nobody waits
//! - Favorites persistence and client-side search, sort and conversion helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gecko_market_client::MarketDataService;
//! use gecko_market_client::types::Currency;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = MarketDataService::new();
//!     let coins = service.list_coins(Currency::Usd, 1, 10).await?;
//!     println!("Top coin: {:?}", coins.first().map(|c| &c.name));
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod favorites;
pub mod model;
pub mod query;
pub mod rate_limit;
pub mod rest;
pub mod service;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ErrorKind, MarketError};
pub use service::{MarketDataService, MarketDataServiceBuilder, ServiceConfig};
pub use types::Currency;

/// Result type alias using MarketError
pub type Result<T> = std::result::Result<T, MarketError>;
