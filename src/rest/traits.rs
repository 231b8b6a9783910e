//! Trait definition for the upstream market API.
//!
//! [`MarketApi`] abstracts the four raw upstream calls. The caching, rate-limiting
//! façade ([`MarketDataService`](crate::service::MarketDataService)) is generic over
//! it, which enables:
//! - Mock implementations for testing
//! - Alternative transports
//!
//! # Example
//!
//! ```rust,ignore
//! use gecko_market_client::rest::{MarketApi, MarketsRequest, RestClient};
//! use gecko_market_client::types::Currency;
//!
//! async fn top_ids<A: MarketApi>(api: &A) -> gecko_market_client::Result<Vec<String>> {
//!     let records = api.coin_markets(&MarketsRequest::new(Currency::Usd)).await?;
//!     Ok(records.into_iter().map(|r| r.id).collect())
//! }
//! ```

use std::future::Future;

use crate::error::MarketError;
use crate::rest::types::{
    CoinDetailRecord, CoinDetailRequest, CoinMarketRecord, ExchangeRecord, ExchangesRequest,
    MarketChartRecord, MarketChartRequest, MarketsRequest,
};

/// Raw upstream operations.
///
/// Implementations return the upstream records as-is. A throttled response must be
/// reported as [`MarketError::Throttled`] so the façade can apply its retry policy.
pub trait MarketApi: Send + Sync {
    /// `GET /coins/markets`
    fn coin_markets(
        &self,
        request: &MarketsRequest,
    ) -> impl Future<Output = Result<Vec<CoinMarketRecord>, MarketError>> + Send;

    /// `GET /exchanges`
    fn exchanges(
        &self,
        request: &ExchangesRequest,
    ) -> impl Future<Output = Result<Vec<ExchangeRecord>, MarketError>> + Send;

    /// `GET /coins/{id}`
    fn coin_detail(
        &self,
        request: &CoinDetailRequest,
    ) -> impl Future<Output = Result<CoinDetailRecord, MarketError>> + Send;

    /// `GET /coins/{id}/market_chart`
    fn market_chart(
        &self,
        request: &MarketChartRequest,
    ) -> impl Future<Output = Result<MarketChartRecord, MarketError>> + Send;
}
