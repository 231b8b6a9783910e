//! Request parameters and raw response records for the upstream endpoints.
//!
//! Records mirror the upstream JSON as closely as the normalization layer needs.
//! Numeric fields that the upstream may send as `null` or omit default to zero here;
//! fields whose absence must stay visible are `Option`s.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};

use crate::types::Currency;
use crate::types::serde_helpers::non_empty_string;

/// Default page size of the market and exchange listings.
pub const DEFAULT_PER_PAGE: u32 = 50;

/// Sort order requested from `/coins/markets`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketOrder {
    /// Largest market cap first
    #[default]
    MarketCapDesc,
}

/// Query parameters for `/coins/markets`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketsRequest {
    /// Quote currency.
    pub vs_currency: Currency,
    /// Sort order.
    pub order: MarketOrder,
    /// Page size.
    pub per_page: u32,
    /// 1-based page number.
    pub page: u32,
    /// Whether to include 7-day sparklines.
    pub sparkline: bool,
    /// Price change windows to include.
    pub price_change_percentage: String,
}

impl MarketsRequest {
    /// Create a request for the first page in the given currency.
    pub fn new(currency: Currency) -> Self {
        Self {
            vs_currency: currency,
            order: MarketOrder::MarketCapDesc,
            per_page: DEFAULT_PER_PAGE,
            page: 1,
            sparkline: false,
            price_change_percentage: "24h".to_string(),
        }
    }

    /// Set the page number.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Set the page size.
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }
}

/// Query parameters for `/exchanges`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangesRequest {
    /// Page size.
    pub per_page: u32,
    /// 1-based page number.
    pub page: u32,
}

impl ExchangesRequest {
    /// Create a request for one page.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { per_page, page }
    }
}

impl Default for ExchangesRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

/// Path and query parameters for `/coins/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoinDetailRequest {
    /// Coin identifier, sent as a path segment.
    #[serde(skip)]
    pub id: String,
    pub localization: bool,
    pub tickers: bool,
    pub market_data: bool,
    pub community_data: bool,
    pub developer_data: bool,
    pub sparkline: bool,
}

impl CoinDetailRequest {
    /// Request the market data block only.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            localization: false,
            tickers: false,
            market_data: true,
            community_data: false,
            developer_data: false,
            sparkline: false,
        }
    }
}

/// Sampling interval of a market chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartInterval {
    /// One point per hour
    Hourly,
    /// One point per day
    Daily,
}

impl ChartInterval {
    /// Hourly points up to 30 days, daily beyond.
    pub fn for_days(days: u32) -> Self {
        if days <= 30 {
            ChartInterval::Hourly
        } else {
            ChartInterval::Daily
        }
    }
}

/// Path and query parameters for `/coins/{id}/market_chart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketChartRequest {
    /// Coin identifier, sent as a path segment.
    #[serde(skip)]
    pub id: String,
    /// Quote currency.
    pub vs_currency: Currency,
    /// Number of days back from now.
    pub days: u32,
    /// Sampling interval.
    pub interval: ChartInterval,
}

impl MarketChartRequest {
    /// Create a chart request with the interval derived from the day range.
    pub fn new(id: impl Into<String>, currency: Currency, days: u32) -> Self {
        Self {
            id: id.into(),
            vs_currency: currency,
            days,
            interval: ChartInterval::for_days(days),
        }
    }

    /// Override the sampling interval.
    pub fn interval(mut self, interval: ChartInterval) -> Self {
        self.interval = interval;
        self
    }
}

/// One entry of the `/coins/markets` array.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoinMarketRecord {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub image: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub current_price: f64,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub market_cap: f64,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub price_change_percentage_24h: f64,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub total_volume: f64,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub high_24h: f64,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub low_24h: f64,
}

/// One entry of the `/exchanges` array.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExchangeRecord {
    pub id: String,
    pub name: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub image: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub trust_score: u32,
    #[serde(default)]
    pub trust_score_rank: Option<u32>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub trade_volume_24h_btc: f64,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub trade_volume_24h_btc_normalized: f64,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub country: Option<String>,
    #[serde(default)]
    pub year_established: Option<u32>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub url: Option<String>,
}

/// Response of `/coins/{id}`.
///
/// Everything is optional at this level; required fields are checked during
/// normalization so the error can say which part was missing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoinDetailRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<ImageRecord>,
    #[serde(default)]
    pub description: Option<DescriptionRecord>,
    #[serde(default)]
    pub market_data: Option<MarketDataRecord>,
}

/// Image URLs of a coin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageRecord {
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

/// Localized descriptions of a coin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DescriptionRecord {
    #[serde(default)]
    pub en: Option<String>,
}

/// Market data block of `/coins/{id}`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarketDataRecord {
    #[serde_as(as = "DefaultOnNull<HashMap<_, DefaultOnNull>>")]
    #[serde(default)]
    pub current_price: HashMap<String, f64>,
    #[serde_as(as = "DefaultOnNull<HashMap<_, DefaultOnNull>>")]
    #[serde(default)]
    pub market_cap: HashMap<String, f64>,
    #[serde_as(as = "DefaultOnNull<HashMap<_, DefaultOnNull>>")]
    #[serde(default)]
    pub total_volume: HashMap<String, f64>,
    #[serde_as(as = "DefaultOnNull<HashMap<_, DefaultOnNull>>")]
    #[serde(default)]
    pub high_24h: HashMap<String, f64>,
    #[serde_as(as = "DefaultOnNull<HashMap<_, DefaultOnNull>>")]
    #[serde(default)]
    pub low_24h: HashMap<String, f64>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub price_change_percentage_24h: f64,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub price_change_percentage_7d: f64,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub price_change_percentage_30d: f64,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub total_supply: Option<f64>,
}

/// Response of `/coins/{id}/market_chart`.
///
/// Each series is a list of `[unix_millis, value]` pairs in ascending time order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarketChartRecord {
    pub prices: Vec<(f64, f64)>,
    #[serde(default)]
    pub market_caps: Vec<(f64, f64)>,
    #[serde(default)]
    pub total_volumes: Vec<(f64, f64)>,
}
