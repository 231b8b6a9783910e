//! Normalized market entities.
//!
//! These are the shapes callers work with. Each one is built from the raw records
//! of [`rest::types`](crate::rest::types) with an explicit rule per field: absent
//! numbers become zero, absent ranks and years stay `None`, and absent exchange
//! countries and URLs are replaced by display markers.

use std::collections::HashMap;

use serde::Serialize;
use serde_with::{TimestampMilliSeconds, serde_as};
use time::OffsetDateTime;

use crate::error::MarketError;
use crate::rest::types::{
    CoinDetailRecord, CoinMarketRecord, ExchangeRecord, MarketChartRecord, MarketDataRecord,
};
use crate::types::Currency;

/// Marker used for exchanges that do not report a country.
pub const UNKNOWN_COUNTRY: &str = "N/A";

/// Marker used for exchanges that do not report a website.
pub const PLACEHOLDER_URL: &str = "#";

/// A coin with its market data in one quote currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: String,
    pub current_price: f64,
    pub market_cap: f64,
    pub market_cap_rank: Option<u32>,
    pub price_change_percentage_24h: f64,
    pub total_volume: f64,
    pub high_24h: f64,
    pub low_24h: f64,
}

impl From<CoinMarketRecord> for Coin {
    fn from(record: CoinMarketRecord) -> Self {
        Self {
            id: record.id,
            symbol: record.symbol,
            name: record.name,
            image: record.image,
            current_price: record.current_price,
            market_cap: record.market_cap,
            market_cap_rank: record.market_cap_rank,
            price_change_percentage_24h: record.price_change_percentage_24h,
            total_volume: record.total_volume,
            high_24h: record.high_24h,
            low_24h: record.low_24h,
        }
    }
}

/// An exchange listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    pub id: String,
    pub name: String,
    pub image: String,
    pub trust_score: u32,
    pub trust_score_rank: Option<u32>,
    pub trade_volume_24h_btc: f64,
    pub trade_volume_24h_btc_normalized: f64,
    /// Country of registration, or [`UNKNOWN_COUNTRY`].
    pub country: String,
    pub year_established: Option<u32>,
    /// Website, or [`PLACEHOLDER_URL`].
    pub url: String,
}

impl Exchange {
    /// Check if the exchange reported its country.
    pub fn has_country(&self) -> bool {
        self.country != UNKNOWN_COUNTRY
    }
}

impl From<ExchangeRecord> for Exchange {
    fn from(record: ExchangeRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            image: record.image,
            trust_score: record.trust_score,
            trust_score_rank: record.trust_score_rank,
            trade_volume_24h_btc: record.trade_volume_24h_btc,
            trade_volume_24h_btc_normalized: record.trade_volume_24h_btc_normalized,
            country: record
                .country
                .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
            year_established: record.year_established,
            url: record.url.unwrap_or_else(|| PLACEHOLDER_URL.to_string()),
        }
    }
}

/// Per-currency market data of a coin.
///
/// The map fields are keyed by lower-case currency code, as sent upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoinMarketData {
    pub current_price: HashMap<String, f64>,
    pub market_cap: HashMap<String, f64>,
    pub total_volume: HashMap<String, f64>,
    pub high_24h: HashMap<String, f64>,
    pub low_24h: HashMap<String, f64>,
    pub price_change_percentage_24h: f64,
    pub price_change_percentage_7d: f64,
    pub price_change_percentage_30d: f64,
    pub market_cap_rank: Option<u32>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
}

impl CoinMarketData {
    /// Current price in the given currency, if the upstream quoted it.
    pub fn price_in(&self, currency: Currency) -> Option<f64> {
        self.current_price.get(currency.as_str()).copied()
    }

    /// Market cap in the given currency, if the upstream quoted it.
    pub fn market_cap_in(&self, currency: Currency) -> Option<f64> {
        self.market_cap.get(currency.as_str()).copied()
    }
}

impl From<MarketDataRecord> for CoinMarketData {
    fn from(record: MarketDataRecord) -> Self {
        Self {
            current_price: record.current_price,
            market_cap: record.market_cap,
            total_volume: record.total_volume,
            high_24h: record.high_24h,
            low_24h: record.low_24h,
            price_change_percentage_24h: record.price_change_percentage_24h,
            price_change_percentage_7d: record.price_change_percentage_7d,
            price_change_percentage_30d: record.price_change_percentage_30d,
            market_cap_rank: record.market_cap_rank,
            circulating_supply: record.circulating_supply,
            total_supply: record.total_supply,
        }
    }
}

/// One sample of a price history.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    /// Sample time, serialized as unix milliseconds.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub timestamp: OffsetDateTime,
    pub price: f64,
}

/// Full detail of a single coin, including a short daily price history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoinDetail {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub image: String,
    /// Raw HTML description. Sanitizing it is up to whoever renders it.
    pub description: String,
    pub market_data: CoinMarketData,
    /// Price samples in upstream order (oldest first).
    pub price_history: Vec<PricePoint>,
}

impl CoinDetail {
    /// Combine a detail record and its market chart into a [`CoinDetail`].
    ///
    /// Fails with [`MarketError::Validation`] when the detail record lacks its id,
    /// name, symbol or market data block, or when the chart has an unusable timestamp.
    pub fn from_records(
        detail: CoinDetailRecord,
        chart: MarketChartRecord,
    ) -> Result<Self, MarketError> {
        let CoinDetailRecord {
            id: Some(id),
            symbol: Some(symbol),
            name: Some(name),
            image,
            description,
            market_data: Some(market_data),
        } = detail
        else {
            return Err(MarketError::Validation(
                "Missing required coin data fields (id, name, symbol or market_data)".to_string(),
            ));
        };

        Ok(Self {
            id,
            name,
            symbol,
            image: image.and_then(|i| i.large).unwrap_or_default(),
            description: description.and_then(|d| d.en).unwrap_or_default(),
            market_data: market_data.into(),
            price_history: price_history(&chart)?,
        })
    }
}

/// Convert the price series of a market chart into [`PricePoint`]s.
///
/// The order of the upstream series is kept as is.
pub fn price_history(chart: &MarketChartRecord) -> Result<Vec<PricePoint>, MarketError> {
    chart
        .prices
        .iter()
        .map(|&(millis, price)| {
            Ok(PricePoint {
                timestamp: timestamp_from_millis(millis)?,
                price,
            })
        })
        .collect()
}

fn timestamp_from_millis(millis: f64) -> Result<OffsetDateTime, MarketError> {
    if !millis.is_finite() {
        return Err(MarketError::Validation(format!(
            "Invalid price history timestamp: {}",
            millis
        )));
    }
    let nanos = (millis * 1_000_000.0).round() as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).map_err(|e| {
        MarketError::Validation(format!(
            "Invalid price history timestamp {}: {}",
            millis, e
        ))
    })
}
