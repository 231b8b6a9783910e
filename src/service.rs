//! The caching, rate-limited data access façade.
//!
//! [`MarketDataService`] is the entry point for callers. Each operation builds a
//! [`CacheKey`], goes through the matching [`ResponseCache`] (which owns the rate
//! limiter interaction), normalizes the upstream records and applies the throttling
//! policy: one retry after a fixed cooldown, then give up.
//!
//! # Example
//!
//! ```rust,no_run
//! use gecko_market_client::MarketDataService;
//! use gecko_market_client::types::Currency;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = MarketDataService::new();
//!
//!     let coins = service.list_coins(Currency::Usd, 1, 10).await?;
//!     for coin in &coins {
//!         println!("{:>4?} {:<10} {}", coin.market_cap_rank, coin.symbol, coin.current_price);
//!     }
//!
//!     let bitcoin = service.get_coin_detail("bitcoin", Currency::Eur).await?;
//!     println!("{} has {} daily samples", bitcoin.name, bitcoin.price_history.len());
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use crate::cache::{CacheKey, ResponseCache};
use crate::error::MarketError;
use crate::favorites::Favorites;
use crate::model::{Coin, CoinDetail, Exchange, PricePoint, price_history};
use crate::rate_limit::{RateLimitConfig, RateLimiter, limits};
use crate::rest::{
    ChartInterval, CoinDetailRequest, DEFAULT_PER_PAGE, ExchangesRequest, MarketApi,
    MarketChartRequest, MarketsRequest, RestClient,
};
use crate::types::Currency;

/// Length of the daily price history attached to a coin detail.
pub const DETAIL_HISTORY_DAYS: u32 = 7;

/// Timing policy of a [`MarketDataService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Spacing of upstream requests.
    pub rate_limit: RateLimitConfig,
    /// How long a cached response stays fresh.
    pub freshness_window: Duration,
    /// Wait before retrying a throttled operation.
    pub throttle_cooldown: Duration,
    /// Attempts per operation when the upstream keeps throttling, first one included.
    pub max_attempts: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            freshness_window: limits::FRESHNESS_WINDOW,
            throttle_cooldown: limits::THROTTLE_COOLDOWN,
            max_attempts: limits::MAX_ATTEMPTS,
        }
    }
}

/// Typed market data operations over a [`MarketApi`].
///
/// All operations share one rate limiter, so upstream request starts are spaced
/// globally regardless of endpoint. The service is cheap to share behind an `Arc`;
/// its caches live as long as it does.
pub struct MarketDataService<A = RestClient> {
    api: Arc<A>,
    limiter: RateLimiter,
    coins: ResponseCache<CacheKey, Vec<Coin>>,
    exchanges: ResponseCache<CacheKey, Vec<Exchange>>,
    details: ResponseCache<CacheKey, CoinDetail>,
    histories: ResponseCache<CacheKey, Vec<PricePoint>>,
    config: ServiceConfig,
}

impl MarketDataService<RestClient> {
    /// Create a service talking to the public upstream API with default settings.
    pub fn new() -> Self {
        Self::with_api(RestClient::new())
    }

    /// Create a new service builder.
    pub fn builder() -> MarketDataServiceBuilder<RestClient> {
        MarketDataServiceBuilder::new(RestClient::new())
    }
}

impl Default for MarketDataService<RestClient> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> MarketDataService<A>
where
    A: MarketApi + 'static,
{
    /// Create a service over a custom API implementation with default settings.
    pub fn with_api(api: A) -> Self {
        MarketDataServiceBuilder::new(api).build()
    }

    /// The underlying API implementation.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// The timing policy in use.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The limiter shared by every upstream request of this service.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.coins.clear();
        self.exchanges.clear();
        self.details.clear();
        self.histories.clear();
    }

    /// A page of coins ordered by descending market cap, priced in `currency`.
    ///
    /// The upstream order is kept; at most `per_page` coins are returned.
    pub async fn list_coins(
        &self,
        currency: Currency,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Coin>, MarketError> {
        check_page(page, per_page)?;

        let key = &CacheKey::Coins {
            currency,
            page,
            per_page,
        };
        let request = &MarketsRequest::new(currency).page(page).per_page(per_page);

        self.with_throttle_retry("list_coins", move || {
            let api = Arc::clone(&self.api);
            let request = request.clone();
            self.coins
                .get_or_fetch(key.clone(), move || fetch_coins(api, request))
        })
        .await
    }

    /// A page of exchanges in upstream order.
    pub async fn list_exchanges(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Exchange>, MarketError> {
        check_page(page, per_page)?;

        let key = &CacheKey::Exchanges { page, per_page };
        let request = &ExchangesRequest::new(page, per_page);

        self.with_throttle_retry("list_exchanges", move || {
            let api = Arc::clone(&self.api);
            let request = request.clone();
            self.exchanges
                .get_or_fetch(key.clone(), move || fetch_exchanges(api, request))
        })
        .await
    }

    /// Full detail of one coin with its last seven daily prices in `currency`.
    ///
    /// The detail and chart requests run concurrently, each with its own limiter
    /// slot, and both must succeed. An unknown `id` fails with
    /// [`MarketError::NotFound`]; a detail record without id, name, symbol or market
    /// data fails with [`MarketError::Validation`] and nothing is cached.
    pub async fn get_coin_detail(
        &self,
        id: &str,
        currency: Currency,
    ) -> Result<CoinDetail, MarketError> {
        let id = check_id(id)?;

        let key = &CacheKey::CoinDetail {
            id: id.to_string(),
            currency,
        };
        let detail_request = &CoinDetailRequest::new(id);
        let chart_request = &MarketChartRequest::new(id, currency, DETAIL_HISTORY_DAYS)
            .interval(ChartInterval::Daily);

        self.with_throttle_retry("get_coin_detail", move || {
            let api = Arc::clone(&self.api);
            let limiter = self.limiter.clone();
            let detail_request = detail_request.clone();
            let chart_request = chart_request.clone();
            self.details.get_or_fetch(key.clone(), move || {
                fetch_coin_detail(api, limiter, detail_request, chart_request)
            })
        })
        .await
    }

    /// Price history of a coin over the last `days` days.
    ///
    /// Samples are hourly up to 30 days and daily beyond, oldest first.
    pub async fn get_coin_history(
        &self,
        id: &str,
        currency: Currency,
        days: u32,
    ) -> Result<Vec<PricePoint>, MarketError> {
        let id = check_id(id)?;
        if days == 0 {
            return Err(MarketError::InvalidInput(
                "days must be at least 1".to_string(),
            ));
        }

        let key = &CacheKey::CoinHistory {
            id: id.to_string(),
            currency,
            days,
        };
        let request = &MarketChartRequest::new(id, currency, days);

        self.with_throttle_retry("get_coin_history", move || {
            let api = Arc::clone(&self.api);
            let request = request.clone();
            self.histories
                .get_or_fetch(key.clone(), move || fetch_history(api, request))
        })
        .await
    }

    /// The favorite coins found on the first page of the listing.
    ///
    /// An empty favorite set returns immediately without any upstream request.
    pub async fn list_favorite_coins(
        &self,
        favorites: &Favorites,
        currency: Currency,
    ) -> Result<Vec<Coin>, MarketError> {
        if favorites.is_empty() {
            return Ok(Vec::new());
        }

        let coins = self.list_coins(currency, 1, DEFAULT_PER_PAGE).await?;
        Ok(favorites.filter_coins(coins))
    }

    /// Run `attempt` until it succeeds, fails with a non-throttling error, or uses up
    /// `max_attempts`.
    ///
    /// Every attempt is a fresh operation: a new cache lookup and, on a miss, a new
    /// limiter slot.
    async fn with_throttle_retry<T, F, Fut>(
        &self,
        operation: &str,
        mut attempt: F,
    ) -> Result<T, MarketError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MarketError>>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_throttled() && attempts < self.config.max_attempts => {
                    warn!(
                        operation,
                        attempt = attempts,
                        cooldown_ms = self.config.throttle_cooldown.as_millis() as u64,
                        "Upstream throttled the request, retrying after cooldown"
                    );
                    tokio::time::sleep(self.config.throttle_cooldown).await;
                }
                Err(err) => {
                    error!(operation, attempt = attempts, error = %err, "Operation failed");
                    return Err(err);
                }
            }
        }
    }
}

impl<A> std::fmt::Debug for MarketDataService<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataService")
            .field("limiter", &self.limiter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`MarketDataService`].
pub struct MarketDataServiceBuilder<A> {
    api: A,
    config: ServiceConfig,
}

impl<A> MarketDataServiceBuilder<A>
where
    A: MarketApi + 'static,
{
    /// Start from an API implementation and the default timing policy.
    pub fn new(api: A) -> Self {
        Self {
            api,
            config: ServiceConfig::default(),
        }
    }

    /// Replace the API implementation.
    pub fn api<B: MarketApi + 'static>(self, api: B) -> MarketDataServiceBuilder<B> {
        MarketDataServiceBuilder {
            api,
            config: self.config,
        }
    }

    /// Replace the whole timing policy.
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the rate limiter configuration.
    pub fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.config.rate_limit = rate_limit;
        self
    }

    /// Set how long cached responses stay fresh.
    pub fn freshness_window(mut self, window: Duration) -> Self {
        self.config.freshness_window = window;
        self
    }

    /// Set the wait before retrying a throttled operation.
    pub fn throttle_cooldown(mut self, cooldown: Duration) -> Self {
        self.config.throttle_cooldown = cooldown;
        self
    }

    /// Set the number of attempts per operation, first one included.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Build the service.
    pub fn build(self) -> MarketDataService<A> {
        let limiter = RateLimiter::new(self.config.rate_limit.clone());
        let window = self.config.freshness_window;

        MarketDataService {
            api: Arc::new(self.api),
            coins: ResponseCache::new(window, limiter.clone()),
            exchanges: ResponseCache::new(window, limiter.clone()),
            details: ResponseCache::new(window, limiter.clone()),
            histories: ResponseCache::new(window, limiter.clone()),
            limiter,
            config: self.config,
        }
    }
}

async fn fetch_coins<A: MarketApi>(
    api: Arc<A>,
    request: MarketsRequest,
) -> Result<Vec<Coin>, MarketError> {
    let mut records = api.coin_markets(&request).await?;
    records.truncate(request.per_page as usize);
    Ok(records.into_iter().map(Coin::from).collect())
}

async fn fetch_exchanges<A: MarketApi>(
    api: Arc<A>,
    request: ExchangesRequest,
) -> Result<Vec<Exchange>, MarketError> {
    let records = api.exchanges(&request).await?;
    Ok(records.into_iter().map(Exchange::from).collect())
}

/// Runs on a cache miss, after the miss has taken its limiter slot. The chart
/// request is a second upstream call and takes a slot of its own.
async fn fetch_coin_detail<A: MarketApi>(
    api: Arc<A>,
    limiter: RateLimiter,
    detail_request: CoinDetailRequest,
    chart_request: MarketChartRequest,
) -> Result<CoinDetail, MarketError> {
    let detail = async {
        api.coin_detail(&detail_request)
            .await
            .map_err(|err| not_found_as(err, &detail_request.id))
    };
    let chart = async {
        limiter.acquire().await;
        api.market_chart(&chart_request)
            .await
            .map_err(|err| not_found_as(err, &chart_request.id))
    };

    let (detail, chart) = futures_util::try_join!(detail, chart)?;
    CoinDetail::from_records(detail, chart)
}

async fn fetch_history<A: MarketApi>(
    api: Arc<A>,
    request: MarketChartRequest,
) -> Result<Vec<PricePoint>, MarketError> {
    let chart = api
        .market_chart(&request)
        .await
        .map_err(|err| not_found_as(err, &request.id))?;
    price_history(&chart)
}

fn check_page(page: u32, per_page: u32) -> Result<(), MarketError> {
    if page == 0 || per_page == 0 {
        return Err(MarketError::InvalidInput(format!(
            "page and per_page must be at least 1 (got page={}, per_page={})",
            page, per_page
        )));
    }
    Ok(())
}

fn check_id(id: &str) -> Result<&str, MarketError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(MarketError::InvalidInput(
            "coin id must not be empty".to_string(),
        ));
    }
    Ok(id)
}

fn not_found_as(err: MarketError, id: &str) -> MarketError {
    match err {
        MarketError::Api(api) if api.is_not_found() => MarketError::NotFound { id: id.to_string() },
        other => other,
    }
}
