//! Upstream REST API client implementation.

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{
    RetryTransientMiddleware, Retryable, RetryableStrategy, default_on_request_failure,
};
use reqwest_tracing::TracingMiddleware;
use url::Url;

use crate::error::{ApiError, MarketError};
use crate::rest::endpoints::{COINGECKO_BASE_URL, paths};
use crate::rest::traits::MarketApi;
use crate::rest::types::{
    CoinDetailRecord, CoinDetailRequest, CoinMarketRecord, ExchangeRecord, ExchangesRequest,
    MarketChartRecord, MarketChartRequest, MarketsRequest,
};

/// The upstream REST API client.
///
/// Issues plain GET requests and decodes the JSON bodies into the raw records of
/// [`rest::types`](crate::rest::types). Status handling:
///
/// - `429` becomes [`MarketError::Throttled`]
/// - any other non-2xx status becomes [`MarketError::Api`] with the message from the body
/// - a body of the wrong shape becomes [`MarketError::Validation`]
///
/// # Example
///
/// ```rust,no_run
/// use gecko_market_client::rest::{MarketsRequest, RestClient};
/// use gecko_market_client::types::Currency;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = RestClient::new();
///     let coins = client.get_coin_markets(&MarketsRequest::new(Currency::Usd)).await?;
///     println!("Top coin: {:?}", coins.first().map(|c| &c.name));
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RestClient {
    http_client: ClientWithMiddleware,
    base_url: String,
}

impl RestClient {
    /// Create a new client with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder.
    pub fn builder() -> RestClientBuilder {
        RestClientBuilder::new()
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get a page of coins with market data.
    pub async fn get_coin_markets(
        &self,
        request: &MarketsRequest,
    ) -> Result<Vec<CoinMarketRecord>, MarketError> {
        let url = self.endpoint_url(&[paths::COINS, paths::MARKETS], request)?;
        self.get_json(url).await
    }

    /// Get a page of exchanges.
    pub async fn get_exchanges(
        &self,
        request: &ExchangesRequest,
    ) -> Result<Vec<ExchangeRecord>, MarketError> {
        let url = self.endpoint_url(&[paths::EXCHANGES], request)?;
        self.get_json(url).await
    }

    /// Get the detail record of a single coin.
    pub async fn get_coin_detail(
        &self,
        request: &CoinDetailRequest,
    ) -> Result<CoinDetailRecord, MarketError> {
        let url = self.endpoint_url(&[paths::COINS, &request.id], request)?;
        self.get_json(url).await
    }

    /// Get the historical market chart of a single coin.
    pub async fn get_market_chart(
        &self,
        request: &MarketChartRequest,
    ) -> Result<MarketChartRecord, MarketError> {
        let url = self.endpoint_url(&[paths::COINS, &request.id, paths::MARKET_CHART], request)?;
        self.get_json(url).await
    }

    /// Build the full URL for an endpoint.
    ///
    /// Path segments are percent-encoded, so identifiers can never escape their
    /// segment.
    fn endpoint_url<Q>(&self, segments: &[&str], params: &Q) -> Result<Url, MarketError>
    where
        Q: serde::Serialize + ?Sized,
    {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| {
                MarketError::InvalidInput(format!("base URL cannot take a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);

        let query_string = serde_urlencoded::to_string(params)
            .map_err(|e| MarketError::InvalidInput(e.to_string()))?;
        if !query_string.is_empty() {
            url.set_query(Some(&query_string));
        }
        Ok(url)
    }

    /// Make a GET request and decode the JSON body.
    async fn get_json<T>(&self, url: Url) -> Result<T, MarketError>
    where
        T: serde::de::DeserializeOwned,
    {
        tracing::debug!("GET {}", url);
        let response = self.http_client.get(url).send().await?;
        self.parse_response(response).await
    }

    /// Map the status and body of an upstream response.
    async fn parse_response<T>(&self, response: reqwest::Response) -> Result<T, MarketError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000));
            return Err(MarketError::Throttled { retry_after_ms });
        }

        let body = response.text().await?;

        if !status.is_success() {
            return Err(MarketError::Api(ApiError::from_body(status.as_u16(), &body)));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl Default for RestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl MarketApi for RestClient {
    async fn coin_markets(
        &self,
        request: &MarketsRequest,
    ) -> Result<Vec<CoinMarketRecord>, MarketError> {
        self.get_coin_markets(request).await
    }

    async fn exchanges(
        &self,
        request: &ExchangesRequest,
    ) -> Result<Vec<ExchangeRecord>, MarketError> {
        self.get_exchanges(request).await
    }

    async fn coin_detail(
        &self,
        request: &CoinDetailRequest,
    ) -> Result<CoinDetailRecord, MarketError> {
        self.get_coin_detail(request).await
    }

    async fn market_chart(
        &self,
        request: &MarketChartRequest,
    ) -> Result<MarketChartRecord, MarketError> {
        self.get_market_chart(request).await
    }
}

/// Builder for [`RestClient`].
pub struct RestClientBuilder {
    base_url: String,
    user_agent: Option<String>,
    transport_retries: u32,
}

impl RestClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: COINGECKO_BASE_URL.to_string(),
            user_agent: None,
            transport_retries: 0,
        }
    }

    /// Set the base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Retry connection failures and 5xx responses at the transport level.
    ///
    /// Off by default. Throttled (429) responses are never retried here; they are
    /// left to the service's own throttling policy.
    pub fn transport_retries(mut self, retries: u32) -> Self {
        self.transport_retries = retries;
        self
    }

    /// Build the client.
    pub fn build(self) -> RestClient {
        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("gecko-market-client/{}", env!("CARGO_PKG_VERSION")));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("gecko-market-client"));
        headers.insert(USER_AGENT, header_value);

        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let mut client = ClientBuilder::new(reqwest_client).with(TracingMiddleware::default());
        if self.transport_retries > 0 {
            let retry_policy =
                ExponentialBackoff::builder().build_with_max_retries(self.transport_retries);
            client = client.with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                ServerErrorsOnly,
            ));
        }

        RestClient {
            http_client: client.build(),
            base_url: self.base_url,
        }
    }
}

impl Default for RestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Transport retry classification that leaves throttling alone.
struct ServerErrorsOnly;

impl RetryableStrategy for ServerErrorsOnly {
    fn handle(
        &self,
        res: &Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(response) if response.status().is_server_error() => Some(Retryable::Transient),
            Ok(_) => None,
            Err(error) => default_on_request_failure(error),
        }
    }
}
