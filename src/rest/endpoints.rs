//! Upstream REST API endpoint constants.

/// Base URL for the public CoinGecko REST API.
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Path segments, appended to the base URL.
pub mod paths {
    /// Coins collection (`/coins`, `/coins/{id}`).
    pub const COINS: &str = "coins";
    /// Market listing under `/coins`.
    pub const MARKETS: &str = "markets";
    /// Historical chart under `/coins/{id}`.
    pub const MARKET_CHART: &str = "market_chart";
    /// Exchange listing.
    pub const EXCHANGES: &str = "exchanges";
}
