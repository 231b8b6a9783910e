//! Client-side search, sorting and conversion over already fetched data.
//!
//! None of these touch the network. They operate on the slices returned by
//! [`MarketDataService`](crate::service::MarketDataService).

use std::cmp::Ordering;

use crate::error::MarketError;
use crate::model::{Coin, Exchange};
use crate::types::Currency;

/// Coins whose name or symbol contains `term`, ignoring case.
///
/// A blank term matches everything.
pub fn search_coins<'a>(coins: &'a [Coin], term: &str) -> Vec<&'a Coin> {
    let term = term.trim().to_lowercase();
    coins
        .iter()
        .filter(|coin| {
            term.is_empty()
                || coin.name.to_lowercase().contains(&term)
                || coin.symbol.to_lowercase().contains(&term)
        })
        .collect()
}

/// Exchanges whose name contains `term`, ignoring case.
pub fn search_exchanges<'a>(exchanges: &'a [Exchange], term: &str) -> Vec<&'a Exchange> {
    let term = term.trim().to_lowercase();
    exchanges
        .iter()
        .filter(|exchange| term.is_empty() || exchange.name.to_lowercase().contains(&term))
        .collect()
}

/// Display order of a coin listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Upstream order (descending market cap)
    #[default]
    Default,
    /// Cheapest first
    PriceAsc,
    /// Most expensive first
    PriceDesc,
}

/// Sort coins in place. The sort is stable, so equal prices keep upstream order.
pub fn sort_coins(coins: &mut [Coin], order: SortOrder) {
    match order {
        SortOrder::Default => {}
        SortOrder::PriceAsc => coins.sort_by(|a, b| compare_prices(a, b)),
        SortOrder::PriceDesc => coins.sort_by(|a, b| compare_prices(b, a)),
    }
}

fn compare_prices(a: &Coin, b: &Coin) -> Ordering {
    a.current_price.total_cmp(&b.current_price)
}

/// Convert `amount` between two units.
///
/// Each unit is either the quote currency code (for example `"usd"`) or the symbol
/// of one of `coins`, both matched case-insensitively. Coin prices are read as
/// [`Coin::current_price`], which must be expressed in `quote`:
///
/// - coin to quote multiplies by the coin's price
/// - quote to coin divides by the coin's price
/// - coin to coin converts through the quote currency
///
/// # Example
///
/// ```rust
/// use gecko_market_client::model::Coin;
/// use gecko_market_client::query::convert;
/// use gecko_market_client::types::Currency;
///
/// let btc = Coin {
///     id: "bitcoin".into(),
///     symbol: "btc".into(),
///     name: "Bitcoin".into(),
///     image: String::new(),
///     current_price: 50_000.0,
///     market_cap: 0.0,
///     market_cap_rank: Some(1),
///     price_change_percentage_24h: 0.0,
///     total_volume: 0.0,
///     high_24h: 0.0,
///     low_24h: 0.0,
/// };
///
/// let usd = convert(2.0, "BTC", "USD", &[btc], Currency::Usd).unwrap();
/// assert_eq!(usd, 100_000.0);
/// ```
pub fn convert(
    amount: f64,
    from: &str,
    to: &str,
    coins: &[Coin],
    quote: Currency,
) -> Result<f64, MarketError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(MarketError::InvalidInput(format!(
            "Amount must be a non-negative number, got {}",
            amount
        )));
    }

    let from = Unit::resolve(from, coins, quote)?;
    let to = Unit::resolve(to, coins, quote)?;

    let in_quote = match from {
        Unit::Quote => amount,
        Unit::Coin(price) => amount * price,
    };
    Ok(match to {
        Unit::Quote => in_quote,
        Unit::Coin(price) => in_quote / price,
    })
}

enum Unit {
    Quote,
    /// A coin with its price in the quote currency
    Coin(f64),
}

impl Unit {
    fn resolve(code: &str, coins: &[Coin], quote: Currency) -> Result<Self, MarketError> {
        let code = code.trim();
        if code.eq_ignore_ascii_case(quote.as_str()) {
            return Ok(Unit::Quote);
        }

        let coin = coins
            .iter()
            .find(|coin| coin.symbol.eq_ignore_ascii_case(code))
            .ok_or_else(|| MarketError::InvalidInput(format!("Unknown currency: {}", code)))?;

        if !coin.current_price.is_finite() || coin.current_price <= 0.0 {
            return Err(MarketError::InvalidInput(format!(
                "No usable price for {}",
                coin.symbol.to_uppercase()
            )));
        }
        Ok(Unit::Coin(coin.current_price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(id: &str, symbol: &str, name: &str, price: f64) -> Coin {
        Coin {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            image: String::new(),
            current_price: price,
            market_cap: 0.0,
            market_cap_rank: None,
            price_change_percentage_24h: 0.0,
            total_volume: 0.0,
            high_24h: 0.0,
            low_24h: 0.0,
        }
    }

    fn sample() -> Vec<Coin> {
        vec![
            coin("bitcoin", "btc", "Bitcoin", 50_000.0),
            coin("ethereum", "eth", "Ethereum", 2_500.0),
            coin("wrapped-bitcoin", "wbtc", "Wrapped Bitcoin", 50_000.0),
            coin("dead", "dead", "Dead Coin", 0.0),
        ]
    }

    fn ids(coins: &[Coin]) -> Vec<&str> {
        coins.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_search_coins() {
        let coins = sample();

        let found: Vec<_> = search_coins(&coins, "BITCOIN").iter().map(|c| c.id.as_str()).collect();
        assert_eq!(found, ["bitcoin", "wrapped-bitcoin"]);

        let found = search_coins(&coins, "eth");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "ethereum");

        assert_eq!(search_coins(&coins, "  ").len(), coins.len());
    }

    #[test]
    fn test_search_exchanges() {
        let exchange = |name: &str| Exchange {
            id: name.to_lowercase(),
            name: name.to_string(),
            image: String::new(),
            trust_score: 0,
            trust_score_rank: None,
            trade_volume_24h_btc: 0.0,
            trade_volume_24h_btc_normalized: 0.0,
            country: crate::model::UNKNOWN_COUNTRY.to_string(),
            year_established: None,
            url: crate::model::PLACEHOLDER_URL.to_string(),
        };
        let exchanges = vec![exchange("Binance"), exchange("Kraken"), exchange("Binance US")];

        let found = search_exchanges(&exchanges, "binance");
        assert_eq!(found.len(), 2);
        assert!(search_exchanges(&exchanges, "coinbase").is_empty());
    }

    #[test]
    fn test_sort_coins_is_stable() {
        let mut coins = sample();

        sort_coins(&mut coins, SortOrder::PriceDesc);
        assert_eq!(ids(&coins), ["bitcoin", "wrapped-bitcoin", "ethereum", "dead"]);

        sort_coins(&mut coins, SortOrder::PriceAsc);
        assert_eq!(ids(&coins), ["dead", "ethereum", "bitcoin", "wrapped-bitcoin"]);

        let before = ids(&coins).into_iter().map(String::from).collect::<Vec<_>>();
        sort_coins(&mut coins, SortOrder::Default);
        assert_eq!(ids(&coins), before);
    }

    #[test]
    fn test_convert_directions() {
        let coins = sample();

        assert_eq!(convert(2.0, "btc", "usd", &coins, Currency::Usd).unwrap(), 100_000.0);
        assert_eq!(convert(5_000.0, "USD", "ETH", &coins, Currency::Usd).unwrap(), 2.0);
        assert_eq!(convert(1.0, "BTC", "ETH", &coins, Currency::Usd).unwrap(), 20.0);
        assert_eq!(convert(7.0, "usd", "usd", &coins, Currency::Usd).unwrap(), 7.0);
        assert_eq!(convert(0.0, "btc", "usd", &coins, Currency::Usd).unwrap(), 0.0);
    }

    #[test]
    fn test_convert_rejects_bad_input() {
        let coins = sample();

        let err = convert(1.0, "doge", "usd", &coins, Currency::Usd).unwrap_err();
        assert!(matches!(err, MarketError::InvalidInput(_)));

        assert!(convert(-1.0, "btc", "usd", &coins, Currency::Usd).is_err());
        assert!(convert(f64::NAN, "btc", "usd", &coins, Currency::Usd).is_err());
        assert!(convert(1.0, "usd", "dead", &coins, Currency::Usd).is_err());
        // "usd" is only the quote when the listing is quoted in usd
        assert!(convert(1.0, "btc", "usd", &coins, Currency::Eur).is_err());
    }
}
