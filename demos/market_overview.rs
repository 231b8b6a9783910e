//! Example: Browsing the market listing.
//!
//! Fetches the top coins and exchanges, then filters, sorts and converts locally.
//! Repeated listing calls within five minutes are served from the cache.
//!
//! Run with: cargo run --example market_overview

use gecko_market_client::MarketDataService;
use gecko_market_client::query::{SortOrder, convert, search_coins, sort_coins};
use gecko_market_client::types::Currency;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let service = MarketDataService::new();
    let currency: Currency = std::env::args()
        .nth(1)
        .as_deref()
        .unwrap_or("usd")
        .parse()?;

    println!("=== Top Coins ({}) ===", currency.label());
    let mut coins = service.list_coins(currency, 1, 20).await?;
    for coin in &coins {
        let rank = coin
            .market_cap_rank
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>4} {:<8} {:>16.4} {:>8.2}%",
            rank,
            coin.symbol.to_uppercase(),
            coin.current_price,
            coin.price_change_percentage_24h
        );
    }

    println!("\n=== Search \"bit\" ===");
    for coin in search_coins(&coins, "bit") {
        println!("{} ({})", coin.name, coin.symbol.to_uppercase());
    }

    println!("\n=== Cheapest Five ===");
    sort_coins(&mut coins, SortOrder::PriceAsc);
    for coin in coins.iter().take(5) {
        println!("{:<12} {}", coin.name, coin.current_price);
    }

    println!("\n=== Conversion ===");
    let amount = convert(0.5, "btc", "eth", &coins, currency)?;
    println!("0.5 BTC = {:.8} ETH", amount);

    println!("\n=== Exchanges ===");
    let exchanges = service.list_exchanges(1, 10).await?;
    for exchange in &exchanges {
        println!(
            "{:<24} trust {:>2}  {}",
            exchange.name, exchange.trust_score, exchange.country
        );
    }

    Ok(())
}
