//! Example: Coin detail, price history and favorites.
//!
//! Run with: cargo run --example coin_detail -- bitcoin

use gecko_market_client::favorites::{FavoritesStore, JsonFileStore};
use gecko_market_client::types::Currency;
use gecko_market_client::{ErrorKind, MarketDataService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let id = std::env::args().nth(1).unwrap_or_else(|| "bitcoin".to_string());
    let service = MarketDataService::new();

    let detail = match service.get_coin_detail(&id, Currency::Eur).await {
        Ok(detail) => detail,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            println!("{}", err);
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    println!("=== {} ({}) ===", detail.name, detail.symbol.to_uppercase());
    if let Some(price) = detail.market_data.price_in(Currency::Eur) {
        println!("Price: {:.2} EUR", price);
    }
    println!("7d change: {:.2}%", detail.market_data.price_change_percentage_7d);
    for point in &detail.price_history {
        println!("  {}  {:.2}", point.timestamp.date(), point.price);
    }

    println!("\n=== 90 Day History ===");
    let history = service.get_coin_history(&id, Currency::Eur, 90).await?;
    if let (Some(first), Some(last)) = (history.first(), history.last()) {
        println!(
            "{} samples, {:.2} -> {:.2}",
            history.len(),
            first.price,
            last.price
        );
    }

    println!("\n=== Favorites ===");
    let store = JsonFileStore::new(std::env::temp_dir().join("gecko-market-client"));
    let mut favorites = store.load()?;
    let added = favorites.toggle(&detail.id);
    store.save(&favorites)?;
    println!(
        "{} {} favorites ({})",
        if added { "Added to" } else { "Removed from" },
        store.path().display(),
        favorites.ids().join(", ")
    );

    let favorite_coins = service.list_favorite_coins(&favorites, Currency::Eur).await?;
    for coin in favorite_coins {
        println!("{:<12} {:.2} EUR", coin.name, coin.current_price);
    }

    Ok(())
}
