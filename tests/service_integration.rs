use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gecko_market_client::error::{ErrorKind, MarketError};
use gecko_market_client::rate_limit::RateLimitConfig;
use gecko_market_client::rest::RestClient;
use gecko_market_client::types::Currency;
use gecko_market_client::{MarketDataService, ServiceConfig};

fn fast_config() -> ServiceConfig {
    ServiceConfig {
        rate_limit: RateLimitConfig {
            min_spacing: Duration::from_millis(10),
            enabled: true,
        },
        throttle_cooldown: Duration::from_millis(50),
        ..ServiceConfig::default()
    }
}

fn build_service(server: &MockServer) -> MarketDataService {
    MarketDataService::builder()
        .api(RestClient::builder().base_url(server.uri()).build())
        .config(fast_config())
        .build()
}

fn detail_body() -> serde_json::Value {
    serde_json::json!({
        "id": "bitcoin",
        "symbol": "btc",
        "name": "Bitcoin",
        "image": { "large": "https://example.com/btc.png" },
        "description": { "en": "<p>Peer-to-peer cash</p>" },
        "market_data": {
            "current_price": { "usd": 50000.0, "eur": 46000.0 },
            "market_cap": { "usd": 980000000000.0 },
            "price_change_percentage_24h": 1.25,
            "market_cap_rank": 1,
            "circulating_supply": 19500000.0
        }
    })
}

fn chart_body() -> serde_json::Value {
    serde_json::json!({
        "prices": [
            [1700000000000i64, 35000.0],
            [1700086400000i64, 36000.0],
            [1700172800000i64, 37000.0]
        ]
    })
}

#[tokio::test]
async fn test_list_coins_end_to_end() {
    let server = MockServer::start().await;
    let response = serde_json::json!([
        { "id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "current_price": 50000 },
        { "id": "ethereum", "symbol": "eth", "name": "Ethereum",
          "current_price": 3000, "market_cap_rank": 2 }
    ]);

    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .and(query_param("vs_currency", "usd"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .expect(1)
        .mount(&server)
        .await;

    let service = build_service(&server);
    let coins = service.list_coins(Currency::Usd, 1, 2).await.unwrap();

    assert_eq!(coins.len(), 2);
    assert_eq!(coins[0].id, "bitcoin");
    assert_eq!(coins[0].current_price, 50000.0);
    assert_eq!(coins[0].market_cap_rank, None);
    assert_eq!(coins[1].id, "ethereum");
    assert_eq!(coins[1].current_price, 3000.0);
    assert_eq!(coins[1].market_cap_rank, Some(2));

    // Served from cache; the mock expects exactly one request.
    let again = service.list_coins(Currency::Usd, 1, 2).await.unwrap();
    assert_eq!(again, coins);
}

#[tokio::test]
async fn test_list_exchanges_applies_markers() {
    let server = MockServer::start().await;
    let response = serde_json::json!([
        { "id": "kraken", "name": "Kraken", "country": "United States",
          "url": "https://www.kraken.com", "year_established": 2011, "trust_score": 10 },
        { "id": "anon", "name": "Anon DEX", "country": null, "url": "" }
    ]);

    Mock::given(method("GET"))
        .and(path("/exchanges"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let service = build_service(&server);
    let exchanges = service.list_exchanges(1, 50).await.unwrap();

    assert_eq!(exchanges[0].country, "United States");
    assert_eq!(exchanges[0].year_established, Some(2011));
    assert_eq!(exchanges[1].country, "N/A");
    assert_eq!(exchanges[1].url, "#");
    assert_eq!(exchanges[1].trust_score, 0);
}

#[tokio::test]
async fn test_get_coin_detail_combines_both_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins/bitcoin"))
        .and(query_param("market_data", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .and(query_param("vs_currency", "eur"))
        .and(query_param("days", "7"))
        .and(query_param("interval", "daily"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body()))
        .expect(1)
        .mount(&server)
        .await;

    let service = build_service(&server);
    let detail = service
        .get_coin_detail("bitcoin", Currency::Eur)
        .await
        .unwrap();

    assert_eq!(detail.name, "Bitcoin");
    assert_eq!(detail.image, "https://example.com/btc.png");
    assert_eq!(detail.description, "<p>Peer-to-peer cash</p>");
    assert_eq!(detail.market_data.price_in(Currency::Eur), Some(46000.0));
    assert_eq!(detail.market_data.circulating_supply, Some(19_500_000.0));
    assert_eq!(detail.market_data.total_supply, None);
    let prices: Vec<f64> = detail.price_history.iter().map(|p| p.price).collect();
    assert_eq!(prices, [35000.0, 36000.0, 37000.0]);

    service
        .get_coin_detail("bitcoin", Currency::Eur)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_coin_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins/dogecoin2"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({ "error": "coin not found" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/coins/dogecoin2/market_chart"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({ "error": "coin not found" })),
        )
        .mount(&server)
        .await;

    let service = build_service(&server);
    let err = service
        .get_coin_detail("dogecoin2", Currency::Usd)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Cryptocurrency with ID \"dogecoin2\" not found");
}

#[tokio::test]
async fn test_throttled_once_then_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/exchanges"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/exchanges"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{ "id": "binance", "name": "Binance" }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let service = build_service(&server);
    let exchanges = service.list_exchanges(1, 50).await.unwrap();

    assert_eq!(exchanges.len(), 1);
    assert_eq!(exchanges[0].id, "binance");
}

#[tokio::test]
async fn test_throttled_twice_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let service = build_service(&server);
    let err = service
        .list_coins(Currency::Usd, 1, 50)
        .await
        .unwrap_err();

    assert!(err.is_throttled());
}

#[tokio::test]
async fn test_non_array_body_is_validation_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": "oops" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let service = build_service(&server);
    let first = service.list_coins(Currency::Usd, 1, 50).await.unwrap_err();
    assert_eq!(first.kind(), ErrorKind::Validation);

    // Failures are never cached, so the second call goes upstream again.
    let second = service.list_coins(Currency::Usd, 1, 50).await.unwrap_err();
    assert_eq!(second.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_detail_without_market_data_is_validation_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins/bitcoin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body()))
        .mount(&server)
        .await;

    let service = build_service(&server);
    let err = service
        .get_coin_detail("bitcoin", Currency::Usd)
        .await
        .unwrap_err();

    assert!(matches!(err, MarketError::Validation(_)));
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "status": { "error_code": 500, "error_message": "Internal maintenance" }
        })))
        .mount(&server)
        .await;

    let service = build_service(&server);
    let err = service
        .get_coin_history("bitcoin", Currency::Usd, 90)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("Internal maintenance"));
}
