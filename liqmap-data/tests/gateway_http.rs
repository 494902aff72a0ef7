use httpmock::prelude::*;
use liqmap_core::{Candle, LiquidationEvent};
use liqmap_data::{
    BinanceKlineGateway, CoinglassGateway, FetchRequest, GatewayConfig, GatewayError, Interval,
    MarketDataGateway, SplitGateway, fetch_market_input,
};
use serde_json::json;
use std::time::Duration;

fn request() -> FetchRequest {
    FetchRequest::new("Binance", "BTC", Interval::H1, 24)
}

fn coinglass(server: &MockServer) -> CoinglassGateway {
    CoinglassGateway::new(GatewayConfig::new(server.base_url()).with_api_key("test-key"))
}

#[tokio::test]
async fn test_coinglass_price_history() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/futures/price/history")
                .query_param("exchange", "Binance")
                .query_param("symbol", "BTCUSDT")
                .query_param("interval", "1h")
                .query_param("limit", "24")
                .header("CG-API-KEY", "test-key");
            then.status(200).json_body(json!({
                "code": "0",
                "msg": "success",
                "data": [
                    {"time": 1721649600000_i64, "open": "67000", "high": "67500", "low": "66800", "close": "67250"},
                    {"time": 1721653200000_i64, "open": "bad", "high": "67600", "low": "67100", "close": "67400"}
                ]
            }));
        })
        .await;

    let candles = coinglass(&server).fetch_ohlc(&request()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(
        candles,
        vec![Candle::new(67000.0, 67500.0, 66800.0, 67250.0, 1721649600000)]
    );
}

#[tokio::test]
async fn test_coinglass_liquidation_history() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/futures/liquidation/history")
                .query_param("symbol", "BTCUSDT")
                .header("CG-API-KEY", "test-key");
            then.status(200).json_body(json!({
                "code": "0",
                "data": [
                    {"time": 1721649600000_i64, "long_liquidation_usd": "2000000", "short_liquidation_usd": 1500000.5}
                ]
            }));
        })
        .await;

    let events = coinglass(&server)
        .fetch_liquidations(&request())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(
        events,
        vec![LiquidationEvent::new(2_000_000.0, 1_500_000.5, 1721649600000)]
    );
}

#[tokio::test]
async fn test_coinglass_errors() {
    struct TestCase {
        status: u16,
        body: serde_json::Value,
        expected: GatewayError,
    }

    let tests = vec![
        TestCase {
            // TC0: API level rejection
            status: 200,
            body: json!({"code": "30001", "msg": "API key missing"}),
            expected: GatewayError::Api {
                code: "30001".to_string(),
                msg: "API key missing".to_string(),
            },
        },
        TestCase {
            // TC1: API rejection with explicit null data
            status: 200,
            body: json!({"code": "40001", "msg": "Upgrade plan", "data": null}),
            expected: GatewayError::Api {
                code: "40001".to_string(),
                msg: "Upgrade plan".to_string(),
            },
        },
        TestCase {
            // TC2: no rows
            status: 200,
            body: json!({"code": "0", "data": []}),
            expected: GatewayError::Empty,
        },
        TestCase {
            // TC3: HTTP status
            status: 503,
            body: json!({}),
            expected: GatewayError::Status(503),
        },
    ];

    for (index, test) in tests.into_iter().enumerate() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/futures/liquidation/history");
                then.status(test.status).json_body(test.body.clone());
            })
            .await;

        let actual = coinglass(&server).fetch_liquidations(&request()).await;
        assert_eq!(actual, Err(test.expected), "TC{} failed", index);
    }
}

#[tokio::test]
async fn test_coinglass_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/futures/price/history");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(json!({"code": "0", "data": []}));
        })
        .await;

    let gateway = CoinglassGateway::new(
        GatewayConfig::new(server.base_url()).with_timeout(Duration::from_millis(50)),
    );

    let actual = gateway.fetch_ohlc(&request()).await;
    assert_eq!(actual, Err(GatewayError::Timeout));
}

#[tokio::test]
async fn test_binance_klines() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/fapi/v1/klines")
                .query_param("symbol", "BTCUSDT")
                .query_param("interval", "1h")
                .query_param("limit", "24");
            then.status(200).json_body(json!([
                [1721649600000_i64, "67000.0", "67500.0", "66800.0", "67250.0", "10", 1721653199999_i64, "1", 1, "1", "1", "0"],
                [1721653200000_i64, "67250.0", "67600.0", "67100.0", "67400.0", "10", 1721656799999_i64, "1", 1, "1", "1", "0"]
            ]));
        })
        .await;

    let gateway = BinanceKlineGateway::new(GatewayConfig::new(server.base_url()));
    let candles = gateway.fetch_ohlc(&request()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[1].close, 67400.0);
}

#[tokio::test]
async fn test_split_gateway_over_http() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/fapi/v1/klines");
            then.status(200).json_body(json!([
                [1721649600000_i64, "67000.0", "67500.0", "66800.0", "67250.0", "10", 1721653199999_i64, "1", 1, "1", "1", "0"]
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/futures/liquidation/history");
            then.status(500);
        })
        .await;

    let gateway = SplitGateway::new(
        BinanceKlineGateway::new(GatewayConfig::new(server.base_url())),
        CoinglassGateway::new(GatewayConfig::new(server.base_url())),
    );

    let input = fetch_market_input(&gateway, &request(), &request()).await;

    assert_eq!(input.candles.len(), 1);
    assert!(input.liquidations.is_empty());
}
