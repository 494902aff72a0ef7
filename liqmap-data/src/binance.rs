use crate::{
    config::GatewayConfig, de::de_opt_f64, error::GatewayError, gateway::MarketDataGateway,
    request::FetchRequest,
};
use async_trait::async_trait;
use liqmap_core::{Candle, LiquidationEvent};
use reqwest::Client;
use serde::{Deserialize, de::IgnoredAny};
use tracing::debug;

const KLINES_PATH: &str = "/fapi/v1/klines";

/// Binance USD-M futures kline row.
///
/// ### Raw Payload Examples
/// See docs: <https://developers.binance.com/docs/derivatives/usds-margined-futures/market-data/rest-api/Kline-Candlestick-Data>
/// ```json
/// [
///   1499040000000,
///   "0.01634790",
///   "0.80000000",
///   "0.01575800",
///   "0.01577100",
///   "148976.11427815",
///   1499644799999,
///   "2434.19055334",
///   308,
///   "1756.87402397",
///   "28.46694368",
///   "0"
/// ]
/// ```
#[derive(Debug, Deserialize)]
pub struct BinanceKline(
    i64,                                             // 0: Open time
    #[serde(deserialize_with = "de_opt_f64")] Option<f64>, // 1: Open
    #[serde(deserialize_with = "de_opt_f64")] Option<f64>, // 2: High
    #[serde(deserialize_with = "de_opt_f64")] Option<f64>, // 3: Low
    #[serde(deserialize_with = "de_opt_f64")] Option<f64>, // 4: Close
    IgnoredAny,                                      // 5: Volume
    IgnoredAny,                                      // 6: Close time
    IgnoredAny,                                      // 7: Quote asset volume
    IgnoredAny,                                      // 8: Number of trades
    IgnoredAny,                                      // 9: Taker buy base asset volume
    IgnoredAny,                                      // 10: Taker buy quote asset volume
    IgnoredAny,                                      // 11: Ignore
);

impl BinanceKline {
    fn into_candle(self) -> Option<Candle> {
        Some(Candle::new(self.1?, self.2?, self.3?, self.4?, self.0))
    }
}

/// Public Binance futures klines. Needs no credentials, provides no liquidation history.
#[derive(Debug, Clone)]
pub struct BinanceKlineGateway {
    client: Client,
    config: GatewayConfig,
}

impl BinanceKlineGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: GatewayConfig) -> Self {
        Self { client, config }
    }
}

impl Default for BinanceKlineGateway {
    fn default() -> Self {
        Self::new(GatewayConfig::binance())
    }
}

#[async_trait]
impl MarketDataGateway for BinanceKlineGateway {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn fetch_ohlc(&self, request: &FetchRequest) -> Result<Vec<Candle>, GatewayError> {
        let url = self.config.endpoint(KLINES_PATH)?;
        let interval = request.interval.to_string();
        let limit = request.limit.to_string();
        let pair = request.pair();

        let response = self
            .client
            .get(url)
            .query(&[
                ("symbol", pair.as_str()),
                ("interval", interval.as_str()),
                ("limit", limit.as_str()),
            ])
            .timeout(self.config.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Status(response.status().as_u16()));
        }

        let rows: Vec<serde_json::Value> = response.json().await?;
        let received = rows.len();

        let candles = parse_klines(rows);
        debug!(
            symbol = %pair,
            received,
            parsed = candles.len(),
            "binance klines"
        );

        if candles.is_empty() {
            return Err(GatewayError::Empty);
        }
        Ok(candles)
    }

    async fn fetch_liquidations(
        &self,
        _: &FetchRequest,
    ) -> Result<Vec<LiquidationEvent>, GatewayError> {
        Err(GatewayError::Unsupported {
            gateway: self.name().to_string(),
            operation: "liquidation history".to_string(),
        })
    }
}

/// Parse raw kline rows, skipping any row that is malformed.
pub fn parse_klines(rows: Vec<serde_json::Value>) -> Vec<Candle> {
    rows.into_iter()
        .filter_map(|row| serde_json::from_value::<BinanceKline>(row).ok())
        .filter_map(BinanceKline::into_candle)
        .filter(Candle::is_valid)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_klines() {
        let input = r#"
        [
            [1721649600000, "67000.1", "67500.0", "66800.5", "67250.0", "100.5", 1721653199999, "6700000", 1000, "50", "3350000", "0"],
            [1721653200000, "67250.0", "nope", "67100.0", "67400.0", "1", 1721656799999, "1", 1, "1", "1", "0"],
            [1721656800000, "67400.0"],
            {"open": "1"},
            [1721660400000, "67400.0", "67600.0", "67300.0", "67350.0", "1", 1721663999999, "1", 1, "1", "1", "0"]
        ]
        "#;

        let rows: Vec<serde_json::Value> = serde_json::from_str(input).unwrap();
        let candles = parse_klines(rows);

        assert_eq!(
            candles,
            vec![
                Candle::new(67000.1, 67500.0, 66800.5, 67250.0, 1721649600000),
                Candle::new(67400.0, 67600.0, 67300.0, 67350.0, 1721660400000),
            ]
        );
    }

    #[tokio::test]
    async fn test_liquidations_unsupported() {
        let gateway = BinanceKlineGateway::default();
        let request = FetchRequest::new("Binance", "BTC", crate::request::Interval::H1, 24);

        let actual = gateway.fetch_liquidations(&request).await;

        assert_eq!(
            actual,
            Err(GatewayError::Unsupported {
                gateway: "binance".to_string(),
                operation: "liquidation history".to_string(),
            })
        );
    }
}
