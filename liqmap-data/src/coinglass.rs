use crate::{
    config::GatewayConfig,
    de::{de_code, de_opt_f64, de_opt_i64},
    error::GatewayError,
    gateway::MarketDataGateway,
    request::FetchRequest,
};
use async_trait::async_trait;
use liqmap_core::{Candle, LiquidationEvent};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

/// Header carrying the Coinglass API key
pub const API_KEY_HEADER: &str = "CG-API-KEY";

const PRICE_HISTORY_PATH: &str = "/api/futures/price/history";
const LIQUIDATION_HISTORY_PATH: &str = "/api/futures/liquidation/history";

/// Coinglass response envelope.
///
/// See docs: <https://docs.coinglass.com/reference/response-and-error-code>
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct CoinglassResponse<T> {
    #[serde(deserialize_with = "de_code")]
    pub code: String,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<T>>,
}

/// Coinglass futures price history row.
///
/// See docs: <https://docs.coinglass.com/reference/price-ohlc-history>
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoinglassOhlc {
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub time: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub open: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub high: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub low: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub close: Option<f64>,
}

impl CoinglassOhlc {
    fn into_candle(self) -> Option<Candle> {
        Some(Candle::new(
            self.open?,
            self.high?,
            self.low?,
            self.close?,
            self.time?,
        ))
    }
}

/// Coinglass pair liquidation history row.
///
/// See docs: <https://docs.coinglass.com/reference/pair-liquidation-history>
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoinglassLiquidation {
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub time: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub long_liquidation_usd: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub short_liquidation_usd: Option<f64>,
}

impl CoinglassLiquidation {
    fn into_event(self) -> Option<LiquidationEvent> {
        Some(LiquidationEvent::new(
            self.long_liquidation_usd?,
            self.short_liquidation_usd?,
            self.time?,
        ))
    }
}

/// Coinglass open API gateway: futures price history and pair liquidation history.
#[derive(Debug, Clone)]
pub struct CoinglassGateway {
    client: Client,
    config: GatewayConfig,
}

impl CoinglassGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Construct with a shared [`Client`] (connection pool reuse).
    pub fn with_client(client: Client, config: GatewayConfig) -> Self {
        Self { client, config }
    }

    async fn get<T>(&self, path: &str, request: &FetchRequest) -> Result<Vec<T>, GatewayError>
    where
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(path)?;
        let interval = request.interval.to_string();
        let limit = request.limit.to_string();
        let pair = request.pair();

        let mut builder = self
            .client
            .get(url)
            .query(&[
                ("exchange", request.exchange.as_str()),
                ("symbol", pair.as_str()),
                ("interval", interval.as_str()),
                ("limit", limit.as_str()),
            ])
            .timeout(self.config.timeout);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.header(API_KEY_HEADER, api_key);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(GatewayError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let envelope: CoinglassResponse<T> =
            serde_json::from_str(&body).map_err(|error| GatewayError::Decode(error.to_string()))?;

        if envelope.code != "0" {
            return Err(GatewayError::Api {
                code: envelope.code,
                msg: envelope.msg.unwrap_or_default(),
            });
        }

        Ok(envelope.data.unwrap_or_default())
    }
}

#[async_trait]
impl MarketDataGateway for CoinglassGateway {
    fn name(&self) -> &'static str {
        "coinglass"
    }

    async fn fetch_ohlc(&self, request: &FetchRequest) -> Result<Vec<Candle>, GatewayError> {
        let rows: Vec<CoinglassOhlc> = self.get(PRICE_HISTORY_PATH, request).await?;
        let received = rows.len();

        let candles = parse_candles(rows);
        debug!(
            symbol = %request.symbol,
            received,
            parsed = candles.len(),
            "coinglass price history"
        );

        if candles.is_empty() {
            return Err(GatewayError::Empty);
        }
        Ok(candles)
    }

    async fn fetch_liquidations(
        &self,
        request: &FetchRequest,
    ) -> Result<Vec<LiquidationEvent>, GatewayError> {
        let rows: Vec<CoinglassLiquidation> = self.get(LIQUIDATION_HISTORY_PATH, request).await?;
        let received = rows.len();

        let events = parse_liquidations(rows);
        debug!(
            symbol = %request.symbol,
            received,
            parsed = events.len(),
            "coinglass liquidation history"
        );

        if events.is_empty() {
            return Err(GatewayError::Empty);
        }
        Ok(events)
    }
}

/// Convert rows to candles, skipping rows with missing or malformed fields.
pub fn parse_candles(rows: Vec<CoinglassOhlc>) -> Vec<Candle> {
    rows.into_iter()
        .filter_map(CoinglassOhlc::into_candle)
        .filter(Candle::is_valid)
        .collect()
}

/// Convert rows to liquidation events, skipping rows with missing or malformed fields.
pub fn parse_liquidations(rows: Vec<CoinglassLiquidation>) -> Vec<LiquidationEvent> {
    rows.into_iter()
        .filter_map(CoinglassLiquidation::into_event)
        .filter(LiquidationEvent::is_valid)
        .collect()
}
