use crate::error::GatewayError;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Candle / liquidation aggregation interval.
///
/// The `Display` strings are the wire names shared by Coinglass and Binance. Serde and
/// [`FromStr`] go through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    #[display("1m")]
    M1,
    #[display("5m")]
    M5,
    #[display("15m")]
    M15,
    #[display("30m")]
    M30,
    #[display("1h")]
    H1,
    #[display("4h")]
    H4,
    #[display("12h")]
    H12,
    #[display("1d")]
    D1,
    #[display("1w")]
    W1,
}

impl Interval {
    pub const ALL: [Interval; 9] = [
        Interval::M1,
        Interval::M5,
        Interval::M15,
        Interval::M30,
        Interval::H1,
        Interval::H4,
        Interval::H12,
        Interval::D1,
        Interval::W1,
    ];
}

impl FromStr for Interval {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Interval::ALL
            .into_iter()
            .find(|interval| interval.to_string() == s)
            .ok_or_else(|| GatewayError::InvalidRequest(format!("unsupported interval: {s}")))
    }
}

impl TryFrom<String> for Interval {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.to_string()
    }
}

/// Parameters of a single gateway fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct FetchRequest {
    /// Exchange name as the upstream API spells it (eg/ "Binance")
    pub exchange: String,
    /// Base asset ticker (eg/ "BTC") or full pair (eg/ "BTCUSDT")
    pub symbol: String,
    pub interval: Interval,
    pub limit: usize,
}

impl FetchRequest {
    pub fn new(
        exchange: impl Into<String>,
        symbol: impl Into<String>,
        interval: Interval,
        limit: usize,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            symbol: symbol.into(),
            interval,
            limit,
        }
    }

    /// Same request with a different row limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// USDT-margined perpetual pair for the requested symbol, eg/ "btc" -> "BTCUSDT".
    pub fn pair(&self) -> String {
        let symbol = self.symbol.trim().to_uppercase();
        if symbol.ends_with("USDT") || symbol.ends_with("USD") {
            symbol
        } else {
            format!("{symbol}USDT")
        }
    }
}
