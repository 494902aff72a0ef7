use liqmap_data::{FetchRequest, Interval};
use std::{fmt::Display, net::SocketAddr, str::FromStr, time::Duration};
use tracing::warn;

/// Runtime configuration of the snapshot server.
///
/// Every field is read from a `LIQMAP_*` env var, falling back to the default when the var is
/// absent or unparsable.
#[derive(Clone, PartialEq)]
pub struct ServerConfig {
    /// `LIQMAP_WS_ADDR`
    pub ws_addr: SocketAddr,
    /// `LIQMAP_BUFFER_SIZE`, broadcast channel capacity
    pub buffer_size: usize,
    /// `LIQMAP_POLL_SECS`
    pub poll_interval: Duration,
    /// `LIQMAP_SYMBOLS`, comma separated base tickers
    pub symbols: Vec<String>,
    /// `LIQMAP_EXCHANGE`
    pub exchange: String,
    /// `LIQMAP_INTERVAL`
    pub interval: Interval,
    /// `LIQMAP_CANDLE_LIMIT`
    pub candle_limit: usize,
    /// `LIQMAP_LIQ_LIMIT`
    pub liquidation_limit: usize,
    /// `COINGLASS_API_KEY`
    pub coinglass_api_key: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("ws_addr", &self.ws_addr)
            .field("buffer_size", &self.buffer_size)
            .field("poll_interval", &self.poll_interval)
            .field("symbols", &self.symbols)
            .field("exchange", &self.exchange)
            .field("interval", &self.interval)
            .field("candle_limit", &self.candle_limit)
            .field("liquidation_limit", &self.liquidation_limit)
            .field(
                "coinglass_api_key",
                &self.coinglass_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ws_addr: SocketAddr::from(([0, 0, 0, 0], 9002)),
            buffer_size: 64,
            poll_interval: Duration::from_secs(60),
            symbols: vec!["BTC".to_string(), "ETH".to_string()],
            exchange: "Binance".to_string(),
            interval: Interval::H1,
            candle_limit: 24,
            liquidation_limit: 24,
            coinglass_api_key: None,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        let symbols = lookup("LIQMAP_SYMBOLS")
            .map(|value| parse_symbols(&value))
            .filter(|symbols| !symbols.is_empty())
            .unwrap_or(default.symbols);

        let exchange = lookup("LIQMAP_EXCHANGE")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(default.exchange);

        let coinglass_api_key = lookup("COINGLASS_API_KEY")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Self {
            ws_addr: parse_or(&lookup, "LIQMAP_WS_ADDR", default.ws_addr),
            buffer_size: parse_or(&lookup, "LIQMAP_BUFFER_SIZE", default.buffer_size).max(1),
            poll_interval: Duration::from_secs(
                parse_or(&lookup, "LIQMAP_POLL_SECS", default.poll_interval.as_secs()).max(1),
            ),
            symbols,
            exchange,
            interval: parse_or(&lookup, "LIQMAP_INTERVAL", default.interval),
            candle_limit: parse_or(&lookup, "LIQMAP_CANDLE_LIMIT", default.candle_limit).max(1),
            liquidation_limit: parse_or(&lookup, "LIQMAP_LIQ_LIMIT", default.liquidation_limit)
                .max(1),
            coinglass_api_key,
        }
    }

    pub fn candle_request(&self, symbol: &str) -> FetchRequest {
        FetchRequest::new(&self.exchange, symbol, self.interval, self.candle_limit)
    }

    pub fn liquidation_request(&self, symbol: &str) -> FetchRequest {
        FetchRequest::new(&self.exchange, symbol, self.interval, self.liquidation_limit)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };

    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(error) => {
            warn!(key, value = %raw, %error, %default, "invalid env var, using default");
            default
        }
    }
}

fn parse_symbols(raw: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in raw
        .split(',')
        .map(|symbol| symbol.trim().to_uppercase())
        .filter(|symbol| !symbol.is_empty())
    {
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const DEFAULT_WS_ADDR: &str = "0.0.0.0:9002";

    fn config_from(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]);

        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.ws_addr.to_string(), DEFAULT_WS_ADDR);
        assert_eq!(config.symbols, vec!["BTC", "ETH"]);
        assert_eq!(config.coinglass_api_key, None);
    }

    #[test]
    fn test_from_lookup() {
        let config = config_from(&[
            ("LIQMAP_WS_ADDR", "127.0.0.1:9100"),
            ("LIQMAP_BUFFER_SIZE", "8"),
            ("LIQMAP_POLL_SECS", "15"),
            ("LIQMAP_SYMBOLS", " sol, btc ,,SOL"),
            ("LIQMAP_EXCHANGE", "OKX"),
            ("LIQMAP_INTERVAL", "4h"),
            ("LIQMAP_CANDLE_LIMIT", "48"),
            ("LIQMAP_LIQ_LIMIT", "12"),
            ("COINGLASS_API_KEY", "key"),
        ]);

        assert_eq!(config.ws_addr, SocketAddr::from(([127, 0, 0, 1], 9100)));
        assert_eq!(config.buffer_size, 8);
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.symbols, vec!["SOL", "BTC"]);
        assert_eq!(config.exchange, "OKX");
        assert_eq!(config.interval, Interval::H4);
        assert_eq!(config.candle_limit, 48);
        assert_eq!(config.liquidation_limit, 12);
        assert_eq!(config.coinglass_api_key.as_deref(), Some("key"));
        assert!(!format!("{config:?}").contains("\"key\""));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        struct TestCase {
            key: &'static str,
            value: &'static str,
            check: fn(&ServerConfig) -> bool,
        }

        let tests = vec![
            TestCase {
                // TC0: unparsable address
                key: "LIQMAP_WS_ADDR",
                value: "localhost",
                check: |config| config.ws_addr.to_string() == DEFAULT_WS_ADDR,
            },
            TestCase {
                // TC1: zero capacity clamped
                key: "LIQMAP_BUFFER_SIZE",
                value: "0",
                check: |config| config.buffer_size == 1,
            },
            TestCase {
                // TC2: zero poll period clamped
                key: "LIQMAP_POLL_SECS",
                value: "0",
                check: |config| config.poll_interval == Duration::from_secs(1),
            },
            TestCase {
                // TC3: unknown interval
                key: "LIQMAP_INTERVAL",
                value: "2h",
                check: |config| config.interval == Interval::H1,
            },
            TestCase {
                // TC4: no symbols
                key: "LIQMAP_SYMBOLS",
                value: " , ",
                check: |config| config.symbols == vec!["BTC", "ETH"],
            },
            TestCase {
                // TC5: blank key treated as absent
                key: "COINGLASS_API_KEY",
                value: "  ",
                check: |config| config.coinglass_api_key.is_none(),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let config = config_from(&[(test.key, test.value)]);
            assert!((test.check)(&config), "TC{} failed", index);
        }
    }

    #[test]
    fn test_requests() {
        let config = ServerConfig::default();

        let candles = config.candle_request("BTC");
        let liquidations = config.liquidation_request("BTC");

        assert_eq!(candles.exchange, "Binance");
        assert_eq!(candles.interval, Interval::H1);
        assert_eq!(candles.limit, 24);
        assert_eq!(liquidations.limit, 24);
        assert_eq!(liquidations.pair(), "BTCUSDT");
    }
}
