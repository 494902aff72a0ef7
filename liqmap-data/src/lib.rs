#![forbid(unsafe_code)]
#![warn(unused, clippy::cognitive_complexity, missing_debug_implementations)]

//! # Liqmap-Data
//! REST gateways feeding the liqmap analytics core:
//! * **Coinglass**: futures price history and aggregated pair liquidation history.
//! * **Binance**: public USD-M futures klines (no liquidation history).
//!
//! Every gateway implements [`MarketDataGateway`]. Failures surface as [`GatewayError`] and
//! [`fetch_market_input`] turns them into empty inputs, so the pipeline degrades to its
//! fallback instead of erroring.

/// Binance USD-M futures kline gateway.
pub mod binance;

/// Coinglass open API gateway.
pub mod coinglass;

/// Base URLs, credentials and timeouts.
pub mod config;

/// Lenient number-or-string field deserializers.
pub mod de;

/// All [`Error`](std::error::Error)s generated in Liqmap-Data.
pub mod error;

/// [`MarketDataGateway`] trait and composition helpers.
pub mod gateway;

/// Fetch parameters.
pub mod request;

pub use binance::BinanceKlineGateway;
pub use coinglass::CoinglassGateway;
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::{MarketDataGateway, SplitGateway, fetch_market_input};
pub use request::{FetchRequest, Interval};
