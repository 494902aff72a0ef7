#![forbid(unsafe_code)]
#![warn(unused, clippy::cognitive_complexity, missing_debug_implementations)]

//! # Liqmap-Core
//! Pure analytics behind the liquidation heatmap:
//! * **Price Interpolator**: dense, visually plausible price trajectory from OHLC candles.
//! * **Concentration Analyzer**: liquidation volume clustered into ranked support/resistance levels.
//! * **Heatmap Grid Builder**: levels and trajectory projected onto a price x time intensity grid.
//! * **Summary Aggregator**: nearest levels, bid/ask liquidity and risk buckets.
//!
//! Every stage is a function of its inputs plus an injected [`rand::Rng`]; there is no I/O and
//! no state shared between runs. See [`Pipeline`] for the end-to-end entry point.
//!
//! ```ignore
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! let snapshot = pipeline.run(&MarketInput::new(candles, liquidations), Utc::now())?;
//! println!("{}", serde_json::to_string(&snapshot)?);
//! ```

/// Liquidation events to ranked support/resistance levels.
pub mod concentration;

/// Tunable parameters for every stage.
pub mod config;

/// All [`Error`](std::error::Error)s generated in Liqmap-Core.
pub mod error;

/// Synthetic trajectory and levels used when upstream data is unavailable.
pub mod fallback;

/// Levels and trajectory to a price x time grid.
pub mod heatmap;

/// OHLC candles to a dense price trajectory.
pub mod interpolate;

/// End-to-end [`Pipeline`] and the [`HeatmapSnapshot`] it produces.
pub mod pipeline;

/// Nearest levels, bid/ask totals and risk buckets.
pub mod summary;

/// Value types shared by every stage.
pub mod types;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::{HeatmapSnapshot, MarketInput, Pipeline};
pub use types::{Candle, HeatmapCell, Level, LevelKind, LiquidationEvent, PricePoint, Source};
