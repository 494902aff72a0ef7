/// Core value types flowing through the heatmap pipeline
///
/// Every type here is a plain value object: built fresh per pipeline run and serialised to
/// JSON for the consumers of a [`HeatmapSnapshot`](crate::pipeline::HeatmapSnapshot).
use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};

/// OHLC candle as returned by the market-data gateway
#[derive(Debug, Clone, Copy, PartialEq, Constructor, Deserialize, Serialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Candle open time (epoch ms)
    pub time: i64,
}

impl Candle {
    /// True when every price is finite and the high/low envelope is coherent
    pub fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite())
            && self.high >= self.low
    }

    /// Midpoint of the high/low range
    pub fn midpoint(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Check if the candle closed at or above its open
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

/// Aggregated forced-close volume for one interval
#[derive(Debug, Clone, Copy, PartialEq, Constructor, Deserialize, Serialize)]
pub struct LiquidationEvent {
    pub long_liquidation_usd: f64,
    pub short_liquidation_usd: f64,
    /// Interval time (epoch ms)
    pub time: i64,
}

impl LiquidationEvent {
    /// True when both volumes are finite and non-negative
    pub fn is_valid(&self) -> bool {
        self.long_liquidation_usd.is_finite()
            && self.short_liquidation_usd.is_finite()
            && self.long_liquidation_usd >= 0.0
            && self.short_liquidation_usd >= 0.0
    }

    /// Combined long + short volume in USD
    pub fn total_usd(&self) -> f64 {
        self.long_liquidation_usd + self.short_liquidation_usd
    }
}

/// One point of the interpolated price trajectory
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PricePoint {
    /// Epoch ms
    pub timestamp: i64,
    pub price: f64,
    /// Sequence position, 0..N-1
    pub index: usize,
}

/// Side a [`Level`] is inferred to defend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    #[display("support")]
    Support,
    #[display("resistance")]
    Resistance,
}

impl LevelKind {
    /// Resistance iff long volume strictly exceeds short volume; ties map to support
    pub fn from_volumes(long: f64, short: f64) -> Self {
        if long > short {
            LevelKind::Resistance
        } else {
            LevelKind::Support
        }
    }

    /// Check if this is a support level
    pub fn is_support(&self) -> bool {
        matches!(self, LevelKind::Support)
    }

    /// Check if this is a resistance level
    pub fn is_resistance(&self) -> bool {
        matches!(self, LevelKind::Resistance)
    }
}

/// Significant liquidation concentration at a rounded price
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Level {
    /// Bucket price, rounded to the analyzer grid
    pub price: f64,
    /// Aggregate volume in USD millions
    pub liquidity: f64,
    #[serde(rename = "type")]
    pub kind: LevelKind,
    /// Normalised strength in [0, 1]
    pub intensity: f64,
    /// Long volume in USD millions
    pub long_liquidations: f64,
    /// Short volume in USD millions
    pub short_liquidations: f64,
    /// Number of contributing event sides
    pub count: usize,
}

/// One (time, price) cell of the heatmap grid
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct HeatmapCell {
    pub price: f64,
    /// Normalised intensity in [0, 1]
    pub liquidity: f64,
    pub time_index: usize,
    /// Epoch ms of the price-history row
    pub timestamp: i64,
}

/// Rows are time points, columns are price buckets
pub type HeatmapGrid = Vec<Vec<HeatmapCell>>;

/// Whether a snapshot was computed purely from upstream data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    #[display("real")]
    Real,
    #[display("fallback")]
    Fallback,
}
