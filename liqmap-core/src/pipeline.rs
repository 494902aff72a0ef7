//! End-to-end heatmap computation.
//!
//! Candles and liquidation events go in, a [`HeatmapSnapshot`] comes out. Missing upstream data
//! is replaced by the synthetic generators in [`fallback`](crate::fallback) and the snapshot is
//! tagged accordingly. Each run owns its own random source; nothing is shared between runs.

use crate::{
    concentration, config::PipelineConfig, error::PipelineError, fallback, heatmap,
    interpolate::{self, sort_valid_candles},
    summary::{self, KeyLevels, RiskBuckets},
    types::{Candle, HeatmapGrid, Level, LiquidationEvent, PricePoint, Source},
};
use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Raw upstream data for one pipeline run. Empty vectors mean "unavailable".
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct MarketInput {
    pub candles: Vec<Candle>,
    pub liquidations: Vec<LiquidationEvent>,
}

impl MarketInput {
    pub fn new(candles: Vec<Candle>, liquidations: Vec<LiquidationEvent>) -> Self {
        Self {
            candles,
            liquidations,
        }
    }
}

/// Computed result handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HeatmapSnapshot {
    pub current_price: f64,
    #[serde(rename = "priceHistory")]
    pub price_history: Vec<PricePoint>,
    #[serde(rename = "liquidityLevels")]
    pub liquidity_levels: Vec<Level>,
    #[serde(rename = "heatmapData")]
    pub heatmap_data: HeatmapGrid,
    #[serde(rename = "keyLevels")]
    pub key_levels: KeyLevels,
    pub total_bid_liquidity: f64,
    pub total_ask_liquidity: f64,
    pub risk: RiskBuckets,
    pub source: Source,
}

/// Validated pipeline ready to run any number of independent computations
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Construct a pipeline, rejecting unusable configuration up front.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run with a fresh OS-seeded random source.
    pub fn run(
        &self,
        input: &MarketInput,
        now: DateTime<Utc>,
    ) -> Result<HeatmapSnapshot, PipelineError> {
        let mut rng = StdRng::from_os_rng();
        self.run_with_rng(input, now, &mut rng)
    }

    /// Run with a caller supplied random source, eg/ a seeded [`StdRng`] for reproducible output.
    pub fn run_with_rng<R>(
        &self,
        input: &MarketInput,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<HeatmapSnapshot, PipelineError>
    where
        R: Rng + ?Sized,
    {
        let config = &self.config;
        let mut source = Source::Real;

        let candles = sort_valid_candles(&input.candles);
        let current_price = match candles.last() {
            Some(latest) => latest.close,
            None => {
                warn!(
                    fallback_price = config.fallback.fallback_price,
                    "no usable candles, using fallback price"
                );
                source = Source::Fallback;
                config.fallback.fallback_price
            }
        };
        if !current_price.is_finite() || current_price <= 0.0 {
            return Err(PipelineError::InvalidPrice(current_price));
        }

        let mut price_history =
            interpolate::interpolate(&candles, &config.interpolator, now, rng);
        if price_history.is_empty() {
            warn!(current_price, "price history unavailable, generating synthetic trajectory");
            source = Source::Fallback;
            price_history = fallback::trajectory(
                current_price,
                &config.interpolator,
                &config.fallback,
                now,
                rng,
            );
        }

        let mut levels =
            concentration::analyze(&input.liquidations, current_price, &config.concentration);
        if levels.is_empty() {
            warn!(
                events = input.liquidations.len(),
                "no significant liquidation levels, generating synthetic levels"
            );
            source = Source::Fallback;
            levels = fallback::levels(
                current_price,
                config.concentration.bucket_size,
                &config.fallback,
                rng,
            );
        }

        let heatmap_data = heatmap::build(&levels, current_price, &price_history, &config.heatmap);
        let summary = summary::summarize(&levels, current_price, &config.summary);

        debug!(
            %source,
            current_price,
            points = price_history.len(),
            levels = levels.len(),
            rows = heatmap_data.len(),
            "heatmap snapshot computed"
        );

        Ok(HeatmapSnapshot {
            current_price,
            price_history,
            liquidity_levels: levels,
            heatmap_data,
            key_levels: summary.key_levels,
            total_bid_liquidity: summary.total_bid_liquidity,
            total_ask_liquidity: summary.total_ask_liquidity,
            risk: summary.risk,
            source,
        })
    }
}
