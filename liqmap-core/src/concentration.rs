//! Liquidation events → ranked support/resistance levels.
//!
//! Liquidation records carry volume but no price, so each event side is placed at a synthetic
//! offset from the current price that grows with its volume: longs above, shorts below. This is a
//! heuristic proxy for price impact, not a reconstruction of where liquidations happened.

use crate::{
    config::ConcentrationConfig,
    types::{Level, LevelKind, LiquidationEvent},
};
use indexmap::IndexMap;
use tracing::debug;

const USD_PER_MILLION: f64 = 1_000_000.0;

/// Accumulated volume for one rounded price
#[derive(Debug, Clone, Default)]
struct Bucket {
    price: f64,
    long_usd: f64,
    short_usd: f64,
    total_usd: f64,
    count: usize,
}

/// Cluster `events` around `current_price` into at most `config.max_levels` levels, ranked by
/// liquidity descending. Equal liquidity keeps the order buckets were first touched.
///
/// Returns an empty sequence when nothing clears the significance floor.
pub fn analyze(
    events: &[LiquidationEvent],
    current_price: f64,
    config: &ConcentrationConfig,
) -> Vec<Level> {
    let mut buckets: IndexMap<i64, Bucket> = IndexMap::new();
    let mut skipped = 0usize;

    for event in events {
        if !event.is_valid() {
            skipped += 1;
            continue;
        }

        let total = event.total_usd();
        if total <= 0.0 {
            continue;
        }

        let offset = distance_factor(total, config);

        if event.long_liquidation_usd > 0.0 {
            let bucket = bucket_entry(&mut buckets, current_price + offset, config.bucket_size);
            bucket.long_usd += event.long_liquidation_usd;
            bucket.total_usd += event.long_liquidation_usd;
            bucket.count += 1;
        }

        if event.short_liquidation_usd > 0.0 {
            let bucket = bucket_entry(&mut buckets, current_price - offset, config.bucket_size);
            bucket.short_usd += event.short_liquidation_usd;
            bucket.total_usd += event.short_liquidation_usd;
            bucket.count += 1;
        }
    }

    if skipped > 0 {
        debug!(skipped, "skipped malformed liquidation events");
    }

    let mut levels: Vec<Level> = buckets
        .into_values()
        .filter(|bucket| bucket.total_usd > config.significance_floor)
        .map(|bucket| Level {
            price: bucket.price,
            liquidity: bucket.total_usd / USD_PER_MILLION,
            kind: LevelKind::from_volumes(bucket.long_usd, bucket.short_usd),
            intensity: (bucket.total_usd / config.intensity_scale).min(1.0),
            long_liquidations: bucket.long_usd / USD_PER_MILLION,
            short_liquidations: bucket.short_usd / USD_PER_MILLION,
            count: bucket.count,
        })
        .collect();

    // Stable sort keeps first-seen order for equal liquidity
    levels.sort_by(|a, b| b.liquidity.total_cmp(&a.liquidity));
    levels.truncate(config.max_levels);

    debug!(levels = levels.len(), "liquidation levels clustered");
    levels
}

/// Synthetic price offset for an event of `total_usd` volume.
pub fn distance_factor(total_usd: f64, config: &ConcentrationConfig) -> f64 {
    (total_usd / config.distance_divisor).min(config.max_distance)
}

/// Round `price` to the nearest multiple of `bucket_size`.
pub fn round_to_bucket(price: f64, bucket_size: f64) -> f64 {
    (price / bucket_size).round() * bucket_size
}

fn bucket_entry(
    buckets: &mut IndexMap<i64, Bucket>,
    price: f64,
    bucket_size: f64,
) -> &mut Bucket {
    let key = (price / bucket_size).round() as i64;
    buckets.entry(key).or_insert_with(|| Bucket {
        price: round_to_bucket(price, bucket_size),
        ..Default::default()
    })
}
