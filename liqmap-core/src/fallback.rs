//! Synthetic stand-ins used when the gateway has nothing usable.
//!
//! Output from this module is not market data. The pipeline tags any snapshot that used it
//! with [`Source::Fallback`](crate::types::Source::Fallback).

use crate::{
    concentration::round_to_bucket,
    config::{FallbackConfig, InterpolatorConfig},
    interpolate::timestamp_grid,
    types::{Level, LevelKind, PricePoint},
};
use chrono::{DateTime, Utc};
use rand::Rng;

/// Bounded random walk on the interpolator's timestamp grid that ends exactly at
/// `current_price`.
pub fn trajectory<R>(
    current_price: f64,
    interpolator: &InterpolatorConfig,
    config: &FallbackConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<PricePoint>
where
    R: Rng + ?Sized,
{
    let timestamps = timestamp_grid(interpolator, now);
    let step = current_price * config.walk_step_ratio;
    let band = current_price * config.walk_band_ratio;

    // Walk backwards from "now" so the final point is pinned to the current price
    let mut prices = vec![current_price; timestamps.len()];
    for index in (0..prices.len().saturating_sub(1)).rev() {
        let delta = if step > 0.0 {
            rng.random_range(-step..=step)
        } else {
            0.0
        };
        prices[index] =
            (prices[index + 1] + delta).clamp(current_price - band, current_price + band);
    }

    timestamps
        .into_iter()
        .zip(prices)
        .enumerate()
        .map(|(index, (timestamp, price))| PricePoint {
            timestamp,
            price,
            index,
        })
        .collect()
}

/// Exactly `config.level_count` synthetic levels within `current_price +/- level_spread`,
/// rounded to `bucket_size` and ranked by liquidity descending.
///
/// Levels above the current price are resistance, the rest support. The side volume matching
/// the type carries the full liquidity so the long/short ordering agrees with the type.
pub fn levels<R>(
    current_price: f64,
    bucket_size: f64,
    config: &FallbackConfig,
    rng: &mut R,
) -> Vec<Level>
where
    R: Rng + ?Sized,
{
    let spread = config.level_spread;
    let (liq_min, liq_max) = config.liquidity_range;
    let (int_min, int_max) = config.intensity_range;

    let mut levels: Vec<Level> = (0..config.level_count)
        .map(|_| {
            let offset = if spread > 0.0 {
                rng.random_range(-spread..=spread)
            } else {
                0.0
            };
            let price = within_spread(
                round_to_bucket(current_price + offset, bucket_size),
                current_price,
                spread,
                bucket_size,
            );
            let liquidity = rng.random_range(liq_min..=liq_max);
            let intensity = rng.random_range(int_min..=int_max);
            let kind = if price > current_price {
                LevelKind::Resistance
            } else {
                LevelKind::Support
            };

            Level {
                price,
                liquidity,
                kind,
                intensity,
                long_liquidations: if kind.is_resistance() { liquidity } else { 0.0 },
                short_liquidations: if kind.is_support() { liquidity } else { 0.0 },
                count: 0,
            }
        })
        .collect();

    levels.sort_by(|a, b| b.liquidity.total_cmp(&a.liquidity));
    levels
}

/// Pull a rounded price back inside the spread band by one bucket if rounding pushed it out.
fn within_spread(price: f64, current_price: f64, spread: f64, bucket_size: f64) -> f64 {
    if price > current_price + spread {
        price - bucket_size
    } else if price < current_price - spread {
        price + bucket_size
    } else {
        price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_fallback_levels_count_and_types() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = FallbackConfig::default();

        let levels = levels(100_000.0, 100.0, &config, &mut rng);

        assert_eq!(levels.len(), 10);
        for level in &levels {
            assert!((99_000.0..=101_000.0).contains(&level.price));
            assert!((5.0..=50.0).contains(&level.liquidity));
            assert!((0.3..=0.9).contains(&level.intensity));
            assert_eq!(level.price % 100.0, 0.0);
            let expected = if level.price > 100_000.0 {
                LevelKind::Resistance
            } else {
                LevelKind::Support
            };
            assert_eq!(level.kind, expected);
            assert_eq!(
                level.kind,
                LevelKind::from_volumes(level.long_liquidations, level.short_liquidations)
            );
        }
        for pair in levels.windows(2) {
            assert!(pair[0].liquidity >= pair[1].liquidity);
        }
    }

    #[test]
    fn test_fallback_levels_respect_spread_off_grid() {
        let mut rng = StdRng::seed_from_u64(11);
        let config = FallbackConfig::default().with_level_count(200);

        for level in levels(100_050.0, 100.0, &config, &mut rng) {
            assert!((99_050.0..=101_050.0).contains(&level.price), "{}", level.price);
        }
    }

    #[test]
    fn test_fallback_trajectory_shape() {
        let mut rng = StdRng::seed_from_u64(5);
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let interpolator = InterpolatorConfig::default();
        let config = FallbackConfig::default();

        let points = trajectory(50_000.0, &interpolator, &config, now, &mut rng);

        assert_eq!(points.len(), 144);
        assert_eq!(points[143].price, 50_000.0);
        assert_eq!(points[143].timestamp, now.timestamp_millis());
        for point in &points {
            assert!((49_000.0..=51_000.0).contains(&point.price));
        }
        for pair in points.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, 600_000);
        }
    }
}
