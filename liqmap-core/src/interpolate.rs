//! Candle → dense price trajectory.
//!
//! Each output point is mapped onto one candle and placed on a fixed four-segment waveform
//! inside it (open → first extreme → other extreme → midpoint → close). The waveform is a
//! visual smoothing device: it is not derived from tick data and carries no statistical meaning.

use crate::{
    config::InterpolatorConfig,
    types::{Candle, PricePoint},
};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use rand::Rng;
use tracing::debug;

/// Interpolate `candles` onto `config.target_points` evenly spaced points ending at `now`.
///
/// Candles are sorted ascending by `time` first; invalid candles are skipped. Returns an
/// empty sequence when no usable candle remains, leaving the fallback decision to the caller.
pub fn interpolate<R>(
    candles: &[Candle],
    config: &InterpolatorConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<PricePoint>
where
    R: Rng + ?Sized,
{
    let sorted = sort_valid_candles(candles);
    if sorted.is_empty() || config.target_points == 0 {
        return Vec::new();
    }

    let timestamps = timestamp_grid(config, now);
    let last = config.target_points - 1;
    let max_index = sorted.len() - 1;

    timestamps
        .into_iter()
        .enumerate()
        .map(|(index, timestamp)| {
            let progress = if last == 0 {
                0.0
            } else {
                index as f64 / last as f64
            };

            let candle_index = ((progress * max_index as f64).floor() as usize).min(max_index);
            let candle = &sorted[candle_index];
            let candle_progress = (progress * sorted.len() as f64).fract();

            let jitter = if config.jitter > 0.0 {
                rng.random_range(-config.jitter..=config.jitter)
            } else {
                0.0
            };

            let price = (waveform(candle, candle_progress) + jitter).clamp(
                candle.low - config.clamp_margin,
                candle.high + config.clamp_margin,
            );

            PricePoint {
                timestamp,
                price,
                index,
            }
        })
        .collect()
}

/// Timestamps `now - (N - 1 - i) * interval` for `i` in `0..N`.
pub fn timestamp_grid(config: &InterpolatorConfig, now: DateTime<Utc>) -> Vec<i64> {
    let now_ms = now.timestamp_millis();
    let interval_ms = config.interval_ms();
    let last = config.target_points.saturating_sub(1) as i64;

    (0..config.target_points as i64)
        .map(|i| now_ms.saturating_sub((last - i).saturating_mul(interval_ms)))
        .collect()
}

/// Drop malformed candles and order the rest by open time.
pub fn sort_valid_candles(candles: &[Candle]) -> Vec<Candle> {
    let sorted: Vec<Candle> = candles
        .iter()
        .filter(|candle| candle.is_valid())
        .copied()
        .sorted_by_key(|candle| candle.time)
        .collect();

    if sorted.len() < candles.len() {
        debug!(
            skipped = candles.len() - sorted.len(),
            "skipped malformed candles"
        );
    }

    sorted
}

/// Position on the intra-candle waveform for `t` in [0, 1).
///
/// Bullish candles dip to the low first, bearish candles spike to the high first.
fn waveform(candle: &Candle, t: f64) -> f64 {
    let (first, second) = if candle.is_bullish() {
        (candle.low, candle.high)
    } else {
        (candle.high, candle.low)
    };
    let anchors = [candle.open, first, second, candle.midpoint(), candle.close];

    let scaled = t.clamp(0.0, 1.0) * 4.0;
    let quarter = (scaled.floor() as usize).min(3);
    let local = scaled - quarter as f64;

    lerp(anchors[quarter], anchors[quarter + 1], local)
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}
