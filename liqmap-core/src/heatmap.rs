//! Levels + price trajectory → time × price liquidity grid.

use crate::{
    config::HeatmapConfig,
    types::{HeatmapCell, HeatmapGrid, Level, PricePoint},
};

/// Build the heatmap grid: one row per price-history point, one column per price step across
/// `current_price +/- config.half_window` (both edges inclusive).
///
/// Each cell sums a linear falloff around every nearby level with a smaller bump around the
/// interpolated price of its row, then caps the sum at 1.0. An empty `price_history` yields a
/// grid with zero rows.
pub fn build(
    levels: &[Level],
    current_price: f64,
    price_history: &[PricePoint],
    config: &HeatmapConfig,
) -> HeatmapGrid {
    let columns = price_columns(current_price, config);

    // Level proximity does not depend on time, compute it once per column
    let proximity: Vec<f64> = columns
        .iter()
        .map(|&price| proximity_intensity(price, levels, config.level_radius))
        .collect();

    price_history
        .iter()
        .enumerate()
        .map(|(time_index, point)| {
            columns
                .iter()
                .zip(&proximity)
                .map(|(&price, &proximity)| HeatmapCell {
                    price,
                    liquidity: (proximity + trail_component(price, point.price, config))
                        .clamp(0.0, 1.0),
                    time_index,
                    timestamp: point.timestamp,
                })
                .collect()
        })
        .collect()
}

/// Column prices from `current_price - half_window` upward in `price_step` increments.
pub fn price_columns(current_price: f64, config: &HeatmapConfig) -> Vec<f64> {
    let price_min = current_price - config.half_window;
    (0..config.columns())
        .map(|column| price_min + column as f64 * config.price_step)
        .collect()
}

/// Σ level.intensity × (1 - distance / radius) over levels closer than `radius`.
fn proximity_intensity(price: f64, levels: &[Level], radius: f64) -> f64 {
    levels
        .iter()
        .filter_map(|level| {
            let distance = (price - level.price).abs();
            (distance < radius).then(|| level.intensity * (1.0 - distance / radius).max(0.0))
        })
        .sum()
}

/// Density bump around the interpolated price of the row.
fn trail_component(price: f64, row_price: f64, config: &HeatmapConfig) -> f64 {
    let distance = (price - row_price).abs();
    if distance < config.trail_radius {
        (1.0 - distance / config.trail_radius).max(0.0) * config.trail_weight
    } else {
        0.0
    }
}
