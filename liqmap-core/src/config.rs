/// Tunable parameters for every pipeline stage
///
/// The numeric defaults (significance floor, bucket sizes, intensity normalisation) are
/// heuristics, so each one is a field rather than a literal in the algorithms.
use crate::error::PipelineError;
use std::time::Duration;

/// Price interpolator parameters
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatorConfig {
    /// Number of output points
    pub target_points: usize,
    /// Spacing between output timestamps
    pub interval: Duration,
    /// Uniform jitter amplitude (price units, applied as +/-)
    pub jitter: f64,
    /// Allowed overshoot beyond the mapped candle's low/high
    pub clamp_margin: f64,
}

impl Default for InterpolatorConfig {
    fn default() -> Self {
        Self {
            target_points: 144,
            interval: Duration::from_secs(10 * 60),
            jitter: 10.0,
            clamp_margin: 20.0,
        }
    }
}

impl InterpolatorConfig {
    /// Set number of output points
    pub fn with_target_points(mut self, target_points: usize) -> Self {
        self.target_points = target_points;
        self
    }

    /// Set output spacing
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set jitter amplitude
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Set clamp margin
    pub fn with_clamp_margin(mut self, clamp_margin: f64) -> Self {
        self.clamp_margin = clamp_margin;
        self
    }

    /// Output spacing in epoch milliseconds
    pub fn interval_ms(&self) -> i64 {
        i64::try_from(self.interval.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Concentration analyzer parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentrationConfig {
    /// Price grid levels are rounded to
    pub bucket_size: f64,
    /// Minimum bucket total (USD) for a level to be kept
    pub significance_floor: f64,
    /// Bucket total (USD) that maps to intensity 1.0
    pub intensity_scale: f64,
    /// USD volume per unit of synthetic price offset
    pub distance_divisor: f64,
    /// Cap on the synthetic price offset
    pub max_distance: f64,
    /// Maximum number of levels returned
    pub max_levels: usize,
}

impl Default for ConcentrationConfig {
    fn default() -> Self {
        Self {
            bucket_size: 100.0,
            significance_floor: 1_000_000.0,
            intensity_scale: 10_000_000.0,
            distance_divisor: 1_000_000.0,
            max_distance: 1000.0,
            max_levels: 20,
        }
    }
}

impl ConcentrationConfig {
    /// Set price grid
    pub fn with_bucket_size(mut self, bucket_size: f64) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    /// Set significance floor (USD)
    pub fn with_significance_floor(mut self, floor: f64) -> Self {
        self.significance_floor = floor;
        self
    }

    /// Set intensity normalisation (USD)
    pub fn with_intensity_scale(mut self, scale: f64) -> Self {
        self.intensity_scale = scale;
        self
    }

    /// Set maximum number of levels
    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }
}

/// Heatmap grid parameters
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapConfig {
    /// Grid spans current_price +/- half_window
    pub half_window: f64,
    /// Column width
    pub price_step: f64,
    /// Linear falloff radius around each level
    pub level_radius: f64,
    /// Falloff radius around the interpolated price of each row
    pub trail_radius: f64,
    /// Peak contribution of the price trail
    pub trail_weight: f64,
    /// Upper bound on rows x columns
    pub max_cells: usize,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            half_window: 2000.0,
            price_step: 25.0,
            level_radius: 100.0,
            trail_radius: 200.0,
            trail_weight: 0.3,
            max_cells: 1_000_000,
        }
    }
}

impl HeatmapConfig {
    /// Set grid half window
    pub fn with_half_window(mut self, half_window: f64) -> Self {
        self.half_window = half_window;
        self
    }

    /// Set column width
    pub fn with_price_step(mut self, price_step: f64) -> Self {
        self.price_step = price_step;
        self
    }

    /// Set level falloff radius
    pub fn with_level_radius(mut self, level_radius: f64) -> Self {
        self.level_radius = level_radius;
        self
    }

    /// Number of price columns, both window edges inclusive
    pub fn columns(&self) -> usize {
        ((2.0 * self.half_window) / self.price_step + 1e-9).floor() as usize + 1
    }
}

/// Synthetic data generator parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackConfig {
    /// Number of synthetic levels
    pub level_count: usize,
    /// Synthetic levels are scattered within current_price +/- level_spread
    pub level_spread: f64,
    /// Synthetic liquidity range (USD millions)
    pub liquidity_range: (f64, f64),
    /// Synthetic intensity range
    pub intensity_range: (f64, f64),
    /// Random walk step as a fraction of price
    pub walk_step_ratio: f64,
    /// Random walk band as a fraction of price
    pub walk_band_ratio: f64,
    /// Price used when no candle is usable
    pub fallback_price: f64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            level_count: 10,
            level_spread: 1000.0,
            liquidity_range: (5.0, 50.0),
            intensity_range: (0.3, 0.9),
            walk_step_ratio: 0.001,
            walk_band_ratio: 0.02,
            fallback_price: 100_000.0,
        }
    }
}

impl FallbackConfig {
    /// Set number of synthetic levels
    pub fn with_level_count(mut self, level_count: usize) -> Self {
        self.level_count = level_count;
        self
    }

    /// Set the price used when no candle is usable
    pub fn with_fallback_price(mut self, price: f64) -> Self {
        self.fallback_price = price;
        self
    }
}

/// Summary aggregator parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryConfig {
    /// Intensity at or above which a level counts as high risk
    pub high_intensity: f64,
    /// Intensity at or above which a level counts as medium risk
    pub medium_intensity: f64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            high_intensity: 0.7,
            medium_intensity: 0.4,
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineConfig {
    pub interpolator: InterpolatorConfig,
    pub concentration: ConcentrationConfig,
    pub heatmap: HeatmapConfig,
    pub fallback: FallbackConfig,
    pub summary: SummaryConfig,
}

impl PipelineConfig {
    /// Set interpolator parameters
    pub fn with_interpolator(mut self, interpolator: InterpolatorConfig) -> Self {
        self.interpolator = interpolator;
        self
    }

    /// Set analyzer parameters
    pub fn with_concentration(mut self, concentration: ConcentrationConfig) -> Self {
        self.concentration = concentration;
        self
    }

    /// Set heatmap parameters
    pub fn with_heatmap(mut self, heatmap: HeatmapConfig) -> Self {
        self.heatmap = heatmap;
        self
    }

    /// Set fallback parameters
    pub fn with_fallback(mut self, fallback: FallbackConfig) -> Self {
        self.fallback = fallback;
        self
    }

    /// Set summary parameters
    pub fn with_summary(mut self, summary: SummaryConfig) -> Self {
        self.summary = summary;
        self
    }

    /// Reject parameter combinations the algorithms cannot work with.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |msg: &str| Err(PipelineError::InvalidConfig(msg.to_string()));

        let interp = &self.interpolator;
        if interp.target_points == 0 {
            return invalid("target_points must be >= 1");
        }
        if interp.interval.is_zero() {
            return invalid("interval must be > 0");
        }
        if !positive_or_zero(interp.jitter) || !positive_or_zero(interp.clamp_margin) {
            return invalid("jitter and clamp_margin must be finite and >= 0");
        }
        if !finite_width(interp.jitter) {
            return invalid("jitter range width must be finite");
        }
        let span = i64::try_from(interp.target_points - 1)
            .ok()
            .and_then(|steps| interp.interval_ms().checked_mul(steps));
        if interp.interval_ms() == i64::MAX || span.is_none() {
            return invalid("interval * (target_points - 1) must fit in epoch milliseconds");
        }

        let conc = &self.concentration;
        if !positive(conc.bucket_size)
            || !positive(conc.intensity_scale)
            || !positive(conc.distance_divisor)
        {
            return invalid("bucket_size, intensity_scale and distance_divisor must be > 0");
        }
        if !positive_or_zero(conc.significance_floor) || !positive_or_zero(conc.max_distance) {
            return invalid("significance_floor and max_distance must be finite and >= 0");
        }

        let heat = &self.heatmap;
        if !positive(heat.half_window) || !positive(heat.price_step) {
            return invalid("half_window and price_step must be > 0");
        }
        if !positive(heat.level_radius) || !positive(heat.trail_radius) {
            return invalid("level_radius and trail_radius must be > 0");
        }
        if !positive_or_zero(heat.trail_weight) {
            return invalid("trail_weight must be finite and >= 0");
        }
        let cells = interp.target_points.saturating_mul(heat.columns());
        if cells > heat.max_cells {
            return Err(PipelineError::GridTooLarge {
                rows: interp.target_points,
                cols: heat.columns(),
                max: heat.max_cells,
            });
        }

        let fb = &self.fallback;
        if !valid_range(fb.liquidity_range) || !valid_range(fb.intensity_range) {
            return invalid("fallback ranges must be finite with min <= max");
        }
        if fb.intensity_range.0 < 0.0 || fb.intensity_range.1 > 1.0 {
            return invalid("fallback intensity_range must lie within [0, 1]");
        }
        if !positive(fb.fallback_price) || !positive_or_zero(fb.level_spread) {
            return invalid("fallback_price must be > 0 and level_spread >= 0");
        }
        if !positive_or_zero(fb.walk_step_ratio) || !positive_or_zero(fb.walk_band_ratio) {
            return invalid("walk ratios must be finite and >= 0");
        }
        if !finite_width(fb.level_spread) || !finite_width(fb.walk_step_ratio * fb.fallback_price)
        {
            return invalid("level_spread and walk step range widths must be finite");
        }

        let sum = &self.summary;
        if sum.medium_intensity > sum.high_intensity {
            return invalid("medium_intensity must be <= high_intensity");
        }

        Ok(())
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn positive_or_zero(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn valid_range((min, max): (f64, f64)) -> bool {
    min.is_finite() && max.is_finite() && min <= max && (max - min).is_finite()
}

/// Width of `-value..=value` stays finite, as `Rng::random_range` requires.
fn finite_width(value: f64) -> bool {
    (2.0 * value).is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.interpolator.target_points, 144);
        assert_eq!(config.interpolator.interval_ms(), 600_000);
        assert_eq!(config.heatmap.columns(), 161);
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::default()
            .with_interpolator(InterpolatorConfig::default().with_target_points(4))
            .with_heatmap(
                HeatmapConfig::default()
                    .with_half_window(100.0)
                    .with_price_step(10.0),
            );

        assert_eq!(config.interpolator.target_points, 4);
        assert_eq!(config.heatmap.columns(), 21);
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        struct TestCase {
            input: PipelineConfig,
            expected_config_error: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: zero target points
                input: PipelineConfig::default()
                    .with_interpolator(InterpolatorConfig::default().with_target_points(0)),
                expected_config_error: true,
            },
            TestCase {
                // TC1: zero price step
                input: PipelineConfig::default()
                    .with_heatmap(HeatmapConfig::default().with_price_step(0.0)),
                expected_config_error: true,
            },
            TestCase {
                // TC2: negative bucket size
                input: PipelineConfig::default()
                    .with_concentration(ConcentrationConfig::default().with_bucket_size(-1.0)),
                expected_config_error: true,
            },
            TestCase {
                // TC3: grid over the cell budget
                input: PipelineConfig::default()
                    .with_heatmap(HeatmapConfig::default().with_price_step(0.001)),
                expected_config_error: true,
            },
            TestCase {
                // TC4: finite jitter whose range width overflows
                input: PipelineConfig::default()
                    .with_interpolator(InterpolatorConfig::default().with_jitter(1e308)),
                expected_config_error: true,
            },
            TestCase {
                // TC5: interval too long for the timestamp grid
                input: PipelineConfig::default().with_interpolator(
                    InterpolatorConfig::default()
                        .with_interval(Duration::from_secs(u64::MAX / 1000)),
                ),
                expected_config_error: true,
            },
            TestCase {
                // TC6: grid span overflows i64 milliseconds
                input: PipelineConfig::default().with_interpolator(
                    InterpolatorConfig::default()
                        .with_interval(Duration::from_millis(i64::MAX as u64 / 100)),
                ),
                expected_config_error: true,
            },
            TestCase {
                // TC7: level spread range width overflows
                input: PipelineConfig::default().with_fallback(FallbackConfig {
                    level_spread: 1e308,
                    ..FallbackConfig::default()
                }),
                expected_config_error: true,
            },
            TestCase {
                // TC8: walk step range width overflows
                input: PipelineConfig::default().with_fallback(FallbackConfig {
                    walk_step_ratio: 1e305,
                    ..FallbackConfig::default()
                }),
                expected_config_error: true,
            },
            TestCase {
                // TC9: liquidity range width overflows
                input: PipelineConfig::default().with_fallback(FallbackConfig {
                    liquidity_range: (-1e308, 1e308),
                    ..FallbackConfig::default()
                }),
                expected_config_error: true,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.validate();
            assert_eq!(
                actual.map_err(|e| e.is_config()).err(),
                Some(test.expected_config_error),
                "TC{} failed",
                index
            );
        }
    }
}
