//! Headline figures derived from a level set.

use crate::{
    config::SummaryConfig,
    types::{Level, LevelKind},
};
use serde::{Deserialize, Serialize};

/// Nearest levels on each side plus per-side counts
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct KeyLevels {
    pub nearest_support: Option<Level>,
    pub nearest_resistance: Option<Level>,
    pub support_count: usize,
    pub resistance_count: usize,
}

/// Level counts by intensity band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct RiskBuckets {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Reduced view of a level set relative to the current price
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Summary {
    pub key_levels: KeyLevels,
    /// Σ liquidity strictly below the current price (USD millions)
    pub total_bid_liquidity: f64,
    /// Σ liquidity strictly above the current price (USD millions)
    pub total_ask_liquidity: f64,
    pub risk: RiskBuckets,
}

/// Summarise `levels` around `current_price`.
///
/// Nearest-level ties resolve to the earliest level in input order. Levels sitting exactly at
/// `current_price` count towards neither bid nor ask liquidity.
pub fn summarize(levels: &[Level], current_price: f64, config: &SummaryConfig) -> Summary {
    let mut summary = Summary::default();

    for level in levels {
        match level.kind {
            LevelKind::Support => {
                summary.key_levels.support_count += 1;
                keep_nearest(&mut summary.key_levels.nearest_support, level, current_price);
            }
            LevelKind::Resistance => {
                summary.key_levels.resistance_count += 1;
                keep_nearest(
                    &mut summary.key_levels.nearest_resistance,
                    level,
                    current_price,
                );
            }
        }

        if level.price < current_price {
            summary.total_bid_liquidity += level.liquidity;
        } else if level.price > current_price {
            summary.total_ask_liquidity += level.liquidity;
        }

        if level.intensity >= config.high_intensity {
            summary.risk.high += 1;
        } else if level.intensity >= config.medium_intensity {
            summary.risk.medium += 1;
        } else {
            summary.risk.low += 1;
        }
    }

    summary
}

fn keep_nearest(slot: &mut Option<Level>, candidate: &Level, current_price: f64) {
    let closer = match slot {
        Some(existing) => {
            (candidate.price - current_price).abs() < (existing.price - current_price).abs()
        }
        None => true,
    };
    if closer {
        *slot = Some(candidate.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(price: f64, kind: LevelKind, liquidity: f64, intensity: f64) -> Level {
        Level {
            price,
            liquidity,
            kind,
            intensity,
            long_liquidations: if kind.is_resistance() { liquidity } else { 0.0 },
            short_liquidations: if kind.is_support() { liquidity } else { 0.0 },
            count: 1,
        }
    }

    #[test]
    fn test_empty_levels() {
        let summary = summarize(&[], 100.0, &SummaryConfig::default());
        assert_eq!(summary, Summary::default());
        assert!(summary.key_levels.nearest_support.is_none());
        assert!(summary.key_levels.nearest_resistance.is_none());
    }

    #[test]
    fn test_nearest_levels_and_totals() {
        let levels = vec![
            level(99_000.0, LevelKind::Support, 10.0, 0.9),
            level(99_800.0, LevelKind::Support, 4.0, 0.5),
            level(100_500.0, LevelKind::Resistance, 6.0, 0.2),
            level(100_000.0, LevelKind::Resistance, 3.0, 0.3),
        ];

        let summary = summarize(&levels, 100_000.0, &SummaryConfig::default());

        assert_eq!(summary.key_levels.support_count, 2);
        assert_eq!(summary.key_levels.resistance_count, 2);
        assert_eq!(
            summary.key_levels.nearest_support.as_ref().map(|l| l.price),
            Some(99_800.0)
        );
        assert_eq!(
            summary.key_levels.nearest_resistance.as_ref().map(|l| l.price),
            Some(100_000.0)
        );
        assert_eq!(summary.total_bid_liquidity, 14.0);
        // Level at exactly the current price is excluded
        assert_eq!(summary.total_ask_liquidity, 6.0);
        assert_eq!(
            summary.risk,
            RiskBuckets {
                high: 1,
                medium: 1,
                low: 2
            }
        );
    }

    #[test]
    fn test_nearest_tie_keeps_input_order() {
        let levels = vec![
            level(99_900.0, LevelKind::Support, 1.5, 0.5),
            level(100_100.0, LevelKind::Support, 2.5, 0.5),
        ];

        let summary = summarize(&levels, 100_000.0, &SummaryConfig::default());

        assert_eq!(
            summary.key_levels.nearest_support.map(|l| l.liquidity),
            Some(1.5)
        );
    }
}
