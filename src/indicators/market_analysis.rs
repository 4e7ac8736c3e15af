/// Volume and price-structure checks
///
/// Each check has its own minimum-history guard and reads false below it.

use super::moving_average::calculate_sma;

const VOLUME_LONG: usize = 20;
const VOLUME_SHORT: usize = 5;
const VOLUME_EXPAND_RATIO: f64 = 1.25;
const VOLUME_CONTRACT_RATIO: f64 = 0.80;

const CONSOLIDATION_BARS: usize = 15;
const CONSOLIDATION_MAX_RANGE_PCT: f64 = 6.0;

const NEAR_HIGH_MIN_BARS: usize = 50;
const NEAR_HIGH_LOOKBACK: usize = 252;
const NEAR_HIGH_RATIO: f64 = 0.92;

/// Calculate average volume over the trailing `period` bars
pub fn calculate_average_volume(volumes: &[f64], period: usize) -> Option<f64> {
    calculate_sma(volumes, period)
}

/// Volume expansion / contraction against the 20-bar average
///
/// Returns `(expand, contract)`:
/// - expand: latest volume > 1.25x the 20-bar average
/// - contract: 5-bar average < 0.80x the 20-bar average
pub fn volume_pattern(volumes: &[f64]) -> (bool, bool) {
    let (Some(avg20), Some(avg5), Some(&latest)) = (
        calculate_average_volume(volumes, VOLUME_LONG),
        calculate_average_volume(volumes, VOLUME_SHORT),
        volumes.last(),
    ) else {
        return (false, false);
    };

    (
        latest > avg20 * VOLUME_EXPAND_RATIO,
        avg5 < avg20 * VOLUME_CONTRACT_RATIO,
    )
}

/// True when the last 15 closes span less than 6% of their low
pub fn is_consolidating(closes: &[f64]) -> bool {
    if closes.len() < CONSOLIDATION_BARS {
        return false;
    }

    let recent = &closes[closes.len() - CONSOLIDATION_BARS..];
    let max = recent.iter().copied().fold(f64::MIN, f64::max);
    let min = recent.iter().copied().fold(f64::MAX, f64::min);

    let range_pct = (max - min) / (min + 1e-10) * 100.0;
    range_pct < CONSOLIDATION_MAX_RANGE_PCT
}

/// True when the last close sits within 8% of the 52-week closing high
///
/// Uses up to 252 bars, or everything available when the series is shorter.
pub fn is_near_52_week_high(closes: &[f64]) -> bool {
    if closes.len() < NEAR_HIGH_MIN_BARS {
        return false;
    }

    let start = closes.len().saturating_sub(NEAR_HIGH_LOOKBACK);
    let high = closes[start..].iter().copied().fold(f64::MIN, f64::max);

    match closes.last() {
        Some(&last) => last >= high * NEAR_HIGH_RATIO,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_expand_on_spike() {
        let mut volumes = vec![1000.0; 19];
        volumes.push(5000.0);
        let (expand, contract) = volume_pattern(&volumes);
        assert!(expand);
        assert!(!contract);
    }

    #[test]
    fn test_volume_contract_on_drying_up() {
        let mut volumes = vec![1000.0; 15];
        volumes.extend([300.0; 5]);
        let (expand, contract) = volume_pattern(&volumes);
        assert!(!expand);
        assert!(contract);
    }

    #[test]
    fn test_volume_contract_and_expand_together() {
        // quiet week that ends on a breakout bar
        let mut volumes = vec![2000.0; 15];
        volumes.extend([100.0, 100.0, 100.0, 100.0, 2600.0]);
        // avg20 = (30000 + 3000) / 20 = 1650, avg5 = 600
        assert_eq!(volume_pattern(&volumes), (true, true));
    }

    #[test]
    fn test_volume_needs_twenty_bars() {
        let volumes = vec![1000.0; 19];
        assert_eq!(volume_pattern(&volumes), (false, false));
    }

    #[test]
    fn test_consolidation() {
        let tight: Vec<f64> = (0..30).map(|i| 100.0 + (i % 3) as f64).collect();
        assert!(is_consolidating(&tight));

        let mut wide = vec![100.0; 29];
        wide.push(110.0);
        assert!(!is_consolidating(&wide));

        assert!(!is_consolidating(&[100.0; 14]));
    }

    #[test]
    fn test_near_52_week_high() {
        let mut closes: Vec<f64> = vec![100.0; 60];
        closes.push(93.0);
        assert!(is_near_52_week_high(&closes));

        closes.push(91.0);
        assert!(!is_near_52_week_high(&closes));
    }

    #[test]
    fn test_near_high_only_looks_back_one_year() {
        // an old peak beyond 252 bars is ignored
        let mut closes = vec![500.0];
        closes.extend(vec![100.0; 260]);
        assert!(is_near_52_week_high(&closes));
    }

    #[test]
    fn test_near_high_needs_fifty_bars() {
        assert!(!is_near_52_week_high(&[100.0; 49]));
        assert!(is_near_52_week_high(&[100.0; 50]));
    }
}
