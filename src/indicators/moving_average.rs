/// Calculate Simple Moving Average (SMA) over the trailing `period` values
pub fn calculate_sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }

    let sum: f64 = values.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Exponential Moving Average series for a span
///
/// Weights decay by `1 - alpha` per bar with `alpha = 2 / (span + 1)`, and each
/// point is normalized by the sum of the weights seen so far, so the series is
/// defined from the very first bar instead of needing a seed window. Written
/// incrementally so a constant input stays exactly constant.
pub fn calculate_ema_series(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 {
        return Vec::new();
    }

    let decay = 1.0 - 2.0 / (span as f64 + 1.0);
    let mut weight_total = 0.0;
    let mut ema = 0.0;

    values
        .iter()
        .map(|value| {
            weight_total = 1.0 + decay * weight_total;
            ema += (value - ema) / weight_total;
            ema
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma() {
        let prices = vec![100.0, 102.0, 104.0, 106.0, 108.0];
        assert_eq!(calculate_sma(&prices, 5), Some(104.0));
        assert_eq!(calculate_sma(&prices, 2), Some(107.0));
    }

    #[test]
    fn test_sma_insufficient_data() {
        let prices = vec![100.0, 102.0];
        assert!(calculate_sma(&prices, 5).is_none());
    }

    #[test]
    fn test_ema_series_weights() {
        // span 3 -> alpha 0.5
        let ema = calculate_ema_series(&[1.0, 2.0, 3.0], 3);
        assert_eq!(ema.len(), 3);
        assert!((ema[0] - 1.0).abs() < 1e-12);
        assert!((ema[1] - 2.5 / 1.5).abs() < 1e-12);
        assert!((ema[2] - 4.25 / 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_ema_constant_series() {
        let ema = calculate_ema_series(&[42.0; 30], 12);
        assert!(ema.iter().all(|v| (v - 42.0).abs() < 1e-9));
    }

    #[test]
    fn test_ema_lags_rising_prices() {
        let prices: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let fast = *calculate_ema_series(&prices, 5).last().unwrap();
        let slow = *calculate_ema_series(&prices, 20).last().unwrap();
        assert!(fast > slow);
        assert!(slow < 149.0);
    }

    #[test]
    fn test_ema_empty() {
        assert!(calculate_ema_series(&[], 5).is_empty());
        assert!(calculate_ema_series(&[1.0, 2.0], 0).is_empty());
    }
}
