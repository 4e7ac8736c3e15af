//! Average True Range (ATR) over the most recent bars
//!
//! True Range is the greatest of:
//! - Current High - Current Low
//! - Abs(Current High - Previous Close)
//! - Abs(Current Low - Previous Close)
//!
//! This is a plain mean of the last `lookback` true ranges (or fewer when the
//! series is shorter), not Wilder-smoothed.

/// True range of bar `i` against the close of bar `i - 1`
pub fn true_range(highs: &[f64], lows: &[f64], closes: &[f64], i: usize) -> f64 {
    let high = highs[i];
    let low = lows[i];
    let prev_close = closes[i - 1];

    (high - low)
        .max((high - prev_close).abs())
        .max((low - prev_close).abs())
}

/// Mean true range of up to `lookback` trailing bars
///
/// Returns None when the columns disagree in length or fewer than two bars exist.
pub fn calculate_atr(highs: &[f64], lows: &[f64], closes: &[f64], lookback: usize) -> Option<f64> {
    let n = closes.len();
    if highs.len() != n || lows.len() != n || n < 2 || lookback == 0 {
        return None;
    }

    let bars = lookback.min(n - 1);
    let total: f64 = (n - bars..n)
        .map(|i| true_range(highs, lows, closes, i))
        .sum();

    Some(total / bars as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(rows: &[(f64, f64, f64)]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        (
            rows.iter().map(|r| r.0).collect(),
            rows.iter().map(|r| r.1).collect(),
            rows.iter().map(|r| r.2).collect(),
        )
    }

    #[test]
    fn test_calculate_atr() {
        let rows = vec![(101.0, 99.0, 100.0); 15];
        let (h, l, c) = columns(&rows);

        let atr = calculate_atr(&h, &l, &c, 14).unwrap();
        assert!((atr - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_true_range_uses_gap() {
        // gap up: previous close 100, today's range 110..108
        let (h, l, c) = columns(&[(101.0, 99.0, 100.0), (110.0, 108.0, 109.0)]);
        assert_eq!(true_range(&h, &l, &c, 1), 10.0);
    }

    #[test]
    fn test_atr_short_series_uses_available_bars() {
        let (h, l, c) = columns(&[
            (101.0, 99.0, 100.0),
            (102.0, 100.0, 101.0),
            (105.0, 101.0, 104.0),
        ]);
        // TRs: 2.0, 4.0
        assert_eq!(calculate_atr(&h, &l, &c, 14), Some(3.0));
    }

    #[test]
    fn test_insufficient_data() {
        let (h, l, c) = columns(&[(101.0, 99.0, 100.0)]);
        assert!(calculate_atr(&h, &l, &c, 14).is_none());
    }

    #[test]
    fn test_mismatched_columns() {
        assert!(calculate_atr(&[1.0, 2.0], &[1.0], &[1.0, 2.0], 14).is_none());
    }
}
