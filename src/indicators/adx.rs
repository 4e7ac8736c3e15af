/// Trend-strength proxy reported in the `adx` field
///
/// This is not Wilder's ADX. It scales the 10-bar close displacement by the
/// recent average true range:
///
/// strength = clamp(|close[last] - close[last-10]| / (ATR * 10 + 1e-10) * 25, 5, 50)
///
/// ATR is the mean true range over up to the last 14 bars. Series shorter than
/// 14 bars read as 15.0, and if fewer than 11 closes exist the displacement leg
/// also falls back to 15.0 before clamping.

use super::atr::calculate_atr;

pub const ADX_DEFAULT: f64 = 15.0;
const ATR_LOOKBACK: usize = 14;
const DISPLACEMENT_BARS: usize = 10;

pub fn calculate_adx(highs: &[f64], lows: &[f64], closes: &[f64]) -> f64 {
    let n = closes.len();
    if n < ATR_LOOKBACK {
        return ADX_DEFAULT;
    }

    let Some(atr) = calculate_atr(highs, lows, closes, ATR_LOOKBACK) else {
        return ADX_DEFAULT;
    };

    let strength = if n > DISPLACEMENT_BARS {
        (closes[n - 1] - closes[n - 1 - DISPLACEMENT_BARS]).abs() / (atr * 10.0 + 1e-10) * 25.0
    } else {
        ADX_DEFAULT
    };

    if !strength.is_finite() {
        return ADX_DEFAULT;
    }

    round1(strength.clamp(5.0, 50.0))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trend(len: usize, step: f64, range: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let closes: Vec<f64> = (0..len).map(|i| 100.0 + step * i as f64).collect();
        let highs = closes.iter().map(|c| c + range / 2.0).collect();
        let lows = closes.iter().map(|c| c - range / 2.0).collect();
        (highs, lows, closes)
    }

    #[test]
    fn test_flat_market_floors_at_five() {
        let (h, l, c) = trend(30, 0.0, 2.0);
        assert_eq!(calculate_adx(&h, &l, &c), 5.0);
    }

    #[test]
    fn test_steady_trend_value() {
        // step 1.0, range 2.0 -> every TR is 2.0, displacement is 10.0
        // 10 / (2 * 10) * 25 = 12.5
        let (h, l, c) = trend(30, 1.0, 2.0);
        assert_eq!(calculate_adx(&h, &l, &c), 12.5);
    }

    #[test]
    fn test_gap_only_moves() {
        // zero intraday range: every TR is the 4.0 gap, displacement 40 -> 25.0
        let (h, l, c) = trend(30, 4.0, 0.0);
        assert_eq!(calculate_adx(&h, &l, &c), 25.0);
    }

    #[test]
    fn test_zero_atr_caps_at_fifty() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        // every bar prints exactly at the previous close
        let mut highs = vec![closes[0]];
        highs.extend_from_slice(&closes[..29]);
        let lows = highs.clone();
        assert_eq!(calculate_adx(&highs, &lows, &closes), 50.0);
    }

    #[test]
    fn test_insufficient_data_default() {
        let (h, l, c) = trend(13, 1.0, 2.0);
        assert_eq!(calculate_adx(&h, &l, &c), ADX_DEFAULT);
    }

    #[test]
    fn test_bounds() {
        for step in [-3.0, -0.5, 0.0, 0.2, 1.5, 7.0] {
            for range in [0.5, 2.0, 10.0] {
                let (h, l, c) = trend(40, step, range);
                let adx = calculate_adx(&h, &l, &c);
                assert!((5.0..=50.0).contains(&adx), "adx {} out of range", adx);
            }
        }
    }
}
