/// Calculate Relative Strength Index (RSI)
///
/// Average gain and average loss are simple means of the day-over-day close
/// deltas inside the trailing `period` window:
///
/// RSI = 100 - 100 / (1 + avg_gain / (avg_loss + 1e-10))
///
/// A window with no movement at all reads as neutral (50.0), and so does any
/// non-finite result.
pub fn calculate_rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let window = &prices[prices.len() - period - 1..];

    let mut gains = 0.0;
    let mut losses = 0.0;
    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains += change;
        } else {
            losses += change.abs();
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_gain == 0.0 && avg_loss == 0.0 {
        return Some(50.0);
    }

    let rsi = 100.0 - 100.0 / (1.0 + avg_gain / (avg_loss + 1e-10));
    if rsi.is_finite() {
        Some(rsi.clamp(0.0, 100.0))
    } else {
        Some(50.0)
    }
}
