//! Per-ticker technical read-out
//!
//! Every sub-computation degrades to its neutral value on its own, so a short
//! or odd series never costs the other indicators.

use super::adx::{calculate_adx, ADX_DEFAULT};
use super::market_analysis::{is_consolidating, is_near_52_week_high, volume_pattern};
use super::moving_average::calculate_ema_series;
use super::rsi::calculate_rsi;
use crate::models::{EmaSignal, PriceSeries, TechnicalIndicators};

pub const MIN_BARS: usize = 30;
const RSI_PERIOD: usize = 14;
const GOLDEN_MIN_BARS: usize = 200;
/// Earlier bars (besides the latest) checked for a crossover the last scan missed
const CROSS_LOOKBACK: usize = 2;
const TREND_RISE_BARS: usize = 4;

/// Analyze a normalized daily series
///
/// Returns None below [`MIN_BARS`] bars.
pub fn analyze(series: &PriceSeries) -> Option<TechnicalIndicators> {
    let closes = &series.closes;
    if closes.len() < MIN_BARS {
        return None;
    }

    let rsi = calculate_rsi(closes, RSI_PERIOD)
        .map(round1)
        .unwrap_or(50.0);

    let macd = macd_trigger(closes);

    let ema14 = calculate_ema_series(closes, 14);
    let ema50 = calculate_ema_series(closes, 50);
    let ema_signal = classify_ema(&ema14, &ema50);

    let golden = is_golden(closes);

    let adx = if series.highs.len() == closes.len() && series.lows.len() == closes.len() {
        calculate_adx(&series.highs, &series.lows, closes)
    } else {
        ADX_DEFAULT
    };

    let (vol_expand, vol_contract) = if series.volumes.len() == closes.len() {
        volume_pattern(&series.volumes)
    } else {
        (false, false)
    };

    Some(TechnicalIndicators {
        rsi,
        macd,
        ema_signal,
        golden,
        adx,
        vol_expand,
        vol_contract,
        consolidating: is_consolidating(closes),
        near_52_high: is_near_52_week_high(closes),
    })
}

/// MACD(12, 26) crossing strictly above its 9-span signal on the latest bar
pub fn macd_trigger(closes: &[f64]) -> bool {
    if closes.len() < 2 {
        return false;
    }

    let fast = calculate_ema_series(closes, 12);
    let slow = calculate_ema_series(closes, 26);
    let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = calculate_ema_series(&line, 9);

    crossed_above(&line, &signal, line.len() - 1)
}

/// Classify the 14/50 EMA relationship
///
/// - `Cross`: fast crossed above slow on the latest bar or one of the two
///   bars before it
/// - `Trend`: fast above slow and higher than four bars earlier, no cross
/// - `None`: anything else
pub fn classify_ema(fast: &[f64], slow: &[f64]) -> EmaSignal {
    let n = fast.len().min(slow.len());
    if n < 2 {
        return EmaSignal::None;
    }
    let last = n - 1;

    let mut cross = crossed_above(fast, slow, last);
    if !cross && n >= CROSS_LOOKBACK + 2 {
        cross = (1..=CROSS_LOOKBACK).any(|back| crossed_above(fast, slow, last - back));
    }
    if cross {
        return EmaSignal::Cross;
    }

    let rising = n > TREND_RISE_BARS && fast[last] > fast[last - TREND_RISE_BARS];
    if fast[last] > slow[last] && rising {
        EmaSignal::Trend
    } else {
        EmaSignal::None
    }
}

/// EMA30 above EMA200, only judged with at least 200 bars
pub fn is_golden(closes: &[f64]) -> bool {
    if closes.len() < GOLDEN_MIN_BARS {
        return false;
    }

    match (
        calculate_ema_series(closes, 30).last(),
        calculate_ema_series(closes, 200).last(),
    ) {
        (Some(e30), Some(e200)) => e30 > e200,
        _ => false,
    }
}

/// `a` moved from at-or-below `b` at `i - 1` to strictly above at `i`
fn crossed_above(a: &[f64], b: &[f64], i: usize) -> bool {
    i >= 1 && a[i] > b[i] && a[i - 1] <= b[i - 1]
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
