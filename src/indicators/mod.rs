// Technical indicators module
// RSI, EMA, ATR-based trend strength, volume and price-structure checks,
// combined per ticker by the analyzer

pub mod adx;
pub mod analyzer;
pub mod atr;
pub mod market_analysis;
pub mod moving_average;
pub mod rsi;

pub use adx::calculate_adx;
pub use analyzer::{analyze, classify_ema, is_golden, macd_trigger, MIN_BARS};
pub use atr::{calculate_atr, true_range};
pub use market_analysis::{
    calculate_average_volume, is_consolidating, is_near_52_week_high, volume_pattern,
};
pub use moving_average::{calculate_ema_series, calculate_sma};
pub use rsi::calculate_rsi;
