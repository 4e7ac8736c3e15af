//! Composite breakout score
//!
//! Fundamentals (max 35) + technicals (max 41) + liquidity (max 10) + catalyst
//! (always 0 for now), capped at 100. ROE does not score; it only feeds the
//! risk label shown next to the snapshot.

use crate::models::{EmaSignal, RoeRisk, ScoreBreakdown, TechnicalIndicators};

const FUNDAMENTAL_BASE: u32 = 8;
pub const MAX_TOTAL: u32 = 100;

/// Score one ticker
///
/// `daily_value` is the average daily traded value in crore. Pass `None` for
/// `indicators` when history was too short; the technical component is then 0.
pub fn score(
    pe: f64,
    debt_equity: f64,
    _roe: f64,
    daily_value: f64,
    indicators: Option<&TechnicalIndicators>,
) -> ScoreBreakdown {
    let fundamental = fundamental_score(pe, debt_equity, daily_value);
    let technical = indicators.map(technical_score).unwrap_or(0);
    let liquidity = liquidity_score(daily_value);
    let catalyst = 0;

    ScoreBreakdown {
        total: (fundamental + catalyst + technical + liquidity).min(MAX_TOTAL),
        fundamental,
        catalyst,
        technical,
        liquidity,
    }
}

pub fn fundamental_score(pe: f64, debt_equity: f64, daily_value: f64) -> u32 {
    let mut points = FUNDAMENTAL_BASE;

    // loss-making or unreported PE earns nothing
    if pe > 0.0 {
        points += if pe < 15.0 {
            12
        } else if pe < 25.0 {
            9
        } else if pe < 35.0 {
            5
        } else if pe < 50.0 {
            2
        } else {
            0
        };
    }

    points += if debt_equity < 0.3 {
        10
    } else if debt_equity < 0.7 {
        7
    } else if debt_equity < 1.0 {
        4
    } else if debt_equity < 1.5 {
        1
    } else {
        0
    };

    points += if daily_value >= 10.0 {
        5
    } else if daily_value >= 5.0 {
        3
    } else if daily_value >= 2.0 {
        1
    } else {
        0
    };

    points
}

pub fn technical_score(t: &TechnicalIndicators) -> u32 {
    let mut points = 0;

    let rsi = t.rsi;
    points += if (45.0..=58.0).contains(&rsi) {
        12
    } else if rsi > 58.0 && rsi <= 65.0 {
        7
    } else if (40.0..45.0).contains(&rsi) {
        4
    } else if rsi > 65.0 && rsi <= 72.0 {
        2
    } else {
        0
    };

    points += match t.ema_signal {
        EmaSignal::Cross => 12,
        EmaSignal::Trend => 7,
        EmaSignal::None => 0,
    };

    let adx = t.adx;
    points += if (20.0..=35.0).contains(&adx) {
        10
    } else if (15.0..20.0).contains(&adx) {
        5
    } else if adx > 35.0 {
        4
    } else {
        0
    };

    points += match (t.vol_contract, t.vol_expand) {
        (true, true) => 6,
        (false, true) => 3,
        (true, false) => 2,
        (false, false) => 0,
    };

    if t.consolidating {
        points += 5;
    }
    if t.near_52_high {
        points += 3;
    }
    if t.macd {
        points += 2;
    }
    if t.golden {
        points += 1;
    }

    points
}

pub fn liquidity_score(daily_value: f64) -> u32 {
    if daily_value >= 5.0 {
        10
    } else if daily_value >= 2.0 {
        5
    } else if daily_value >= 0.5 {
        2
    } else {
        0
    }
}

/// Label return on equity (in percent)
pub fn roe_risk(roe: f64) -> RoeRisk {
    if roe > 20.0 {
        RoeRisk::High
    } else if roe > 12.0 {
        RoeRisk::Medium
    } else if roe > 0.0 {
        RoeRisk::Low
    } else {
        RoeRisk::Na
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn best_technicals() -> TechnicalIndicators {
        TechnicalIndicators {
            rsi: 52.0,
            macd: true,
            ema_signal: EmaSignal::Cross,
            golden: true,
            adx: 25.0,
            vol_expand: true,
            vol_contract: true,
            consolidating: true,
            near_52_high: true,
        }
    }

    #[test]
    fn test_fundamental_bands() {
        assert_eq!(fundamental_score(12.0, 0.1, 20.0), 8 + 12 + 10 + 5);
        assert_eq!(fundamental_score(20.0, 0.5, 6.0), 8 + 9 + 7 + 3);
        assert_eq!(fundamental_score(30.0, 0.9, 3.0), 8 + 5 + 4 + 1);
        assert_eq!(fundamental_score(45.0, 1.2, 1.0), 8 + 2 + 1);
        assert_eq!(fundamental_score(80.0, 3.0, 0.0), 8);
    }

    #[test]
    fn test_non_positive_pe_scores_nothing() {
        assert_eq!(fundamental_score(0.0, 3.0, 0.0), 8);
        assert_eq!(fundamental_score(-12.0, 3.0, 0.0), 8);
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(fundamental_score(15.0, 0.3, 10.0), 8 + 9 + 7 + 5);
        assert_eq!(liquidity_score(5.0), 10);
        assert_eq!(liquidity_score(4.99), 5);
        assert_eq!(liquidity_score(0.5), 2);
        assert_eq!(liquidity_score(0.49), 0);
    }

    #[test]
    fn test_rsi_bands() {
        let at = |rsi: f64| {
            technical_score(&TechnicalIndicators {
                rsi,
                adx: 0.0,
                ..TechnicalIndicators::neutral()
            })
        };
        assert_eq!(at(45.0), 12);
        assert_eq!(at(58.0), 12);
        assert_eq!(at(58.1), 7);
        assert_eq!(at(65.0), 7);
        assert_eq!(at(40.0), 4);
        assert_eq!(at(44.9), 4);
        assert_eq!(at(72.0), 2);
        assert_eq!(at(72.1), 0);
        assert_eq!(at(39.9), 0);
    }

    #[test]
    fn test_adx_bands() {
        let at = |adx: f64| {
            technical_score(&TechnicalIndicators {
                rsi: 0.0,
                adx,
                ..TechnicalIndicators::neutral()
            })
        };
        assert_eq!(at(20.0), 10);
        assert_eq!(at(35.0), 10);
        assert_eq!(at(15.0), 5);
        assert_eq!(at(19.9), 5);
        assert_eq!(at(35.1), 4);
        assert_eq!(at(14.9), 0);
    }

    #[test]
    fn test_volume_bonus() {
        let at = |vol_contract: bool, vol_expand: bool| {
            technical_score(&TechnicalIndicators {
                rsi: 0.0,
                adx: 0.0,
                vol_contract,
                vol_expand,
                ..TechnicalIndicators::neutral()
            })
        };
        assert_eq!(at(true, true), 6);
        assert_eq!(at(false, true), 3);
        assert_eq!(at(true, false), 2);
        assert_eq!(at(false, false), 0);
    }

    #[test]
    fn test_max_technicals() {
        assert_eq!(technical_score(&best_technicals()), 12 + 12 + 10 + 6 + 5 + 3 + 2 + 1);
    }

    #[test]
    fn test_without_indicators() {
        let breakdown = score(12.0, 0.1, 25.0, 20.0, None);
        assert_eq!(breakdown.technical, 0);
        assert_eq!(breakdown.catalyst, 0);
        assert_eq!(breakdown.fundamental, 35);
        assert_eq!(breakdown.liquidity, 10);
        assert_eq!(breakdown.total, 45);
    }

    #[test]
    fn test_best_case_total() {
        let breakdown = score(12.0, 0.1, 25.0, 20.0, Some(&best_technicals()));
        assert_eq!(breakdown.total, 35 + 51 + 10);
        assert!(breakdown.total <= MAX_TOTAL);
    }

    #[test]
    fn test_total_is_capped_sum() {
        let pes = [-5.0, 0.0, 10.0, 20.0, 30.0, 40.0, 60.0];
        let debts = [-1.0, 0.0, 0.5, 0.8, 1.2, 2.0];
        let values = [0.0, 0.6, 3.0, 7.0, 50.0];
        let technicals = [None, Some(TechnicalIndicators::neutral()), Some(best_technicals())];

        for pe in pes {
            for de in debts {
                for dv in values {
                    for t in &technicals {
                        let b = score(pe, de, 15.0, dv, t.as_ref());
                        let sum = b.fundamental + b.catalyst + b.technical + b.liquidity;
                        assert_eq!(b.total, sum.min(100));
                        assert!(b.total <= 100);
                    }
                }
            }
        }
    }

    #[test]
    fn test_roe_risk() {
        assert_eq!(roe_risk(25.0), RoeRisk::High);
        assert_eq!(roe_risk(20.0), RoeRisk::Medium);
        assert_eq!(roe_risk(12.5), RoeRisk::Medium);
        assert_eq!(roe_risk(12.0), RoeRisk::Low);
        assert_eq!(roe_risk(0.1), RoeRisk::Low);
        assert_eq!(roe_risk(0.0), RoeRisk::Na);
        assert_eq!(roe_risk(-4.0), RoeRisk::Na);
    }
}
