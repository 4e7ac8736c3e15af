//! Full scan: universe → provider → analyzer → scorer → snapshots
//!
//! Provider records arrive with every field optional. All defaulting happens
//! in [`build_snapshot`]; nothing downstream ever sees a missing value.

use crate::api::{SharedProvider, SharedUniverse};
use crate::config::ScanConfig;
use crate::indicators::analyze;
use crate::models::{HistoryBar, PriceSeries, QuoteFundamentals, Snapshot, TechnicalIndicators};
use crate::scoring::{roe_risk, score};
use crate::state::SharedState;
use crate::{Result, ScoutError};
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;

const CRORE: f64 = 1e7;
pub const STRONG_SCORE: u32 = 65;

/// Result of one pass over the universe
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub snapshots: Vec<Snapshot>,
    pub total_scanned: usize,
    pub in_range: usize,
    pub failed: usize,
}

impl ScanReport {
    pub fn strong(&self) -> usize {
        self.snapshots
            .iter()
            .filter(|s| s.score.total >= STRONG_SCORE)
            .count()
    }
}

pub struct Scanner {
    provider: SharedProvider,
    universe: SharedUniverse,
    config: ScanConfig,
}

impl Scanner {
    pub fn new(provider: SharedProvider, universe: SharedUniverse, config: ScanConfig) -> Self {
        Self {
            provider,
            universe,
            config,
        }
    }

    pub fn provider(&self) -> &SharedProvider {
        &self.provider
    }

    /// Walk the whole universe, publishing progress into `state` as it goes
    ///
    /// Never fails: a ticker that errors (or panics) is counted and skipped.
    pub async fn scan(&self, state: &SharedState) -> ScanReport {
        state.begin_scan("Downloading NSE ticker list...");

        let tickers = unique_tickers(self.universe.tickers().await);
        let total = tickers.len();
        state.set_universe(total);

        tracing::info!(
            "🔍 Scanning {} NSE stocks, market cap {}–{} Cr",
            total,
            self.config.mcap_min_cr,
            self.config.mcap_max_cr
        );

        let mut snapshots: Vec<Snapshot> = Vec::new();
        let mut failed = 0;
        let every = self.config.progress_every.max(1);

        for (i, ticker) in tickers.iter().enumerate() {
            if i % every == 0 {
                let percent = (i * 100 / total) as u8;
                state.publish_progress(
                    percent,
                    format!(
                        "Scanning {} of {} ({} found so far)",
                        i + 1,
                        total,
                        snapshots.len()
                    ),
                    snapshots.len(),
                );
            }

            let outcome = AssertUnwindSafe(self.scan_ticker(ticker))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(ScoutError::Provider(format!("{} panicked", ticker))));

            match outcome {
                Ok(Some(snapshot)) => {
                    let star = if snapshot.score.total >= STRONG_SCORE { "⭐" } else { "" };
                    tracing::debug!(
                        ticker = %snapshot.ticker,
                        price = snapshot.price,
                        score = snapshot.score.total,
                        "✅ in range {}",
                        star
                    );
                    snapshots.push(snapshot);
                }
                Ok(None) => {}
                Err(e) => {
                    failed += 1;
                    tracing::debug!(ticker = %ticker, "❌ skipped: {}", e);
                }
            }

            tokio::time::sleep(self.config.request_delay()).await;
        }

        let report = ScanReport {
            in_range: snapshots.len(),
            snapshots,
            total_scanned: total,
            failed,
        };

        tracing::info!("✅ {} stocks in range", report.in_range);
        tracing::info!("⭐ {} strong entry candidates (score {}+)", report.strong(), STRONG_SCORE);
        tracing::info!("❌ {} tickers failed / not found", report.failed);

        report
    }

    /// Fetch and evaluate one ticker
    ///
    /// `Ok(None)` means the ticker was looked at and rejected (out of the cap
    /// window, short history, no usable price); `Err` means the fetch failed.
    pub async fn scan_ticker(&self, ticker: &str) -> Result<Option<Snapshot>> {
        let quote = self.provider.fundamentals(ticker).await?;

        // cheap reject before pulling a year of bars
        let mcap_cr = market_cap_crore(&quote);
        if !in_cap_range(mcap_cr, &self.config) {
            return Ok(None);
        }

        let bars = self.provider.history(ticker).await?;
        Ok(build_snapshot(ticker, &quote, &bars, &self.config))
    }
}

/// Trim, drop blanks and duplicates, keep first-seen order
fn unique_tickers(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|t| t.trim().replace(' ', ""))
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Market cap in whole crore; 0 when the provider has none
pub fn market_cap_crore(quote: &QuoteFundamentals) -> f64 {
    (present(quote.market_cap).unwrap_or(0.0) / CRORE).round()
}

/// Inclusive on both ends
pub fn in_cap_range(mcap_cr: f64, config: &ScanConfig) -> bool {
    mcap_cr >= config.mcap_min_cr && mcap_cr <= config.mcap_max_cr
}

/// Turn provider records into a snapshot, or None when the ticker is unusable
pub fn build_snapshot(
    ticker: &str,
    quote: &QuoteFundamentals,
    bars: &[HistoryBar],
    config: &ScanConfig,
) -> Option<Snapshot> {
    let series = PriceSeries::from_bars(bars);
    if series.len() < config.min_history_bars {
        return None;
    }

    let price = present(quote.current_price)
        .or(present(quote.regular_market_price))
        .or(series.last_close())
        .filter(|p| p.is_finite() && *p > 0.0)?;

    let prev_close = present(quote.previous_close)
        .or_else(|| {
            let n = series.len();
            (n > 1).then(|| series.closes[n - 2])
        })
        .unwrap_or(price);
    let change = if prev_close != 0.0 {
        round2((price - prev_close) / prev_close * 100.0)
    } else {
        0.0
    };

    let pe = round1(
        present(quote.trailing_pe)
            .or(present(quote.forward_pe))
            .unwrap_or(0.0),
    );
    let roe = round1(present(quote.return_on_equity).unwrap_or(0.0) * 100.0);
    let debt_eq = round2(present(quote.debt_to_equity).unwrap_or(0.0) / 100.0);
    let daily_vol = round1(present(quote.average_volume).unwrap_or(0.0) * price / CRORE);

    let wk52_high = present(quote.fifty_two_week_high).unwrap_or(0.0);
    let wk52_low = present(quote.fifty_two_week_low).unwrap_or(0.0);

    let indicators = analyze(&series);
    let breakdown = score(pe, debt_eq, roe, daily_vol, indicators.as_ref());

    let (chart_prices, chart_dates) = chart_tail(&series, config.chart_bars);

    Some(Snapshot {
        ticker: ticker.to_string(),
        name: quote
            .long_name
            .clone()
            .or_else(|| quote.short_name.clone())
            .unwrap_or_else(|| ticker.to_string()),
        sector: quote.sector.clone().unwrap_or_else(|| "Others".to_string()),
        price: round2(price),
        change,
        pe,
        mcap: market_cap_crore(quote) as i64,
        debt_eq,
        roe,
        roe_warn: roe_risk(roe),
        wk52_high: round2(wk52_high),
        wk52_low: round2(wk52_low),
        pct_from_52_high: pct_from(price, wk52_high),
        pct_from_52_low: pct_from(price, wk52_low),
        indicators: indicators.unwrap_or_else(TechnicalIndicators::neutral),
        daily_vol,
        score: breakdown,
        chart_prices,
        chart_dates,
    })
}

/// Last `bars` closes and their dates, finite values only
fn chart_tail(series: &PriceSeries, bars: usize) -> (Vec<f64>, Vec<String>) {
    let start = series.len().saturating_sub(bars);
    series.closes[start..]
        .iter()
        .zip(&series.dates[start..])
        .filter(|(close, _)| close.is_finite())
        .map(|(close, date)| (round2(*close), date.to_string()))
        .unzip()
}

fn pct_from(price: f64, level: f64) -> f64 {
    if level != 0.0 {
        round1((price - level) / level * 100.0)
    } else {
        0.0
    }
}

/// Zero, missing and non-finite provider values all count as absent
pub fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != 0.0)
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
