//! Scripted collaborators and fixtures shared by unit tests

use crate::api::{MarketDataProvider, TickerUniverse};
use crate::models::{
    HistoryBar, LivePrice, QuoteFundamentals, RoeRisk, ScoreBreakdown, Snapshot,
    TechnicalIndicators,
};
use crate::{Result, ScoutError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// UTC instant for a local market wall-clock time
pub fn local_instant(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> DateTime<Utc> {
    let wall = NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(hh, mm, 0)
        .unwrap();
    (wall - chrono::Duration::minutes(5 * 60 + 30)).and_utc()
}

/// `n` daily bars with closes `start, start + step, ...`
pub fn rising_bars(n: usize, start: f64, step: f64) -> Vec<HistoryBar> {
    let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let close = start + step * i as f64;
            HistoryBar {
                date: first + chrono::Duration::days(i as i64),
                open: Some(close),
                high: Some(close * 1.01),
                low: Some(close * 0.99),
                close: Some(close),
                volume: Some(100_000.0),
            }
        })
        .collect()
}

/// Quote with only a market cap (in crore) set
pub fn sample_quote(mcap_cr: f64) -> QuoteFundamentals {
    QuoteFundamentals {
        market_cap: Some(mcap_cr * 1e7),
        ..QuoteFundamentals::default()
    }
}

pub fn sample_snapshot(ticker: &str, price: f64) -> Snapshot {
    Snapshot {
        ticker: ticker.to_string(),
        name: format!("{} Limited", ticker),
        sector: "Industrials".to_string(),
        price,
        change: 1.5,
        pe: 22.4,
        mcap: 4_200,
        debt_eq: 0.35,
        roe: 18.2,
        roe_warn: RoeRisk::Medium,
        wk52_high: price * 1.1,
        wk52_low: price * 0.6,
        pct_from_52_high: -9.1,
        pct_from_52_low: 66.7,
        indicators: TechnicalIndicators::neutral(),
        daily_vol: 6.3,
        score: ScoreBreakdown {
            total: 55,
            fundamental: 27,
            catalyst: 0,
            technical: 18,
            liquidity: 10,
        },
        chart_prices: vec![price * 0.98, price * 0.99, price],
        chart_dates: vec![
            "2024-05-29".to_string(),
            "2024-05-30".to_string(),
            "2024-05-31".to_string(),
        ],
    }
}

/// In-memory provider; unknown tickers fail like a 404 would
#[derive(Default)]
pub struct ScriptedProvider {
    quotes: HashMap<String, QuoteFundamentals>,
    histories: HashMap<String, Vec<HistoryBar>>,
    live: Mutex<HashMap<String, LivePrice>>,
    gate: Option<Arc<Semaphore>>,
    live_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock(mut self, ticker: &str, quote: QuoteFundamentals, bars: Vec<HistoryBar>) -> Self {
        self.quotes.insert(ticker.to_string(), quote);
        self.histories.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_live_price(self, ticker: &str, last_price: f64, previous_close: f64) -> Self {
        self.set_live_price(ticker, last_price, previous_close);
        self
    }

    /// Every `fundamentals` call waits for a permit on `gate`
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_live_price(&self, ticker: &str, last_price: f64, previous_close: f64) {
        self.live.lock().unwrap().insert(
            ticker.to_string(),
            LivePrice {
                last_price: Some(last_price),
                previous_close: Some(previous_close),
            },
        );
    }

    pub fn live_calls(&self) -> usize {
        self.live_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    async fn fundamentals(&self, ticker: &str) -> Result<QuoteFundamentals> {
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.quotes
            .get(ticker)
            .cloned()
            .ok_or_else(|| ScoutError::Provider(format!("unknown ticker {}", ticker)))
    }

    async fn history(&self, ticker: &str) -> Result<Vec<HistoryBar>> {
        self.histories
            .get(ticker)
            .cloned()
            .ok_or_else(|| ScoutError::Provider(format!("unknown ticker {}", ticker)))
    }

    async fn live_price(&self, ticker: &str) -> Result<LivePrice> {
        self.live_calls.fetch_add(1, Ordering::SeqCst);
        self.live
            .lock()
            .unwrap()
            .get(ticker)
            .copied()
            .ok_or_else(|| ScoutError::Provider(format!("no live price for {}", ticker)))
    }
}

/// Fixed ticker list that counts how often it was asked
#[derive(Default)]
pub struct StaticUniverse {
    tickers: Vec<String>,
    calls: AtomicUsize,
}

impl StaticUniverse {
    pub fn new(tickers: &[&str]) -> Self {
        Self {
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TickerUniverse for StaticUniverse {
    async fn tickers(&self) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tickers.clone()
    }
}
