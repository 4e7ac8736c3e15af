//! Single lock-guarded store read by the API and written by the scheduler
//!
//! Nothing outside this module touches the fields directly. Every method takes
//! the lock once, so multi-field updates land as one critical section and
//! readers never see a half-applied scan. No method does I/O under the lock.

use crate::clock::{format_local_time, SessionMode};
use crate::models::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Lifecycle of the snapshot collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    #[default]
    Starting,
    Fetching,
    Live,
    Eod,
}

impl ScanStatus {
    /// Status to show once data is installed, by current session
    pub fn for_session(mode: SessionMode) -> Self {
        if mode == SessionMode::Open {
            ScanStatus::Live
        } else {
            ScanStatus::Eod
        }
    }
}

#[derive(Debug, Clone)]
struct ScoutState {
    stocks: Vec<Snapshot>,
    last_updated: Option<String>,
    status: ScanStatus,
    market_mode: Option<SessionMode>,
    fetch_progress: u8,
    fetch_message: String,
    total_scanned: usize,
    in_range: usize,
}

impl Default for ScoutState {
    fn default() -> Self {
        Self {
            stocks: Vec::new(),
            last_updated: None,
            status: ScanStatus::Starting,
            market_mode: None,
            fetch_progress: 0,
            fetch_message: "Starting...".to_string(),
            total_scanned: 0,
            in_range: 0,
        }
    }
}

/// Fresh price and change for one ticker, produced outside the lock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceUpdate {
    pub price: f64,
    pub change: f64,
}

/// Ticker with the price/change currently on record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub ticker: String,
    pub price: f64,
    pub change: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub status: ScanStatus,
    pub market_mode: &'static str,
    pub last_updated: Option<String>,
    pub fetch_progress: u8,
    pub fetch_message: String,
    pub total_scanned: usize,
    pub in_range: usize,
    pub count: usize,
    pub current_local_time: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StocksView {
    pub status: ScanStatus,
    pub market_mode: &'static str,
    pub last_updated: Option<String>,
    pub stocks: Vec<Snapshot>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricesView {
    pub status: ScanStatus,
    pub last_updated: Option<String>,
    pub prices: Vec<PriceQuote>,
}

fn quotes(stocks: &[Snapshot]) -> Vec<PriceQuote> {
    stocks
        .iter()
        .map(|s| PriceQuote {
            ticker: s.ticker.clone(),
            price: s.price,
            change: s.change,
        })
        .collect()
}

fn mode_label(mode: Option<SessionMode>) -> &'static str {
    mode.map(|m| m.as_str()).unwrap_or("unknown")
}

#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<ScoutState>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    // a panicked writer never leaves the store unusable
    fn lock(&self) -> MutexGuard<'_, ScoutState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ---- writers ----

    /// Enter the fetching state at the start of a full scan
    pub fn begin_scan(&self, message: &str) {
        let mut state = self.lock();
        state.status = ScanStatus::Fetching;
        state.fetch_progress = 0;
        state.fetch_message = message.to_string();
        state.in_range = 0;
    }

    /// Record the universe size once the ticker list is known
    pub fn set_universe(&self, total: usize) {
        let mut state = self.lock();
        state.total_scanned = total;
        state.fetch_message = format!("Scanning {} NSE stocks...", total);
    }

    pub fn publish_progress(&self, percent: u8, message: String, in_range: usize) {
        let mut state = self.lock();
        state.fetch_progress = percent.min(100);
        state.fetch_message = message;
        state.in_range = in_range;
    }

    /// Replace the whole collection with a finished scan
    pub fn complete_scan(
        &self,
        stocks: Vec<Snapshot>,
        total_scanned: usize,
        last_updated: String,
        mode: SessionMode,
    ) {
        let mut state = self.lock();
        let count = stocks.len();
        state.stocks = stocks;
        state.last_updated = Some(last_updated);
        state.market_mode = Some(mode);
        state.status = ScanStatus::for_session(mode);
        state.fetch_progress = 100;
        state.fetch_message = format!("Done: {} stocks in range", count);
        state.in_range = count;
        state.total_scanned = total_scanned;
    }

    /// Install a collection read back from the cache
    pub fn install_cache(&self, stocks: Vec<Snapshot>, last_updated: String, mode: SessionMode) {
        let mut state = self.lock();
        let count = stocks.len();
        state.stocks = stocks;
        state.last_updated = Some(last_updated);
        state.market_mode = Some(mode);
        state.status = ScanStatus::for_session(mode);
        state.fetch_progress = 100;
        state.fetch_message = format!("Loaded {} stocks from cache", count);
        state.in_range = count;
        state.total_scanned = count;
    }

    /// Write refreshed prices in place; every other snapshot field is left alone
    ///
    /// Returns how many snapshots were updated. Tickers that vanished from the
    /// collection since the updates were fetched are ignored. A scan that
    /// started while the prices were in flight keeps its `fetching` status.
    pub fn apply_prices(
        &self,
        updates: &HashMap<String, PriceUpdate>,
        last_updated: String,
        mode: SessionMode,
    ) -> usize {
        let mut state = self.lock();
        let mut updated = 0;
        for stock in state.stocks.iter_mut() {
            if let Some(update) = updates.get(&stock.ticker) {
                stock.price = update.price;
                stock.change = update.change;
                updated += 1;
            }
        }
        state.last_updated = Some(last_updated);
        state.market_mode = Some(mode);
        if state.status != ScanStatus::Fetching {
            state.status = ScanStatus::Live;
        }
        updated
    }

    /// Set the idle status for the session, unless a scan owns the status
    ///
    /// Only [`complete_scan`](Self::complete_scan) and
    /// [`abort_scan`](Self::abort_scan) end `fetching`.
    pub fn settle_status(&self, status: ScanStatus) {
        let mut state = self.lock();
        if state.status != ScanStatus::Fetching {
            state.status = status;
        }
    }

    /// Leave `fetching` after a scan died; the previous collection stays
    pub fn abort_scan(&self, message: &str, mode: SessionMode) {
        let mut state = self.lock();
        state.status = ScanStatus::for_session(mode);
        state.market_mode = Some(mode);
        state.fetch_message = message.to_string();
    }

    pub fn set_market_mode(&self, mode: SessionMode) {
        self.lock().market_mode = Some(mode);
    }

    // ---- readers ----

    pub fn status(&self) -> ScanStatus {
        self.lock().status
    }

    pub fn market_mode(&self) -> Option<SessionMode> {
        self.lock().market_mode
    }

    pub fn count(&self) -> usize {
        self.lock().stocks.len()
    }

    /// Copy of the collection and its display timestamp, for the cache writer
    pub fn snapshot(&self) -> (Vec<Snapshot>, Option<String>) {
        let state = self.lock();
        (state.stocks.clone(), state.last_updated.clone())
    }

    pub fn price_quotes(&self) -> Vec<PriceQuote> {
        quotes(&self.lock().stocks)
    }

    /// Case-insensitive lookup
    pub fn find(&self, ticker: &str) -> Option<Snapshot> {
        let wanted = ticker.trim().to_uppercase();
        self.lock()
            .stocks
            .iter()
            .find(|s| s.ticker.to_uppercase() == wanted)
            .cloned()
    }

    pub fn status_view(&self, now: DateTime<Utc>) -> StatusView {
        let state = self.lock();
        StatusView {
            status: state.status,
            market_mode: mode_label(state.market_mode),
            last_updated: state.last_updated.clone(),
            fetch_progress: state.fetch_progress,
            fetch_message: state.fetch_message.clone(),
            total_scanned: state.total_scanned,
            in_range: state.in_range,
            count: state.stocks.len(),
            current_local_time: format_local_time(now),
        }
    }

    pub fn stocks_view(&self) -> StocksView {
        let state = self.lock();
        StocksView {
            status: state.status,
            market_mode: mode_label(state.market_mode),
            last_updated: state.last_updated.clone(),
            stocks: state.stocks.clone(),
        }
    }

    pub fn prices_view(&self) -> PricesView {
        let state = self.lock();
        PricesView {
            status: state.status,
            last_updated: state.last_updated.clone(),
            prices: quotes(&state.stocks),
        }
    }
}
