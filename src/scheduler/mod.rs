//! Background scheduler: startup, full scans, intraday refresh, EOD save
//!
//! ```text
//! STARTING ──cache ok, open──────────────▶ LIVE_LOOP
//!    │     ──cache ok, not open──────────▶ EOD_IDLE
//!    └─────cache unusable──▶ FULL_SCAN ──▶ SAVE_CACHE ──▶ LIVE_LOOP | EOD_IDLE
//! ```
//!
//! After startup every tick re-reads the session mode and moves between
//! LIVE_LOOP and EOD_IDLE. Manual rescans run beside the loop through
//! [`ScanCoordinator::try_start_rescan`], never inside it.

pub mod coordinator;
pub mod guard;

pub use coordinator::{price_update, RescanOutcome, ScanCoordinator};
pub use guard::{ScanGuard, ScanPermit};

use crate::clock::SessionMode;
use crate::state::ScanStatus;
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    FullScan,
    SaveCache,
    LiveLoop,
    EodIdle,
}

impl Phase {
    fn idle_for(mode: SessionMode) -> Self {
        if mode == SessionMode::Open {
            Phase::LiveLoop
        } else {
            Phase::EodIdle
        }
    }
}

/// Wake-up source for the steady-state loop
#[async_trait]
pub trait Ticker: Send {
    /// Wait for the next wake-up; false ends the loop
    async fn tick(&mut self) -> bool;
}

/// Fixed-period ticker; the first wake-up comes one full period after start
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

pub struct Scheduler {
    coordinator: Arc<ScanCoordinator>,
    phase: Phase,
    eod_saved: bool,
    ignore_cache: bool,
}

impl Scheduler {
    pub fn new(coordinator: Arc<ScanCoordinator>) -> Self {
        Self {
            coordinator,
            phase: Phase::Starting,
            eod_saved: false,
            ignore_cache: false,
        }
    }

    /// Skip the cache at startup and always run a full scan
    pub fn ignore_cache(mut self, ignore: bool) -> Self {
        self.ignore_cache = ignore;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run startup, then one [`on_tick`](Self::on_tick) per wake-up until the ticker ends
    ///
    /// A panic in any single pass is logged and the loop carries on.
    pub async fn run(mut self, mut ticker: impl Ticker) {
        if AssertUnwindSafe(self.start()).catch_unwind().await.is_err() {
            tracing::error!("❌ [SCHEDULER] Startup pass panicked, continuing with the refresh loop");
            self.phase = Phase::idle_for(self.coordinator.clock().session_mode());
        }

        while ticker.tick().await {
            if AssertUnwindSafe(self.on_tick()).catch_unwind().await.is_err() {
                tracing::error!("❌ [SCHEDULER] Tick panicked, waiting for the next one");
            }
        }

        tracing::info!("[SCHEDULER] Ticker closed, scheduler stopped");
    }

    /// STARTING: use the cache when it is good, otherwise scan and save
    pub async fn start(&mut self) {
        self.phase = Phase::Starting;
        tracing::info!("📂 Checking for saved cache...");

        let cache_ok = if self.ignore_cache {
            tracing::info!("Cache ignored on request");
            false
        } else {
            self.coordinator.load_cache().await
        };

        if cache_ok {
            let mode = self.coordinator.clock().session_mode();
            if mode == SessionMode::Open {
                tracing::info!("🔄 Refreshing prices from cache...");
                self.coordinator.fast_refresh().await;
            } else {
                tracing::info!("📴 Market {}, using cached prices", mode);
            }
            self.phase = Phase::idle_for(mode);
            return;
        }

        match self.coordinator.guard().try_acquire() {
            Some(permit) => {
                tracing::info!("🚀 Starting full NSE scan...");
                self.phase = Phase::FullScan;
                if self.coordinator.full_scan(&permit).await.is_some() {
                    self.phase = Phase::SaveCache;
                    self.coordinator.save_cache().await;
                }
                drop(permit);
            }
            None => tracing::info!("⏳ A scan is already running, skipping the startup scan"),
        }

        self.phase = Phase::idle_for(self.coordinator.clock().session_mode());
    }

    /// One steady-state pass
    ///
    /// - open: fast refresh, status live, re-arm the EOD save
    /// - eod: status eod, save the cache once per session
    /// - pre / weekend: status eod, nothing else
    ///
    /// While a full scan is running only the market mode is updated; the scan
    /// owns status and the collection until it finishes.
    pub async fn on_tick(&mut self) {
        let mode = self.coordinator.clock().session_mode();
        let state = self.coordinator.state();
        state.set_market_mode(mode);

        if self.coordinator.is_scanning() {
            tracing::debug!("[SCHEDULER] Full scan in progress, skipping {} tick", mode);
            return;
        }

        match mode {
            SessionMode::Open => {
                self.coordinator.fast_refresh().await;
                state.settle_status(ScanStatus::Live);
                self.eod_saved = false;
            }
            SessionMode::Eod => {
                state.settle_status(ScanStatus::Eod);
                if !self.eod_saved {
                    tracing::info!("🌙 Market closed, saving EOD cache...");
                    // a failed save is retried on the next tick
                    self.eod_saved = self.coordinator.save_cache().await;
                }
            }
            SessionMode::Pre | SessionMode::Weekend => {
                state.settle_status(ScanStatus::Eod);
            }
        }

        self.phase = Phase::idle_for(mode);
    }
}
