use super::guard::{ScanGuard, ScanPermit};
use crate::clock::{format_last_updated, format_local_time, session_mode, SharedClock};
use crate::models::LivePrice;
use crate::persistence::{age_hours, CacheLoad, SnapshotCache};
use crate::scanner::{round2, ScanReport, Scanner};
use crate::state::{PriceQuote, PriceUpdate, SharedState};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

/// Answer to a manual rescan request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescanOutcome {
    Started,
    AlreadyRunning,
}

/// Owns every pipeline action the scheduler and the API can trigger
///
/// Provider calls always run outside the state lock; only their results are
/// written back.
pub struct ScanCoordinator {
    scanner: Scanner,
    cache: SnapshotCache,
    state: SharedState,
    clock: SharedClock,
    guard: ScanGuard,
    price_delay: Duration,
}

impl ScanCoordinator {
    pub fn new(
        scanner: Scanner,
        cache: SnapshotCache,
        state: SharedState,
        clock: SharedClock,
        price_delay: Duration,
    ) -> Self {
        Self {
            scanner,
            cache,
            state,
            clock,
            guard: ScanGuard::new(),
            price_delay,
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn guard(&self) -> &ScanGuard {
        &self.guard
    }

    pub fn is_scanning(&self) -> bool {
        self.guard.is_running()
    }

    /// Start a detached full scan unless one is already running
    ///
    /// Returns immediately either way; the scan's progress and result are only
    /// visible through the shared state.
    pub fn try_start_rescan(self: &Arc<Self>) -> RescanOutcome {
        let Some(permit) = self.guard.try_acquire() else {
            tracing::info!("⏳ Rescan rejected: scan already running");
            return RescanOutcome::AlreadyRunning;
        };

        tracing::info!("🔁 Manual full rescan started");
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            coordinator.full_scan_and_save(permit).await;
        });

        RescanOutcome::Started
    }

    /// Full scan then cache save; the permit is released when this returns
    pub async fn full_scan_and_save(&self, permit: ScanPermit) {
        if self.full_scan(&permit).await.is_some() {
            self.save_cache().await;
        }
        drop(permit);
    }

    /// Scan the universe and install the result as one atomic replace
    ///
    /// A scan that panics leaves the previous collection in place, hands the
    /// status back to the session and returns None.
    pub async fn full_scan(&self, _permit: &ScanPermit) -> Option<ScanReport> {
        let report = match AssertUnwindSafe(self.scanner.scan(&self.state))
            .catch_unwind()
            .await
        {
            Ok(report) => report,
            Err(_) => {
                tracing::error!("❌ Full scan panicked, keeping previous data");
                self.state
                    .abort_scan("Scan failed, keeping previous data", session_mode(self.clock.now()));
                return None;
            }
        };

        let now = self.clock.now();
        self.state.complete_scan(
            report.snapshots.clone(),
            report.total_scanned,
            format_last_updated(now),
            session_mode(now),
        );

        Some(report)
    }

    /// Persist the current collection; failures are logged, never raised
    pub async fn save_cache(&self) -> bool {
        let (stocks, last_updated) = self.state.snapshot();
        let last_updated = last_updated.unwrap_or_else(|| format_last_updated(self.clock.now()));

        match self.cache.save(&stocks, &last_updated, self.clock.now()).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("⚠️  Cache save failed: {}", e);
                false
            }
        }
    }

    /// Install the cached collection when it is usable
    pub async fn load_cache(&self) -> bool {
        let now = self.clock.now();
        match self.cache.load(now).await {
            CacheLoad::Ok {
                stocks,
                last_updated,
                age,
            } => {
                let count = stocks.len();
                self.state.install_cache(stocks, last_updated, session_mode(now));
                tracing::info!(
                    "🚀 Cache loaded: {} stocks (age: {:.1}h)",
                    count,
                    age_hours(age)
                );
                true
            }
            CacheLoad::NoCache => {
                tracing::info!("📭 No cache, full scan needed");
                false
            }
            CacheLoad::Stale { age } => {
                tracing::info!(
                    "⏰ Cache {:.1}h old (max {}h), rescan needed",
                    age_hours(age),
                    self.cache_max_age_hours()
                );
                false
            }
            CacheLoad::Empty => {
                tracing::warn!("⚠️  Cache empty, rescan needed");
                false
            }
            CacheLoad::Corrupt(reason) => {
                tracing::warn!("⚠️  Cache load error: {}", reason);
                false
            }
        }
    }

    fn cache_max_age_hours(&self) -> i64 {
        self.cache.max_age().num_hours()
    }

    /// Re-query last price for every known ticker and update price/change in place
    ///
    /// Returns the number of snapshots updated.
    pub async fn fast_refresh(&self) -> usize {
        let quotes = self.state.price_quotes();
        if quotes.is_empty() {
            return 0;
        }

        tracing::info!("🔄 Refreshing {} prices...", quotes.len());

        let provider = self.scanner.provider();
        let mut updates = HashMap::with_capacity(quotes.len());
        for quote in &quotes {
            match provider.live_price(&quote.ticker).await {
                Ok(live) => {
                    if let Some(update) = price_update(quote, &live) {
                        updates.insert(quote.ticker.clone(), update);
                    }
                }
                Err(e) => {
                    tracing::debug!(ticker = %quote.ticker, "live price failed: {}", e);
                }
            }
            tokio::time::sleep(self.price_delay).await;
        }

        let now = self.clock.now();
        let updated = self
            .state
            .apply_prices(&updates, format_last_updated(now), session_mode(now));
        tracing::info!("✅ {} prices updated at {} IST", updated, format_local_time(now));

        updated
    }
}

/// New price/change for a snapshot, or None when the lookup had no usable price
///
/// Without a previous close the change is measured against the price on record.
pub fn price_update(current: &PriceQuote, live: &LivePrice) -> Option<PriceUpdate> {
    let price = live.last_price.filter(|p| p.is_finite() && *p > 0.0)?;
    let prev = live
        .previous_close
        .filter(|p| p.is_finite() && *p != 0.0)
        .unwrap_or(current.price);

    let change = if prev != 0.0 {
        round2((price - prev) / prev * 100.0)
    } else {
        current.change
    };

    Some(PriceUpdate {
        price: round2(price),
        change,
    })
}
