//! External market data sources
//!
//! The scanner and the fast refresh only ever talk to these traits, so tests
//! can swap in scripted providers without touching the network.

pub mod nse;
pub mod yahoo;

pub use nse::{NseUniverse, FALLBACK_TICKERS};
pub use yahoo::YahooProvider;

use crate::models::{HistoryBar, LivePrice, QuoteFundamentals};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Per-ticker quote, fundamentals and daily history
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Quote and fundamentals; any field may be missing
    async fn fundamentals(&self, ticker: &str) -> Result<QuoteFundamentals>;

    /// Roughly one year of daily bars, oldest first
    async fn history(&self, ticker: &str) -> Result<Vec<HistoryBar>>;

    /// Cheap last-price lookup for the intraday refresh
    async fn live_price(&self, ticker: &str) -> Result<LivePrice>;
}

/// Source of the tickers a full scan walks
#[async_trait]
pub trait TickerUniverse: Send + Sync {
    /// Never fails; implementations fall back to a built-in list
    async fn tickers(&self) -> Vec<String>;
}

pub type SharedProvider = Arc<dyn MarketDataProvider>;
pub type SharedUniverse = Arc<dyn TickerUniverse>;
