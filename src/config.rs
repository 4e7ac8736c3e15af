//! Layered service configuration
//!
//! Defaults are baked into the `Default` impls below, then overridden by an
//! optional TOML file and finally by `SCOUT__SECTION__KEY` environment variables.

use crate::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "scout.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Front-end page served at `/` when present
    pub index_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            index_file: Some(PathBuf::from("index.html")),
        }
    }
}

/// Full scan parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Market cap window in crore, both ends inclusive
    pub mcap_min_cr: f64,
    pub mcap_max_cr: f64,
    /// Pause after every ticker request
    pub request_delay_ms: u64,
    /// Publish progress every N tickers
    pub progress_every: usize,
    pub chart_bars: usize,
    pub min_history_bars: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mcap_min_cr: 100.0,
            mcap_max_cr: 10_000.0,
            request_delay_ms: 1000,
            progress_every: 20,
            chart_bars: 60,
            min_history_bars: 30,
        }
    }
}

impl ScanConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    pub price_delay_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5 * 60,
            price_delay_ms: 150,
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn price_delay(&self) -> Duration {
        Duration::from_millis(self.price_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub path: PathBuf,
    pub max_age_hours: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("cache.json"),
            max_age_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Exchange suffix appended to every ticker before it hits the provider
    pub symbol_suffix: String,
    pub requests_per_minute: u32,
    pub timeout_secs: u64,
    pub universe_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query2.finance.yahoo.com".to_string(),
            symbol_suffix: ".NS".to_string(),
            requests_per_minute: 120,
            timeout_secs: 20,
            universe_url: "https://archives.nseindia.com/content/equities/EQUITY_L.csv"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "street_scout=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub scan: ScanConfig,
    pub refresh: RefreshConfig,
    pub cache: CacheConfig,
    pub provider: ProviderConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// Load defaults, then the optional file at `path`, then `SCOUT__*` env vars
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("SCOUT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
