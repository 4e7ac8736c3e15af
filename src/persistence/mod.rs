use crate::config::CacheConfig;
use crate::models::Snapshot;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static SAVE_SEQ: AtomicU64 = AtomicU64::new(0);

/// The single durable artifact: the whole collection plus when it was saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub stocks: Vec<Snapshot>,
    pub last_updated: String,
    pub saved_at: DateTime<Utc>,
}

/// Outcome of reading the cache at startup
///
/// Every variant other than `Ok` sends the caller to a full scan.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLoad {
    Ok {
        stocks: Vec<Snapshot>,
        last_updated: String,
        age: Duration,
    },
    NoCache,
    Stale {
        age: Duration,
    },
    Empty,
    Corrupt(String),
}

impl CacheLoad {
    pub fn is_ok(&self) -> bool {
        matches!(self, CacheLoad::Ok { .. })
    }
}

/// JSON file store for the snapshot collection
///
/// Writes go to a sibling temp file that is then renamed over the record, so
/// a reader never sees a partially written cache.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    path: PathBuf,
    max_age: Duration,
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            path: path.into(),
            max_age,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.path.clone(), Duration::hours(config.max_age_hours))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Fresh sibling temp file per save, so overlapping saves never share one
    fn temp_path(&self) -> PathBuf {
        let seq = SAVE_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "cache.json".into());
        name.push(format!(".{}.{}.tmp", std::process::id(), seq));
        self.path.with_file_name(name)
    }

    /// Overwrite the record with `stocks`, stamped `now`
    pub async fn save(&self, stocks: &[Snapshot], last_updated: &str, now: DateTime<Utc>) -> Result<()> {
        let record = CacheRecord {
            stocks: stocks.to_vec(),
            last_updated: last_updated.to_string(),
            saved_at: now,
        };
        let bytes = serde_json::to_vec(&record)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        if let Err(e) = write_then_rename(&temp, &self.path, &bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        tracing::info!(
            "💾 Cache saved: {} stocks → {}",
            record.stocks.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Read the record back and judge it against `now`
    pub async fn load(&self, now: DateTime<Utc>) -> CacheLoad {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return CacheLoad::NoCache,
            Err(e) => return CacheLoad::Corrupt(e.to_string()),
        };

        let record: CacheRecord = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(e) => return CacheLoad::Corrupt(e.to_string()),
        };

        // a save stamped in the future reads as fresh
        let age = now - record.saved_at;
        if age > self.max_age {
            return CacheLoad::Stale { age };
        }

        if record.stocks.is_empty() {
            return CacheLoad::Empty;
        }

        CacheLoad::Ok {
            stocks: record.stocks,
            last_updated: record.last_updated,
            age,
        }
    }
}

async fn write_then_rename(temp: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(temp, bytes).await?;
    tokio::fs::rename(temp, path).await
}

/// Hours with one decimal, for log lines
pub fn age_hours(age: Duration) -> f64 {
    (age.num_seconds() as f64 / 3600.0 * 10.0).round() / 10.0
}
