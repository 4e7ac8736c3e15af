//! Market session classification on a fixed UTC+5:30 offset (no DST)

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const IST_OFFSET_SECS: i64 = 5 * 3600 + 30 * 60;
const OPEN_MINUTE: u32 = 9 * 60 + 15;
const CLOSE_MINUTE: u32 = 15 * 60 + 30;

/// Where an instant falls relative to trading hours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Pre,
    Open,
    Eod,
    Weekend,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Pre => "pre",
            SessionMode::Open => "open",
            SessionMode::Eod => "eod",
            SessionMode::Weekend => "weekend",
        }
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert an instant to local market wall-clock time
pub fn to_local(instant: DateTime<Utc>) -> NaiveDateTime {
    instant.naive_utc() + chrono::Duration::seconds(IST_OFFSET_SECS)
}

/// Classify an instant into a session mode
pub fn session_mode(instant: DateTime<Utc>) -> SessionMode {
    let local = to_local(instant);

    if local.weekday().num_days_from_monday() >= 5 {
        return SessionMode::Weekend;
    }

    let minutes = local.hour() * 60 + local.minute();
    if (OPEN_MINUTE..CLOSE_MINUTE).contains(&minutes) {
        SessionMode::Open
    } else if minutes >= CLOSE_MINUTE {
        SessionMode::Eod
    } else {
        SessionMode::Pre
    }
}

/// Display string used for `lastUpdated`
pub fn format_last_updated(instant: DateTime<Utc>) -> String {
    to_local(instant).format("%d %b %Y, %I:%M %p IST").to_string()
}

/// Wall-clock time of day in local market time
pub fn format_local_time(instant: DateTime<Utc>) -> String {
    to_local(instant).format("%H:%M:%S").to_string()
}

/// Time source, injectable so session transitions can be driven from tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn session_mode(&self) -> SessionMode {
        session_mode(self.now())
    }
}

pub type SharedClock = Arc<dyn Clock>;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = instant;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
