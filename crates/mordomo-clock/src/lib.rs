//! Effective time for the whole process.
//!
//! Container hosts drift. All scheduling and display go through [`Clock`],
//! which adds a process-wide correction offset to the wall clock. A
//! background task compares the wall clock against an external UTC source
//! every 45 minutes; past the threshold it logs a `CLOCK_DRIFT_ALERT` and
//! applies the offset (`CLOCK_DRIFT_CORRECTED`). Only the drift comparison
//! itself reads the raw clock.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub const DRIFT_CHECK_INTERVAL: Duration = Duration::from_secs(45 * 60);
pub const DRIFT_ALERT_THRESHOLD_SECS: i64 = 60;
pub const DRIFT_CORRECT_THRESHOLD_SECS: i64 = 60;
pub const EXTERNAL_TIME_URL: &str = "https://worldtimeapi.org/api/timezone/Etc/UTC";

pub const DRIFT_ALERT_TAG: &str = "CLOCK_DRIFT_ALERT";
pub const DRIFT_CORRECTED_TAG: &str = "CLOCK_DRIFT_CORRECTED";

/// Cheap cloneable handle; the offset is shared across all clones.
#[derive(Debug, Clone)]
pub struct Clock {
    offset_ms: Arc<AtomicI64>,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            offset_ms: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Apply the `CLOCK_OFFSET_SECONDS` operator override, when set.
    pub fn with_env_override(self) -> Self {
        if let Ok(v) = std::env::var("CLOCK_OFFSET_SECONDS") {
            if let Ok(secs) = v.trim().parse::<i64>() {
                self.offset_ms.store(secs * 1000, Ordering::Relaxed);
                info!(offset_secs = secs, "clock offset set from CLOCK_OFFSET_SECONDS");
            }
        }
        self
    }

    /// Effective UTC now (wall clock + correction offset).
    pub fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.now_ms())
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Effective UTC now in milliseconds.
    pub fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis() + self.offset_ms.load(Ordering::Relaxed)
    }

    pub fn offset_ms(&self) -> i64 {
        self.offset_ms.load(Ordering::Relaxed)
    }

    fn apply_offset_ms(&self, offset: i64) {
        self.offset_ms.store(offset, Ordering::Relaxed);
    }

    fn clear_offset_if_set(&self) {
        if self.offset_ms.swap(0, Ordering::Relaxed) != 0 {
            info!("clock drift: offset cleared (wall clock back within threshold)");
        }
    }

    /// Compare the raw wall clock against the external source.
    ///
    /// Network failure never alters the offset — a missing source must not
    /// push reminders off schedule.
    pub async fn check_drift(&self, client: &reqwest::Client, url: &str) -> Option<i64> {
        let wall_ms = Utc::now().timestamp_millis();
        let external_ms = match fetch_external_utc_ms(client, url).await {
            Some(ms) => ms,
            None => return None,
        };
        let drift_secs = (wall_ms - external_ms) / 1000;
        if drift_secs.abs() > DRIFT_ALERT_THRESHOLD_SECS {
            error!(
                tag = DRIFT_ALERT_TAG,
                drift_seconds = drift_secs,
                "server clock out of alignment; reminders may fire at the wrong time"
            );
            if drift_secs.abs() >= DRIFT_CORRECT_THRESHOLD_SECS {
                self.apply_offset_ms(external_ms - wall_ms);
                warn!(
                    tag = DRIFT_CORRECTED_TAG,
                    offset_ms = external_ms - wall_ms,
                    "automatic correction applied; scheduling uses external time until next check"
                );
            }
        } else {
            self.clear_offset_if_set();
            debug!(drift_seconds = drift_secs, "clock drift check ok");
        }
        Some(drift_secs)
    }

    /// Background loop: one check at startup, then every 45 minutes, until
    /// `shutdown` broadcasts `true`.
    pub async fn drift_loop(self, mut shutdown: watch::Receiver<bool>) {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                warn!("clock drift loop disabled: {e}");
                return;
            }
        };
        self.check_drift(&client, EXTERNAL_TIME_URL).await;
        let mut interval = tokio::time::interval(DRIFT_CHECK_INTERVAL);
        interval.tick().await; // first tick fires immediately; already checked
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.check_drift(&client, EXTERNAL_TIME_URL).await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("clock drift loop shutting down");
                        break;
                    }
                }
            }
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

async fn fetch_external_utc_ms(client: &reqwest::Client, url: &str) -> Option<i64> {
    let resp = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!("clock drift check: could not fetch external time: {e}");
            return None;
        }
    };
    let body: serde_json::Value = match resp.json().await {
        Ok(b) => b,
        Err(e) => {
            warn!("clock drift check: bad response body: {e}");
            return None;
        }
    };
    if let Some(unix) = body.get("unixtime").and_then(|v| v.as_i64()) {
        return Some(unix * 1000);
    }
    if let Some(s) = body.get("datetime").and_then(|v| v.as_str()) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.timestamp_millis());
        }
    }
    warn!("clock drift check: no unixtime/datetime in response");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_shifts_effective_time() {
        let clock = Clock::new();
        let before = clock.now_ms();
        clock.apply_offset_ms(90_000);
        let shifted = clock.now_ms();
        assert!(shifted - before >= 90_000);
        clock.clear_offset_if_set();
        assert_eq!(clock.offset_ms(), 0);
    }

    #[test]
    fn clones_share_the_offset() {
        let a = Clock::new();
        let b = a.clone();
        a.apply_offset_ms(5_000);
        assert_eq!(b.offset_ms(), 5_000);
    }
}
