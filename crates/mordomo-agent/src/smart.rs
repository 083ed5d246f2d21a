//! Daily message counter per chat, backing the "at least two messages
//! today" smart-reminder policy.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct DayCount {
    day: String,
    count: u32,
}

pub struct DailyMessageCounter {
    path: PathBuf,
    counts: Mutex<HashMap<String, DayCount>>,
}

impl DailyMessageCounter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let counts = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self { path, counts: Mutex::new(counts) }
    }

    /// Record one user message for `day` (the user-timezone date) and return
    /// the running total.
    pub fn record(&self, chat_id: &str, day: &str) -> u32 {
        let mut counts = self.counts.lock().unwrap();
        let entry = counts.entry(chat_id.to_string()).or_default();
        if entry.day != day {
            entry.day = day.to_string();
            entry.count = 0;
        }
        entry.count += 1;
        let count = entry.count;
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(raw) = serde_json::to_string(&*counts) {
            let _ = fs::write(&self.path, raw);
        }
        count
    }

    pub fn count_today(&self, chat_id: &str, day: &str) -> u32 {
        let counts = self.counts.lock().unwrap();
        counts
            .get(chat_id)
            .filter(|e| e.day == day)
            .map(|e| e.count)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_resets_per_day() {
        let tmp = tempfile::tempdir().unwrap();
        let counter = DailyMessageCounter::new(tmp.path().join("smart.json"));
        assert_eq!(counter.record("c1", "2026-02-10"), 1);
        assert_eq!(counter.record("c1", "2026-02-10"), 2);
        assert_eq!(counter.record("c1", "2026-02-11"), 1);
        assert_eq!(counter.count_today("c1", "2026-02-11"), 1);
    }
}
