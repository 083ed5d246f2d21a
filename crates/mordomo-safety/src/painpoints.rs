//! Painpoint store: signals that a user appears frustrated, surfaced to
//! human support through god-mode `#painpoints`.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

const MAX_ENTRIES: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Painpoint {
    /// Truncated chat id — enough for support to act, no full number.
    pub chat_id: String,
    pub note: String,
    pub timestamp: i64,
}

pub struct PainpointStore {
    path: PathBuf,
    entries: Mutex<Vec<Painpoint>>,
}

impl PainpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self { path, entries: Mutex::new(entries) }
    }

    pub fn add(&self, chat_id: &str, note: &str, now_secs: i64) {
        let short: String = chat_id.chars().take(20).collect();
        let mut entries = self.entries.lock().unwrap();
        entries.push(Painpoint { chat_id: short, note: note.to_string(), timestamp: now_secs });
        let len = entries.len();
        if len > MAX_ENTRIES {
            entries.drain(..len - MAX_ENTRIES);
        }
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(raw) = serde_json::to_string(&*entries) {
            let _ = fs::write(&self.path, raw);
        }
    }

    pub fn recent(&self, limit: usize) -> Vec<Painpoint> {
        let entries = self.entries.lock().unwrap();
        entries.iter().rev().take(limit).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_list() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PainpointStore::new(tmp.path().join("pp.json"));
        store.add("5511999998888@s.whatsapp.net", "frustração detectada", 10);
        let recent = store.recent(5);
        assert_eq!(recent.len(), 1);
        assert!(recent[0].chat_id.len() <= 20);
    }
}
