//! Deferred apology for stale reminders removed at startup. Sending it on
//! the user's second message keeps it from reading as spam.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PendingApology {
    removed: Vec<String>,
    /// Counts down on each user turn; fires at zero.
    messages_until_send: u32,
}

pub struct StaleRemovalStore {
    path: PathBuf,
    pending: Mutex<HashMap<String, PendingApology>>,
}

impl StaleRemovalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let pending = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self { path, pending: Mutex::new(pending) }
    }

    /// Queue an apology for this chat after the startup sweep.
    pub fn queue(&self, chat_id: &str, removed: Vec<String>) {
        if removed.is_empty() {
            return;
        }
        let mut pending = self.pending.lock().unwrap();
        pending.insert(
            chat_id.to_string(),
            PendingApology { removed, messages_until_send: 2 },
        );
        self.persist(&pending);
    }

    /// Called on every user turn. Returns the removed names once the
    /// countdown hits zero.
    pub fn consume(&self, chat_id: &str) -> Option<Vec<String>> {
        let mut pending = self.pending.lock().unwrap();
        let entry = pending.get_mut(chat_id)?;
        if entry.messages_until_send > 1 {
            entry.messages_until_send -= 1;
            self.persist(&pending);
            return None;
        }
        let removed = pending.remove(chat_id).map(|p| p.removed);
        self.persist(&pending);
        removed
    }

    fn persist(&self, pending: &HashMap<String, PendingApology>) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(raw) = serde_json::to_string(pending) {
            let _ = fs::write(&self.path, raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apology_waits_two_turns() {
        let tmp = tempfile::tempdir().unwrap();
        let store = StaleRemovalStore::new(tmp.path().join("stale.json"));
        store.queue("c1", vec!["remédio".to_string()]);
        assert!(store.consume("c1").is_none()); // first turn: countdown
        let removed = store.consume("c1").unwrap(); // second turn: fire
        assert_eq!(removed, vec!["remédio"]);
        assert!(store.consume("c1").is_none()); // consumed
    }
}
