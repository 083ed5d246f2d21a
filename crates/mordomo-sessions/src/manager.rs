use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, SessionError};
use crate::types::Session;

/// Session files larger than this roll over: the oldest messages are
/// dropped so one chatty user cannot grow a file without bound.
const MAX_FILE_BYTES: usize = 1024 * 1024;
const ROLLOVER_KEEP: usize = 30;

/// Disk-backed session store, one JSON file per sanitised key.
pub struct SessionManager {
    dir: PathBuf,
}

impl SessionManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Only `[a-zA-Z0-9._-]` survive in file names; everything else maps to
    /// `_`. Distinct keys that sanitise to the same name are avoided by
    /// appending a short hash of the raw key.
    pub fn safe_key(key: &str) -> Result<String> {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(SessionError::InvalidKey("empty session key".into()));
        }
        let cleaned: String = trimmed
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        // Short stable suffix keeps `a:b` and `a_b` apart.
        let mut h: u64 = 1469598103934665603;
        for b in trimmed.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(1099511628211);
        }
        Ok(format!("{}-{:08x}", &cleaned[..cleaned.len().min(80)], h as u32))
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        Ok(self.dir.join(format!("{}.json", Self::safe_key(key)?)))
    }

    pub fn get_or_create(&self, key: &str) -> Result<Session> {
        let path = self.path_for(key)?;
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(raw) => match serde_json::from_str::<Session>(&raw) {
                    Ok(session) => return Ok(session),
                    Err(e) => {
                        warn!(key, "session file unreadable, starting fresh: {e}");
                    }
                },
                Err(e) => warn!(key, "session file read failed, starting fresh: {e}"),
            }
        }
        Ok(Session::new(key))
    }

    /// Atomic write: serialise to a temp file in the same directory, then
    /// rename over the target.
    pub fn save(&self, session: &Session) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&session.key)?;
        let mut to_write = session.clone();
        let mut raw = serde_json::to_string(&to_write)?;
        if raw.len() > MAX_FILE_BYTES {
            let keep_from = to_write.messages.len().saturating_sub(ROLLOVER_KEEP);
            to_write.messages.drain(..keep_from);
            raw = serde_json::to_string(&to_write)?;
            warn!(key = %session.key, "session file rolled over at 1 MB");
        }
        atomic_write(&path, raw.as_bytes())?;
        debug!(key = %session.key, messages = to_write.messages.len(), "session saved");
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        if path.exists() {
            fs::remove_file(path)?;
            return Ok(true);
        }
        Ok(false)
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionMessage;

    #[test]
    fn roundtrip_persists_messages_and_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = SessionManager::new(tmp.path());
        let mut s = mgr.get_or_create("whatsapp:5511@s.whatsapp.net").unwrap();
        s.push(SessionMessage::user("olá"));
        s.set_meta_bool("onboarding_intro_sent", true);
        mgr.save(&s).unwrap();

        let loaded = mgr.get_or_create("whatsapp:5511@s.whatsapp.net").unwrap();
        assert_eq!(loaded.messages.len(), 1);
        assert!(loaded.meta_bool("onboarding_intro_sent"));
    }

    #[test]
    fn distinct_keys_never_collide() {
        let a = SessionManager::safe_key("whatsapp:a:b").unwrap();
        let b = SessionManager::safe_key("whatsapp:a_b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn corrupt_file_starts_fresh() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = SessionManager::new(tmp.path());
        let s = mgr.get_or_create("k").unwrap();
        mgr.save(&s).unwrap();
        let path = tmp
            .path()
            .join(format!("{}.json", SessionManager::safe_key("k").unwrap()));
        fs::write(&path, b"{not json").unwrap();
        let fresh = mgr.get_or_create("k").unwrap();
        assert!(fresh.messages.is_empty());
    }
}
