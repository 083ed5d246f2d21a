//! `mordomo-memory` — per-session long-term memory and daily notes.
//!
//! Layout: `memory/<safe-key>/MEMORY.md` plus `memory/<safe-key>/YYYY-MM-DD.md`.
//! The key is path-sanitised with a stable hash suffix, so two different
//! session keys can never share a namespace.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid memory key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, MemoryError>;

pub struct MemoryStore {
    root: PathBuf,
}

impl MemoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dir_for(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.join(sanitize_key(key)?))
    }

    fn long_term_path(&self, key: &str) -> Result<PathBuf> {
        Ok(self.dir_for(key)?.join("MEMORY.md"))
    }

    /// Full long-term document, empty string when none exists yet.
    pub fn read_long_term(&self, key: &str) -> Result<String> {
        let path = self.long_term_path(key)?;
        if !path.exists() {
            return Ok(String::new());
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Replace (or append) one `## heading` section of the long-term document.
    pub fn upsert_section(&self, key: &str, heading: &str, content: &str) -> Result<()> {
        let dir = self.dir_for(key)?;
        fs::create_dir_all(&dir)?;
        let path = self.long_term_path(key)?;
        let existing = if path.exists() {
            fs::read_to_string(&path)?
        } else {
            String::new()
        };

        let mut sections: Vec<(String, String)> = Vec::new();
        let mut current: Option<(String, String)> = None;
        let mut preamble = String::new();
        for line in existing.lines() {
            if line.starts_with("## ") {
                if let Some(sec) = current.take() {
                    sections.push(sec);
                }
                current = Some((line.to_string(), String::new()));
            } else if let Some((_, body)) = current.as_mut() {
                body.push_str(line);
                body.push('\n');
            } else {
                preamble.push_str(line);
                preamble.push('\n');
            }
        }
        if let Some(sec) = current.take() {
            sections.push(sec);
        }

        let mut replaced = false;
        for (head, body) in sections.iter_mut() {
            if head.trim() == heading.trim() {
                *body = format!("{}\n", content.trim_end());
                replaced = true;
            }
        }
        if !replaced {
            sections.push((heading.trim().to_string(), format!("{}\n", content.trim_end())));
        }

        let mut out = preamble;
        for (head, body) in sections {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&head);
            out.push('\n');
            out.push_str(&body);
        }
        atomic_write(&path, out.as_bytes())?;
        debug!(key, heading, "memory section upserted");
        Ok(())
    }

    /// Append a line to the dated daily note, creating it as needed.
    pub fn append_daily_note(&self, key: &str, day: NaiveDate, text: &str) -> Result<()> {
        let dir = self.dir_for(key)?;
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.md", day.format("%Y-%m-%d")));
        let mut existing = if path.exists() {
            fs::read_to_string(&path)?
        } else {
            String::new()
        };
        if !existing.is_empty() && !existing.ends_with('\n') {
            existing.push('\n');
        }
        existing.push_str(text.trim_end());
        existing.push('\n');
        atomic_write(&path, existing.as_bytes())?;
        Ok(())
    }

    pub fn read_daily_note(&self, key: &str, day: NaiveDate) -> Result<String> {
        let path = self.dir_for(key)?.join(format!("{}.md", day.format("%Y-%m-%d")));
        if !path.exists() {
            return Ok(String::new());
        }
        Ok(fs::read_to_string(path)?)
    }
}

/// Write the per-user profile markdown under `workspace/users/`.
pub fn write_user_profile(users_dir: &Path, chat_id: &str, content: &str) -> Result<()> {
    fs::create_dir_all(users_dir)?;
    let path = users_dir.join(format!("{}.md", sanitize_key(chat_id)?));
    atomic_write(&path, content.as_bytes())?;
    Ok(())
}

fn sanitize_key(key: &str) -> Result<String> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(MemoryError::InvalidKey("empty key".into()));
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
    let mut h: u64 = 1469598103934665603;
    for b in trimmed.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(1099511628211);
    }
    Ok(format!("{}-{:08x}", &cleaned[..cleaned.len().min(80)], h as u32))
}

fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("md.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_by_heading() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(tmp.path());
        store.upsert_section("k1", "## Perfil", "Nome: Ana").unwrap();
        store.upsert_section("k1", "## Resumo de conversas", "- pediu lembrete").unwrap();
        store.upsert_section("k1", "## Perfil", "Nome: Ana Maria").unwrap();
        let doc = store.read_long_term("k1").unwrap();
        assert!(doc.contains("Nome: Ana Maria"));
        assert!(!doc.contains("Nome: Ana\n"));
        assert!(doc.contains("- pediu lembrete"));
    }

    #[test]
    fn memory_is_isolated_per_key() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(tmp.path());
        store.upsert_section("whatsapp:userA", "## Perfil", "segredo de A").unwrap();
        let b = store.read_long_term("whatsapp:userB").unwrap();
        assert!(b.is_empty());
        // Keys that sanitise to similar names still do not collide
        store.upsert_section("whatsapp:user_A", "## Perfil", "outro").unwrap();
        let a = store.read_long_term("whatsapp:userA").unwrap();
        assert!(a.contains("segredo de A"));
        assert!(!a.contains("outro"));
    }

    #[test]
    fn daily_notes_accumulate() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(tmp.path());
        let day = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        store.append_daily_note("k", day, "- comprou arroz").unwrap();
        store.append_daily_note("k", day, "- marcou consulta").unwrap();
        let note = store.read_daily_note("k", day).unwrap();
        assert!(note.contains("arroz"));
        assert!(note.contains("consulta"));
    }
}
