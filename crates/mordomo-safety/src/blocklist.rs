//! Dangerous-content blocklist: shell substitution, SQL mutation, path
//! traversal, eval/exec, script tags. Matches are refused with a neutral
//! reply and recorded (truncated phone only) for the god-mode `#blocked`
//! view.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

const MAX_ENTRIES: usize = 500;

const PATTERNS: &[(&str, &str)] = &[
    // Shell / command injection
    (r"\$\([^)]*\)", "shell_substitution"),
    (r"`[^`]*`", "backtick_command"),
    (r"\|\s*(?:rm|cat|wget|curl|nc|bash|sh|python)\b", "pipe_command"),
    (r"&&\s*(?:rm|sudo|chmod|wget|curl)\b", "chain_dangerous"),
    (r";\s*(?:rm|sudo|chmod|wget|curl|nc)\b", "semicolon_command"),
    (r"\brm\s+-rf\s+/", "rm_rf_root"),
    (r"\bsudo\s+", "sudo"),
    (r"\bchmod\s+[0-7]{3,4}\s+", "chmod_octal"),
    // SQL injection / DDL
    (r"(?i)\bDROP\s+(?:TABLE|DATABASE|SCHEMA)\b", "sql_drop"),
    (r"(?i)\bDELETE\s+FROM\b", "sql_delete"),
    (r"(?i)\bTRUNCATE\b", "sql_truncate"),
    (r"(?i)\bINSERT\s+INTO\b", "sql_insert"),
    (r"(?i)\bUPDATE\s+\w+\s+SET\b", "sql_update"),
    (r";\s*--\s*$", "sql_comment_injection"),
    // Path traversal
    (r"\.\./\.\./", "path_traversal"),
    (r"/etc/passwd", "path_sensitive"),
    (r"/\.env", "path_env"),
    // Code execution / markup
    (r"\beval\s*\(", "eval"),
    (r"\bexec\s*\(", "exec"),
    (r"(?i)<script\b", "html_script"),
];

fn compiled() -> &'static Vec<(Regex, &'static str)> {
    static CELL: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    CELL.get_or_init(|| {
        PATTERNS
            .iter()
            .map(|(p, reason)| (Regex::new(p).expect("static pattern"), *reason))
            .collect()
    })
}

/// `Some(reason)` when the text matches a blocked pattern.
pub fn is_blocked(text: &str) -> Option<&'static str> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }
    compiled()
        .iter()
        .find(|(re, _)| re.is_match(t))
        .map(|(_, reason)| *reason)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedEntry {
    pub channel: String,
    /// Truncated phone (`55119***8888`) — never the full number.
    pub chat_id: String,
    pub timestamp: i64,
    pub reason: String,
    pub preview: String,
}

/// Append-only JSON log of blocked attempts, capped at 500 entries.
pub struct BlockedStore {
    path: PathBuf,
    entries: Mutex<Vec<BlockedEntry>>,
}

impl BlockedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self { path, entries: Mutex::new(entries) }
    }

    pub fn record(&self, channel: &str, chat_id: &str, preview: &str, reason: &str, now_secs: i64) {
        let digits: String = chat_id.chars().filter(|c| c.is_ascii_digit()).collect();
        let client_id = if digits.len() >= 9 {
            format!("{}***{}", &digits[..5], &digits[digits.len() - 4..])
        } else if !digits.is_empty() {
            digits
        } else {
            chat_id.chars().take(12).collect()
        };
        let mut entries = self.entries.lock().unwrap();
        entries.push(BlockedEntry {
            channel: channel.to_string(),
            chat_id: client_id,
            timestamp: now_secs,
            reason: reason.to_string(),
            preview: preview.chars().take(80).collect(),
        });
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
        debug!(reason, "blocked command recorded");
    }

    /// Per-client totals for `#blocked`, most offenders first.
    pub fn stats(&self) -> Vec<(String, usize)> {
        let entries = self.entries.lock().unwrap();
        let mut by_client: std::collections::HashMap<String, usize> = Default::default();
        for e in entries.iter() {
            *by_client.entry(format!("{}:{}", e.channel, e.chat_id)).or_default() += 1;
        }
        let mut out: Vec<(String, usize)> = by_client.into_iter().collect();
        out.sort_by_key(|(_, n)| std::cmp::Reverse(*n));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangerous_patterns_are_caught() {
        assert_eq!(is_blocked("$(rm -rf /)"), Some("shell_substitution"));
        assert_eq!(is_blocked("DROP TABLE users"), Some("sql_drop"));
        assert_eq!(is_blocked("../../etc/shadow"), Some("path_traversal"));
        assert_eq!(is_blocked("<script>alert(1)</script>"), Some("html_script"));
        assert_eq!(is_blocked("sudo reboot"), Some("sudo"));
    }

    #[test]
    fn normal_messages_pass() {
        assert_eq!(is_blocked("me lembra de pagar a conta amanhã"), None);
        assert_eq!(is_blocked("adiciona arroz à lista de compras"), None);
        assert_eq!(is_blocked(""), None);
    }

    #[test]
    fn store_truncates_phone_and_caps() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BlockedStore::new(tmp.path().join("blocked.json"));
        store.record("whatsapp", "5511999998888@s.whatsapp.net", "DROP TABLE x", "sql_drop", 1);
        let stats = store.stats();
        assert_eq!(stats.len(), 1);
        assert!(stats[0].0.contains("***"));
        assert!(!stats[0].0.contains("99999"));
    }
}
