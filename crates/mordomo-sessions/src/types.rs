use chrono::Utc;
use serde::{Deserialize, Serialize};

/// When the history reaches this many messages, compression runs.
pub const COMPRESS_THRESHOLD: usize = 45;
/// How many leading messages collapse into one summary.
pub const COMPRESS_BATCH: usize = 25;

pub const TAG_SUMMARY: &str = "summary";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: String,
    pub content: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl SessionMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
            timestamp: Utc::now().to_rfc3339(),
            tag: None,
        }
    }

    pub fn is_summary(&self) -> bool {
        self.tag.as_deref() == Some(TAG_SUMMARY)
    }
}

/// One chat's conversation state: ordered messages plus a small typed
/// metadata bag (onboarding stage, pending flows, nudge flags).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub key: String,
    #[serde(default)]
    pub messages: Vec<SessionMessage>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub updated_at: String,
}

impl Session {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            messages: Vec::new(),
            metadata: serde_json::Map::new(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn push(&mut self, msg: SessionMessage) {
        self.messages.push(msg);
        self.updated_at = Utc::now().to_rfc3339();
    }

    pub fn needs_compression(&self) -> bool {
        self.messages.len() >= COMPRESS_THRESHOLD
    }

    /// Replace the first [`COMPRESS_BATCH`] messages by a single summary
    /// message. No-op unless the threshold is reached, so running it twice
    /// in a row compresses at most once.
    pub fn compress_with_summary(&mut self, summary: impl Into<String>) -> bool {
        if !self.needs_compression() {
            return false;
        }
        let summary_msg = SessionMessage {
            role: "user".to_string(),
            content: format!("[Resumo da conversa anterior]\n{}", summary.into()),
            timestamp: Utc::now().to_rfc3339(),
            tag: Some(TAG_SUMMARY.to_string()),
        };
        let tail = self.messages.split_off(COMPRESS_BATCH);
        self.messages = std::iter::once(summary_msg).chain(tail).collect();
        self.updated_at = Utc::now().to_rfc3339();
        true
    }

    /// Last N messages as (role, content) pairs for prompt building.
    pub fn recent(&self, n: usize) -> Vec<(&str, &str)> {
        let start = self.messages.len().saturating_sub(n);
        self.messages[start..]
            .iter()
            .map(|m| (m.role.as_str(), m.content.as_str()))
            .collect()
    }

    // --- metadata bag -------------------------------------------------------

    pub fn meta_bool(&self, key: &str) -> bool {
        self.metadata.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    pub fn set_meta_bool(&mut self, key: &str, value: bool) {
        self.metadata.insert(key.to_string(), serde_json::Value::Bool(value));
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    pub fn set_meta_str(&mut self, key: &str, value: &str) {
        self.metadata
            .insert(key.to_string(), serde_json::Value::String(value.to_string()));
    }

    pub fn meta_u64(&self, key: &str) -> Option<u64> {
        self.metadata.get(key).and_then(|v| v.as_u64())
    }

    pub fn set_meta_u64(&mut self, key: &str, value: u64) {
        self.metadata.insert(key.to_string(), serde_json::Value::from(value));
    }

    pub fn meta_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    pub fn set_meta_value(&mut self, key: &str, value: serde_json::Value) {
        self.metadata.insert(key.to_string(), value);
    }

    pub fn clear_meta(&mut self, key: &str) {
        self.metadata.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: usize) -> Session {
        let mut s = Session::new("whatsapp:test");
        for i in 0..n {
            s.push(SessionMessage::user(format!("m{i}")));
        }
        s
    }

    #[test]
    fn compression_bound_holds() {
        let mut s = filled(COMPRESS_THRESHOLD);
        assert!(s.compress_with_summary("resumo"));
        // 45 - 25 + 1 = 21
        assert_eq!(s.messages.len(), 21);
        assert!(s.messages[0].is_summary());
    }

    #[test]
    fn compression_twice_is_noop_after_first() {
        let mut s = filled(COMPRESS_THRESHOLD);
        assert!(s.compress_with_summary("resumo"));
        let after_first = s.messages.len();
        assert!(!s.compress_with_summary("resumo de novo"));
        assert_eq!(s.messages.len(), after_first);
    }

    #[test]
    fn below_threshold_never_compresses() {
        let mut s = filled(COMPRESS_THRESHOLD - 1);
        assert!(!s.compress_with_summary("resumo"));
        assert_eq!(s.messages.len(), COMPRESS_THRESHOLD - 1);
    }

    #[test]
    fn metadata_roundtrip() {
        let mut s = Session::new("whatsapp:test");
        s.set_meta_bool("onboarding_intro_sent", true);
        s.set_meta_str("proposed_tz_iana", "Etc/GMT+3");
        s.set_meta_u64("onboarding_nudge_count", 2);
        assert!(s.meta_bool("onboarding_intro_sent"));
        assert_eq!(s.meta_str("proposed_tz_iana"), Some("Etc/GMT+3"));
        assert_eq!(s.meta_u64("onboarding_nudge_count"), Some(2));
        s.clear_meta("proposed_tz_iana");
        assert!(s.meta_str("proposed_tz_iana").is_none());
    }
}
