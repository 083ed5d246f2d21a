use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Maximum lengths for user-supplied content.
pub const MAX_LIST_NAME_LEN: usize = 128;
pub const MAX_ITEM_TEXT_LEN: usize = 512;
pub const MAX_EVENT_NAME_LEN: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// SHA-256 hex of the phone digits. The raw number is never stored.
    pub phone_hash: String,
    /// Truncated display form for audit logs only (e.g. `5511***9999`).
    pub phone_display: String,
    pub preferred_name: Option<String>,
    pub lang: String,
    pub tz_iana: Option<String>,
    pub city: Option<String>,
    pub quiet_start: Option<String>,
    pub quiet_end: Option<String>,
    pub default_lead_seconds: Option<i64>,
    pub extra_lead_seconds: Vec<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// Timezone falling back to UTC when onboarding hasn't set one.
    pub fn tz_or_utc(&self) -> &str {
        self.tz_iana.as_deref().unwrap_or("UTC")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub project: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItem {
    pub id: i64,
    pub list_id: i64,
    pub text: String,
    pub done: bool,
    pub position: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub user_id: i64,
    /// `evento`, `filme`, `livro`, `musica`, `receita`.
    pub tipo: String,
    /// JSON payload; always carries at least `nome`.
    pub payload: serde_json::Value,
    /// Absolute instant (RFC3339, UTC). Required for `tipo == "evento"`.
    pub data_at: Option<String>,
    pub deleted: bool,
    pub created_at: String,
}

impl Event {
    pub fn nome(&self) -> &str {
        self.payload
            .get("nome")
            .and_then(|v| v.as_str())
            .unwrap_or("(sem nome)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: i64,
    pub action: String,
    pub resource: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub created_at: String,
}

/// Hash the phone digits of a chat id; the raw number never reaches the DB.
pub fn hash_phone(chat_id: &str) -> String {
    let digits: String = chat_id
        .split('@')
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    let input = if digits.is_empty() { chat_id } else { &digits };
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Truncated display form of a phone-bearing chat id for audit logs.
pub fn display_phone(chat_id: &str) -> String {
    let digits: String = chat_id
        .split('@')
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.len() >= 9 {
        format!("{}***{}", &digits[..5], &digits[digits.len() - 4..])
    } else if !digits.is_empty() {
        digits
    } else {
        chat_id.chars().take(12).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_hash_is_stable_and_opaque() {
        let a = hash_phone("5511999999999@s.whatsapp.net");
        let b = hash_phone("5511999999999");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(!a.contains("5511"));
    }

    #[test]
    fn display_phone_truncates() {
        assert_eq!(display_phone("5511999998888@s.whatsapp.net"), "55119***8888");
        assert_eq!(display_phone("123"), "123");
    }
}
