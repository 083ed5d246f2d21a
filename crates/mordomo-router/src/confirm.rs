//! Pending confirmations: `(channel, chat_id) → action` with a 5-minute
//! TTL, resolved by the next `1/2/sim/não`-style reply.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

const TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    Exportar,
    DeletarTudo,
    NukeAll,
    /// 👍 on a reminder: confirm the task is actually done.
    CompletionConfirmation { job_id: String },
    CreateShoppingListFromRecipe { items: Vec<String> },
    /// Requested one-shot date already passed; schedule for next year?
    DatePastNextYear { message: String, in_seconds: i64 },
    /// "tenho de X, Y e Z" — list, reminders, or both?
    ListOrEventsChoice { items: Vec<String> },
    /// 👎 on a reminder: change the time or cancel?
    RescheduleOrCancel { job_id: String },
}

#[derive(Debug, Clone)]
pub struct Pending {
    pub action: PendingAction,
    pub payload: Value,
    created_at: Instant,
}

/// Process-wide confirmation map; stale entries evicted lazily on access.
pub struct PendingConfirmations {
    map: DashMap<(String, String), Pending>,
}

impl PendingConfirmations {
    pub fn new() -> Self {
        Self { map: DashMap::new() }
    }

    pub fn install(&self, channel: &str, chat_id: &str, action: PendingAction) {
        self.install_with_payload(channel, chat_id, action, Value::Null);
    }

    pub fn install_with_payload(
        &self,
        channel: &str,
        chat_id: &str,
        action: PendingAction,
        payload: Value,
    ) {
        self.map.insert(
            (channel.to_string(), chat_id.to_string()),
            Pending { action, payload, created_at: Instant::now() },
        );
    }

    /// Remove and return the pending entry, unless expired.
    pub fn take(&self, channel: &str, chat_id: &str) -> Option<Pending> {
        let key = (channel.to_string(), chat_id.to_string());
        let (_, pending) = self.map.remove(&key)?;
        if pending.created_at.elapsed() > TTL {
            return None;
        }
        Some(pending)
    }

    pub fn peek_active(&self, channel: &str, chat_id: &str) -> bool {
        let key = (channel.to_string(), chat_id.to_string());
        let expired = match self.map.get(&key) {
            Some(p) => p.created_at.elapsed() > TTL,
            None => return false,
        };
        if expired {
            self.map.remove(&key);
            return false;
        }
        true
    }
}

impl Default for PendingConfirmations {
    fn default() -> Self {
        Self::new()
    }
}

/// How the user answered a 1/2-style question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    /// Third option where offered (e.g. "both").
    Third,
    Other,
}

pub fn parse_answer(text: &str) -> Answer {
    let t = mordomo_parse::normalize::normalize(text);
    match t.as_str() {
        "1" | "sim" | "s" | "si" | "yes" | "y" | "claro" | "pode" | "quero" | "quero sim"
        | "confirmo" | "ok" | "okay" => Answer::Yes,
        "2" | "nao" | "n" | "no" | "nope" | "cancela" | "cancelar" => Answer::No,
        "3" | "ambos" | "os dois" | "both" => Answer::Third,
        _ => Answer::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_take_roundtrip() {
        let pc = PendingConfirmations::new();
        pc.install("w", "c1", PendingAction::Exportar);
        assert!(pc.peek_active("w", "c1"));
        let p = pc.take("w", "c1").unwrap();
        assert_eq!(p.action, PendingAction::Exportar);
        assert!(pc.take("w", "c1").is_none());
    }

    #[test]
    fn answers_parse() {
        assert_eq!(parse_answer("1"), Answer::Yes);
        assert_eq!(parse_answer("Sim"), Answer::Yes);
        assert_eq!(parse_answer("não"), Answer::No);
        assert_eq!(parse_answer("2"), Answer::No);
        assert_eq!(parse_answer("ambos"), Answer::Third);
        assert_eq!(parse_answer("talvez"), Answer::Other);
    }
}
