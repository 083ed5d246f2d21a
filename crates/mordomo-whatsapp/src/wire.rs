//! Bridge wire format.

use serde::{Deserialize, Serialize};

/// Inbound bridge event, as produced by the bridge process.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub sender: String,
    /// Phone number when `sender` is a LID; empty otherwise.
    #[serde(default)]
    pub pn: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, rename = "isGroup")]
    pub is_group: bool,
    #[serde(default, rename = "pushName")]
    pub push_name: Option<String>,
    #[serde(default, rename = "attachmentIcs")]
    pub attachment_ics: Option<String>,
    #[serde(default)]
    pub reaction: Option<BridgeReaction>,
    #[serde(default)]
    pub audio: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeReaction {
    pub emoji: String,
    #[serde(rename = "targetId")]
    pub target_id: String,
}

/// Outbound send frame.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeSend {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub id: String,
    pub to: String,
    pub content: String,
}

impl BridgeSend {
    pub fn new(id: String, to: String, content: String) -> Self {
        Self { frame_type: "send", id, to, content }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_event_parses() {
        let raw = r#"{
            "type": "message", "id": "m1", "sender": "5511999998888@s.whatsapp.net",
            "pn": "", "content": "oi", "timestamp": 1739188800, "isGroup": false
        }"#;
        let event: BridgeEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.event_type, "message");
        assert_eq!(event.content, "oi");
        assert!(!event.is_group);
    }

    #[test]
    fn reaction_event_parses() {
        let raw = r#"{
            "type": "message", "id": "m2", "sender": "x@s.whatsapp.net",
            "content": "", "timestamp": 1, "isGroup": false,
            "reaction": {"emoji": "👍", "targetId": "m1"}
        }"#;
        let event: BridgeEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.reaction.unwrap().emoji, "👍");
    }
}
