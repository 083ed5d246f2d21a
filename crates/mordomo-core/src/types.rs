use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one conversation: a channel name plus the channel-specific
/// chat address (a WhatsApp JID, a CLI pseudo-id, …).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatRef {
    pub channel: String,
    pub chat_id: String,
}

impl ChatRef {
    pub fn new(channel: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Canonical session key: `channel:chat_id`.
    pub fn session_key(&self) -> String {
        format!("{}:{}", self.channel, self.chat_id)
    }
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel, self.chat_id)
    }
}

/// An emoji reaction to a previously delivered message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    /// Message id the reaction targets (carries the job id for reminders).
    pub target_id: String,
}

/// A normalised inbound message, produced by a transport adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub channel: String,
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
    /// Unix seconds as reported by the transport.
    pub timestamp: i64,
    /// Phone number to use for locale inference when `chat_id` is an opaque
    /// LID rather than a phone-derived JID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_for_locale: Option<String>,
    /// Display name pushed by the transport (WhatsApp push-name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<Reaction>,
    /// Raw ICS text attached to the message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_ics: Option<String>,
}

impl InboundMessage {
    pub fn chat(&self) -> ChatRef {
        ChatRef::new(self.channel.clone(), self.chat_id.clone())
    }
}

/// A message queued for delivery through a transport adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel: String,
    pub chat_id: String,
    pub content: String,
    /// Free-form delivery hints (e.g. the originating job id so the
    /// transport can correlate reactions back to reminders).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl OutboundMessage {
    pub fn new(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            metadata: None,
        }
    }

    pub fn with_job_id(mut self, job_id: &str) -> Self {
        self.metadata = Some(serde_json::json!({ "job_id": job_id }));
        self
    }
}
