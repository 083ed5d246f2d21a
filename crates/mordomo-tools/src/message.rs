//! `message` tool — cross-chat delivery only. Answering the current user
//! goes through the normal reply path, never through this tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use mordomo_core::{MessageBus, OutboundMessage};

use crate::{Tool, ToolCtx, ToolResult};

pub struct MessageTool {
    bus: Arc<MessageBus>,
    ctx: ToolCtx,
}

impl MessageTool {
    pub fn new(bus: Arc<MessageBus>, ctx: ToolCtx) -> Self {
        Self { bus, ctx }
    }
}

#[async_trait]
impl Tool for MessageTool {
    fn name(&self) -> &str {
        "message"
    }

    fn description(&self) -> &str {
        "Send a message to ANOTHER chat. Never use this to answer the user \
         you are currently talking to — just reply normally."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "channel": {"type": "string"},
                "chat_id": {"type": "string"},
                "content": {"type": "string"}
            },
            "required": ["channel", "chat_id", "content"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        let channel = input.get("channel").and_then(|v| v.as_str()).unwrap_or("");
        let chat_id = input.get("chat_id").and_then(|v| v.as_str()).unwrap_or("");
        let content = input.get("content").and_then(|v| v.as_str()).unwrap_or("");
        if channel.is_empty() || chat_id.is_empty() || content.is_empty() {
            return ToolResult::error("'channel', 'chat_id' and 'content' are required");
        }
        if channel == self.ctx.channel && chat_id == self.ctx.chat_id {
            return ToolResult::error(
                "refusing to message the current chat — reply directly instead",
            );
        }
        self.bus
            .publish_outbound(OutboundMessage::new(channel, chat_id, content))
            .await;
        ToolResult::success(format!("message queued for {channel}:{chat_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refuses_current_chat() {
        let bus = Arc::new(MessageBus::new());
        let ctx = ToolCtx {
            channel: "whatsapp".into(),
            chat_id: "c1".into(),
            ..Default::default()
        };
        let tool = MessageTool::new(bus.clone(), ctx);
        let res = tool
            .execute(json!({"channel": "whatsapp", "chat_id": "c1", "content": "oi"}))
            .await;
        assert!(res.is_error);

        let res = tool
            .execute(json!({"channel": "whatsapp", "chat_id": "c2", "content": "oi"}))
            .await;
        assert!(!res.is_error);
        let delivered = bus.consume_outbound().await.unwrap();
        assert_eq!(delivered.chat_id, "c2");
    }
}
