//! In-memory async queues decoupling transports from the agent loop.
//!
//! One bounded channel per direction. The agent loop consumes inbound
//! messages one at a time, so per-chat ordering is preserved end to end:
//! the bridge socket serialises each chat's messages, and the outbound
//! writer drains a single queue.

use tokio::sync::{mpsc, Mutex};
use tracing::warn;

use crate::types::{InboundMessage, OutboundMessage};

const QUEUE_DEPTH: usize = 256;

pub struct MessageBus {
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: Mutex<mpsc::Receiver<InboundMessage>>,
    outbound_tx: mpsc::Sender<OutboundMessage>,
    outbound_rx: Mutex<mpsc::Receiver<OutboundMessage>>,
}

impl MessageBus {
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(QUEUE_DEPTH);
        let (outbound_tx, outbound_rx) = mpsc::channel(QUEUE_DEPTH);
        Self {
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            outbound_tx,
            outbound_rx: Mutex::new(outbound_rx),
        }
    }

    pub async fn publish_inbound(&self, msg: InboundMessage) {
        if self.inbound_tx.send(msg).await.is_err() {
            warn!("inbound queue closed — message dropped");
        }
    }

    /// Await the next inbound message. Returns `None` when all producers
    /// have been dropped (shutdown).
    pub async fn consume_inbound(&self) -> Option<InboundMessage> {
        self.inbound_rx.lock().await.recv().await
    }

    pub async fn publish_outbound(&self, msg: OutboundMessage) {
        if self.outbound_tx.send(msg).await.is_err() {
            warn!("outbound queue closed — message dropped");
        }
    }

    pub async fn consume_outbound(&self) -> Option<OutboundMessage> {
        self.outbound_rx.lock().await.recv().await
    }

    /// Non-blocking publish for tick loops that must never stall
    /// (scheduler dispatch).
    pub fn try_publish_outbound(&self, msg: OutboundMessage) {
        if self.outbound_tx.try_send(msg).is_err() {
            warn!("outbound queue full or closed — message dropped");
        }
    }

    /// Non-blocking inbound publish, used by the scheduler to feed
    /// `agent_turn` jobs with `deliver=false` back through the agent loop.
    pub fn try_publish_inbound(&self, msg: InboundMessage) {
        if self.inbound_tx.try_send(msg).is_err() {
            warn!("inbound queue full or closed — synthetic turn dropped");
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn inbound_preserves_order() {
        let bus = MessageBus::new();
        for i in 0..3 {
            bus.publish_inbound(InboundMessage {
                channel: "whatsapp".into(),
                chat_id: "c1".into(),
                sender_id: "c1".into(),
                content: format!("m{i}"),
                timestamp: i,
                phone_for_locale: None,
                push_name: None,
                reaction: None,
                attachment_ics: None,
            })
            .await;
        }
        for i in 0..3 {
            let m = bus.consume_inbound().await.unwrap();
            assert_eq!(m.content, format!("m{i}"));
        }
    }

    #[tokio::test]
    async fn try_publish_outbound_never_blocks() {
        let bus = MessageBus::new();
        bus.try_publish_outbound(OutboundMessage::new("whatsapp", "c1", "hi"));
        let m = bus.consume_outbound().await.unwrap();
        assert_eq!(m.content, "hi");
    }
}
