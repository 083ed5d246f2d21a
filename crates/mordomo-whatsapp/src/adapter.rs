//! Bridge connection loop: reads events off the socket, writes outbound
//! frames, reconnects with backoff. Gives up after the retry budget so the
//! CLI can exit with code 2.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::watch;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};
use uuid::Uuid;

use mordomo_core::types::{InboundMessage, Reaction};
use mordomo_core::MessageBus;

use crate::wire::{BridgeEvent, BridgeSend};

const MAX_RETRIES: u32 = 10;
const BACKOFF_BASE: Duration = Duration::from_secs(2);
const MAX_JOB_MAP: usize = 2000;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge disconnected and retries exhausted")]
    RetriesExhausted,
}

/// Maps sent message ids to job ids so a reaction on a reminder delivery
/// resolves back to its job.
struct JobIdMap {
    map: DashMap<String, String>,
}

impl JobIdMap {
    fn new() -> Self {
        Self { map: DashMap::new() }
    }

    fn remember(&self, msg_id: String, job_id: String) {
        if self.map.len() >= MAX_JOB_MAP {
            // Drop an arbitrary chunk; reaction windows are short anyway.
            let stale: Vec<String> = self.map.iter().take(MAX_JOB_MAP / 4).map(|e| e.key().clone()).collect();
            for key in stale {
                self.map.remove(&key);
            }
        }
        self.map.insert(msg_id, job_id);
    }

    fn resolve(&self, msg_id: &str) -> Option<String> {
        self.map.get(msg_id).map(|v| v.clone())
    }
}

fn normalize_event(event: BridgeEvent, jobs: &JobIdMap) -> Option<InboundMessage> {
    if event.event_type != "message" || event.is_group {
        return None;
    }
    let reaction = event.reaction.map(|r| Reaction {
        emoji: r.emoji,
        // A reaction on a reminder delivery resolves to the job id; other
        // reactions keep the raw message id (and go nowhere downstream).
        target_id: jobs.resolve(&r.target_id).unwrap_or(r.target_id),
    });
    Some(InboundMessage {
        channel: "whatsapp".to_string(),
        chat_id: event.sender.clone(),
        sender_id: event.sender,
        content: event.content,
        timestamp: event.timestamp,
        phone_for_locale: (!event.pn.is_empty()).then_some(event.pn),
        push_name: event.push_name,
        reaction,
        attachment_ics: event.attachment_ics,
    })
}

/// Connect to the bridge and pump both directions until shutdown. Returns
/// `RetriesExhausted` when the bridge stays unreachable.
pub async fn run_bridge(
    url: String,
    bus: Arc<MessageBus>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), BridgeError> {
    let jobs = JobIdMap::new();
    let mut retries = 0u32;

    loop {
        if *shutdown.borrow() {
            return Ok(());
        }
        let (stream, _) = match connect_async(url.as_str()).await {
            Ok(ok) => {
                info!("connected to WhatsApp bridge");
                retries = 0;
                ok
            }
            Err(e) => {
                retries += 1;
                if retries >= MAX_RETRIES {
                    warn!("bridge unreachable after {retries} attempts: {e}");
                    return Err(BridgeError::RetriesExhausted);
                }
                let delay = BACKOFF_BASE * retries.min(6);
                warn!("bridge connect failed ({e}); retrying in {delay:?}");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => continue,
                    _ = shutdown.changed() => return Ok(()),
                }
            }
        };
        let (mut ws_tx, mut ws_rx) = stream.split();

        loop {
            tokio::select! {
                frame = ws_rx.next() => {
                    match frame {
                        Some(Ok(WsMessage::Text(raw))) => {
                            match serde_json::from_str::<BridgeEvent>(&raw) {
                                Ok(event) => {
                                    if let Some(msg) = normalize_event(event, &jobs) {
                                        bus.publish_inbound(msg).await;
                                    }
                                }
                                Err(e) => debug!("unparseable bridge frame: {e}"),
                            }
                        }
                        Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => {}
                        Some(Ok(WsMessage::Close(_))) | None => {
                            warn!("bridge socket closed; reconnecting");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!("bridge socket error: {e}; reconnecting");
                            break;
                        }
                    }
                }
                maybe_out = bus.consume_outbound() => {
                    let Some(out) = maybe_out else { return Ok(()) };
                    let msg_id = Uuid::new_v4().to_string();
                    if let Some(job_id) = out
                        .metadata
                        .as_ref()
                        .and_then(|m| m.get("job_id"))
                        .and_then(|v| v.as_str())
                    {
                        jobs.remember(msg_id.clone(), job_id.to_string());
                    }
                    let frame = BridgeSend::new(msg_id, out.chat_id, out.content);
                    let raw = match serde_json::to_string(&frame) {
                        Ok(raw) => raw,
                        Err(e) => {
                            warn!("outbound frame serialisation failed: {e}");
                            continue;
                        }
                    };
                    if let Err(e) = ws_tx.send(WsMessage::text(raw)).await {
                        warn!("bridge send failed: {e}; reconnecting");
                        break;
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("bridge adapter shutting down");
                        let _ = ws_tx.close().await;
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(sender: &str, content: &str, is_group: bool) -> BridgeEvent {
        serde_json::from_value(serde_json::json!({
            "type": "message",
            "id": "m1",
            "sender": sender,
            "content": content,
            "timestamp": 1,
            "isGroup": is_group,
        }))
        .unwrap()
    }

    #[test]
    fn groups_are_dropped() {
        let jobs = JobIdMap::new();
        assert!(normalize_event(event("g@g.us", "oi", true), &jobs).is_none());
        assert!(normalize_event(event("u@s.whatsapp.net", "oi", false), &jobs).is_some());
    }

    #[test]
    fn reactions_resolve_job_ids() {
        let jobs = JobIdMap::new();
        jobs.remember("m9".to_string(), "RE".to_string());
        let mut e = event("u@s.whatsapp.net", "", false);
        e.reaction = Some(crate::wire::BridgeReaction {
            emoji: "👍".to_string(),
            target_id: "m9".to_string(),
        });
        let msg = normalize_event(e, &jobs).unwrap();
        assert_eq!(msg.reaction.unwrap().target_id, "RE");
    }

    #[test]
    fn pn_becomes_phone_for_locale() {
        let jobs = JobIdMap::new();
        let mut e = event("123lid@lid", "oi", false);
        e.pn = "5511999998888".to_string();
        let msg = normalize_event(e, &jobs).unwrap();
        assert_eq!(msg.phone_for_locale.as_deref(), Some("5511999998888"));
    }
}
