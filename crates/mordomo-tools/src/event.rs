//! `event` tool — agenda events and media collections (filme, livro,
//! música, receita). Events of type `evento` require an absolute date.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::{json, Value};

use mordomo_clock::Clock;
use mordomo_locale::templates;
use mordomo_store::Store;

use crate::{resolve_lang, Tool, ToolCtx, ToolResult};

const EVENT_TYPES: &[&str] = &["evento", "filme", "livro", "musica", "receita"];
const LIMIT_EVENTS_PER_DAY: i64 = 40;

pub struct EventTool {
    store: Arc<Store>,
    clock: Clock,
    ctx: ToolCtx,
}

impl EventTool {
    pub fn new(store: Arc<Store>, clock: Clock, ctx: ToolCtx) -> Self {
        Self { store, clock, ctx }
    }

    fn user_tz(&self) -> Tz {
        self.store
            .get_user(&self.ctx.chat_id)
            .ok()
            .flatten()
            .and_then(|u| u.tz_iana)
            .and_then(|t| t.parse().ok())
            .unwrap_or(chrono_tz::UTC)
    }

    /// Accepts RFC3339 or `YYYY-MM-DD HH:MM` (interpreted in the user tz).
    fn parse_data(&self, raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw.trim()) {
            return Some(dt.with_timezone(&Utc));
        }
        let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M"))
            .ok()?;
        self.user_tz()
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn add(&self, input: &Value) -> ToolResult {
        let lang = resolve_lang(&self.store, &self.ctx);
        let user = match self.store.get_or_create_user(&self.ctx.chat_id, lang.as_str()) {
            Ok(u) => u,
            Err(e) => return ToolResult::error(format!("user lookup failed: {e}")),
        };
        let tipo = input.get("tipo").and_then(|v| v.as_str()).unwrap_or("evento");
        if !EVENT_TYPES.contains(&tipo) {
            return ToolResult::error(format!(
                "unknown tipo: {tipo} (use evento, filme, livro, musica, receita)"
            ));
        }
        let nome = input.get("nome").and_then(|v| v.as_str()).unwrap_or("").trim();
        if nome.is_empty() {
            return ToolResult::error("'nome' is required for add");
        }

        let data_at = input
            .get("data")
            .and_then(|v| v.as_str())
            .and_then(|raw| self.parse_data(raw));
        if tipo == "evento" && data_at.is_none() {
            return ToolResult::error("events of type 'evento' require 'data' (an absolute date)");
        }

        // Per-day quota on agenda events.
        if let Some(at) = data_at {
            let tz = self.user_tz();
            let local = at.with_timezone(&tz);
            let day_start = tz
                .from_local_datetime(&local.date_naive().and_hms_opt(0, 0, 0).unwrap())
                .single();
            if let Some(start) = day_start {
                let start_utc = start.with_timezone(&Utc);
                let end_utc = start_utc + chrono::Duration::days(1);
                match self.store.count_events_between(user.id, start_utc, end_utc) {
                    Ok(n) if n >= LIMIT_EVENTS_PER_DAY => {
                        return ToolResult::success(templates::limit_agenda_per_day_reached(lang));
                    }
                    _ => {}
                }
            }
        }

        let mut payload = input
            .get("payload")
            .cloned()
            .unwrap_or_else(|| json!({}));
        if !payload.is_object() {
            payload = json!({});
        }
        payload["nome"] = json!(nome);
        let payload = mordomo_safety::sanitize::sanitize_payload(&payload, 0);

        match self.store.add_event(user.id, tipo, payload, data_at) {
            Ok(event) => {
                let mut reply = format!("Registado: {} «{}» (id {})", tipo, nome, event.id);
                if let Some(at) = data_at {
                    let local = at.with_timezone(&self.user_tz());
                    reply.push_str(&format!(" em {}", local.format("%d/%m %H:%M")));
                }
                ToolResult::success(reply)
            }
            Err(e) => ToolResult::error(format!("failed to add event: {e}")),
        }
    }

    fn list(&self, input: &Value) -> ToolResult {
        let lang = resolve_lang(&self.store, &self.ctx);
        let user = match self.store.get_or_create_user(&self.ctx.chat_id, lang.as_str()) {
            Ok(u) => u,
            Err(e) => return ToolResult::error(format!("user lookup failed: {e}")),
        };
        match input.get("tipo").and_then(|v| v.as_str()) {
            Some(tipo) if tipo != "evento" => match self.store.events_by_tipo(user.id, tipo, 30) {
                Ok(events) if events.is_empty() => {
                    ToolResult::success(format!("Nenhum registo de {tipo}."))
                }
                Ok(events) => {
                    let mut out = format!("{tipo}:\n");
                    for e in events {
                        out.push_str(&format!("- {} (id {})\n", e.nome(), e.id));
                    }
                    ToolResult::success(out.trim_end().to_string())
                }
                Err(e) => ToolResult::error(format!("failed to list: {e}")),
            },
            _ => {
                let now = Utc.timestamp_millis_opt(self.clock.now_ms()).single().unwrap_or_else(Utc::now);
                match self.store.upcoming_events(user.id, now, 20) {
                    Ok(events) if events.is_empty() => {
                        ToolResult::success("Agenda vazia — nenhum evento futuro.")
                    }
                    Ok(events) => {
                        let tz = self.user_tz();
                        let mut out = String::from("Próximos eventos:\n");
                        for e in events {
                            let when = e
                                .data_at
                                .as_deref()
                                .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
                                .map(|d| d.with_timezone(&tz).format("%d/%m %H:%M").to_string())
                                .unwrap_or_default();
                            out.push_str(&format!("- {} {} (id {})\n", when, e.nome(), e.id));
                        }
                        ToolResult::success(out.trim_end().to_string())
                    }
                    Err(e) => ToolResult::error(format!("failed to list events: {e}")),
                }
            }
        }
    }

    fn remove(&self, input: &Value) -> ToolResult {
        let lang = resolve_lang(&self.store, &self.ctx);
        let user = match self.store.get_or_create_user(&self.ctx.chat_id, lang.as_str()) {
            Ok(u) => u,
            Err(e) => return ToolResult::error(format!("user lookup failed: {e}")),
        };
        let Some(event_id) = input.get("event_id").and_then(|v| v.as_i64()) else {
            return ToolResult::error("'event_id' is required for remove");
        };
        match self.store.soft_delete_event(user.id, event_id) {
            Ok(true) => ToolResult::success(format!("Evento {event_id} removido.")),
            Ok(false) => ToolResult::success(format!("Evento {event_id} não encontrado.")),
            Err(e) => ToolResult::error(format!("failed to remove event: {e}")),
        }
    }
}

#[async_trait]
impl Tool for EventTool {
    fn name(&self) -> &str {
        "event"
    }

    fn description(&self) -> &str {
        "Manage agenda events and media collections. Actions: add, list, remove. \
         tipo is one of evento, filme, livro, musica, receita; tipo 'evento' requires 'data'."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {"type": "string", "enum": ["add", "list", "remove"]},
                "tipo": {"type": "string", "enum": EVENT_TYPES},
                "nome": {"type": "string", "description": "Event or media name"},
                "payload": {"type": "object", "description": "Extra fields (local, pessoas, notas...)"},
                "data": {"type": "string", "description": "Absolute instant: RFC3339 or 'YYYY-MM-DD HH:MM' in the user's timezone"},
                "event_id": {"type": "integer", "description": "Event id (for remove)"}
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        match input.get("action").and_then(|v| v.as_str()) {
            Some("add") => self.add(&input),
            Some("list") => self.list(&input),
            Some("remove") => self.remove(&input),
            other => ToolResult::error(format!("unknown action: {other:?}")),
        }
    }
}
