//! `cron` tool — schedule, list, and remove reminders.
//!
//! The AI calls this when the user asks "me lembra em 30 min", "todo dia às
//! 8h", etc. Duplicate suppression, per-day quotas, dependency chaining,
//! deadlines, and pre-event alerts all happen here, on top of the
//! scheduler's own validation.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::{debug, warn};

use mordomo_clock::Clock;
use mordomo_llm::{ChatMessage, ChatRequest, LlmProvider, Profile};
use mordomo_locale::templates;
use mordomo_locale::tz::format_utc_timestamp_for_user;
use mordomo_locale::Lang;
use mordomo_parse::time::is_vague_reminder_message;
use mordomo_scheduler::{
    AddJob, CronPayload, CronService, PayloadKind, QuotaKind, Schedule, SchedulerError,
};
use mordomo_sessions::SessionManager;
use mordomo_store::Store;

use crate::lead::{is_long_duration, keyword_verdict, AUTO_LEAD_SECONDS};
use crate::{resolve_lang, ToolCtx, Tool, ToolResult};

const MAX_MESSAGE_LEN: usize = 2000;
const DEADLINE_CHECK_DELAY_MS: i64 = 5 * 60 * 1000;

pub struct CronTool {
    cron: Arc<CronService>,
    store: Arc<Store>,
    sessions: Arc<SessionManager>,
    parser: Option<Arc<dyn LlmProvider>>,
    clock: Clock,
    ctx: ToolCtx,
}

impl CronTool {
    pub fn new(
        cron: Arc<CronService>,
        store: Arc<Store>,
        sessions: Arc<SessionManager>,
        parser: Option<Arc<dyn LlmProvider>>,
        clock: Clock,
        ctx: ToolCtx,
    ) -> Self {
        Self { cron, store, sessions, parser, clock, ctx }
    }

    fn lang(&self) -> Lang {
        resolve_lang(&self.store, &self.ctx)
    }

    fn user_tz(&self) -> Option<String> {
        self.store
            .get_user(&self.ctx.chat_id)
            .ok()
            .flatten()
            .and_then(|u| u.tz_iana)
    }

    async fn add(&self, input: &Value) -> ToolResult {
        let lang = self.lang();
        let message = input
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .chars()
            .take(MAX_MESSAGE_LEN)
            .collect::<String>();
        if message.is_empty() {
            return ToolResult::error("'message' is required for the add action");
        }
        if is_vague_reminder_message(&message) {
            return ToolResult::success(templates::reminder_ask_what(lang));
        }

        let in_seconds = input.get("in_seconds").and_then(|v| v.as_i64());
        let every_seconds = input.get("every_seconds").and_then(|v| v.as_i64());
        let cron_expr = input.get("cron_expr").and_then(|v| v.as_str());
        let recurring = every_seconds.is_some() || cron_expr.is_some();
        let not_before_ms = recurring
            .then(|| input.get("start_date").and_then(|v| v.as_str()).and_then(date_start_ms))
            .flatten();
        let not_after_ms = recurring
            .then(|| input.get("end_date").and_then(|v| v.as_str()).and_then(date_end_ms))
            .flatten();

        let now_ms = self.clock.now_ms();
        let (schedule, delete_after_run) = if let Some(secs) = in_seconds.filter(|s| *s > 0) {
            // 366 days covers "same date next year" across a leap year.
            if secs > 86_400 * 366 {
                return ToolResult::error("in_seconds must be between 0 and one year");
            }
            (Schedule::At { at_ms: now_ms + secs * 1000 }, true)
        } else if let Some(secs) = every_seconds.filter(|s| *s > 0) {
            (
                Schedule::Every { every_ms: secs * 1000, not_before_ms, not_after_ms },
                false,
            )
        } else if let Some(expr) = cron_expr.filter(|e| !e.trim().is_empty()) {
            (
                Schedule::Cron {
                    expr: expr.trim().to_string(),
                    tz: self.user_tz(),
                    not_before_ms,
                    not_after_ms,
                },
                false,
            )
        } else {
            return ToolResult::error(
                "use every_seconds (repeat), in_seconds (once), or cron_expr",
            );
        };

        if let Some(secs) = input
            .get("remind_again_if_unconfirmed_seconds")
            .and_then(|v| v.as_i64())
        {
            if !(60..=3600).contains(&secs) {
                return ToolResult::error(
                    "remind_again_if_unconfirmed_seconds must be between 60 and 3600",
                );
            }
        }

        if let Some(dup_reply) = self.check_duplicate(&message, &schedule, lang).await {
            return ToolResult::success(dup_reply);
        }

        let depends_on = input
            .get("depends_on_job_id")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_uppercase().chars().take(16).collect::<String>());
        let has_deadline =
            input.get("has_deadline").and_then(|v| v.as_bool()).unwrap_or(false)
                && in_seconds.map(|s| s > 0).unwrap_or(false);

        let payload = CronPayload {
            kind: PayloadKind::AgentTurn,
            message: message.clone(),
            deliver: true,
            channel: Some(self.ctx.channel.clone()),
            to: Some(self.ctx.chat_id.clone()),
            phone_for_locale: self.ctx.phone_for_locale.clone(),
            remind_again_if_unconfirmed_seconds: input
                .get("remind_again_if_unconfirmed_seconds")
                .and_then(|v| v.as_i64()),
            depends_on_job_id: depends_on.clone(),
            has_deadline,
            ..Default::default()
        };

        let outcome = match self.cron.add_job(AddJob {
            name: message.chars().take(30).collect(),
            schedule: schedule.clone(),
            payload,
            delete_after_run: delete_after_run && !has_deadline,
            suggested_prefix: None,
            allow_relaxed_interval: self.ctx.allow_relaxed_interval,
        }) {
            Ok(outcome) => outcome,
            Err(SchedulerError::QuotaExceeded { kind }) => {
                let reply = match kind {
                    QuotaKind::Total => templates::limit_total_per_day_reached(lang),
                    _ => templates::limit_reminders_per_day_reached(lang),
                };
                return ToolResult::success(reply);
            }
            Err(SchedulerError::IntervalTooShort { min_minutes }) => {
                let reply = if min_minutes <= 30 {
                    templates::reminder_min_interval_30min(lang)
                } else {
                    templates::reminder_min_interval_2h(lang)
                };
                return ToolResult::success(reply);
            }
            Err(SchedulerError::DependencyNotFound { id }) => {
                return ToolResult::success(format!(
                    "Não encontrei o lembrete «{id}» para encadear. Verifica o id em /lembrete."
                ));
            }
            Err(SchedulerError::InvalidSchedule(reason)) => {
                return ToolResult::error(format!("invalid schedule: {reason}"));
            }
            Err(e) => return ToolResult::error(format!("failed to schedule: {e}")),
        };
        let job = outcome.job;

        // Deadline pair: a deadline_check fires 5 minutes past the event and
        // spawns the three post-deadline chasers if still unconfirmed.
        if has_deadline {
            if let Schedule::At { at_ms } = schedule {
                let check = self.cron.add_job(AddJob {
                    name: format!("{} (prazo)", truncate(&message, 22)),
                    schedule: Schedule::At { at_ms: at_ms + DEADLINE_CHECK_DELAY_MS },
                    payload: CronPayload {
                        kind: PayloadKind::DeadlineCheck,
                        message: message.clone(),
                        deliver: false,
                        channel: Some(self.ctx.channel.clone()),
                        to: Some(self.ctx.chat_id.clone()),
                        deadline_check_for_job_id: Some(job.id.clone()),
                        ..Default::default()
                    },
                    delete_after_run: true,
                    suggested_prefix: None,
                    allow_relaxed_interval: false,
                });
                if let Err(e) = check {
                    warn!("deadline check creation failed: {e}");
                }
            }
        }

        // Pre-event alerts for one-shots that deserve advance notice.
        let mut pre_count = 0usize;
        if let Some(secs) = in_seconds.filter(|s| *s > 0) {
            pre_count = self.create_pre_event_reminders(&message, secs, now_ms).await;
        }

        let mut reply = templates::reminder_scheduled(lang, &job.id);
        if pre_count > 0 {
            reply.push_str(&format!(" + {pre_count} aviso(s) antes do evento."));
        }
        if let Some(secs) = input
            .get("remind_again_if_unconfirmed_seconds")
            .and_then(|v| v.as_i64())
        {
            reply.push_str(&format!(" Se não confirmares com 👍, relembro em {} min.", secs / 60));
        }
        if let Some(dep) = depends_on {
            reply.push_str(&format!(" Dispara depois de marcar «{dep}» como feito."));
        }
        if in_seconds.is_some() {
            if let Some(next_ms) = job.state.next_run_at_ms {
                let tz = self.user_tz().unwrap_or_else(|| "UTC".to_string());
                let hora = format_utc_timestamp_for_user(next_ms / 1000, &tz);
                reply.push_str(&templates::reminder_will_fire_at(lang, &hora));
            }
        }
        if outcome.at_warning {
            reply.push_str("\n\n");
            reply.push_str(templates::limit_warning_70(lang));
        }
        ToolResult::success(reply)
    }

    /// Exact duplicates are refused outright; same schedule with a different
    /// message goes to the parser LLM with recent context. Judge failure
    /// lets the creation proceed.
    async fn check_duplicate(
        &self,
        message: &str,
        schedule: &Schedule,
        lang: Lang,
    ) -> Option<String> {
        let candidates = self.cron.jobs_with_same_schedule(&self.ctx.chat_id, schedule);
        if candidates.is_empty() {
            return None;
        }
        let msg_norm = message.to_lowercase();
        for existing in &candidates {
            if existing.payload.message.to_lowercase() == msg_norm {
                return Some(templates::duplicate_reminder(lang, &existing.id));
            }
        }
        let parser = self.parser.as_ref()?;
        let session_key = format!("{}:{}", self.ctx.channel, self.ctx.chat_id);
        let history = self
            .sessions
            .get_or_create(&session_key)
            .map(|s| {
                s.recent(20)
                    .iter()
                    .map(|(role, content)| {
                        format!("{role}: {}", content.chars().take(150).collect::<String>())
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();
        for existing in &candidates {
            let prompt = format!(
                "Conversa recente:\n{}\n\nUtilizador quer criar lembrete: «{}»\n\
                 Já existe lembrete: «{}»\n\n\
                 O novo lembrete é o MESMO que o existente? (ex: mesmo remédio, mesma tarefa)\n\
                 Responde APENAS: SIM ou NAO",
                history.chars().rev().take(2000).collect::<String>().chars().rev().collect::<String>(),
                truncate(message, 200),
                truncate(&existing.payload.message, 200),
            );
            let req = ChatRequest::new(Profile::Parser, vec![ChatMessage::user(prompt)]);
            match parser.chat(&req).await {
                Ok(out) => {
                    let verdict = out.content.trim().to_uppercase();
                    if verdict.contains("SIM") || verdict.starts_with('S') {
                        return Some(templates::duplicate_reminder(lang, &existing.id));
                    }
                }
                Err(e) => {
                    debug!("duplicate judge failed, creating anyway: {e}");
                }
            }
        }
        None
    }

    /// Lead alerts: long events always get one 24h-before alert; shorter
    /// commitment-type reminders follow the user's configured leads (up to
    /// 4). Keyword lists decide most messages; the parser LLM breaks ties.
    /// Failures skip the alert, never the main job.
    async fn create_pre_event_reminders(&self, message: &str, in_seconds: i64, now_ms: i64) -> usize {
        let long_event = is_long_duration(in_seconds);
        let needs_advance = if long_event {
            true
        } else {
            match keyword_verdict(message) {
                Some(verdict) => verdict,
                None => self.judge_needs_advance(message).await,
            }
        };
        if !needs_advance {
            return 0;
        }
        let mut leads: Vec<i64> = Vec::new();
        if long_event {
            leads.push(AUTO_LEAD_SECONDS);
        } else if let Ok(Some(user)) = self.store.get_user(&self.ctx.chat_id) {
            let default = user.default_lead_seconds.unwrap_or(AUTO_LEAD_SECONDS);
            leads.push(default);
            for extra in user.extra_lead_seconds {
                if !leads.contains(&extra) {
                    leads.push(extra);
                }
            }
        } else {
            leads.push(AUTO_LEAD_SECONDS);
        }
        leads.sort_unstable_by(|a, b| b.cmp(a));
        leads.truncate(4);

        let mut created = 0;
        for lead in leads {
            let when = in_seconds - lead;
            if when <= 0 {
                continue;
            }
            let result = self.cron.add_job(AddJob {
                name: format!("{} (antes)", truncate(message, 26)),
                schedule: Schedule::At { at_ms: now_ms + when * 1000 },
                payload: CronPayload {
                    kind: PayloadKind::AgentTurn,
                    message: message.to_string(),
                    deliver: true,
                    channel: Some(self.ctx.channel.clone()),
                    to: Some(self.ctx.chat_id.clone()),
                    phone_for_locale: self.ctx.phone_for_locale.clone(),
                    ..Default::default()
                },
                delete_after_run: true,
                suggested_prefix: None,
                allow_relaxed_interval: false,
            });
            match result {
                Ok(_) => created += 1,
                Err(e) => debug!("pre-event reminder skipped: {e}"),
            }
        }
        created
    }

    /// Tie-breaker for messages neither keyword list recognises: ask the
    /// parser model YES/NO. Unavailable or unreadable answers default to
    /// no advance alerts (the at-the-hour reminder always stands).
    async fn judge_needs_advance(&self, message: &str) -> bool {
        let Some(parser) = self.parser.as_ref() else {
            return false;
        };
        let prompt = format!(
            "The user created a reminder: «{}». \
             Does this reminder typically NEED one or more advance alerts BEFORE the event time? \
             Examples that NEED advance alert: meeting, doctor appointment, flight, bus departure, \
             interview, wedding, exam. \
             Examples that do NOT need advance alert: take medicine at 3pm, wake up at 7am, \
             call someone, send email, drink water. \
             Reply with ONLY one word: YES or NO.",
            truncate(message, 300)
        );
        let req = ChatRequest::new(Profile::Parser, vec![ChatMessage::user(prompt)]);
        match parser.chat(&req).await {
            Ok(out) => out.content.trim().to_uppercase().starts_with("YES"),
            Err(e) => {
                debug!("advance-alert judge failed, no leads: {e}");
                false
            }
        }
    }

    fn list(&self) -> ToolResult {
        let jobs = self.cron.jobs_for_chat(&self.ctx.chat_id);
        if jobs.is_empty() {
            return ToolResult::success("Nenhum lembrete agendado.");
        }
        let mut out = String::from("Lembretes agendados:\n");
        for j in jobs {
            let kind = match j.schedule {
                Schedule::At { .. } => "pontual",
                Schedule::Every { .. } => "recorrente",
                Schedule::Cron { .. } => "recorrente",
            };
            out.push_str(&format!("- {} (id: {}, {})\n", j.name, j.id, kind));
        }
        ToolResult::success(out.trim_end().to_string())
    }

    fn remove(&self, input: &Value) -> ToolResult {
        let Some(job_id) = input.get("job_id").and_then(|v| v.as_str()).filter(|s| !s.is_empty())
        else {
            return ToolResult::error("'job_id' is required for the remove action");
        };
        let job_id: String = job_id.trim().to_uppercase().chars().take(16).collect();
        match self.cron.get_job(&job_id) {
            Some(job) => {
                if job.payload.to.as_deref() != Some(self.ctx.chat_id.as_str()) {
                    return ToolResult::success(format!("Job {job_id} não te pertence."));
                }
                match self.cron.remove_job_and_deadline_followups(&job_id) {
                    Ok(n) if n > 0 => ToolResult::success(format!("Removido: {job_id}")),
                    _ => ToolResult::success(format!("Job {job_id} não encontrado.")),
                }
            }
            None => {
                // One-shots are removed automatically after delivery.
                let hint = self
                    .store
                    .get_user(&self.ctx.chat_id)
                    .ok()
                    .flatten()
                    .and_then(|u| {
                        self.store
                            .recent_reminder_history(u.id, Some("delivered"), 1)
                            .ok()
                    })
                    .and_then(|entries| entries.into_iter().next());
                match hint {
                    Some((_, message, _)) => ToolResult::success(format!(
                        "Job {job_id} não está na lista (lembretes únicos são removidos após disparar). \
                         O último lembrete entregue foi «{}».",
                        truncate(&message, 60)
                    )),
                    None => ToolResult::success(format!(
                        "Job {job_id} não encontrado. Se era um lembrete único, pode já ter sido executado."
                    )),
                }
            }
        }
    }
}

#[async_trait]
impl Tool for CronTool {
    fn name(&self) -> &str {
        "cron"
    }

    fn description(&self) -> &str {
        "Schedule one-time or recurring reminders. Actions: add, list, remove. \
         message = WHAT to remind (e.g. 'ir à farmácia') — required, never the word 'lembrete'. \
         If the user gives a time but no event, ask 'De que é o lembrete?' first. \
         For chaining ('depois de X lembra Y') use depends_on_job_id with the short id of X."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {"type": "string", "enum": ["add", "list", "remove"]},
                "message": {"type": "string", "description": "What to remind. Must describe the EVENT/ACTION, never 'lembrete' or 'alerta'."},
                "in_seconds": {"type": "integer", "description": "One-time reminder in N seconds"},
                "every_seconds": {"type": "integer", "description": "Repeat every N seconds (minimum 7200; 1800 when the user insists)"},
                "cron_expr": {"type": "string", "description": "Five-field cron for fixed times (e.g. '0 9 * * *')"},
                "start_date": {"type": "string", "description": "Recurring only: ISO start date; no fires before it"},
                "end_date": {"type": "string", "description": "Recurring only: ISO end date; no fires after it"},
                "job_id": {"type": "string", "description": "Short job id (for remove)"},
                "remind_again_if_unconfirmed_seconds": {"type": "integer", "description": "Re-send after N seconds unless the user reacts 👍 (60-3600)"},
                "depends_on_job_id": {"type": "string", "description": "Fire only after this job is marked done (👍)"},
                "has_deadline": {"type": "boolean", "description": "True for 'até X': unconfirmed reminders are chased three times past the deadline"}
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        match input.get("action").and_then(|v| v.as_str()) {
            Some("add") => self.add(&input).await,
            Some("list") => self.list(),
            Some("remove") => self.remove(&input),
            other => ToolResult::error(format!("unknown action: {other:?}")),
        }
    }
}

fn date_start_ms(s: &str) -> Option<i64> {
    let date = NaiveDate::from_str(&s.trim().chars().take(10).collect::<String>()).ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

fn date_end_ms(s: &str) -> Option<i64> {
    let date = NaiveDate::from_str(&s.trim().chars().take(10).collect::<String>()).ok()?;
    Some(date.and_hms_opt(23, 59, 59)?.and_utc().timestamp_millis() + 999)
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_window_bounds() {
        let start = date_start_ms("2026-07-01").unwrap();
        let end = date_end_ms("2026-07-01").unwrap();
        assert_eq!(end - start, 86_400_000 - 1);
        assert!(date_start_ms("julho").is_none());
    }
}
