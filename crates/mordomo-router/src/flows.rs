//! Multi-turn flows kept in session metadata: the vague-time reminder flow
//! ("tenho consulta amanhã" → "A que horas?"), the recurring-event flow
//! ("academia segunda e quarta 19h" → confirm → until when), and the
//! one-message reschedule after a 👎.

use chrono::{Datelike, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::json;

use mordomo_core::types::InboundMessage;
use mordomo_locale::templates;
use mordomo_parse::onboarding_time::parse_local_time;
use mordomo_parse::recurring::{detect_weekly_pattern, parse_recurring_end, RecurringEnd};
use mordomo_parse::time::{
    has_date_word, has_event_keyword, has_time_word, is_consulta_like, parse_reminder_time,
};
use mordomo_sessions::Session;
use mordomo_tools::ToolRegistry;

use crate::{Router, RouterOutcome};

pub const META_REMINDER_FLOW: &str = "pending_reminder_flow";
pub const META_RECURRING_FLOW: &str = "pending_recurring_event_flow";
pub const META_RESCHEDULE: &str = "pending_reschedule_job_id";

const MAX_ATTEMPTS: u64 = 3;

impl Router {
    /// The user's local wall clock, for relative time parsing.
    pub fn local_now(&self, msg: &InboundMessage) -> NaiveDateTime {
        let tz: Tz = self
            .store
            .get_user(&msg.chat_id)
            .ok()
            .flatten()
            .and_then(|u| u.tz_iana)
            .and_then(|t| t.parse().ok())
            .unwrap_or(chrono_tz::UTC);
        Utc.timestamp_millis_opt(self.clock.now_ms())
            .single()
            .unwrap_or_else(Utc::now)
            .with_timezone(&tz)
            .naive_local()
    }
}

/// Continue a flow already in progress. `None` when no flow is active.
pub async fn continue_flow(
    router: &Router,
    msg: &InboundMessage,
    session: &mut Session,
    registry: &ToolRegistry,
) -> Option<RouterOutcome> {
    if session.meta_str(META_RESCHEDULE).is_some() {
        return Some(continue_reschedule(router, msg, session).await);
    }
    if session.meta_value(META_REMINDER_FLOW).is_some() {
        return Some(continue_reminder_flow(router, msg, session, registry).await);
    }
    if session.meta_value(META_RECURRING_FLOW).is_some() {
        return Some(continue_recurring_flow(router, msg, session, registry).await);
    }
    None
}

/// Install a flow when the message has an event but only half the timing.
pub fn maybe_start_flow(
    router: &Router,
    msg: &InboundMessage,
    session: &mut Session,
) -> Option<RouterOutcome> {
    let text = msg.content.trim();
    if text.is_empty() || text.starts_with('/') {
        return None;
    }
    let lang = router.lang_for(msg);

    // Weekly recurring pattern: confirm before registering.
    if let Some(pattern) = detect_weekly_pattern(text) {
        let label = pattern.schedule_label();
        session.set_meta_value(
            META_RECURRING_FLOW,
            json!({
                "stage": "need_confirm",
                "event": pattern.event.clone(),
                "cron_expr": pattern.cron_expr(),
                "label": label,
            }),
        );
        return Some(RouterOutcome::reply(templates::recurring_event_confirm(
            lang,
            &pattern.event,
            &pattern.schedule_label(),
        )));
    }

    let event = has_event_keyword(text);
    let date = has_date_word(text);
    let time = has_time_word(text);
    if event && date && !time {
        session.set_meta_value(
            META_REMINDER_FLOW,
            json!({ "stage": "need_time", "text": text, "attempts": 0 }),
        );
        return Some(RouterOutcome::reply(templates::reminder_ask_time(
            lang,
            is_consulta_like(text),
        )));
    }
    if event && time && !date {
        session.set_meta_value(
            META_REMINDER_FLOW,
            json!({ "stage": "need_date", "text": text, "attempts": 0 }),
        );
        return Some(RouterOutcome::reply(templates::reminder_ask_date(
            lang,
            is_consulta_like(text),
        )));
    }
    None
}

async fn continue_reminder_flow(
    router: &Router,
    msg: &InboundMessage,
    session: &mut Session,
    registry: &ToolRegistry,
) -> RouterOutcome {
    let lang = router.lang_for(msg);
    let state = session.meta_value(META_REMINDER_FLOW).cloned().unwrap_or(json!({}));
    let stage = state["stage"].as_str().unwrap_or("need_time").to_string();
    let original = state["text"].as_str().unwrap_or("").to_string();
    let attempts = state["attempts"].as_u64().unwrap_or(0);

    match stage.as_str() {
        "need_time" | "need_date" => {
            // Merge the new fragment into the original request and re-parse.
            let combined = format!("{} {}", original, msg.content.trim());
            let now = router.local_now(msg);
            let spec = parse_reminder_time(&combined, now);
            let complete = spec.in_seconds.is_some()
                && (stage != "need_time" || has_time_word(&msg.content));
            if complete {
                session.clear_meta(META_REMINDER_FLOW);
                let result = registry
                    .execute(
                        "cron",
                        json!({
                            "action": "add",
                            "message": spec.message,
                            "in_seconds": spec.in_seconds,
                        }),
                    )
                    .await;
                if result.is_error {
                    return RouterOutcome::reply(result.content);
                }
                session.set_meta_value(
                    META_REMINDER_FLOW,
                    json!({ "stage": "need_advance_preference" }),
                );
                return RouterOutcome::Handled(vec![
                    result.content,
                    templates::reminder_ask_advance_preference(lang).to_string(),
                ]);
            }
            // Invalid attempt
            let attempts = attempts + 1;
            if attempts >= MAX_ATTEMPTS {
                session.clear_meta(META_REMINDER_FLOW);
                return RouterOutcome::reply(templates::reminder_failed_no_info(lang));
            }
            let mut updated = state.clone();
            updated["attempts"] = json!(attempts);
            session.set_meta_value(META_REMINDER_FLOW, updated);
            RouterOutcome::reply(templates::reminder_ask_again(lang, attempts as u32))
        }

        "need_advance_preference" => {
            let t = mordomo_parse::normalize::normalize(&msg.content);
            if t.contains("antecedencia") || t.contains("antes") || t.contains("advance") {
                session.set_meta_value(
                    META_REMINDER_FLOW,
                    json!({ "stage": "need_advance_amount" }),
                );
                RouterOutcome::reply(templates::reminder_ask_advance_amount(lang))
            } else {
                // "na hora" or anything else: done, no lead alerts
                session.clear_meta(META_REMINDER_FLOW);
                RouterOutcome::reply("Combinado, lembro na hora. ⏰")
            }
        }

        "need_advance_amount" => {
            session.clear_meta(META_REMINDER_FLOW);
            let now = router.local_now(msg);
            let spec = parse_reminder_time(&msg.content, now);
            match spec.in_seconds {
                Some(secs) if secs > 0 => {
                    if let Some(user) = router.user_for(msg) {
                        let _ = router.store.set_lead_preferences(user.id, Some(secs), &[]);
                    }
                    RouterOutcome::reply(format!(
                        "Anotado: aviso {} min antes dos teus compromissos. ✨",
                        secs / 60
                    ))
                }
                _ => RouterOutcome::reply(templates::reminder_ask_again(lang, 1)),
            }
        }

        _ => {
            session.clear_meta(META_REMINDER_FLOW);
            RouterOutcome::NotHandled
        }
    }
}

async fn continue_recurring_flow(
    router: &Router,
    msg: &InboundMessage,
    session: &mut Session,
    registry: &ToolRegistry,
) -> RouterOutcome {
    let lang = router.lang_for(msg);
    let state = session.meta_value(META_RECURRING_FLOW).cloned().unwrap_or(json!({}));
    let stage = state["stage"].as_str().unwrap_or("need_confirm").to_string();
    let event = state["event"].as_str().unwrap_or("").to_string();
    let cron_expr = state["cron_expr"].as_str().unwrap_or("").to_string();
    let label = state["label"].as_str().unwrap_or("").to_string();

    match stage.as_str() {
        "need_confirm" => {
            match crate::confirm::parse_answer(&msg.content) {
                crate::Answer::Yes => {
                    let mut updated = state.clone();
                    updated["stage"] = json!("need_end_date");
                    session.set_meta_value(META_RECURRING_FLOW, updated);
                    RouterOutcome::reply(templates::recurring_ask_end_date(lang))
                }
                crate::Answer::No => {
                    session.clear_meta(META_RECURRING_FLOW);
                    RouterOutcome::reply(templates::cancelled(lang))
                }
                _ => {
                    session.clear_meta(META_RECURRING_FLOW);
                    // Not an answer — let the normal chain process it.
                    RouterOutcome::NotHandled
                }
            }
        }

        "need_end_date" => {
            let now = router.local_now(msg);
            let end_date: Option<String> = match parse_recurring_end(&msg.content) {
                Some(RecurringEnd::Indefinite) => None,
                Some(RecurringEnd::EndOfWeek) => {
                    let days_to_sunday = 7 - now.weekday().num_days_from_sunday() as i64;
                    Some((now.date() + Duration::days(days_to_sunday % 7)).to_string())
                }
                Some(RecurringEnd::EndOfMonth) => {
                    let first_next = if now.month() == 12 {
                        chrono::NaiveDate::from_ymd_opt(now.year() + 1, 1, 1)
                    } else {
                        chrono::NaiveDate::from_ymd_opt(now.year(), now.month() + 1, 1)
                    };
                    first_next.map(|d| (d - Duration::days(1)).to_string())
                }
                Some(RecurringEnd::EndOfYear) => {
                    chrono::NaiveDate::from_ymd_opt(now.year(), 12, 31).map(|d| d.to_string())
                }
                None => {
                    // Maybe an explicit date
                    let spec = parse_reminder_time(&msg.content, now);
                    match spec.in_seconds {
                        Some(secs) => Some((now + Duration::seconds(secs)).date().to_string()),
                        None => {
                            return RouterOutcome::reply(templates::recurring_ask_end_date_again(
                                lang,
                            ));
                        }
                    }
                }
            };
            session.clear_meta(META_RECURRING_FLOW);
            let mut input = json!({ "action": "add", "message": event, "cron_expr": cron_expr });
            if let Some(end) = &end_date {
                input["end_date"] = json!(end);
            }
            let result = registry.execute("cron", input).await;
            if result.is_error {
                return RouterOutcome::reply(result.content);
            }
            RouterOutcome::reply(templates::recurring_registered(
                lang,
                &event,
                &label,
                end_date.as_deref(),
            ))
        }

        _ => {
            session.clear_meta(META_RECURRING_FLOW);
            RouterOutcome::NotHandled
        }
    }
}

async fn continue_reschedule(
    router: &Router,
    msg: &InboundMessage,
    session: &mut Session,
) -> RouterOutcome {
    let job_id = session.meta_str(META_RESCHEDULE).unwrap_or_default().to_string();
    session.clear_meta(META_RESCHEDULE);
    let lang = router.lang_for(msg);

    // Accept either a reminder-style time or a bare local time.
    let now = router.local_now(msg);
    let spec = parse_reminder_time(&msg.content, now);
    let in_seconds = spec.in_seconds.or_else(|| {
        parse_local_time(&msg.content).map(|(h, m)| {
            let mut target = now.date().and_hms_opt(h, m, 0).unwrap_or(now);
            if target <= now {
                target += Duration::days(1);
            }
            (target - now).num_seconds()
        })
    });
    match in_seconds {
        Some(secs) if secs > 0 => {
            let at_ms = router.clock.now_ms() + secs * 1000;
            match router.cron.reschedule(&job_id, at_ms) {
                Ok(true) => {
                    let tz = router
                        .store
                        .get_user(&msg.chat_id)
                        .ok()
                        .flatten()
                        .and_then(|u| u.tz_iana)
                        .unwrap_or_else(|| "UTC".to_string());
                    let hora =
                        mordomo_locale::tz::format_utc_timestamp_for_user(at_ms / 1000, &tz);
                    RouterOutcome::reply(format!("Alterado: «{job_id}» agora às {hora}. ✨"))
                }
                _ => RouterOutcome::reply(format!("Não encontrei o lembrete «{job_id}».")),
            }
        }
        _ => RouterOutcome::reply(templates::reminder_ask_again(lang, 1)),
    }
}
