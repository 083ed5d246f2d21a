//! Agenda views: /hoje, /agenda, /semana, /mes, /timeline, /stats,
//! /resumo, /produtividade, /revisao. Pure store reads formatted in the
//! user's timezone.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use chrono_tz::Tz;

use mordomo_core::types::InboundMessage;
use mordomo_store::{Event, User};

use crate::Router;

fn user_tz(user: &User) -> Tz {
    user.tz_iana
        .as_deref()
        .and_then(|t| t.parse().ok())
        .unwrap_or(chrono_tz::UTC)
}

fn format_events(events: &[Event], tz: &Tz) -> String {
    let mut out = String::new();
    for e in events {
        let when = e
            .data_at
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(tz).format("%a %d/%m %H:%M").to_string())
            .unwrap_or_default();
        out.push_str(&format!("- {} {}\n", when, e.nome()));
    }
    out.trim_end().to_string()
}

impl Router {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.clock.now_ms())
            .single()
            .unwrap_or_else(Utc::now)
    }

    fn day_bounds(&self, user: &User, days_ahead: i64) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let tz = user_tz(user);
        let local_now = self.now_utc().with_timezone(&tz);
        let day = local_now.date_naive() + Duration::days(days_ahead);
        let start = tz.from_local_datetime(&day.and_hms_opt(0, 0, 0)?).single()?;
        Some((
            start.with_timezone(&Utc),
            (start + Duration::days(1)).with_timezone(&Utc),
        ))
    }

    pub fn view_hoje(&self, msg: &InboundMessage) -> String {
        let Some(user) = self.user_for(msg) else {
            return "Agenda indisponível.".to_string();
        };
        let Some((start, end)) = self.day_bounds(&user, 0) else {
            return "Agenda indisponível.".to_string();
        };
        let events = self.store.events_between(user.id, start, end).unwrap_or_default();
        let reminders: Vec<String> = self
            .cron
            .jobs_for_chat(&msg.chat_id)
            .into_iter()
            .filter(|j| {
                j.state
                    .next_run_at_ms
                    .map(|nr| nr >= start.timestamp_millis() && nr < end.timestamp_millis())
                    .unwrap_or(false)
            })
            .map(|j| {
                let tz = user_tz(&user);
                let when = j
                    .state
                    .next_run_at_ms
                    .and_then(|nr| tz.timestamp_millis_opt(nr).single())
                    .map(|d| d.format("%H:%M").to_string())
                    .unwrap_or_default();
                format!("- {} {} (id {})", when, j.name, j.id)
            })
            .collect();
        if events.is_empty() && reminders.is_empty() {
            return "Hoje está livre — nada na agenda. ✨".to_string();
        }
        let mut out = String::from("Hoje:\n");
        if !events.is_empty() {
            out.push_str(&format_events(&events, &user_tz(&user)));
            out.push('\n');
        }
        out.push_str(&reminders.join("\n"));
        out.trim_end().to_string()
    }

    pub fn view_agenda(&self, msg: &InboundMessage) -> String {
        let Some(user) = self.user_for(msg) else {
            return "Agenda indisponível.".to_string();
        };
        let events = self
            .store
            .upcoming_events(user.id, self.now_utc(), 15)
            .unwrap_or_default();
        if events.is_empty() {
            return "Agenda vazia — nenhum evento futuro.".to_string();
        }
        format!("Próximos eventos:\n{}", format_events(&events, &user_tz(&user)))
    }

    pub fn view_range(&self, msg: &InboundMessage, days: i64, title: &str) -> String {
        let Some(user) = self.user_for(msg) else {
            return "Agenda indisponível.".to_string();
        };
        let Some((start, _)) = self.day_bounds(&user, 0) else {
            return "Agenda indisponível.".to_string();
        };
        let end = start + Duration::days(days);
        let events = self.store.events_between(user.id, start, end).unwrap_or_default();
        if events.is_empty() {
            return format!("{title}: nada marcado. ✨");
        }
        format!("{title}:\n{}", format_events(&events, &user_tz(&user)))
    }

    pub fn view_timeline(&self, msg: &InboundMessage) -> String {
        let Some(user) = self.user_for(msg) else {
            return "Linha do tempo indisponível.".to_string();
        };
        let history = self
            .store
            .recent_reminder_history(user.id, None, 15)
            .unwrap_or_default();
        if history.is_empty() {
            return "Ainda não há histórico de lembretes.".to_string();
        }
        let mut out = String::from("Linha do tempo (recentes primeiro):\n");
        for (kind, message, _at) in history {
            let marker = if kind == "delivered" { "✅" } else { "🕐" };
            out.push_str(&format!("{marker} {message}\n"));
        }
        out.trim_end().to_string()
    }

    pub fn view_stats(&self, msg: &InboundMessage) -> String {
        let Some(user) = self.user_for(msg) else {
            return "Estatísticas indisponíveis.".to_string();
        };
        let lists = self.store.list_lists(user.id).unwrap_or_default();
        let items: i64 = lists.iter().map(|(_, n)| n).sum();
        let events = self
            .store
            .upcoming_events(user.id, self.now_utc(), 100)
            .map(|e| e.len())
            .unwrap_or(0);
        let reminders = self.cron.jobs_for_chat(&msg.chat_id).len();
        format!(
            "📊 Estatísticas:\n- {} lista(s), {} item(ns) abertos\n- {} evento(s) futuros\n- {} lembrete(s) ativos",
            lists.len(),
            items,
            events,
            reminders
        )
    }

    pub fn view_resumo(&self, msg: &InboundMessage) -> String {
        let Some(user) = self.user_for(msg) else {
            return "Resumo indisponível.".to_string();
        };
        let week_ago = self.now_utc() - Duration::days(7);
        let done = self
            .store
            .count_audit_since(user.id, "list_feito", week_ago)
            .unwrap_or(0);
        let added = self
            .store
            .count_audit_since(user.id, "list_add", week_ago)
            .unwrap_or(0);
        let delivered = self
            .store
            .recent_reminder_history(user.id, Some("delivered"), 50)
            .map(|h| h.len())
            .unwrap_or(0);
        format!(
            "📋 Resumo da semana:\n- {added} item(ns) adicionados\n- {done} concluído(s)\n- {delivered} lembrete(s) entregues"
        )
    }

    pub fn view_produtividade(&self, msg: &InboundMessage) -> String {
        let Some(user) = self.user_for(msg) else {
            return "Dados indisponíveis.".to_string();
        };
        let week_ago = self.now_utc() - Duration::days(7);
        let done = self
            .store
            .count_audit_since(user.id, "list_feito", week_ago)
            .unwrap_or(0);
        let added = self
            .store
            .count_audit_since(user.id, "list_add", week_ago)
            .unwrap_or(0);
        if added == 0 {
            return "Sem atividade esta semana. Que tal começar uma lista? ✨".to_string();
        }
        let pct = (done * 100) / added.max(1);
        format!("⚡ Produtividade: {done}/{added} itens concluídos ({pct}%).")
    }

    pub fn view_revisao(&self, msg: &InboundMessage) -> String {
        let Some(user) = self.user_for(msg) else {
            return "Revisão indisponível.".to_string();
        };
        let lists = self.store.list_lists(user.id).unwrap_or_default();
        let stale: Vec<String> = lists
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(l, count)| format!("- {} ({} pendentes)", l.name, count))
            .collect();
        if stale.is_empty() {
            return "Revisão: tudo em dia! 🎉".to_string();
        }
        format!("🔍 Revisão — listas com pendências:\n{}", stale.join("\n"))
    }

    /// Week/month recap delivered on first contact of a new period.
    pub fn build_recap(&self, user: &User, weekly: bool) -> Option<String> {
        let week_span = if weekly { 7 } else { 30 };
        let since = self.now_utc() - Duration::days(week_span);
        let done = self.store.count_audit_since(user.id, "list_feito", since).ok()?;
        let added = self.store.count_audit_since(user.id, "list_add", since).ok()?;
        if done == 0 && added == 0 {
            return None;
        }
        let title = if weekly { "semana" } else { "mês" };
        Some(format!(
            "🗞️ Recap da {title}: {added} item(ns) novos, {done} concluído(s). Continua assim!"
        ))
    }

    /// Period ids for recap idempotence: ISO week / calendar month in the
    /// user's timezone.
    pub fn period_ids(&self, user: &User) -> (String, String) {
        let local = self.now_utc().with_timezone(&user_tz(user));
        let week = format!("{}-W{:02}", local.iso_week().year(), local.iso_week().week());
        let month = format!("{}-{:02}", local.year(), local.month());
        (week, month)
    }
}
