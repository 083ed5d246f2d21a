//! Scheduler hooks backed by the relational store.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use mordomo_scheduler::SchedulerHooks;
use mordomo_store::Store;

pub struct StoreHooks {
    store: Arc<Store>,
}

impl StoreHooks {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

impl SchedulerHooks for StoreHooks {
    fn timezone(&self, chat_id: &str) -> Option<String> {
        self.store.get_user(chat_id).ok().flatten().and_then(|u| u.tz_iana)
    }

    fn quiet_window(&self, chat_id: &str) -> Option<(String, String)> {
        let user = self.store.get_user(chat_id).ok().flatten()?;
        match (user.quiet_start, user.quiet_end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    fn events_on_day(&self, chat_id: &str, day: NaiveDate) -> i64 {
        let Ok(Some(user)) = self.store.get_user(chat_id) else {
            return 0;
        };
        let tz: Tz = user
            .tz_iana
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(chrono_tz::UTC);
        let Some(start) = tz.from_local_datetime(&day.and_time(NaiveTime::MIN)).single() else {
            return 0;
        };
        let start_utc = start.with_timezone(&Utc);
        self.store
            .count_events_between(user.id, start_utc, start_utc + Duration::days(1))
            .unwrap_or(0)
    }

    fn record_delivery(&self, chat_id: &str, message: &str, job_id: &str) {
        if let Ok(Some(user)) = self.store.get_user(chat_id) {
            let _ = self
                .store
                .add_reminder_history(user.id, "delivered", message, Some(job_id), None);
        }
    }

    fn record_scheduled(&self, chat_id: &str, message: &str, job_id: &str, at_ms: Option<i64>) {
        if let Ok(Some(user)) = self.store.get_user(chat_id) {
            let at = at_ms.and_then(|ms| Utc.timestamp_millis_opt(ms).single());
            let _ = self
                .store
                .add_reminder_history(user.id, "scheduled", message, Some(job_id), at);
        }
    }
}
