//! The cron service: job CRUD, quotas, dependencies, deadlines, snooze,
//! and the 1-second ticking executor.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tokio::sync::watch;
use tracing::{error, info, warn};

use mordomo_clock::Clock;
use mordomo_core::config::SchedulerConfig;
use mordomo_core::types::{InboundMessage, OutboundMessage};
use mordomo_core::MessageBus;

use crate::error::{QuotaKind, Result, SchedulerError};
use crate::ids::derive_short_id;
use crate::schedule::{compute_next_run, cron_min_interval_secs, validate_cron_expr};
use crate::store::CronStore;
use crate::types::{CronJob, CronPayload, CronState, JobStatus, PayloadKind, Schedule};
use crate::{
    LIMIT_REMINDERS_PER_DAY, LIMIT_TOTAL_PER_DAY, MAX_SNOOZE_COUNT, SNOOZE_MINUTES, WARN_THRESHOLD,
};

/// What the scheduler needs from the rest of the system. The gateway wires
/// this to the relational store; tests substitute a fake.
pub trait SchedulerHooks: Send + Sync {
    /// IANA timezone of the chat's user, when known.
    fn timezone(&self, chat_id: &str) -> Option<String>;
    /// Quiet window as (`HH:MM`, `HH:MM`), when configured.
    fn quiet_window(&self, chat_id: &str) -> Option<(String, String)>;
    /// Agenda events on the given day in the user's timezone.
    fn events_on_day(&self, chat_id: &str, day: NaiveDate) -> i64;
    /// Append a `delivered` row to the reminder history.
    fn record_delivery(&self, chat_id: &str, message: &str, job_id: &str);
    /// Append a `scheduled` row to the reminder history.
    fn record_scheduled(&self, chat_id: &str, message: &str, job_id: &str, at_ms: Option<i64>);
}

/// A no-op hooks impl for tests and headless operation.
pub struct NullHooks;

impl SchedulerHooks for NullHooks {
    fn timezone(&self, _chat_id: &str) -> Option<String> {
        None
    }
    fn quiet_window(&self, _chat_id: &str) -> Option<(String, String)> {
        None
    }
    fn events_on_day(&self, _chat_id: &str, _day: NaiveDate) -> i64 {
        0
    }
    fn record_delivery(&self, _chat_id: &str, _message: &str, _job_id: &str) {}
    fn record_scheduled(&self, _chat_id: &str, _message: &str, _job_id: &str, _at_ms: Option<i64>) {}
}

/// Parameters for [`CronService::add_job`].
pub struct AddJob {
    pub name: String,
    pub schedule: Schedule,
    pub payload: CronPayload,
    pub delete_after_run: bool,
    pub suggested_prefix: Option<String>,
    /// User insisted and the parser LLM agreed: floor drops to 30 min.
    pub allow_relaxed_interval: bool,
}

pub struct AddOutcome {
    pub job: CronJob,
    /// True when this creation pushed the user to ≥ 70% of a daily quota.
    pub at_warning: bool,
}

pub struct CronService {
    store: CronStore,
    clock: Clock,
    config: SchedulerConfig,
    hooks: Arc<dyn SchedulerHooks>,
    bus: Arc<MessageBus>,
}

impl CronService {
    pub fn new(
        store_path: impl Into<std::path::PathBuf>,
        clock: Clock,
        config: SchedulerConfig,
        hooks: Arc<dyn SchedulerHooks>,
        bus: Arc<MessageBus>,
    ) -> Result<Self> {
        Ok(Self {
            store: CronStore::load(store_path)?,
            clock,
            config,
            hooks,
            bus,
        })
    }

    // --- public contract ----------------------------------------------------

    pub fn add_job(&self, req: AddJob) -> Result<AddOutcome> {
        let now_ms = self.clock.now_ms();
        self.validate_schedule(&req.schedule, req.allow_relaxed_interval, now_ms)?;

        if let Some(dep_id) = req.payload.depends_on_job_id.as_deref() {
            let dep = self
                .store
                .get(dep_id)
                .ok_or_else(|| SchedulerError::DependencyNotFound { id: dep_id.to_string() })?;
            if dep.payload.to != req.payload.to {
                return Err(SchedulerError::DependencyNotFound { id: dep_id.to_string() });
            }
        }

        // Dependents stay inert: no next run until the predecessor completes.
        let next_run = if req.payload.depends_on_job_id.is_some() {
            None
        } else {
            compute_next_run(&req.schedule, now_ms, None)
        };

        let mut at_warning = false;
        if let (Some(next_ms), Some(chat_id)) = (next_run, req.payload.to.as_deref()) {
            at_warning = self.check_day_quota(chat_id, next_ms)?;
        }

        let job = self.store.with_jobs_mut(|jobs| {
            let id = derive_short_id(&req.name, req.suggested_prefix.as_deref(), |candidate| {
                jobs.iter().any(|j| j.id == candidate)
            });
            let job = CronJob {
                id: id.clone(),
                name: req.name.clone(),
                enabled: true,
                schedule: req.schedule.clone(),
                payload: req.payload.clone(),
                state: CronState { next_run_at_ms: next_run, ..Default::default() },
                created_at_ms: now_ms,
                updated_at_ms: now_ms,
                delete_after_run: req.delete_after_run,
            };
            jobs.push(job.clone());
            (job, true)
        })?;

        if let Some(chat_id) = job.payload.to.as_deref() {
            self.hooks
                .record_scheduled(chat_id, &job.payload.message, &job.id, job.state.next_run_at_ms);
        }
        info!(job_id = %job.id, name = %job.name, next_run = ?job.state.next_run_at_ms, "job added");
        Ok(AddOutcome { job, at_warning })
    }

    pub fn list_jobs(&self, include_disabled: bool) -> Vec<CronJob> {
        self.store
            .snapshot()
            .into_iter()
            .filter(|j| include_disabled || j.enabled)
            .collect()
    }

    pub fn jobs_for_chat(&self, chat_id: &str) -> Vec<CronJob> {
        self.store
            .snapshot()
            .into_iter()
            .filter(|j| j.enabled && j.payload.to.as_deref() == Some(chat_id))
            .collect()
    }

    pub fn get_job(&self, id: &str) -> Option<CronJob> {
        self.store.get(id)
    }

    pub fn remove_job(&self, id: &str) -> Result<bool> {
        self.store.with_jobs_mut(|jobs| {
            let before = jobs.len();
            jobs.retain(|j| j.id != id);
            let removed = jobs.len() != before;
            (removed, removed)
        })
    }

    /// Remove a job plus its deadline_check pair and any post-deadline or
    /// unconfirmed-follow-up siblings.
    pub fn remove_job_and_deadline_followups(&self, id: &str) -> Result<usize> {
        self.store.with_jobs_mut(|jobs| {
            let before = jobs.len();
            jobs.retain(|j| {
                j.id != id
                    && j.payload.deadline_check_for_job_id.as_deref() != Some(id)
                    && j.payload.deadline_main_job_id.as_deref() != Some(id)
                    && j.payload.parent_job_id.as_deref() != Some(id)
            });
            let removed = before - jobs.len();
            (removed, removed > 0)
        })
    }

    /// Mark a job complete (👍): remove it and every follow-up, then release
    /// its dependents.
    pub fn mark_complete(&self, id: &str) -> Result<bool> {
        let existed = self.remove_job_and_deadline_followups(id)? > 0;
        self.trigger_dependents(id)?;
        Ok(existed)
    }

    /// Release every job waiting on `completed_job_id`: each fires within a
    /// second, one-shot semantics.
    pub fn trigger_dependents(&self, completed_job_id: &str) -> Result<usize> {
        let now_ms = self.clock.now_ms();
        self.store.with_jobs_mut(|jobs| {
            let mut released = 0;
            for job in jobs.iter_mut() {
                if job.payload.depends_on_job_id.as_deref() == Some(completed_job_id) {
                    job.payload.depends_on_job_id = None;
                    job.state.next_run_at_ms = Some(now_ms + 1_000);
                    job.updated_at_ms = now_ms;
                    released += 1;
                }
            }
            (released, released > 0)
        })
    }

    /// Move a one-shot to a new absolute instant (👎 → "change the time").
    pub fn reschedule(&self, id: &str, at_ms: i64) -> Result<bool> {
        let now_ms = self.clock.now_ms();
        self.store.with_jobs_mut(|jobs| {
            let Some(job) = jobs.iter_mut().find(|j| j.id == id) else {
                return (false, false);
            };
            job.schedule = Schedule::At { at_ms };
            job.state.next_run_at_ms = Some(at_ms);
            job.enabled = true;
            job.updated_at_ms = now_ms;
            (true, true)
        })
    }

    /// ⏰ reaction: push the job 5 minutes out. `Ok(None)` when the cap of
    /// 3 snoozes is already reached.
    pub fn snooze(&self, id: &str) -> Result<Option<u32>> {
        let now_ms = self.clock.now_ms();
        self.store.with_jobs_mut(|jobs| {
            let Some(job) = jobs.iter_mut().find(|j| j.id == id) else {
                return (Err(SchedulerError::JobNotFound { id: id.to_string() }), false);
            };
            if job.state.snooze_count >= MAX_SNOOZE_COUNT {
                return (Ok(None), false);
            }
            job.state.snooze_count += 1;
            job.state.next_run_at_ms = Some(now_ms + SNOOZE_MINUTES * 60_000);
            job.enabled = true;
            job.updated_at_ms = now_ms;
            (Ok(Some(job.state.snooze_count)), true)
        })?
    }

    /// Enabled jobs for this chat that share the exact schedule — the first
    /// stage of duplicate suppression. The caller compares messages and may
    /// consult the parser LLM for near-matches.
    pub fn jobs_with_same_schedule(&self, chat_id: &str, schedule: &Schedule) -> Vec<CronJob> {
        self.store
            .snapshot()
            .into_iter()
            .filter(|j| {
                j.enabled
                    && j.payload.to.as_deref() == Some(chat_id)
                    && schedules_match(&j.schedule, schedule)
            })
            .collect()
    }

    /// Reminders whose next fire falls on `day` in the user's timezone.
    pub fn count_reminders_on_day(&self, chat_id: &str, day: NaiveDate, tz: &Tz) -> i64 {
        let Some(start) = tz
            .from_local_datetime(&day.and_time(NaiveTime::MIN))
            .single()
        else {
            return 0;
        };
        let start_ms = start.timestamp_millis();
        let end_ms = start_ms + 86_400_000 - 1;
        self.store
            .snapshot()
            .iter()
            .filter(|j| {
                j.enabled
                    && j.payload.to.as_deref() == Some(chat_id)
                    && j.state
                        .next_run_at_ms
                        .map(|nr| nr >= start_ms && nr <= end_ms)
                        .unwrap_or(false)
            })
            .count() as i64
    }

    /// Startup sweep: one-shot jobs whose fire time passed while the process
    /// was down are removed (they would deliver at a nonsense hour). Returns
    /// `(chat_id, removed names)` so the router can queue an apology.
    pub fn sweep_stale_jobs(&self) -> Result<Vec<(String, Vec<String>)>> {
        let now_ms = self.clock.now_ms();
        self.store.with_jobs_mut(|jobs| {
            let mut removed: std::collections::HashMap<String, Vec<String>> = Default::default();
            jobs.retain(|j| {
                let stale = j.enabled
                    && matches!(j.schedule, Schedule::At { at_ms } if at_ms < now_ms - 60_000)
                    && !j.is_inert();
                if stale {
                    if let Some(chat) = j.payload.to.clone() {
                        removed.entry(chat).or_default().push(j.name.clone());
                    }
                }
                !stale
            });
            let dirty = !removed.is_empty();
            if dirty {
                warn!(chats = removed.len(), "stale one-shot jobs removed on startup");
            }
            (removed.into_iter().collect(), dirty)
        })
    }

    // --- executor -----------------------------------------------------------

    /// Main loop. Ticks at the configured granularity until `shutdown`.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!("scheduler engine started");
        let mut interval =
            tokio::time::interval(std::time::Duration::from_millis(self.config.tick_ms.max(100)));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick() {
                        error!("scheduler tick error: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One scheduling pass. Public so tests can drive time directly.
    pub fn tick(&self) -> Result<()> {
        let now_ms = self.clock.now_ms();

        let due: Vec<CronJob> = self
            .store
            .snapshot()
            .into_iter()
            .filter(|j| {
                j.enabled
                    && !j.is_inert()
                    && j.state.next_run_at_ms.map(|nr| nr <= now_ms).unwrap_or(false)
            })
            .collect();

        for job in due {
            // Quiet window: advance past it without firing.
            if let Some(chat_id) = job.payload.to.as_deref() {
                if let Some(resume_ms) = self.quiet_window_resume(chat_id, now_ms) {
                    self.store.with_jobs_mut(|jobs| {
                        if let Some(j) = jobs.iter_mut().find(|j| j.id == job.id) {
                            j.state.next_run_at_ms = Some(resume_ms);
                            j.state.last_status = Some(JobStatus::Skipped);
                            j.updated_at_ms = now_ms;
                        }
                        ((), true)
                    })?;
                    continue;
                }
            }

            self.dispatch(&job, now_ms)?;
            self.advance_after_fire(&job, now_ms)?;
        }
        Ok(())
    }

    fn dispatch(&self, job: &CronJob, now_ms: i64) -> Result<()> {
        match job.payload.kind {
            PayloadKind::AgentTurn | PayloadKind::SystemEvent => {
                if job.payload.deliver {
                    self.deliver(job, now_ms)?;
                } else if let (Some(channel), Some(chat_id)) =
                    (job.payload.channel.clone(), job.payload.to.clone())
                {
                    // Synthetic user turn through the agent loop.
                    self.bus.try_publish_inbound(InboundMessage {
                        channel,
                        chat_id: chat_id.clone(),
                        sender_id: chat_id,
                        content: job.payload.message.clone(),
                        timestamp: now_ms / 1000,
                        phone_for_locale: job.payload.phone_for_locale.clone(),
                        push_name: None,
                        reaction: None,
                        attachment_ics: None,
                    });
                }
            }
            PayloadKind::DeadlineCheck => {
                self.expand_deadline_check(job, now_ms)?;
            }
        }
        Ok(())
    }

    fn deliver(&self, job: &CronJob, now_ms: i64) -> Result<()> {
        let (Some(channel), Some(chat_id)) = (&job.payload.channel, &job.payload.to) else {
            warn!(job_id = %job.id, "job has no destination — dropped");
            return Ok(());
        };
        self.bus.try_publish_outbound(
            OutboundMessage::new(channel.clone(), chat_id.clone(), job.payload.message.clone())
                .with_job_id(&job.id),
        );
        self.hooks.record_delivery(chat_id, &job.payload.message, &job.id);
        info!(job_id = %job.id, chat = %chat_id, "reminder delivered");

        // "Remind me again if I don't confirm": schedule the next link of the
        // chain, all sharing the root job id so one 👍 cancels everything.
        if let Some(secs) = job.payload.remind_again_if_unconfirmed_seconds {
            if job.payload.remind_again_count < job.payload.remind_again_max_count {
                let root = job
                    .payload
                    .parent_job_id
                    .clone()
                    .unwrap_or_else(|| job.id.clone());
                let payload = CronPayload {
                    kind: PayloadKind::AgentTurn,
                    message: job.payload.message.clone(),
                    deliver: true,
                    channel: job.payload.channel.clone(),
                    to: job.payload.to.clone(),
                    phone_for_locale: job.payload.phone_for_locale.clone(),
                    remind_again_if_unconfirmed_seconds: Some(secs),
                    remind_again_max_count: job.payload.remind_again_max_count,
                    remind_again_count: job.payload.remind_again_count + 1,
                    parent_job_id: Some(root),
                    ..Default::default()
                };
                self.insert_internal_job(
                    format!("{} (again)", truncate(&job.name, 24)),
                    Schedule::At { at_ms: now_ms + secs * 1000 },
                    payload,
                    true,
                    now_ms,
                )?;
            }
        }

        // Third post-deadline chase fired with no confirmation: give up and
        // drop the main job.
        if job.payload.deadline_post_index == Some(3) {
            if let Some(main_id) = job.payload.deadline_main_job_id.clone() {
                self.remove_job_and_deadline_followups(&main_id)?;
                info!(main_job = %main_id, "deadline expired unconfirmed — main job removed");
            }
        }
        Ok(())
    }

    /// A deadline_check fires once the deadline passes: if the main job is
    /// still around (not confirmed), create the three post-deadline chasers
    /// at +0, +N and +2N minutes, then delete itself.
    fn expand_deadline_check(&self, job: &CronJob, now_ms: i64) -> Result<()> {
        let Some(main_id) = job.payload.deadline_check_for_job_id.clone() else {
            return Ok(());
        };
        if self.store.get(&main_id).is_none() {
            return Ok(()); // confirmed in time — nothing to chase
        }
        let spacing_ms = self.config.deadline_followup_minutes as i64 * 60_000;
        for index in 1..=3u8 {
            // +1s so the first chaser (the "+0" one) is strictly in the future.
            let at_ms = now_ms + 1_000 + (index as i64 - 1) * spacing_ms;
            let payload = CronPayload {
                kind: PayloadKind::AgentTurn,
                message: job.payload.message.clone(),
                deliver: true,
                channel: job.payload.channel.clone(),
                to: job.payload.to.clone(),
                phone_for_locale: job.payload.phone_for_locale.clone(),
                deadline_main_job_id: Some(main_id.clone()),
                deadline_post_index: Some(index),
                ..Default::default()
            };
            self.insert_internal_job(
                format!("{} (prazo {index}/3)", truncate(&job.payload.message, 18)),
                Schedule::At { at_ms },
                payload,
                true,
                now_ms,
            )?;
        }
        info!(main_job = %main_id, "deadline passed — three follow-ups scheduled");
        Ok(())
    }

    fn advance_after_fire(&self, job: &CronJob, now_ms: i64) -> Result<()> {
        self.store.with_jobs_mut(|jobs| {
            let Some(idx) = jobs.iter().position(|j| j.id == job.id) else {
                return ((), false); // removed during dispatch
            };
            let next = compute_next_run(&jobs[idx].schedule, now_ms, Some(now_ms));
            match next {
                Some(next_ms) => {
                    let j = &mut jobs[idx];
                    j.state.last_run_at_ms = Some(now_ms);
                    j.state.next_run_at_ms = Some(next_ms);
                    j.state.last_status = Some(JobStatus::Ok);
                    j.updated_at_ms = now_ms;
                }
                None => {
                    // Schedule exhausted. Deadline-protected one-shots stay
                    // until confirmed or chased down; everything else is
                    // removed or disabled per delete_after_run.
                    let keep_for_deadline = jobs[idx].payload.has_deadline;
                    if jobs[idx].delete_after_run && !keep_for_deadline {
                        jobs.remove(idx);
                    } else {
                        let j = &mut jobs[idx];
                        j.state.last_run_at_ms = Some(now_ms);
                        j.state.next_run_at_ms = None;
                        j.state.last_status = Some(JobStatus::Ok);
                        j.enabled = keep_for_deadline; // disabled unless deadline keeps it visible
                        j.updated_at_ms = now_ms;
                    }
                }
            }
            ((), true)
        })
    }

    // --- helpers ------------------------------------------------------------

    fn insert_internal_job(
        &self,
        name: String,
        schedule: Schedule,
        payload: CronPayload,
        delete_after_run: bool,
        now_ms: i64,
    ) -> Result<CronJob> {
        let next = compute_next_run(&schedule, now_ms, None);
        self.store.with_jobs_mut(|jobs| {
            let id = derive_short_id(&name, None, |c| jobs.iter().any(|j| j.id == c));
            let job = CronJob {
                id,
                name,
                enabled: true,
                schedule,
                payload,
                state: CronState { next_run_at_ms: next, ..Default::default() },
                created_at_ms: now_ms,
                updated_at_ms: now_ms,
                delete_after_run,
            };
            jobs.push(job.clone());
            (job, true)
        })
    }

    fn validate_schedule(&self, schedule: &Schedule, relaxed: bool, now_ms: i64) -> Result<()> {
        let floor_secs = if relaxed {
            self.config.relaxed_min_interval_secs
        } else {
            self.config.min_recurring_interval_secs
        } as i64;
        match schedule {
            Schedule::At { at_ms } => {
                if *at_ms <= now_ms {
                    return Err(SchedulerError::InvalidSchedule("one-shot time is in the past".into()));
                }
            }
            Schedule::Every { every_ms, .. } => {
                if *every_ms <= 0 || *every_ms > 30 * 86_400_000 {
                    return Err(SchedulerError::InvalidSchedule(
                        "interval must be between 1 ms and 30 days".into(),
                    ));
                }
                if *every_ms < floor_secs * 1000 {
                    return Err(SchedulerError::IntervalTooShort {
                        min_minutes: (floor_secs / 60) as u64,
                    });
                }
            }
            Schedule::Cron { expr, tz, .. } => {
                if !validate_cron_expr(expr) {
                    return Err(SchedulerError::InvalidSchedule(format!(
                        "bad cron expression: {expr}"
                    )));
                }
                if let Some(min_gap) = cron_min_interval_secs(expr, tz.as_deref(), now_ms) {
                    if min_gap < floor_secs {
                        return Err(SchedulerError::IntervalTooShort {
                            min_minutes: (floor_secs / 60) as u64,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// 40 reminders / 40 events / 80 combined per user calendar day.
    /// Returns whether the creation lands at ≥ 70% of a limit.
    fn check_day_quota(&self, chat_id: &str, next_ms: i64) -> Result<bool> {
        let tz: Tz = self
            .hooks
            .timezone(chat_id)
            .and_then(|t| t.parse().ok())
            .unwrap_or(chrono_tz::UTC);
        let Some(day) = tz.timestamp_millis_opt(next_ms).single().map(|dt| dt.date_naive()) else {
            return Ok(false);
        };
        let reminders = self.count_reminders_on_day(chat_id, day, &tz);
        let events = self.hooks.events_on_day(chat_id, day);
        let total = reminders + events;

        if reminders >= LIMIT_REMINDERS_PER_DAY {
            return Err(SchedulerError::QuotaExceeded { kind: QuotaKind::Reminders });
        }
        if total >= LIMIT_TOTAL_PER_DAY {
            return Err(SchedulerError::QuotaExceeded { kind: QuotaKind::Total });
        }
        let warn_reminders = (LIMIT_REMINDERS_PER_DAY as f64 * WARN_THRESHOLD) as i64;
        let warn_total = (LIMIT_TOTAL_PER_DAY as f64 * WARN_THRESHOLD) as i64;
        Ok(reminders + 1 >= warn_reminders || total + 1 >= warn_total)
    }

    /// When `now` falls inside the chat's quiet window, the instant the
    /// window ends (handles overnight windows like 22:00–08:00).
    fn quiet_window_resume(&self, chat_id: &str, now_ms: i64) -> Option<i64> {
        let (start_s, end_s) = self.hooks.quiet_window(chat_id)?;
        let start = NaiveTime::parse_from_str(&start_s, "%H:%M").ok()?;
        let end = NaiveTime::parse_from_str(&end_s, "%H:%M").ok()?;
        let tz: Tz = self
            .hooks
            .timezone(chat_id)
            .and_then(|t| t.parse().ok())
            .unwrap_or(chrono_tz::UTC);
        let local = tz.timestamp_millis_opt(now_ms).single()?;
        let t = local.time();

        let inside = if start <= end {
            t >= start && t < end
        } else {
            t >= start || t < end
        };
        if !inside {
            return None;
        }
        let today = local.date_naive();
        let end_day = if start <= end || t >= start {
            if start > end {
                today.succ_opt()?
            } else {
                today
            }
        } else {
            today
        };
        let resume = tz.from_local_datetime(&end_day.and_time(end)).single()?;
        Some(resume.with_timezone(&Utc).timestamp_millis())
    }
}

fn schedules_match(a: &Schedule, b: &Schedule) -> bool {
    match (a, b) {
        (Schedule::At { at_ms: x }, Schedule::At { at_ms: y }) => x == y,
        (Schedule::Every { every_ms: x, .. }, Schedule::Every { every_ms: y, .. }) => x == y,
        (Schedule::Cron { expr: x, .. }, Schedule::Cron { expr: y, .. }) => {
            x.trim() == y.trim()
        }
        _ => false,
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestHooks {
        tz: Option<String>,
        quiet: Option<(String, String)>,
        events: i64,
    }

    impl Default for TestHooks {
        fn default() -> Self {
            Self {
                tz: Some("America/Sao_Paulo".to_string()),
                quiet: None,
                events: 0,
            }
        }
    }

    impl SchedulerHooks for TestHooks {
        fn timezone(&self, _chat_id: &str) -> Option<String> {
            self.tz.clone()
        }
        fn quiet_window(&self, _chat_id: &str) -> Option<(String, String)> {
            self.quiet.clone()
        }
        fn events_on_day(&self, _chat_id: &str, _day: NaiveDate) -> i64 {
            self.events
        }
        fn record_delivery(&self, _chat_id: &str, _message: &str, _job_id: &str) {}
        fn record_scheduled(&self, _c: &str, _m: &str, _j: &str, _a: Option<i64>) {}
    }

    fn service_with(hooks: TestHooks) -> (Arc<CronService>, Arc<MessageBus>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let bus = Arc::new(MessageBus::new());
        let svc = CronService::new(
            tmp.path().join("jobs.json"),
            Clock::new(),
            SchedulerConfig::default(),
            Arc::new(hooks),
            bus.clone(),
        )
        .unwrap();
        (Arc::new(svc), bus, tmp)
    }

    fn one_shot_payload(chat: &str, msg: &str) -> CronPayload {
        CronPayload {
            kind: PayloadKind::AgentTurn,
            message: msg.to_string(),
            deliver: true,
            channel: Some("whatsapp".to_string()),
            to: Some(chat.to_string()),
            ..Default::default()
        }
    }

    fn add_one_shot(svc: &CronService, chat: &str, msg: &str, in_ms: i64) -> CronJob {
        let now = svc.clock.now_ms();
        svc.add_job(AddJob {
            name: msg.to_string(),
            schedule: Schedule::At { at_ms: now + in_ms },
            payload: one_shot_payload(chat, msg),
            delete_after_run: true,
            suggested_prefix: None,
            allow_relaxed_interval: false,
        })
        .unwrap()
        .job
    }

    /// Rewind a job so the next tick sees it as due (schedule and state).
    fn force_due(svc: &CronService, id: &str) {
        svc.store
            .with_jobs_mut(|jobs| {
                for j in jobs.iter_mut() {
                    if j.id == id {
                        j.schedule = Schedule::At { at_ms: 1 };
                        j.state.next_run_at_ms = Some(1);
                    }
                }
                ((), true)
            })
            .unwrap();
    }

    #[tokio::test]
    async fn one_shot_fires_and_is_removed() {
        let (svc, bus, _tmp) = service_with(TestHooks::default());
        let job = add_one_shot(&svc, "c1", "tomar remédio", 60_000);
        force_due(&svc, &job.id);
        svc.tick().unwrap();
        let out = bus.consume_outbound().await.unwrap();
        assert_eq!(out.content, "tomar remédio");
        assert!(svc.get_job(&job.id).is_none(), "delete_after_run removes the job");
    }

    #[test]
    fn short_id_derived_from_topic() {
        let (svc, _bus, _tmp) = service_with(TestHooks::default());
        let job = add_one_shot(&svc, "c1", "tomar remédio", 30 * 60_000);
        assert_eq!(job.id, "RE");
    }

    #[test]
    fn interval_floor_is_enforced_and_relaxable() {
        let (svc, _bus, _tmp) = service_with(TestHooks::default());
        let mk = |relaxed| {
            svc.add_job(AddJob {
                name: "beber água".into(),
                schedule: Schedule::Every {
                    every_ms: 30 * 60_000,
                    not_before_ms: None,
                    not_after_ms: None,
                },
                payload: one_shot_payload("c1", "beber água"),
                delete_after_run: false,
                suggested_prefix: None,
                allow_relaxed_interval: relaxed,
            })
        };
        assert!(matches!(mk(false), Err(SchedulerError::IntervalTooShort { .. })));
        assert!(mk(true).is_ok());
    }

    #[test]
    fn reminder_quota_refuses_at_40() {
        let mut hooks = TestHooks::default();
        hooks.tz = Some("UTC".to_string());
        let (svc, _bus, _tmp) = service_with(hooks);
        // Anchor everything at noon UTC two days out so the 40 jobs can never
        // straddle a midnight, regardless of when the test runs.
        let now = svc.clock.now_ms();
        let noon = {
            let today = chrono::Utc.timestamp_millis_opt(now).unwrap().date_naive();
            let day = today.succ_opt().unwrap().succ_opt().unwrap();
            chrono::Utc
                .from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
                .timestamp_millis()
        };
        let mk = |msg: &str, at_ms: i64| {
            svc.add_job(AddJob {
                name: msg.to_string(),
                schedule: Schedule::At { at_ms },
                payload: one_shot_payload("c1", msg),
                delete_after_run: true,
                suggested_prefix: None,
                allow_relaxed_interval: false,
            })
        };
        for i in 0..40i64 {
            mk(&format!("tarefa {i}"), noon + i * 60_000).unwrap();
        }
        let err = mk("mais uma", noon + 45 * 60_000);
        assert!(matches!(err, Err(SchedulerError::QuotaExceeded { .. })));
        // Another chat is unaffected
        add_one_shot(&svc, "c2", "outra", 60_000);
    }

    #[tokio::test]
    async fn dependent_job_is_inert_until_completion() {
        let (svc, bus, _tmp) = service_with(TestHooks::default());
        let lunch = add_one_shot(&svc, "c1", "almoço", 60 * 60_000);
        let coffee = svc
            .add_job(AddJob {
                name: "tomar o café".into(),
                schedule: Schedule::At { at_ms: svc.clock.now_ms() + 60_000 },
                payload: CronPayload {
                    depends_on_job_id: Some(lunch.id.clone()),
                    ..one_shot_payload("c1", "tomar o café")
                },
                delete_after_run: true,
                suggested_prefix: None,
                allow_relaxed_interval: false,
            })
            .unwrap()
            .job;
        assert!(coffee.state.next_run_at_ms.is_none(), "dependent has no next run");

        // Ticks do nothing while inert
        svc.tick().unwrap();
        assert!(svc.get_job(&coffee.id).is_some());

        // 👍 on lunch releases the dependent within a second
        svc.mark_complete(&lunch.id).unwrap();
        let released = svc.get_job(&coffee.id).unwrap();
        assert!(released.state.next_run_at_ms.is_some());
        assert!(released.payload.depends_on_job_id.is_none());

        // Advance past the release instant and fire
        force_due(&svc, &coffee.id);
        svc.tick().unwrap();
        let out = bus.consume_outbound().await.unwrap();
        assert_eq!(out.content, "tomar o café");
        assert!(svc.get_job(&coffee.id).is_none());
    }

    #[test]
    fn dependency_must_exist_and_belong_to_chat() {
        let (svc, _bus, _tmp) = service_with(TestHooks::default());
        let other = add_one_shot(&svc, "c2", "almoço", 60 * 60_000);
        let err = svc.add_job(AddJob {
            name: "café".into(),
            schedule: Schedule::At { at_ms: svc.clock.now_ms() + 60_000 },
            payload: CronPayload {
                depends_on_job_id: Some(other.id.clone()),
                ..one_shot_payload("c1", "café")
            },
            delete_after_run: true,
            suggested_prefix: None,
            allow_relaxed_interval: false,
        });
        assert!(matches!(err, Err(SchedulerError::DependencyNotFound { .. })));
    }

    #[test]
    fn snooze_caps_at_three() {
        let (svc, _bus, _tmp) = service_with(TestHooks::default());
        let job = add_one_shot(&svc, "c1", "remédio", 60_000);
        assert_eq!(svc.snooze(&job.id).unwrap(), Some(1));
        assert_eq!(svc.snooze(&job.id).unwrap(), Some(2));
        assert_eq!(svc.snooze(&job.id).unwrap(), Some(3));
        assert_eq!(svc.snooze(&job.id).unwrap(), None);
        assert_eq!(svc.get_job(&job.id).unwrap().state.snooze_count, 3);
    }

    #[tokio::test]
    async fn deadline_check_spawns_three_chasers() {
        let (svc, _bus, _tmp) = service_with(TestHooks::default());
        let main = svc
            .add_job(AddJob {
                name: "pagar renda".into(),
                schedule: Schedule::At { at_ms: svc.clock.now_ms() + 60_000 },
                payload: CronPayload {
                    has_deadline: true,
                    ..one_shot_payload("c1", "pagar renda")
                },
                delete_after_run: true,
                suggested_prefix: None,
                allow_relaxed_interval: false,
            })
            .unwrap()
            .job;
        let check = svc
            .add_job(AddJob {
                name: "pagar renda (prazo)".into(),
                schedule: Schedule::At { at_ms: svc.clock.now_ms() + 120_000 },
                payload: CronPayload {
                    kind: PayloadKind::DeadlineCheck,
                    message: "pagar renda".into(),
                    deliver: false,
                    channel: Some("whatsapp".into()),
                    to: Some("c1".into()),
                    deadline_check_for_job_id: Some(main.id.clone()),
                    ..Default::default()
                },
                delete_after_run: true,
                suggested_prefix: None,
                allow_relaxed_interval: false,
            })
            .unwrap()
            .job;

        // Deadline passes unconfirmed
        force_due(&svc, &check.id);
        svc.tick().unwrap();

        let chasers: Vec<CronJob> = svc
            .list_jobs(true)
            .into_iter()
            .filter(|j| j.payload.deadline_main_job_id.as_deref() == Some(main.id.as_str()))
            .collect();
        assert_eq!(chasers.len(), 3);
        let mut indexes: Vec<u8> =
            chasers.iter().filter_map(|j| j.payload.deadline_post_index).collect();
        indexes.sort_unstable();
        assert_eq!(indexes, vec![1, 2, 3]);
        // And the check removed itself
        assert!(svc.get_job(&check.id).is_none());
        // Confirming the main job clears the chasers
        svc.mark_complete(&main.id).unwrap();
        assert!(svc
            .list_jobs(true)
            .iter()
            .all(|j| j.payload.deadline_main_job_id.is_none()));
    }

    #[tokio::test]
    async fn quiet_window_advances_without_firing() {
        let mut hooks = TestHooks::default();
        hooks.tz = Some("UTC".to_string());
        hooks.quiet = Some(("00:00".to_string(), "23:59".to_string()));
        let (svc, bus, _tmp) = service_with(hooks);
        let job = add_one_shot(&svc, "c1", "remédio", 60_000);
        force_due(&svc, &job.id);
        svc.tick().unwrap();
        // Not delivered; pushed past the window instead
        let delivered = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            bus.consume_outbound(),
        )
        .await;
        assert!(delivered.is_err());
        let j = svc.get_job(&job.id).unwrap();
        assert_eq!(j.state.last_status, Some(JobStatus::Skipped));
        assert!(j.state.next_run_at_ms.unwrap() > svc.clock.now_ms());
    }

    #[test]
    fn stale_one_shots_are_swept() {
        let (svc, _bus, _tmp) = service_with(TestHooks::default());
        let job = add_one_shot(&svc, "c1", "antigo", 60_000);
        // Simulate a long outage: rewrite the fire time into the past
        svc.store
            .with_jobs_mut(|jobs| {
                for j in jobs.iter_mut() {
                    j.schedule = Schedule::At { at_ms: 1 };
                }
                ((), true)
            })
            .unwrap();
        let removed = svc.sweep_stale_jobs().unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, "c1");
        assert!(svc.get_job(&job.id).is_none());
    }

    #[test]
    fn duplicate_helper_matches_same_schedule() {
        let (svc, _bus, _tmp) = service_with(TestHooks::default());
        let now = svc.clock.now_ms();
        add_one_shot(&svc, "c1", "consulta", 60 * 60_000);
        let dup = svc.jobs_with_same_schedule("c1", &Schedule::At { at_ms: now + 60 * 60_000 });
        assert_eq!(dup.len(), 1);
        assert!(svc
            .jobs_with_same_schedule("c2", &Schedule::At { at_ms: now + 60 * 60_000 })
            .is_empty());
    }
}
