use serde::{Deserialize, Serialize};

/// Defines when and how often a job runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// Fire exactly once at an absolute instant.
    At { at_ms: i64 },

    /// Fire repeatedly with a fixed interval, optionally windowed.
    Every {
        every_ms: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        not_before_ms: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        not_after_ms: Option<i64>,
    },

    /// Five-field cron expression evaluated in the given IANA timezone.
    Cron {
        expr: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tz: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        not_before_ms: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        not_after_ms: Option<i64>,
    },
}

impl Schedule {
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Schedule::At { .. })
    }

    pub fn window(&self) -> (Option<i64>, Option<i64>) {
        match self {
            Schedule::At { .. } => (None, None),
            Schedule::Every { not_before_ms, not_after_ms, .. }
            | Schedule::Cron { not_before_ms, not_after_ms, .. } => (*not_before_ms, *not_after_ms),
        }
    }
}

/// What firing the job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    #[default]
    AgentTurn,
    SystemEvent,
    DeadlineCheck,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CronPayload {
    #[serde(default)]
    pub kind: PayloadKind,
    #[serde(default)]
    pub message: String,
    /// true = deliver the text to the chat; false = feed it back through the
    /// agent loop as a synthetic user turn.
    #[serde(default)]
    pub deliver: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Destination chat id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Phone used for locale inference when `to` is an opaque LID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_for_locale: Option<String>,
    /// Re-send after N seconds unless the user confirms with 👍.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remind_again_if_unconfirmed_seconds: Option<i64>,
    #[serde(default = "default_remind_again_max")]
    pub remind_again_max_count: u32,
    /// How many follow-ups this chain has produced so far.
    #[serde(default)]
    pub remind_again_count: u32,
    /// Inert until the named job is marked complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on_job_id: Option<String>,
    /// For follow-ups: the originating job, so one 👍 cancels the chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_job_id: Option<String>,
    /// Deadline-protected: the main job survives delivery until confirmed or
    /// three post-deadline follow-ups have fired.
    #[serde(default)]
    pub has_deadline: bool,
    /// deadline_check jobs: the main job to verify.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_check_for_job_id: Option<String>,
    /// Post-deadline reminders: the main job they chase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_main_job_id: Option<String>,
    /// 1, 2 or 3.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_post_index: Option<u8>,
}

fn default_remind_again_max() -> u32 {
    10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Ok,
    Error,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CronState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run_at_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_status: Option<JobStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// ⏰ reactions so far; capped at 3.
    #[serde(default)]
    pub snooze_count: u32,
}

/// A scheduled job. Short ids are 2–4 uppercase letters derived from the
/// reminder topic (`AL` for lunch, `RE` for remédio) with a collision suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronJob {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub schedule: Schedule,
    pub payload: CronPayload,
    #[serde(default)]
    pub state: CronState,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    #[serde(default)]
    pub delete_after_run: bool,
}

impl CronJob {
    /// Dependent jobs do not fire on their own schedule.
    pub fn is_inert(&self) -> bool {
        self.payload.depends_on_job_id.is_some()
    }
}

/// On-disk format of `cron/jobs.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronStoreFile {
    pub version: u32,
    pub jobs: Vec<CronJob>,
}

impl Default for CronStoreFile {
    fn default() -> Self {
        Self { version: 1, jobs: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_serde_matches_wire_format() {
        let s = Schedule::Every {
            every_ms: 7_200_000,
            not_before_ms: Some(1_000),
            not_after_ms: None,
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["kind"], "every");
        assert_eq!(json["every_ms"], 7_200_000);
        assert_eq!(json["not_before_ms"], 1_000);
        assert!(json.get("not_after_ms").is_none());

        let back: Schedule = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn payload_defaults() {
        let p: CronPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(p.kind, PayloadKind::AgentTurn);
        assert_eq!(p.remind_again_max_count, 10);
        assert_eq!(p.remind_again_count, 0);
        assert!(!p.has_deadline);
    }
}
