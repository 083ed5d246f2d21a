//! `mordomo-scheduler` — durable job store and ticking executor.
//!
//! Jobs live in `cron/jobs.json` (versioned, atomic writes). The engine
//! polls every second and fires any enabled job whose `next_run_at_ms` has
//! arrived, honouring quiet windows, snooze, dependencies, deadlines,
//! per-day quotas, and `[not_before, not_after]` schedule windows.
//!
//! | Schedule | Behaviour                                             |
//! |----------|-------------------------------------------------------|
//! | `at`     | Single fire at an absolute instant (ms since epoch)   |
//! | `every`  | Fixed interval, optional start/end window             |
//! | `cron`   | Five-field expression evaluated in the user timezone  |

pub mod engine;
pub mod error;
pub mod ids;
pub mod schedule;
pub mod store;
pub mod types;

pub use engine::{AddJob, AddOutcome, CronService, NullHooks, SchedulerHooks};
pub use error::{QuotaKind, Result, SchedulerError};
pub use types::{CronJob, CronPayload, CronState, JobStatus, PayloadKind, Schedule};

/// Per-day quotas (spec'd per user calendar day in their timezone).
pub const LIMIT_REMINDERS_PER_DAY: i64 = 40;
pub const LIMIT_EVENTS_PER_DAY: i64 = 40;
pub const LIMIT_TOTAL_PER_DAY: i64 = 80;
pub const WARN_THRESHOLD: f64 = 0.7;

pub const MAX_SNOOZE_COUNT: u32 = 3;
pub const SNOOZE_MINUTES: i64 = 5;
