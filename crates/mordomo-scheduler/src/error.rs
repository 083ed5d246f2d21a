use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The cron store could not be read at startup. Fatal: operator must fix.
    #[error("cron store unreadable: {0}")]
    StoreUnreadable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("job not found: {id}")]
    JobNotFound { id: String },

    /// Per-day quota would be crossed (`MAX_REMINDERS_EXCEEDED`).
    #[error("MAX_REMINDERS_EXCEEDED: {kind}")]
    QuotaExceeded { kind: QuotaKind },

    #[error("recurring interval below the {min_minutes} minute floor")]
    IntervalTooShort { min_minutes: u64 },

    #[error("duplicate of job {id}")]
    Duplicate { id: String },

    #[error("dependency job not found: {id}")]
    DependencyNotFound { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaKind {
    Reminders,
    Events,
    Total,
}

impl std::fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QuotaKind::Reminders => "reminders",
            QuotaKind::Events => "events",
            QuotaKind::Total => "total",
        };
        f.write_str(s)
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
