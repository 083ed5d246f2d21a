use thiserror::Error;

#[derive(Debug, Error)]
pub enum MordomoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error ({channel}): {reason}")]
    Transport { channel: String, reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request timeout after {ms}ms")]
    Timeout { ms: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MordomoError {
    /// Short error code string for logs and the audit trail.
    pub fn code(&self) -> &'static str {
        match self {
            MordomoError::Config(_) => "CONFIG_ERROR",
            MordomoError::Transport { .. } => "TRANSPORT_ERROR",
            MordomoError::Database(_) => "DATABASE_ERROR",
            MordomoError::LlmProvider(_) => "LLM_PROVIDER_ERROR",
            MordomoError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            MordomoError::Serialization(_) => "SERIALIZATION_ERROR",
            MordomoError::Io(_) => "IO_ERROR",
            MordomoError::Timeout { .. } => "TIMEOUT",
            MordomoError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, MordomoError>;
