use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which price/latency tier a call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Cheap utility model: scope filter, duplicate judge, summaries.
    Parser,
    /// Conversational model driving the tool loop.
    Assistant,
}

impl Profile {
    pub fn default_max_tokens(&self) -> u32 {
        match self {
            Profile::Parser => 512,
            Profile::Assistant => 2048,
        }
    }

    pub fn default_temperature(&self) -> f32 {
        match self {
            Profile::Parser => 0.0,
            Profile::Assistant => 0.7,
        }
    }

    /// A timeout counts as a failure toward the circuit breaker.
    pub fn timeout_secs(&self) -> u64 {
        match self {
            Profile::Parser => 20,
            Profile::Assistant => 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One message in the conversation sent to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Set on `Role::Tool` messages: which call this result answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Set on assistant messages that requested tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), tool_call_id: None, tool_calls: None }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), tool_call_id: None, tool_calls: None }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), tool_call_id: None, tool_calls: None }
    }
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(call_id.into()),
            tool_calls: None,
        }
    }
}

/// Tool schema advertised to the assistant profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
    pub profile: Profile,
    /// Override the profile default when set.
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl ChatRequest {
    pub fn new(profile: Profile, messages: Vec<ChatMessage>) -> Self {
        Self { messages, tools: Vec::new(), profile, max_tokens: None, temperature: None }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub model: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("response parse error: {0}")]
    Parse(String),

    #[error("empty response body")]
    Empty,

    #[error("timeout after {secs}s")]
    Timeout { secs: u64 },
}

/// Common interface for all chat providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging and the cost meter.
    fn name(&self) -> &str;

    /// Send a chat request and wait for the full response. Implementations
    /// must respect the profile timeout.
    async fn chat(&self, req: &ChatRequest) -> Result<ChatOutcome, ProviderError>;
}
