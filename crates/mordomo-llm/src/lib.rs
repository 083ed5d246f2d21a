//! `mordomo-llm` — unified chat interface over OpenAI-compatible providers,
//! with two call profiles and daily cost accounting.
//!
//! The **parser** profile is the cheap utility model (scope judgements,
//! duplicate checks, summaries); the **assistant** profile is the richer
//! conversational model that drives the tool loop.

pub mod cost;
pub mod openai;
pub mod provider;

pub use cost::CostMeter;
pub use openai::OpenAiCompatProvider;
pub use provider::{
    ChatMessage, ChatOutcome, ChatRequest, LlmProvider, Profile, ProviderError, Role, ToolCall,
    ToolDefinition,
};
