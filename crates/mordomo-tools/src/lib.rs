//! `mordomo-tools` — the structured capability surface the assistant model
//! can invoke: `cron`, `list`, `event`, `read_file`, `search`, `message`.
//!
//! Each tool validates its parameters at the boundary and returns plain
//! text; the agent loop feeds results back into the conversation.

pub mod cron;
pub mod event;
pub mod lead;
pub mod list;
pub mod message;
pub mod read_file;
pub mod search;

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mordomo_llm::ToolDefinition;
use mordomo_locale::{phone_to_default_language, Lang};
use mordomo_store::Store;

/// The per-turn delivery context wired into every tool instance.
#[derive(Debug, Clone, Default)]
pub struct ToolCtx {
    pub channel: String,
    pub chat_id: String,
    pub phone_for_locale: Option<String>,
    /// Set when insistence was detected this turn: interval floor drops
    /// to 30 minutes.
    pub allow_relaxed_interval: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self { content: content.into(), is_error: false }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { content: message.into(), is_error: true }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> serde_json::Value;
    async fn execute(&self, input: serde_json::Value) -> ToolResult;
}

/// The set of tools available for one agent turn.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    pub fn to_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    pub async fn execute(&self, name: &str, input: serde_json::Value) -> ToolResult {
        match self.get(name) {
            Some(tool) => tool.execute(input).await,
            None => ToolResult::error(format!("unknown tool: {name}")),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Response language for the current chat: the stored user choice wins,
/// falling back to phone-prefix inference.
pub fn resolve_lang(store: &Store, ctx: &ToolCtx) -> Lang {
    if let Ok(Some(user)) = store.get_user(&ctx.chat_id) {
        if let Ok(lang) = Lang::from_str(&user.lang) {
            return lang;
        }
    }
    let phone = ctx.phone_for_locale.as_deref().unwrap_or(&ctx.chat_id);
    phone_to_default_language(phone)
}
