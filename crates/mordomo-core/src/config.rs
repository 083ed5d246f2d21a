use std::collections::HashMap;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{MordomoError, Result};

/// Top-level config (mordomo.toml + `NANOBOT_*` env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MordomoConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    /// Data directory override; defaults to `~/.mordomo`.
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub god_mode_password: Option<String>,
    #[serde(default)]
    pub atendimento_phone: Option<String>,
    #[serde(default)]
    pub atendimento_email: Option<String>,
    /// External search API key; the `search` tool is only registered when set.
    #[serde(default)]
    pub search_api_key: Option<String>,
    #[serde(default)]
    pub token_usage_file: Option<String>,
}

/// Admin HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// When set, `/users`, `/audit` & co. require `X-API-Key`.
    #[serde(default)]
    pub api_secret_key: Option<String>,
    /// When set, `/health` requires `X-Health-Token`.
    #[serde(default)]
    pub health_check_token: Option<String>,
    /// Comma-separated allowed origins; `*` for dev.
    #[serde(default = "default_cors")]
    pub cors_origins: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            api_secret_key: None,
            health_check_token: None,
            cors_origins: default_cors(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Provider name (key into `providers`) used for the assistant profile.
    #[serde(default = "default_assistant_provider")]
    pub assistant_provider: String,
    /// Provider name used for the cheap parser/utility profile.
    /// Falls back to the assistant provider when absent.
    #[serde(default)]
    pub parser_provider: Option<String>,
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: u32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            assistant_provider: default_assistant_provider(),
            parser_provider: None,
            max_tool_iterations: default_max_tool_iterations(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// One LLM provider endpoint (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// USD per 1M input tokens, for the cost meter.
    #[serde(default)]
    pub price_in_per_mtok: Option<f64>,
    /// USD per 1M output tokens.
    #[serde(default)]
    pub price_out_per_mtok: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub whatsapp: Option<WhatsAppConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// WebSocket URL of the external bridge.
    pub bridge_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Minimum interval for recurring jobs (seconds).
    #[serde(default = "default_min_recurring_secs")]
    pub min_recurring_interval_secs: u64,
    /// Relaxed floor when the user insists (never lower).
    #[serde(default = "default_relaxed_min_secs")]
    pub relaxed_min_interval_secs: u64,
    /// Spacing N between post-deadline follow-ups (minutes): +0, +N, +2N.
    #[serde(default = "default_deadline_followup_minutes")]
    pub deadline_followup_minutes: u32,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_recurring_interval_secs: default_min_recurring_secs(),
            relaxed_min_interval_secs: default_relaxed_min_secs(),
            deadline_followup_minutes: default_deadline_followup_minutes(),
            tick_ms: default_tick_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
    #[serde(default = "default_breaker_failures")]
    pub breaker_failure_threshold: u32,
    #[serde(default = "default_breaker_recovery")]
    pub breaker_recovery_secs: u64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: default_rate_limit(),
            breaker_failure_threshold: default_breaker_failures(),
            breaker_recovery_secs: default_breaker_recovery(),
        }
    }
}

impl MordomoConfig {
    /// Load from `mordomo.toml` (if present) merged with `NANOBOT_*` env vars
    /// (`NANOBOT_PROVIDERS__DEEPSEEK__API_KEY` → `providers.deepseek.api_key`)
    /// plus the handful of bare operator env vars.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(p) = path {
            figment = figment.merge(Toml::file(p));
        } else {
            figment = figment.merge(Toml::file("mordomo.toml"));
        }
        let mut cfg: MordomoConfig = figment
            .merge(Env::prefixed("NANOBOT_").split("__"))
            .extract()
            .map_err(|e| MordomoError::Config(e.to_string()))?;
        cfg.apply_bare_env();
        Ok(cfg)
    }

    /// Bare (unprefixed) env vars kept for operator compatibility.
    fn apply_bare_env(&mut self) {
        if let Ok(v) = std::env::var("GOD_MODE_PASSWORD") {
            if !v.is_empty() {
                self.god_mode_password = Some(v);
            }
        }
        if let Ok(v) = std::env::var("API_SECRET_KEY") {
            if !v.is_empty() {
                self.gateway.api_secret_key = Some(v);
            }
        }
        if let Ok(v) = std::env::var("HEALTH_CHECK_TOKEN") {
            if !v.is_empty() {
                self.gateway.health_check_token = Some(v);
            }
        }
        if let Ok(v) = std::env::var("CORS_ORIGINS") {
            if !v.is_empty() {
                self.gateway.cors_origins = v;
            }
        }
        if let Ok(v) = std::env::var("ATENDIMENTO_PHONE") {
            if !v.is_empty() {
                self.atendimento_phone = Some(v);
            }
        }
        if let Ok(v) = std::env::var("ATENDIMENTO_EMAIL") {
            if !v.is_empty() {
                self.atendimento_email = Some(v);
            }
        }
        if let Ok(v) = std::env::var("TOKEN_USAGE_FILE") {
            if !v.is_empty() {
                self.token_usage_file = Some(v);
            }
        }
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }
}

fn default_port() -> u16 {
    18890
}
fn default_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_cors() -> String {
    "*".to_string()
}
fn default_assistant_provider() -> String {
    "deepseek".to_string()
}
fn default_max_tool_iterations() -> u32 {
    20
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_min_recurring_secs() -> u64 {
    2 * 60 * 60
}
fn default_relaxed_min_secs() -> u64 {
    30 * 60
}
fn default_deadline_followup_minutes() -> u32 {
    30
}
fn default_tick_ms() -> u64 {
    1000
}
fn default_rate_limit() -> u32 {
    20
}
fn default_breaker_failures() -> u32 {
    3
}
fn default_breaker_recovery() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = MordomoConfig::default();
        assert_eq!(cfg.scheduler.min_recurring_interval_secs, 7200);
        assert_eq!(cfg.scheduler.relaxed_min_interval_secs, 1800);
        assert_eq!(cfg.safety.rate_limit_per_minute, 20);
        assert_eq!(cfg.agent.max_tool_iterations, 20);
    }

    #[test]
    fn bare_env_overrides_gateway_secrets() {
        std::env::set_var("API_SECRET_KEY", "k123");
        let mut cfg = MordomoConfig::default();
        cfg.apply_bare_env();
        assert_eq!(cfg.gateway.api_secret_key.as_deref(), Some("k123"));
        std::env::remove_var("API_SECRET_KEY");
    }
}
