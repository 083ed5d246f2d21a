//! OpenAI-compatible chat-completions client. Covers DeepSeek, Xiaomi MIMO,
//! and anything else speaking the same wire format.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::provider::{
    ChatMessage, ChatOutcome, ChatRequest, LlmProvider, ProviderError, Role, ToolCall,
};

pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    provider_name: String,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiCompatProvider {
    /// `base_url` without a trailing slash; the chat path is appended.
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider_name: name.into(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn chat(&self, req: &ChatRequest) -> Result<ChatOutcome, ProviderError> {
        let body = build_request_body(req, &self.model);
        let url = format!("{}/v1/chat/completions", self.base_url);
        let timeout = std::time::Duration::from_secs(req.profile.timeout_secs());

        debug!(model = %self.model, provider = %self.provider_name, "sending chat request");

        let send = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send();
        let resp = tokio::time::timeout(timeout, send)
            .await
            .map_err(|_| ProviderError::Timeout { secs: req.profile.timeout_secs() })??;

        let status = resp.status().as_u16();
        if status == 429 {
            let retry = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|s| s * 1000)
                .unwrap_or(5000);
            return Err(ProviderError::RateLimited { retry_after_ms: retry });
        }
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, provider = %self.provider_name, "chat API error");
            return Err(ProviderError::Api { status, message: text });
        }

        let api_resp: ApiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        parse_response(api_resp)
    }
}

fn build_request_body(req: &ChatRequest, model: &str) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = req.messages.iter().map(message_to_json).collect();
    let mut body = json!({
        "model": model,
        "messages": messages,
        "max_tokens": req.max_tokens.unwrap_or_else(|| req.profile.default_max_tokens()),
        "temperature": req.temperature.unwrap_or_else(|| req.profile.default_temperature()),
    });
    if !req.tools.is_empty() {
        body["tools"] = serde_json::Value::Array(
            req.tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.input_schema,
                        }
                    })
                })
                .collect(),
        );
    }
    body
}

fn message_to_json(msg: &ChatMessage) -> serde_json::Value {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };
    let mut out = json!({ "role": role, "content": msg.content });
    if let Some(id) = &msg.tool_call_id {
        out["tool_call_id"] = json!(id);
    }
    if let Some(calls) = &msg.tool_calls {
        out["tool_calls"] = serde_json::Value::Array(
            calls
                .iter()
                .map(|c| {
                    json!({
                        "id": c.id,
                        "type": "function",
                        "function": {
                            "name": c.name,
                            "arguments": c.input.to_string(),
                        }
                    })
                })
                .collect(),
        );
    }
    out
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Deserialize)]
struct ApiToolCall {
    id: String,
    function: ApiFunction,
}

#[derive(Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

fn parse_response(resp: ApiResponse) -> Result<ChatOutcome, ProviderError> {
    let choice = resp.choices.into_iter().next().ok_or(ProviderError::Empty)?;
    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|c| ToolCall {
            id: c.id,
            name: c.function.name,
            input: serde_json::from_str(&c.function.arguments)
                .unwrap_or(serde_json::Value::Null),
        })
        .collect::<Vec<_>>();
    let content = choice.message.content.unwrap_or_default();
    if content.is_empty() && tool_calls.is_empty() {
        return Err(ProviderError::Empty);
    }
    let usage = resp.usage.unwrap_or_default();
    Ok(ChatOutcome {
        content,
        tool_calls,
        model: resp.model,
        tokens_in: usage.prompt_tokens,
        tokens_out: usage.completion_tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Profile, ToolDefinition};

    #[test]
    fn body_includes_tools_only_when_present() {
        let req = ChatRequest::new(Profile::Parser, vec![ChatMessage::user("oi")]);
        let body = build_request_body(&req, "mimo-v2");
        assert!(body.get("tools").is_none());
        assert_eq!(body["max_tokens"], 512);

        let req = req.with_tools(vec![ToolDefinition {
            name: "cron".into(),
            description: "schedule".into(),
            input_schema: serde_json::json!({"type": "object"}),
        }]);
        let body = build_request_body(&req, "mimo-v2");
        assert_eq!(body["tools"][0]["function"]["name"], "cron");
    }

    #[test]
    fn parse_extracts_tool_calls() {
        let raw = serde_json::json!({
            "model": "deepseek-chat",
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "cron", "arguments": "{\"action\":\"add\"}"}
                    }]
                }
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        });
        let resp: ApiResponse = serde_json::from_value(raw).unwrap();
        let out = parse_response(resp).unwrap();
        assert_eq!(out.tool_calls.len(), 1);
        assert_eq!(out.tool_calls[0].name, "cron");
        assert_eq!(out.tool_calls[0].input["action"], "add");
        assert_eq!(out.tokens_in, 10);
    }

    #[test]
    fn empty_body_is_an_error() {
        let raw = serde_json::json!({
            "model": "m", "choices": [{"message": {"content": ""}}]
        });
        let resp: ApiResponse = serde_json::from_value(raw).unwrap();
        assert!(matches!(parse_response(resp), Err(ProviderError::Empty)));
    }
}
