//! `search` tool — external web search, registered only when an API key is
//! configured.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::{Tool, ToolResult};

const SEARCH_URL: &str = "https://api.perplexity.ai/chat/completions";
const SEARCH_MODEL: &str = "sonar";
const MAX_ANSWER_CHARS: usize = 1500;

pub struct SearchTool {
    client: reqwest::Client,
    api_key: String,
}

impl SearchTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), api_key: api_key.into() }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Use only when the user asks \
         something that needs fresh external facts."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "The search query"}
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        let Some(query) = input.get("query").and_then(|v| v.as_str()).filter(|q| !q.is_empty())
        else {
            return ToolResult::error("'query' is required");
        };
        let body = json!({
            "model": SEARCH_MODEL,
            "messages": [{"role": "user", "content": query}],
            "max_tokens": 512,
        });
        let resp = self
            .client
            .post(SEARCH_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(std::time::Duration::from_secs(20))
            .send()
            .await;
        match resp {
            Ok(r) if r.status().is_success() => {
                let parsed: Value = match r.json().await {
                    Ok(v) => v,
                    Err(e) => return ToolResult::error(format!("search parse failed: {e}")),
                };
                let answer = parsed["choices"][0]["message"]["content"]
                    .as_str()
                    .unwrap_or("")
                    .chars()
                    .take(MAX_ANSWER_CHARS)
                    .collect::<String>();
                if answer.is_empty() {
                    ToolResult::error("search returned no answer")
                } else {
                    ToolResult::success(answer)
                }
            }
            Ok(r) => ToolResult::error(format!("search failed with status {}", r.status())),
            Err(e) => {
                debug!("search request failed: {e}");
                ToolResult::error("search unavailable")
            }
        }
    }
}
