//! `read_file` tool — named reference documents from the workspace
//! (identity, rules, per-user memory). Loading these on demand keeps the
//! system prompt small.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{Tool, ToolResult};

const MAX_FILE_CHARS: usize = 20_000;

pub struct ReadFileTool {
    workspace: PathBuf,
}

impl ReadFileTool {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self { workspace: workspace.into() }
    }

    /// Only simple names inside the workspace. No separators, no parents.
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let trimmed = name.trim();
        if trimmed.is_empty()
            || trimmed.contains("..")
            || trimmed.contains('/')
            || trimmed.contains('\\')
        {
            return None;
        }
        let candidate = self.workspace.join(trimmed);
        candidate.exists().then_some(candidate)
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a named reference document from the workspace (e.g. identity.md, \
         rules.md, the user's memory file). Pass just the file name."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "File name inside the workspace"}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        let Some(name) = input.get("path").and_then(|v| v.as_str()) else {
            return ToolResult::error("'path' is required");
        };
        match self.resolve(name) {
            Some(path) => match std::fs::read_to_string(&path) {
                Ok(content) => {
                    ToolResult::success(content.chars().take(MAX_FILE_CHARS).collect::<String>())
                }
                Err(e) => ToolResult::error(format!("read failed: {e}")),
            },
            None => ToolResult::error(format!("file not available: {name}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn traversal_is_refused() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("identity.md"), "eu sou o mordomo").unwrap();
        let tool = ReadFileTool::new(tmp.path());

        let ok = tool.execute(json!({"path": "identity.md"})).await;
        assert!(!ok.is_error);
        assert!(ok.content.contains("mordomo"));

        for bad in ["../etc/passwd", "a/b.md", "..", ""] {
            let res = tool.execute(json!({"path": bad})).await;
            assert!(res.is_error, "{bad} should be refused");
        }
    }
}
