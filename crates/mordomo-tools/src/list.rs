//! `list` tool — persistent per-user lists (compras, filmes, livros…).

use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde_json::{json, Value};
use tracing::debug;

use mordomo_llm::{ChatMessage, ChatRequest, LlmProvider, Profile};
use mordomo_store::Store;

use crate::{resolve_lang, Tool, ToolCtx, ToolResult};

pub struct ListTool {
    store: Arc<Store>,
    parser: Option<Arc<dyn LlmProvider>>,
    ctx: ToolCtx,
}

impl ListTool {
    pub fn new(store: Arc<Store>, parser: Option<Arc<dyn LlmProvider>>, ctx: ToolCtx) -> Self {
        Self { store, parser, ctx }
    }

    fn user_id(&self) -> Result<i64, ToolResult> {
        let lang = resolve_lang(&self.store, &self.ctx);
        self.store
            .get_or_create_user(&self.ctx.chat_id, lang.as_str())
            .map(|u| u.id)
            .map_err(|e| ToolResult::error(format!("user lookup failed: {e}")))
    }

    fn add(&self, input: &Value) -> ToolResult {
        let user_id = match self.user_id() {
            Ok(id) => id,
            Err(e) => return e,
        };
        let list_name = input.get("list_name").and_then(|v| v.as_str()).unwrap_or("");
        let item_text = input.get("item_text").and_then(|v| v.as_str()).unwrap_or("");
        if list_name.is_empty() || item_text.is_empty() {
            return ToolResult::error("'list_name' and 'item_text' are required for add");
        }
        match self.store.add_list_item(user_id, list_name, item_text) {
            Ok((list, item)) => ToolResult::success(format!(
                "Adicionado à lista «{}»: {} (id {})",
                list.name, item.text, item.id
            )),
            Err(e) => ToolResult::error(format!("failed to add item: {e}")),
        }
    }

    fn show(&self, input: &Value) -> ToolResult {
        let user_id = match self.user_id() {
            Ok(id) => id,
            Err(e) => return e,
        };
        match input.get("list_name").and_then(|v| v.as_str()).filter(|s| !s.is_empty()) {
            Some(name) => match self.store.get_list_items(user_id, name) {
                Ok(items) if items.is_empty() => {
                    ToolResult::success(format!("A lista «{name}» está vazia."))
                }
                Ok(items) => {
                    let mut out = format!("Lista «{name}»:\n");
                    for item in items {
                        out.push_str(&format!("- {} (id {})\n", item.text, item.id));
                    }
                    ToolResult::success(out.trim_end().to_string())
                }
                Err(e) => ToolResult::error(format!("failed to read list: {e}")),
            },
            None => match self.store.list_lists(user_id) {
                Ok(lists) if lists.is_empty() => {
                    ToolResult::success("Nenhuma lista criada ainda.")
                }
                Ok(lists) => {
                    let mut out = String::from("Listas:\n");
                    for (list, count) in lists {
                        out.push_str(&format!("- {} ({} itens)\n", list.name, count));
                    }
                    ToolResult::success(out.trim_end().to_string())
                }
                Err(e) => ToolResult::error(format!("failed to list: {e}")),
            },
        }
    }

    fn feito(&self, input: &Value) -> ToolResult {
        let user_id = match self.user_id() {
            Ok(id) => id,
            Err(e) => return e,
        };
        let Some(item_id) = input.get("item_id").and_then(|v| v.as_i64()) else {
            return ToolResult::error("'item_id' is required for feito");
        };
        match self.store.mark_item_done(user_id, item_id) {
            Ok(true) => ToolResult::success(format!("Item {item_id} marcado como feito. ✅")),
            Ok(false) => ToolResult::success(format!("Item {item_id} não encontrado.")),
            Err(e) => ToolResult::error(format!("failed to mark done: {e}")),
        }
    }

    fn remove(&self, input: &Value) -> ToolResult {
        let user_id = match self.user_id() {
            Ok(id) => id,
            Err(e) => return e,
        };
        let Some(item_id) = input.get("item_id").and_then(|v| v.as_i64()) else {
            return ToolResult::error("'item_id' is required for remove");
        };
        match self.store.remove_item(user_id, item_id) {
            Ok(true) => ToolResult::success(format!("Item {item_id} removido.")),
            Ok(false) => ToolResult::success(format!("Item {item_id} não encontrado.")),
            Err(e) => ToolResult::error(format!("failed to remove: {e}")),
        }
    }

    /// Ask the parser model for context-aware frequent items for this list.
    async fn habitual(&self, input: &Value) -> ToolResult {
        let list_name = input
            .get("list_name")
            .and_then(|v| v.as_str())
            .unwrap_or("compras");
        let Some(parser) = self.parser.as_ref() else {
            return ToolResult::success(
                "Sugestões indisponíveis no momento. Adiciona itens um a um.",
            );
        };
        let user_id = match self.user_id() {
            Ok(id) => id,
            Err(e) => return e,
        };
        let existing = self
            .store
            .get_list_items(user_id, list_name)
            .map(|items| items.iter().map(|i| i.text.clone()).collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        let prompt = format!(
            "Lista «{list_name}» do utilizador contém: {existing}. \
             Sugere 5 itens habituais que costumam faltar numa lista dessas. \
             Responde só os itens, um por linha, sem numeração."
        );
        let req = ChatRequest::new(Profile::Parser, vec![ChatMessage::user(prompt)]);
        match parser.chat(&req).await {
            Ok(out) if !out.content.trim().is_empty() => {
                ToolResult::success(format!("Sugestões habituais:\n{}", out.content.trim()))
            }
            Ok(_) => ToolResult::success("Sem sugestões desta vez."),
            Err(e) => {
                debug!("habitual suggestions failed: {e}");
                ToolResult::success("Sugestões indisponíveis no momento.")
            }
        }
    }

    fn shuffle(&self, input: &Value) -> ToolResult {
        let user_id = match self.user_id() {
            Ok(id) => id,
            Err(e) => return e,
        };
        let Some(name) = input.get("list_name").and_then(|v| v.as_str()).filter(|s| !s.is_empty())
        else {
            return ToolResult::error("'list_name' is required for shuffle");
        };
        match self.store.get_list_items(user_id, name) {
            Ok(mut items) if !items.is_empty() => {
                items.shuffle(&mut rand::thread_rng());
                let mut out = format!("Lista «{name}» (ordem aleatória):\n");
                for item in items {
                    out.push_str(&format!("- {}\n", item.text));
                }
                ToolResult::success(out.trim_end().to_string())
            }
            Ok(_) => ToolResult::success(format!("A lista «{name}» está vazia.")),
            Err(e) => ToolResult::error(format!("failed to read list: {e}")),
        }
    }
}

#[async_trait]
impl Tool for ListTool {
    fn name(&self) -> &str {
        "list"
    }

    fn description(&self) -> &str {
        "Manage the user's lists (shopping, movies, books, recipes). Actions: \
         add, list, remove, feito (mark done), habitual (suggest frequent items), shuffle."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {"type": "string", "enum": ["add", "list", "remove", "feito", "habitual", "shuffle"]},
                "list_name": {"type": "string", "description": "List name, e.g. 'compras'"},
                "item_text": {"type": "string", "description": "Item text (for add)"},
                "item_id": {"type": "integer", "description": "Item id (for remove/feito)"}
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        match input.get("action").and_then(|v| v.as_str()) {
            Some("add") => self.add(&input),
            Some("list") => self.show(&input),
            Some("remove") => self.remove(&input),
            Some("feito") => self.feito(&input),
            Some("habitual") => self.habitual(&input).await,
            Some("shuffle") => self.shuffle(&input),
            other => ToolResult::error(format!("unknown action: {other:?}")),
        }
    }
}
