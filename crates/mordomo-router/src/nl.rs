//! Natural-language aliases: list creation/addition phrases and reminder
//! requests with a parseable time. Anything ambiguous falls through to the
//! flows or the assistant LLM.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::json;

use mordomo_core::types::InboundMessage;
use mordomo_locale::templates;
use mordomo_parse::normalize::normalize;
use mordomo_parse::time::parse_reminder_time;
use mordomo_sessions::Session;
use mordomo_tools::ToolRegistry;

use crate::confirm::PendingAction;
use crate::{Router, RouterOutcome};

fn re(pattern: &'static str, cell: &'static OnceLock<Regex>) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern"))
}

fn re_create_list() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    re(r"cria\w*\s+(?:uma\s+)?lista\s+(?:de\s+)?([\w ]+?)(?:\s+com\s+(.+))?$", &CELL)
}

fn re_add_to_list() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    re(r"(?:adiciona\w*|acrescenta\w*|poe|poem|bota)\s+(.+?)\s+(?:a|na|à|em)\s+lista(?:\s+(?:de|do|da)\s+([\w ]+))?", &CELL)
}

fn re_reminder_keyword() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    re(r"\b(me\s+lembra|lembra(-me)?|lembre(-me)?|lembrete|remind|avisa(-me)?)\b", &CELL)
}

fn re_tenho_de() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    re(r"tenho\s+(?:de|que)\s+(.+)$", &CELL)
}

fn re_recipe() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    re(r"receita\s+(?:de|do|da)\s+(.+?)\s+com\s+(.+)$", &CELL)
}

pub async fn dispatch(
    router: &Router,
    msg: &InboundMessage,
    _session: &mut Session,
    registry: &ToolRegistry,
) -> Option<RouterOutcome> {
    let raw = msg.content.trim();
    if raw.is_empty() || raw.starts_with('/') || raw.starts_with('#') {
        return None;
    }
    let t = normalize(raw);
    let lang = router.lang_for(msg);

    // "cria uma lista de livros com dom casmurro, 1984"
    if let Some(m) = re_create_list().captures(&t) {
        let list_name = m[1].trim().to_string();
        let items: Vec<String> = m
            .get(2)
            .map(|items| split_items(items.as_str()))
            .unwrap_or_default();
        if items.is_empty() {
            let result = registry
                .execute("list", json!({"action": "list", "list_name": list_name}))
                .await;
            return Some(RouterOutcome::reply(format!(
                "Lista «{list_name}» pronta. Vai dizendo os itens!\n{}",
                result.content
            )));
        }
        let mut added = 0;
        for item in &items {
            let result = registry
                .execute(
                    "list",
                    json!({"action": "add", "list_name": list_name, "item_text": item}),
                )
                .await;
            if !result.is_error {
                added += 1;
            }
        }
        return Some(RouterOutcome::reply(format!(
            "Lista «{list_name}» criada com {added} item(ns). ✨"
        )));
    }

    // "adiciona arroz à lista de compras"
    if let Some(m) = re_add_to_list().captures(&t) {
        let item = m[1].trim().to_string();
        let list_name = m
            .get(2)
            .map(|l| l.as_str().trim().to_string())
            .unwrap_or_else(|| "compras".to_string());
        let result = registry
            .execute(
                "list",
                json!({"action": "add", "list_name": list_name, "item_text": item}),
            )
            .await;
        return Some(RouterOutcome::reply(result.content));
    }

    // "guarda a receita de moqueca com peixe, leite de coco e dendê":
    // save the recipe, then offer the ingredients as a shopping list.
    if let Some(m) = re_recipe().captures(&t) {
        let nome = m[1].trim().to_string();
        let ingredients = split_items(&m[2]);
        let result = registry
            .execute(
                "event",
                json!({"action": "add", "tipo": "receita", "nome": nome,
                       "payload": {"ingredientes": ingredients.join(", ")}}),
            )
            .await;
        if !result.is_error && !ingredients.is_empty() {
            router.confirmations.install(
                &msg.channel,
                &msg.chat_id,
                PendingAction::CreateShoppingListFromRecipe { items: ingredients },
            );
            return Some(RouterOutcome::Handled(vec![
                result.content,
                "Queres que eu adicione os ingredientes à lista de compras? (1=sim 2=não)"
                    .to_string(),
            ]));
        }
        return Some(RouterOutcome::reply(result.content));
    }

    // "tenho de pagar a conta, ir ao correio e comprar pão" — 2+ items is
    // ambiguous between a list and reminders.
    if let Some(m) = re_tenho_de().captures(&t) {
        let items = split_items(&m[1]);
        if items.len() >= 2 {
            router.confirmations.install(
                &msg.channel,
                &msg.chat_id,
                PendingAction::ListOrEventsChoice { items },
            );
            return Some(RouterOutcome::reply(templates::list_or_reminders_choice(lang)));
        }
    }

    // Reminder phrasing with a parseable time goes straight to the tool.
    if re_reminder_keyword().is_match(&t) {
        let now = router.local_now(msg);
        let spec = parse_reminder_time(raw, now);
        if spec.date_was_past {
            router.confirmations.install(
                &msg.channel,
                &msg.chat_id,
                PendingAction::DatePastNextYear {
                    message: spec.message.clone(),
                    in_seconds: spec.in_seconds.unwrap_or(0),
                },
            );
            return Some(RouterOutcome::reply(templates::reminder_date_past_ask_next_year(lang)));
        }
        if spec.has_timing() {
            let mut input = json!({ "action": "add", "message": spec.message });
            if let Some(s) = spec.in_seconds {
                input["in_seconds"] = json!(s);
            }
            if let Some(s) = spec.every_seconds {
                input["every_seconds"] = json!(s);
            }
            if let Some(e) = &spec.cron_expr {
                input["cron_expr"] = json!(e);
            }
            if let Some(d) = &spec.start_date {
                input["start_date"] = json!(d.to_string());
            }
            let result = registry.execute("cron", input).await;
            return Some(RouterOutcome::reply(result.content));
        }
    }

    None
}

/// Split "a, b e c" / "a, b and c" into items.
fn split_items(raw: &str) -> Vec<String> {
    raw.split(',')
        .flat_map(|part| {
            let p = part.trim();
            match p.rsplit_once(" e ") {
                Some((head, tail)) if !head.is_empty() => {
                    vec![head.trim().to_string(), tail.trim().to_string()]
                }
                _ => vec![p.to_string()],
            }
        })
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_split_on_commas_and_e() {
        assert_eq!(
            split_items("pagar a conta, ir ao correio e comprar pao"),
            vec!["pagar a conta", "ir ao correio", "comprar pao"]
        );
        assert_eq!(split_items("arroz"), vec!["arroz"]);
    }

    #[test]
    fn list_phrases_match() {
        assert!(re_create_list().is_match("cria uma lista de livros"));
        assert!(re_add_to_list().is_match("adiciona arroz na lista de compras"));
        assert!(re_tenho_de().is_match("tenho de pagar a conta e ir ao banco"));
    }
}
