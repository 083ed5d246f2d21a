//! Slash-command dispatch. Input is normalised (lowercased, diacritics
//! stripped) and aliases resolve to the canonical names before matching.

use serde_json::json;

use mordomo_core::types::InboundMessage;
use mordomo_locale::commands::{build_help, COMMAND_ALIASES};
use mordomo_locale::templates;
use mordomo_locale::tz::{city_to_iana, is_valid_iana};
use mordomo_locale::Lang;
use mordomo_parse::normalize::normalize;
use mordomo_parse::time::parse_reminder_time;
use mordomo_sessions::Session;
use mordomo_tools::ToolRegistry;

use crate::confirm::PendingAction;
use crate::onboarding;
use crate::{Router, RouterOutcome};

/// Split `/cmd rest` after normalisation, resolving aliases.
fn parse_command(content: &str) -> Option<(String, String)> {
    let trimmed = content.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    let normalized = normalize(trimmed);
    let head = match normalized.split_once(char::is_whitespace) {
        Some((h, _)) => h.to_string(),
        None => normalized,
    };
    let canonical = COMMAND_ALIASES
        .iter()
        .find(|(alias, _)| *alias == head)
        .map(|(_, c)| c.to_string())
        .unwrap_or(head);
    // Preserve the raw remainder (with case/diacritics) for free-text args.
    let raw_rest = trimmed
        .split_once(char::is_whitespace)
        .map(|(_, r)| r.trim().to_string())
        .unwrap_or_default();
    Some((canonical, raw_rest))
}

pub async fn dispatch(
    router: &Router,
    msg: &InboundMessage,
    session: &mut Session,
    registry: &ToolRegistry,
) -> Option<RouterOutcome> {
    let (cmd, rest) = parse_command(&msg.content)?;
    let lang = router.lang_for(msg);

    let outcome = match cmd.as_str() {
        "/help" => RouterOutcome::reply(build_help(lang)),

        "/start" => {
            session.clear_meta(onboarding::META_STAGE);
            session.set_meta_bool("onboarding_intro_sent", false);
            RouterOutcome::Handled(vec![
                templates::onboarding_intro(lang).to_string(),
                templates::onboarding_ask_city_or_time(lang).to_string(),
            ])
        }

        "/stop" => RouterOutcome::reply("Até já! Escreve quando precisares. 👋"),

        "/lembrete" => {
            if rest.is_empty() {
                let result = registry.execute("cron", json!({"action": "list"})).await;
                RouterOutcome::reply(result.content)
            } else {
                let now = router.local_now(msg);
                let spec = parse_reminder_time(&rest, now);
                if spec.date_was_past {
                    router.confirmations.install(
                        &msg.channel,
                        &msg.chat_id,
                        PendingAction::DatePastNextYear {
                            message: spec.message.clone(),
                            in_seconds: spec.in_seconds.unwrap_or(0),
                        },
                    );
                    return Some(RouterOutcome::reply(
                        templates::reminder_date_past_ask_next_year(lang),
                    ));
                }
                if !spec.has_timing() {
                    return Some(RouterOutcome::reply(templates::reminder_ask_what(lang)));
                }
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
                RouterOutcome::reply(result.content)
            }
        }

        "/recorrente" => {
            let jobs = router.cron.jobs_for_chat(&msg.chat_id);
            let recurring: Vec<String> = jobs
                .iter()
                .filter(|j| j.schedule.is_recurring())
                .map(|j| format!("- {} (id {})", j.name, j.id))
                .collect();
            if recurring.is_empty() {
                RouterOutcome::reply("Nenhum lembrete recorrente ativo.")
            } else {
                RouterOutcome::reply(format!("Recorrentes:\n{}", recurring.join("\n")))
            }
        }

        "/list" => {
            // `/list`, `/list compras`, `/list compras add arroz`
            let parts: Vec<&str> = rest.splitn(3, ' ').collect();
            let input = match parts.as_slice() {
                [] | [""] => json!({"action": "list"}),
                [name] => json!({"action": "list", "list_name": name}),
                [name, "add", item] => {
                    json!({"action": "add", "list_name": name, "item_text": item})
                }
                [name, item_head, item_tail] => json!({
                    "action": "add", "list_name": name,
                    "item_text": format!("{item_head} {item_tail}")
                }),
                [name, item] => json!({"action": "add", "list_name": name, "item_text": item}),
                _ => json!({"action": "list"}),
            };
            let result = registry.execute("list", input).await;
            RouterOutcome::reply(result.content)
        }

        "/add" => {
            if rest.is_empty() {
                RouterOutcome::reply("Uso: /add <item> (vai para a lista «compras»)")
            } else {
                let result = registry
                    .execute(
                        "list",
                        json!({"action": "add", "list_name": "compras", "item_text": rest}),
                    )
                    .await;
                RouterOutcome::reply(result.content)
            }
        }

        "/feito" | "/done" => match rest.trim().parse::<i64>() {
            Ok(id) => {
                let result = registry
                    .execute("list", json!({"action": "feito", "item_id": id}))
                    .await;
                RouterOutcome::reply(result.content)
            }
            Err(_) => RouterOutcome::reply("Uso: /feito <id do item>"),
        },

        "/hoje" => RouterOutcome::reply(router.view_hoje(msg)),
        "/agenda" => RouterOutcome::reply(router.view_agenda(msg)),
        "/semana" => RouterOutcome::reply(router.view_range(msg, 7, "Esta semana")),
        "/mes" => RouterOutcome::reply(router.view_range(msg, 31, "Este mês")),
        "/timeline" => RouterOutcome::reply(router.view_timeline(msg)),
        "/stats" => RouterOutcome::reply(router.view_stats(msg)),
        "/resumo" => RouterOutcome::reply(router.view_resumo(msg)),
        "/produtividade" => RouterOutcome::reply(router.view_produtividade(msg)),
        "/revisao" => RouterOutcome::reply(router.view_revisao(msg)),

        "/habito" | "/habitos" => handle_habits(router, msg, &rest),
        "/meta" | "/metas" => handle_goals(router, msg, &rest),
        "/nota" | "/notas" => handle_notes(router, msg, &rest),
        "/projeto" | "/projetos" => handle_projects(router, msg, &rest),
        "/template" | "/templates" => handle_templates(router, msg, &rest, registry).await,
        "/save" | "/bookmark" | "/bookmarks" => handle_bookmarks(router, msg, &cmd, &rest),
        "/find" => handle_find(router, msg, &rest),
        "/pomodoro" => handle_pomodoro(router, session, &rest),

        "/tz" => handle_tz(router, msg, &rest, lang).await,

        "/lang" => {
            if rest.is_empty() {
                RouterOutcome::reply(format!("Idioma atual: {}. Uso: /lang pt-br | pt-pt | es | en", lang))
            } else {
                match rest.parse::<Lang>() {
                    Ok(new_lang) if new_lang == lang => {
                        RouterOutcome::reply(templates::language_already_active(lang))
                    }
                    Ok(new_lang) => {
                        if let Some(user) = router.user_for(msg) {
                            let _ = router.store.set_language(user.id, new_lang.as_str());
                        }
                        RouterOutcome::reply(templates::language_switch_confirmation(new_lang))
                    }
                    Err(_) => RouterOutcome::reply("Uso: /lang pt-br | pt-pt | es | en"),
                }
            }
        }

        "/reset" => {
            if let Some(user) = router.user_for(msg) {
                let _ = router.store.reset_profile(user.id);
            }
            session.metadata.clear();
            RouterOutcome::reply(templates::reset_done(lang))
        }

        "/quiet" => {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            match parts.as_slice() {
                [start, end] if is_hhmm(start) && is_hhmm(end) => {
                    if let Some(user) = router.user_for(msg) {
                        let _ = router.store.set_quiet_window(user.id, start, end);
                    }
                    RouterOutcome::reply(templates::quiet_window_set(lang, start, end))
                }
                _ => RouterOutcome::reply("Uso: /quiet HH:MM HH:MM (ex.: /quiet 22:00 08:00)"),
            }
        }

        "/nuke" => {
            router
                .confirmations
                .install(&msg.channel, &msg.chat_id, PendingAction::NukeAll);
            RouterOutcome::reply(templates::confirm_delete_all(lang))
        }

        "/exportar" => {
            router
                .confirmations
                .install(&msg.channel, &msg.chat_id, PendingAction::Exportar);
            RouterOutcome::reply(templates::confirm_export(lang))
        }

        "/deletar_tudo" => {
            router
                .confirmations
                .install(&msg.channel, &msg.chat_id, PendingAction::DeletarTudo);
            RouterOutcome::reply(templates::confirm_delete_all(lang))
        }

        "/pendente" => {
            let mut lines: Vec<String> = Vec::new();
            if router.confirmations.peek_active(&msg.channel, &msg.chat_id) {
                lines.push("- uma confirmação à espera de 1/2".to_string());
            }
            if session.meta_value(crate::flows::META_REMINDER_FLOW).is_some() {
                lines.push("- um lembrete à espera de data/hora".to_string());
            }
            if session.meta_value(crate::flows::META_RECURRING_FLOW).is_some() {
                lines.push("- um evento recorrente à espera de confirmação".to_string());
            }
            if lines.is_empty() {
                RouterOutcome::reply("Nada pendente. ✨")
            } else {
                RouterOutcome::reply(format!("Pendentes:\n{}", lines.join("\n")))
            }
        }

        _ => return None,
    };
    Some(outcome)
}

fn is_hhmm(s: &str) -> bool {
    let parts: Vec<&str> = s.split(':').collect();
    matches!(parts.as_slice(), [h, m]
        if h.parse::<u32>().map(|v| v <= 23).unwrap_or(false)
        && m.parse::<u32>().map(|v| v <= 59).unwrap_or(false))
}

async fn handle_tz(router: &Router, msg: &InboundMessage, rest: &str, lang: Lang) -> RouterOutcome {
    if rest.is_empty() {
        let current = router
            .user_for(msg)
            .and_then(|u| u.tz_iana)
            .unwrap_or_else(|| "—".to_string());
        return RouterOutcome::reply(format!(
            "Fuso atual: {current}. Uso: /tz Cidade (ex.: /tz Lisboa)"
        ));
    }
    // Direct IANA names work too (/tz Europe/Lisbon).
    if is_valid_iana(rest) {
        if let Some(user) = router.user_for(msg) {
            let _ = router.store.set_timezone(user.id, rest, None);
        }
        return RouterOutcome::reply(templates::tz_set_confirmation(lang, rest));
    }
    if let Some(tz) = city_to_iana(rest) {
        if let Some(user) = router.user_for(msg) {
            let _ = router.store.set_timezone(user.id, tz, Some(rest));
        }
        return RouterOutcome::reply(templates::tz_set_confirmation(lang, tz));
    }
    // Unknown city: ask the parser LLM for the IANA zone.
    if let Some(tz) = onboarding::city_to_tz_via_llm(router, rest).await {
        if let Some(user) = router.user_for(msg) {
            let _ = router.store.set_timezone(user.id, &tz, Some(rest));
        }
        return RouterOutcome::reply(templates::tz_set_confirmation(lang, &tz));
    }
    RouterOutcome::reply("Não reconheci essa cidade. Tenta outra próxima, ou um nome IANA (ex.: Europe/Lisbon).")
}

fn handle_habits(router: &Router, msg: &InboundMessage, rest: &str) -> RouterOutcome {
    let Some(user) = router.user_for(msg) else {
        return RouterOutcome::reply("Indisponível.");
    };
    if let Some(name) = rest.strip_prefix("add ") {
        let _ = router.store.add_habit(user.id, name.trim());
        return RouterOutcome::reply(format!("Hábito «{}» criado. 💪", name.trim()));
    }
    if let Some(id_str) = rest.strip_prefix("check ") {
        if let Ok(id) = id_str.trim().parse::<i64>() {
            let today = router.local_now(msg).date().to_string();
            return match router.store.check_habit(user.id, id, &today) {
                Ok(true) => RouterOutcome::reply("Hábito registado hoje. ✅"),
                _ => RouterOutcome::reply("Hábito não encontrado."),
            };
        }
    }
    match router.store.list_habits(user.id) {
        Ok(habits) if habits.is_empty() => {
            RouterOutcome::reply("Sem hábitos ainda. Uso: /habito add <nome>")
        }
        Ok(habits) => {
            let lines: Vec<String> = habits
                .iter()
                .map(|(id, name, checks)| format!("- {name} (id {id}, {checks}x)"))
                .collect();
            RouterOutcome::reply(format!("Hábitos:\n{}", lines.join("\n")))
        }
        Err(_) => RouterOutcome::reply("Indisponível."),
    }
}

fn handle_goals(router: &Router, msg: &InboundMessage, rest: &str) -> RouterOutcome {
    let Some(user) = router.user_for(msg) else {
        return RouterOutcome::reply("Indisponível.");
    };
    if !rest.is_empty() {
        let _ = router.store.add_goal(user.id, rest);
        return RouterOutcome::reply(format!("Meta registada: {rest} 🎯"));
    }
    match router.store.list_goals(user.id) {
        Ok(goals) if goals.is_empty() => RouterOutcome::reply("Sem metas. Uso: /meta <texto>"),
        Ok(goals) => {
            let lines: Vec<String> = goals
                .iter()
                .map(|(id, text, done)| {
                    format!("- [{}] {text} (id {id})", if *done { "x" } else { " " })
                })
                .collect();
            RouterOutcome::reply(format!("Metas:\n{}", lines.join("\n")))
        }
        Err(_) => RouterOutcome::reply("Indisponível."),
    }
}

fn handle_notes(router: &Router, msg: &InboundMessage, rest: &str) -> RouterOutcome {
    let Some(user) = router.user_for(msg) else {
        return RouterOutcome::reply("Indisponível.");
    };
    if !rest.is_empty() {
        let _ = router.store.add_note(user.id, rest);
        return RouterOutcome::reply("Nota guardada. 📝");
    }
    match router.store.list_notes(user.id, 10) {
        Ok(notes) if notes.is_empty() => RouterOutcome::reply("Sem notas. Uso: /nota <texto>"),
        Ok(notes) => {
            let lines: Vec<String> = notes.iter().map(|n| format!("- {n}")).collect();
            RouterOutcome::reply(format!("Notas recentes:\n{}", lines.join("\n")))
        }
        Err(_) => RouterOutcome::reply("Indisponível."),
    }
}

fn handle_projects(router: &Router, msg: &InboundMessage, rest: &str) -> RouterOutcome {
    let Some(user) = router.user_for(msg) else {
        return RouterOutcome::reply("Indisponível.");
    };
    if !rest.is_empty() {
        let _ = router.store.add_project(user.id, rest);
        return RouterOutcome::reply(format!("Projeto «{rest}» criado. 📁"));
    }
    match router.store.list_projects(user.id) {
        Ok(projects) if projects.is_empty() => {
            RouterOutcome::reply("Sem projetos. Uso: /projeto <nome>")
        }
        Ok(projects) => {
            let lines: Vec<String> = projects.iter().map(|p| format!("- {p}")).collect();
            RouterOutcome::reply(format!("Projetos:\n{}", lines.join("\n")))
        }
        Err(_) => RouterOutcome::reply("Indisponível."),
    }
}

async fn handle_templates(
    router: &Router,
    msg: &InboundMessage,
    rest: &str,
    registry: &ToolRegistry,
) -> RouterOutcome {
    let Some(user) = router.user_for(msg) else {
        return RouterOutcome::reply("Indisponível.");
    };
    // `/template save compras arroz, feijão, café` | `/template use compras` | `/template`
    if let Some(spec) = rest.strip_prefix("save ") {
        if let Some((name, items_str)) = spec.split_once(' ') {
            let items: Vec<String> = items_str
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !items.is_empty() {
                let _ = router.store.save_template(user.id, name, &items);
                return RouterOutcome::reply(format!(
                    "Template «{name}» guardado com {} item(ns).",
                    items.len()
                ));
            }
        }
        return RouterOutcome::reply("Uso: /template save <nome> item1, item2, ...");
    }
    if let Some(name) = rest.strip_prefix("use ") {
        let templates_list = router.store.list_templates(user.id).unwrap_or_default();
        if let Some((_, items)) = templates_list.iter().find(|(n, _)| n == name.trim()) {
            for item in items {
                let _ = registry
                    .execute(
                        "list",
                        json!({"action": "add", "list_name": name.trim(), "item_text": item}),
                    )
                    .await;
            }
            return RouterOutcome::reply(format!(
                "Lista «{}» criada a partir do template ({} itens).",
                name.trim(),
                items.len()
            ));
        }
        return RouterOutcome::reply(format!("Template «{}» não encontrado.", name.trim()));
    }
    match router.store.list_templates(user.id) {
        Ok(list) if list.is_empty() => {
            RouterOutcome::reply("Sem templates. Uso: /template save <nome> item1, item2")
        }
        Ok(list) => {
            let lines: Vec<String> = list
                .iter()
                .map(|(name, items)| format!("- {name} ({} itens)", items.len()))
                .collect();
            RouterOutcome::reply(format!("Templates:\n{}", lines.join("\n")))
        }
        Err(_) => RouterOutcome::reply("Indisponível."),
    }
}

fn handle_bookmarks(router: &Router, msg: &InboundMessage, cmd: &str, rest: &str) -> RouterOutcome {
    let Some(user) = router.user_for(msg) else {
        return RouterOutcome::reply("Indisponível.");
    };
    if cmd == "/save" && !rest.is_empty() {
        let (title, url) = match rest.split_once(' ') {
            Some((maybe_url, title)) if maybe_url.starts_with("http") => {
                (title.to_string(), Some(maybe_url.to_string()))
            }
            _ if rest.starts_with("http") => (rest.to_string(), Some(rest.to_string())),
            _ => (rest.to_string(), None),
        };
        let _ = router.store.add_bookmark(user.id, &title, url.as_deref());
        return RouterOutcome::reply("Guardado nos favoritos. 🔖");
    }
    match router.store.list_bookmarks(user.id, 10) {
        Ok(list) if list.is_empty() => {
            RouterOutcome::reply("Sem favoritos. Uso: /save <url ou texto>")
        }
        Ok(list) => {
            let lines: Vec<String> = list
                .iter()
                .map(|(title, url)| match url {
                    Some(u) => format!("- {title} ({u})"),
                    None => format!("- {title}"),
                })
                .collect();
            RouterOutcome::reply(format!("Favoritos:\n{}", lines.join("\n")))
        }
        Err(_) => RouterOutcome::reply("Indisponível."),
    }
}

fn handle_find(router: &Router, msg: &InboundMessage, rest: &str) -> RouterOutcome {
    if rest.is_empty() {
        return RouterOutcome::reply("Uso: /find <texto>");
    }
    let Some(user) = router.user_for(msg) else {
        return RouterOutcome::reply("Indisponível.");
    };
    let found = router.store.find_bookmarks(user.id, rest, 10).unwrap_or_default();
    if found.is_empty() {
        return RouterOutcome::reply(format!("Nada encontrado para «{rest}»."));
    }
    let lines: Vec<String> = found
        .iter()
        .map(|(title, url)| match url {
            Some(u) => format!("- {title} ({u})"),
            None => format!("- {title}"),
        })
        .collect();
    RouterOutcome::reply(format!("Encontrado:\n{}", lines.join("\n")))
}

fn handle_pomodoro(router: &Router, session: &mut Session, rest: &str) -> RouterOutcome {
    let now_ms = router.clock.now_ms();
    match rest.trim() {
        "start" => {
            session.set_meta_u64("pomodoro_started_ms", now_ms as u64);
            RouterOutcome::reply(
                "🍅 Pomodoro iniciado: 25 minutos de foco. Para um aviso no fim: /lembrete em 25 min pausa.",
            )
        }
        "stop" => {
            session.clear_meta("pomodoro_started_ms");
            RouterOutcome::reply("🍅 Pomodoro parado.")
        }
        "status" | "" => match session.meta_u64("pomodoro_started_ms") {
            Some(start) => {
                let mins = (now_ms as u64).saturating_sub(start) / 60_000;
                RouterOutcome::reply(format!("🍅 Pomodoro a correr há {mins} min."))
            }
            None => RouterOutcome::reply("Nenhum pomodoro ativo. Uso: /pomodoro start"),
        },
        _ => RouterOutcome::reply("Uso: /pomodoro start|stop|status"),
    }
}
