//! Canonical slash-command set and localised display names.
//!
//! The canonical names are what the router matches after normalisation;
//! the display table is what `/help` shows per language.

use crate::lang::Lang;

/// Canonical command names (the source of truth for the router).
pub const CANONICAL_COMMANDS: &[&str] = &[
    "/lembrete",
    "/list",
    "/feito",
    "/add",
    "/done",
    "/recorrente",
    "/hoje",
    "/agenda",
    "/semana",
    "/mes",
    "/timeline",
    "/stats",
    "/resumo",
    "/produtividade",
    "/revisao",
    "/habito",
    "/habitos",
    "/meta",
    "/metas",
    "/nota",
    "/notas",
    "/projeto",
    "/projetos",
    "/template",
    "/templates",
    "/save",
    "/bookmark",
    "/bookmarks",
    "/find",
    "/pomodoro",
    "/tz",
    "/lang",
    "/reset",
    "/quiet",
    "/nuke",
    "/exportar",
    "/deletar_tudo",
    "/help",
    "/start",
    "/stop",
    "/pendente",
];

/// Aliases accepted in addition to the canonical names (after
/// diacritic-stripped lowercasing, so `/mês` already maps to `/mes`).
pub const COMMAND_ALIASES: &[(&str, &str)] = &[
    ("/lista", "/list"),
    ("/ajuda", "/help"),
    ("/idioma", "/lang"),
    ("/fuso", "/tz"),
    ("/silencio", "/quiet"),
    ("/bomba", "/nuke"),
    ("/bomb", "/nuke"),
    ("/linha", "/timeline"),
    ("/estatisticas", "/stats"),
];

/// Localised display name for `/help` output.
pub fn display_name(lang: Lang, canonical: &str) -> &'static str {
    let pt = matches!(lang, Lang::PtPt | Lang::PtBr);
    match canonical {
        "/list" if pt => "/lista",
        "/lang" if pt => "/idioma",
        "/quiet" if pt => "/silêncio",
        "/timeline" if pt => "/linha",
        "/stats" if pt => "/estatísticas",
        "/help" if pt => "/ajuda",
        "/list" if lang == Lang::Es => "/lista",
        "/help" if lang == Lang::Es => "/ayuda",
        // Canonical name is already the display form.
        _ => CANONICAL_COMMANDS
            .iter()
            .find(|c| **c == canonical)
            .copied()
            .unwrap_or("/help"),
    }
}

const HELP_ORDER: &[&str] = &[
    "/lembrete", "/list", "/hoje", "/agenda", "/semana", "/mes", "/recorrente", "/stats",
    "/resumo", "/pomodoro", "/tz", "/lang", "/quiet", "/reset", "/exportar", "/help",
];

/// Short per-command description for `/help`.
fn describe(lang: Lang, canonical: &str) -> &'static str {
    let pt = matches!(lang, Lang::PtPt | Lang::PtBr);
    match canonical {
        "/lembrete" if pt => "criar ou listar lembretes",
        "/lembrete" => "create or list reminders",
        "/list" if pt => "listas (compras, filmes, livros...)",
        "/list" => "lists (shopping, movies, books...)",
        "/hoje" if pt => "agenda de hoje",
        "/hoje" => "today's agenda",
        "/agenda" if pt => "próximos eventos",
        "/agenda" => "upcoming events",
        "/semana" if pt => "visão da semana",
        "/semana" => "week view",
        "/mes" if pt => "visão do mês",
        "/mes" => "month view",
        "/recorrente" if pt => "lembretes recorrentes",
        "/recorrente" => "recurring reminders",
        "/stats" if pt => "estatísticas de uso",
        "/stats" => "usage stats",
        "/resumo" if pt => "resumo da semana",
        "/resumo" => "weekly summary",
        "/pomodoro" if pt => "pomodoro start|stop|status",
        "/pomodoro" => "pomodoro start|stop|status",
        "/tz" if pt => "definir fuso (/tz Cidade)",
        "/tz" => "set timezone (/tz City)",
        "/lang" if pt => "mudar idioma",
        "/lang" => "change language",
        "/quiet" if pt => "janela de silêncio (/quiet 22:00 08:00)",
        "/quiet" => "quiet window (/quiet 22:00 08:00)",
        "/reset" if pt => "refazer o cadastro",
        "/reset" => "redo registration",
        "/exportar" if pt => "exportar os teus dados",
        "/exportar" => "export your data",
        "/help" if pt => "esta lista",
        "/help" => "this list",
        _ => "",
    }
}

/// Build the `/help` text in the user's language.
pub fn build_help(lang: Lang) -> String {
    let header = match lang {
        Lang::PtPt | Lang::PtBr => "Comandos disponíveis:",
        Lang::Es => "Comandos disponibles:",
        Lang::En => "Available commands:",
    };
    let mut out = String::from(header);
    for cmd in HELP_ORDER {
        let desc = describe(lang, cmd);
        if desc.is_empty() {
            continue;
        }
        out.push('\n');
        out.push_str(&format!("• {} — {}", display_name(lang, cmd), desc));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_map_to_canonical_commands() {
        for (alias, canonical) in COMMAND_ALIASES {
            assert!(
                CANONICAL_COMMANDS.contains(canonical),
                "alias {alias} points at unknown {canonical}"
            );
        }
    }

    #[test]
    fn help_lists_localised_names() {
        let help = build_help(Lang::PtBr);
        assert!(help.contains("/lista"));
        assert!(help.contains("/lembrete"));
        let help_en = build_help(Lang::En);
        assert!(help_en.contains("Available commands:"));
    }
}
