//! System-prompt assembly: identity block, current time in the user's
//! timezone, reference files, scoped memory, and the language hint.

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;

use mordomo_locale::Lang;

pub struct ContextInput<'a> {
    pub lang: Lang,
    pub tz_iana: &'a str,
    pub now_ms: i64,
    pub preferred_name: Option<&'a str>,
    pub long_term_memory: &'a str,
    pub workspace_path: &'a str,
    pub reference_files: &'a [&'a str],
}

const IDENTITY: &str = "\
You are Mordomo, a personal-organizer assistant on WhatsApp. You manage \
reminders, lists, agenda events and media collections (filme, livro, música, \
receita) through your tools. You never invent tool results. You stay strictly \
within organizing: anything else gets a short friendly redirect. Replies are \
short, warm, and in the user's language, with at most one emoji.";

const SKILLS: &str = "\
Skills: cron (reminders: add/list/remove, chaining with depends_on_job_id, \
deadlines with has_deadline), list (add/list/remove/feito/habitual/shuffle), \
event (agenda + collections), read_file (reference docs), search (web), \
message (other chats only).";

pub fn build_system_prompt(input: &ContextInput<'_>) -> String {
    let tz: Tz = input.tz_iana.parse().unwrap_or(chrono_tz::UTC);
    let local = Utc
        .timestamp_millis_opt(input.now_ms)
        .single()
        .unwrap_or_else(Utc::now)
        .with_timezone(&tz);

    let mut prompt = String::new();
    prompt.push_str(IDENTITY);
    prompt.push_str("\n\n");
    prompt.push_str(&format!(
        "Current time for the user: {} ({})\n",
        local.format("%A %d/%m/%Y %H:%M"),
        input.tz_iana
    ));
    if let Some(name) = input.preferred_name {
        prompt.push_str(&format!("The user prefers to be called {name}.\n"));
    }
    prompt.push_str(&format!("Reply language: {}.\n", input.lang.as_str()));
    prompt.push_str(&format!("Workspace: {}\n", input.workspace_path));
    if !input.reference_files.is_empty() {
        prompt.push_str(&format!(
            "Reference files (use read_file): {}\n",
            input.reference_files.join(", ")
        ));
    }
    prompt.push('\n');
    prompt.push_str(SKILLS);
    if !input.long_term_memory.trim().is_empty() {
        prompt.push_str("\n\nWhat you remember about this user:\n");
        prompt.push_str(input.long_term_memory.trim());
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_time_language_and_memory() {
        let input = ContextInput {
            lang: Lang::PtBr,
            tz_iana: "America/Sao_Paulo",
            now_ms: 1_739_188_800_000, // 2025-02-10 12:00 UTC
            preferred_name: Some("Ana"),
            long_term_memory: "## Perfil\nNome: Ana",
            workspace_path: "/data/workspace",
            reference_files: &["identity.md", "rules.md"],
        };
        let prompt = build_system_prompt(&input);
        assert!(prompt.contains("Ana"));
        assert!(prompt.contains("pt-BR"));
        assert!(prompt.contains("America/Sao_Paulo"));
        assert!(prompt.contains("identity.md"));
        assert!(prompt.contains("## Perfil"));
    }
}
