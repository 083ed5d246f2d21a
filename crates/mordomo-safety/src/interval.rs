//! Interval guard for recurring reminders: 2-hour floor, relaxed to
//! 30 minutes when the user insists with a plausible reason. The parser
//! LLM refines borderline cases; these heuristics are the zero-token base.

use std::sync::OnceLock;

use regex::Regex;

/// The previous assistant reply rejected for a short interval.
const REJECTION_MARKERS: &[&str] = &["2 horas", "2h", "minimo", "mínimo", "intervalo"];

/// Words that signal insistence or a medical justification.
const INSISTENCE_KEYWORDS: &[&str] = &[
    "insisto", "preciso", "necessito", "por favor", "preciso mesmo", "mesmo assim", "medicos",
    "médicos", "medico", "médico", "receita", "recomendou", "recomendaram", "doctor", "doctors",
    "prescribed", "medical", "insist", "need", "please", "aceita", "aceite", "accept",
    "faz assim", "assim mesmo", "desta vez",
];

fn short_interval_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| {
        Regex::new(r"(?i)\b(?:a\s+cada|every)\s+(\d{1,3})\s*min").expect("static pattern")
    })
}

/// The message asks for a recurring interval below `min_minutes`.
pub fn asks_interval_below(text: &str, min_minutes: u32) -> bool {
    if let Some(m) = short_interval_re().captures(text) {
        if let Ok(n) = m[1].parse::<u32>() {
            return n > 0 && n < min_minutes;
        }
    }
    false
}

/// Deterministic insistence check: the last assistant turn was an
/// interval rejection and the new message carries an insistence keyword.
/// (The parser LLM double-checks ambiguous cases.)
pub fn looks_like_insistence(last_assistant_reply: Option<&str>, current: &str) -> bool {
    let Some(last) = last_assistant_reply else {
        return false;
    };
    let last_lower = last.to_lowercase();
    if !REJECTION_MARKERS.iter().any(|m| last_lower.contains(m)) {
        return false;
    }
    let current_lower = current.to_lowercase();
    INSISTENCE_KEYWORDS.iter().any(|k| current_lower.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_interval_is_flagged() {
        assert!(asks_interval_below("beber água a cada 30 min", 120));
        assert!(!asks_interval_below("beber água a cada 30 min", 30));
        assert!(!asks_interval_below("a cada 3 horas", 120));
    }

    #[test]
    fn insistence_needs_rejection_context() {
        let rejection = "O intervalo mínimo para lembretes recorrentes é 2 horas.";
        assert!(looks_like_insistence(Some(rejection), "médicos recomendaram insistentemente"));
        assert!(!looks_like_insistence(Some(rejection), "ok então a cada 3 horas"));
        assert!(!looks_like_insistence(Some("Lembrete agendado."), "preciso mesmo"));
        assert!(!looks_like_insistence(None, "preciso mesmo"));
    }
}
