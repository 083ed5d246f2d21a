//! Fast regex side of the scope filter. The parser LLM is the judge of
//! record; this catalogue answers when the LLM is unavailable, and
//! short-circuits obviously in-scope messages without a call.

use std::sync::OnceLock;

use regex::RegexSet;

const IN_SCOPE_PATTERNS: &[&str] = &[
    // Reminders
    r"(?i)\b(lembr\w*|reminder|remind|recordatorio|alarme|avis[aoe]\w*)\b",
    // Lists and items
    r"(?i)\b(lista\w*|list|compras|shopping|adiciona\w*|add|remove\w*|feito|done)\b",
    // Agenda / events
    r"(?i)\b(agenda|evento\w*|consulta|reuni[aã]o|compromisso|appointment|meeting)\b",
    // Media collections
    r"(?i)\b(filme|livro|m[uú]sica|receita|movie|book|recipe)\b",
    // Dates and times
    r"(?i)\b(hoje|amanh[aã]|semana|m[eê]s|segunda|ter[cç]a|quarta|quinta|sexta|s[aá]bado|domingo)\b",
    r"(?i)(\b\d{1,2}:\d{2}\b|\b\d{1,2}\s*h\b|\b\d{1,2}\s*(?:am|pm)\b)",
    r"(?i)\b(a\s+cada|todo\s+dia|diariamente|daqui\s+a|em\s+\d+\s*min)\b",
    // Slash commands are always ours
    r"^/",
];

fn compiled() -> &'static RegexSet {
    static CELL: OnceLock<RegexSet> = OnceLock::new();
    CELL.get_or_init(|| RegexSet::new(IN_SCOPE_PATTERNS).expect("static patterns"))
}

/// True when the message clearly concerns reminders/lists/agenda — no LLM
/// judgement needed.
pub fn is_clearly_in_scope(text: &str) -> bool {
    let t = text.trim();
    !t.is_empty() && compiled().is_match(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organizer_requests_are_in_scope() {
        assert!(is_clearly_in_scope("me lembra de pagar a conta amanhã"));
        assert!(is_clearly_in_scope("adiciona arroz na lista"));
        assert!(is_clearly_in_scope("/help"));
        assert!(is_clearly_in_scope("reunião segunda às 10h"));
    }

    #[test]
    fn chitchat_is_not() {
        assert!(!is_clearly_in_scope("qual a capital da França?"));
        assert!(!is_clearly_in_scope("conta uma piada"));
    }
}
