//! Short "are you there?" vocatives. These get a one-line acknowledgement
//! instead of a full agent turn — unless the message actually carries an
//! event with date and time.

use std::sync::OnceLock;

use regex::Regex;

use crate::normalize::normalize;
use crate::time::{has_date_word, has_time_word};

const MAX_CALLING_LEN: usize = 40;

fn calling_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| {
        Regex::new(
            r"(?x)^(
                (ta|tas|esta|estas|estais|vc\s+ta|voce\s+ta)\s*(ai|aqui|on|online)
              | (are\s+you\s+there|you\s+there|anyone\s+there)
              | (alo|alou|hey|hello|oi|ola|opa|eai|e\s+ai|bom\s+dia|boa\s+tarde|boa\s+noite)
              | (assistente|organizador|organizadora|mordomo|bot|robo)
              | (me\s+ajuda|help)
            )[\s!?.]*$",
        )
        .expect("static pattern")
    })
}

/// True when the message is a short vocative with no real content.
pub fn is_calling_phrase(text: &str) -> bool {
    let t = normalize(text);
    if t.is_empty() || t.len() > MAX_CALLING_LEN {
        return false;
    }
    // A full event request with date + time is never a vocative, even if short.
    if has_date_word(&t) && has_time_word(&t) {
        return false;
    }
    calling_re().is_match(&t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocatives_match() {
        assert!(is_calling_phrase("tá aí?"));
        assert!(is_calling_phrase("Oi"));
        assert!(is_calling_phrase("assistente?"));
        assert!(is_calling_phrase("are you there?"));
        assert!(is_calling_phrase("bom dia!"));
    }

    #[test]
    fn real_requests_do_not_match() {
        assert!(!is_calling_phrase("me lembra de pagar a conta"));
        assert!(!is_calling_phrase("oi, marca consulta amanhã às 10h"));
        assert!(!is_calling_phrase(""));
    }
}
