//! No-reply filter for trivial messages (ok, tá, bare emojis). Saves
//! tokens and avoids acknowledgement loops.
//!
//! "sim", "não", "1" and "2" are deliberately NOT here: they resolve
//! pending confirmations and must reach the router.

const TRIVIAL_REPLIES: &[&str] = &[
    "ok", "ta", "ah ok", "ah ta", "blz", "beleza", "tranquilo", "tudo bem", "tudo bom", "👍",
    "👌", "🙂", "😊", "👋", "✌", "🤝", "k", "kk", "kkk", "certo", "certinho", "valeu",
    "obrigado", "obrigada", "obg", "thx", "thanks", "ya", "yep", "yup", "nop", "nope",
];

const MAX_LEN_EMOJI_ONLY: usize = 4;

pub fn should_skip_reply(content: &str) -> bool {
    let t = content.trim();
    if t.is_empty() {
        return true;
    }
    let normalized: String = t
        .to_lowercase()
        .trim_end_matches(['.', '!', '?', '¿', '¡'])
        .trim()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            _ => c,
        })
        .collect();
    if TRIVIAL_REPLIES.contains(&normalized.as_str()) {
        return true;
    }
    // Very short and no letters/digits: bare emojis or punctuation
    t.chars().count() <= MAX_LEN_EMOJI_ONLY && !t.chars().any(|c| c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_messages_are_skipped() {
        assert!(should_skip_reply("ok"));
        assert!(should_skip_reply("tá."));
        assert!(should_skip_reply("👍"));
        assert!(should_skip_reply("valeu!"));
        assert!(should_skip_reply(""));
    }

    #[test]
    fn confirmations_are_never_skipped() {
        assert!(!should_skip_reply("sim"));
        assert!(!should_skip_reply("não"));
        assert!(!should_skip_reply("1"));
        assert!(!should_skip_reply("2"));
    }

    #[test]
    fn real_content_is_never_skipped() {
        assert!(!should_skip_reply("me lembra do remédio"));
    }
}
