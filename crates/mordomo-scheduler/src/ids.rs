//! Friendly short ids: 2–4 uppercase letters derived from the reminder
//! topic, so `👍` replies and `/lembrete` listings stay human-readable.

use rand::Rng;

const STOPWORDS: &[&str] = &[
    "o", "a", "os", "as", "um", "uma", "de", "do", "da", "dos", "das", "em", "no", "na", "para",
    "pra", "com", "ao", "à", "e", "que", "meu", "minha", "the", "to", "of", "for", "el", "la",
    "los", "las", "ir", "tomar", "fazer", "buscar", "pagar", "comprar", "marcar",
];

fn strip_diacritics(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// The most significant word of the message: first non-stopword, falling
/// back to the first word.
fn topic_word(message: &str) -> String {
    let words: Vec<String> = message
        .to_lowercase()
        .chars()
        .map(strip_diacritics)
        .collect::<String>()
        .split_whitespace()
        .map(|w| w.chars().filter(|c| c.is_ascii_alphabetic()).collect::<String>())
        .filter(|w| !w.is_empty())
        .collect();
    words
        .iter()
        .find(|w| !STOPWORDS.contains(&w.as_str()) && w.len() >= 2)
        .or_else(|| words.first())
        .cloned()
        .unwrap_or_else(|| "lx".to_string())
}

/// Derive a short id, growing 2 → 3 → 4 letters on collision and finally
/// appending a random letter.
pub fn derive_short_id<F>(message: &str, suggested_prefix: Option<&str>, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    let base = match suggested_prefix {
        Some(p) if p.chars().all(|c| c.is_ascii_alphabetic()) && p.len() >= 2 => p.to_lowercase(),
        _ => topic_word(message),
    };
    for len in 2..=4 {
        let candidate: String = base.chars().take(len).collect::<String>().to_uppercase();
        if candidate.len() >= 2 && !taken(&candidate) {
            return candidate;
        }
    }
    // All prefixes taken: two random letters after the 2-letter head gives
    // 676 more slots.
    let head: String = base.chars().take(2).collect::<String>().to_uppercase();
    let mut rng = rand::thread_rng();
    loop {
        let a = (b'A' + rng.gen_range(0..26)) as char;
        let b = (b'A' + rng.gen_range(0..26)) as char;
        let candidate = format!("{head}{a}{b}");
        if !taken(&candidate) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn remedio_derives_re() {
        let id = derive_short_id("tomar remédio", None, |_| false);
        assert_eq!(id, "RE");
    }

    #[test]
    fn stopwords_are_skipped() {
        let id = derive_short_id("ir à farmácia", None, |_| false);
        assert_eq!(id, "FA");
    }

    #[test]
    fn collisions_grow_the_prefix() {
        let taken: HashSet<&str> = ["RE"].into_iter().collect();
        let id = derive_short_id("tomar remédio", None, |c| taken.contains(c));
        assert_eq!(id, "REM");
    }

    #[test]
    fn suggested_prefix_wins() {
        let id = derive_short_id("whatever", Some("AL"), |_| false);
        assert_eq!(id, "AL");
    }

    #[test]
    fn exhausted_prefixes_get_random_suffix() {
        let taken: HashSet<&str> = ["RE", "REM", "REME"].into_iter().collect();
        let id = derive_short_id("tomar remédio", None, |c| taken.contains(c));
        assert_eq!(id.len(), 4);
        assert!(id.starts_with("RE"));
        assert!(id.chars().all(|c| c.is_ascii_uppercase()));
    }
}
