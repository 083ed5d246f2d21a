use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The four languages the service produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Lang {
    #[serde(rename = "pt-PT")]
    PtPt,
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "es")]
    Es,
    #[serde(rename = "en")]
    En,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::PtPt => "pt-PT",
            Lang::PtBr => "pt-BR",
            Lang::Es => "es",
            Lang::En => "en",
        }
    }

    pub const ALL: [Lang; 4] = [Lang::PtPt, Lang::PtBr, Lang::Es, Lang::En];
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "pt-pt" | "ptpt" => Ok(Lang::PtPt),
            "pt-br" | "ptbr" | "pt" => Ok(Lang::PtBr),
            "es" => Ok(Lang::Es),
            "en" => Ok(Lang::En),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Digits of the chat id before any `@` (WhatsApp JIDs are
/// `<digits>@s.whatsapp.net`).
pub fn digits_from_chat_id(chat_id: &str) -> String {
    chat_id
        .split('@')
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect()
}

// Country prefixes → default language. Brazil and Portugal are exact;
// the Hispanic set covers Spain plus Spanish-speaking Latin America.
const PREFIX_PT_BR: &[&str] = &["55"];
const PREFIX_PT_PT: &[&str] = &["351"];
const PREFIX_ES: &[&str] = &[
    "34", "52", "54", "57", "58", "51", "56", "593", "595", "598", "591", "503", "502", "505",
    "506", "507", "509", "53",
];

/// Infer the default language from a phone-bearing chat id.
/// BR → pt-BR, PT → pt-PT, Hispanic prefixes → es, everything else → en.
pub fn phone_to_default_language(chat_id: &str) -> Lang {
    let digits = digits_from_chat_id(chat_id);
    if digits.is_empty() {
        return Lang::En;
    }
    let mut prefixes: Vec<(&str, Lang)> = Vec::new();
    prefixes.extend(PREFIX_PT_BR.iter().map(|p| (*p, Lang::PtBr)));
    prefixes.extend(PREFIX_PT_PT.iter().map(|p| (*p, Lang::PtPt)));
    prefixes.extend(PREFIX_ES.iter().map(|p| (*p, Lang::Es)));
    // Longest prefix first so 593 wins over 59.
    prefixes.sort_by_key(|(p, _)| std::cmp::Reverse(p.len()));
    for (prefix, lang) in prefixes {
        if digits.starts_with(prefix) {
            return lang;
        }
    }
    Lang::En
}

struct SwitchPattern {
    re: Regex,
    /// `None` means "generic Portuguese" — resolved by phone prefix.
    lang: Option<Lang>,
}

fn switch_patterns() -> &'static Vec<SwitchPattern> {
    static PATTERNS: OnceLock<Vec<SwitchPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let spec: &[(&str, Option<Lang>)] = &[
            // European Portuguese — most specific first
            (r"(?i)\b(?:fala?r?\s+em\s+)?portugu[eê]s\s+(?:de\s+)?portugal\b", Some(Lang::PtPt)),
            (r"(?i)\b(?:speak\s+)?(?:in\s+)?portuguese\s+from\s+portugal\b", Some(Lang::PtPt)),
            (r"(?i)\bpt[- ]?pt\b", Some(Lang::PtPt)),
            (r"(?i)\bportugu[eê]s\s+europeu\b", Some(Lang::PtPt)),
            // Brazilian Portuguese
            (r"(?i)\b(?:fala?r?\s+em\s+)?portugu[eê]s\s+(?:do\s+)?brasil\b", Some(Lang::PtBr)),
            (r"(?i)\b(?:speak\s+)?(?:in\s+)?brazilian\s+portuguese\b", Some(Lang::PtBr)),
            (r"(?i)\bpt[- ]?br\b", Some(Lang::PtBr)),
            // "stop speaking Spanish" → Portuguese inferred from the number
            (r"(?i)\b(?:n[aã]o\s+)?fala?e?\s+em\s+espanhol\b", None),
            (r"(?i)\bpara\s+de\s+fala?r?\s+em\s+espanhol\b", None),
            // Generic Portuguese — inferred from the number
            (r"(?i)\b(?:fala?e?\s+(?:comigo\s+)?(?:em\s+)?|em\s+)portugu\w+s\b", None),
            // Spanish
            (r"(?i)\b(?:speak\s+)?(?:in\s+)?spanish\b", Some(Lang::Es)),
            (r"(?i)\b(?:habla?r?\s+en\s+)?(?:español|espanol)\b", Some(Lang::Es)),
            (r"(?i)\b(?:fala?r?\s+em\s+)?espanhol\b", Some(Lang::Es)),
            // English
            (r"(?i)\b(?:fala?r?\s+em\s+)?ingl[eêé]s\b", Some(Lang::En)),
            (r"(?i)\b(?:habla?r?\s+en\s+)?ingl[eé]s\b", Some(Lang::En)),
            (r"(?i)\b(?:speak\s+)?(?:in\s+)?english\b", Some(Lang::En)),
        ];
        spec.iter()
            .map(|(p, l)| SwitchPattern {
                re: Regex::new(p).expect("static pattern"),
                lang: *l,
            })
            .collect()
    })
}

/// Detect an explicit request to switch the response language.
///
/// Generic "fala em português" resolves to pt-PT or pt-BR by the phone
/// prefix (`351` → pt-PT, everything else → pt-BR).
pub fn parse_language_switch_request(message: &str, phone_for_locale: Option<&str>) -> Option<Lang> {
    let t = message.trim();
    if t.is_empty() || t.len() > 120 {
        return None;
    }
    for pattern in switch_patterns() {
        if pattern.re.is_match(t) {
            return Some(match pattern.lang {
                Some(lang) => lang,
                None => {
                    let phone = phone_for_locale.unwrap_or("");
                    match phone_to_default_language(phone) {
                        Lang::PtPt => Lang::PtPt,
                        _ => Lang::PtBr,
                    }
                }
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_inference() {
        assert_eq!(phone_to_default_language("5511999999999@s.whatsapp.net"), Lang::PtBr);
        assert_eq!(phone_to_default_language("351912345678"), Lang::PtPt);
        assert_eq!(phone_to_default_language("5215512345678"), Lang::Es);
        assert_eq!(phone_to_default_language("447700900000"), Lang::En);
        assert_eq!(phone_to_default_language(""), Lang::En);
    }

    #[test]
    fn longest_prefix_wins() {
        // 593 (Ecuador, es) must not be shadowed by shorter prefixes
        assert_eq!(phone_to_default_language("593987654321"), Lang::Es);
    }

    #[test]
    fn switch_request_explicit() {
        assert_eq!(
            parse_language_switch_request("fala português de portugal", None),
            Some(Lang::PtPt)
        );
        assert_eq!(parse_language_switch_request("speak in english please", None), Some(Lang::En));
        assert_eq!(parse_language_switch_request("habla en español", None), Some(Lang::Es));
    }

    #[test]
    fn switch_request_generic_portuguese_uses_phone() {
        assert_eq!(
            parse_language_switch_request("fala em português", Some("351912345678")),
            Some(Lang::PtPt)
        );
        assert_eq!(
            parse_language_switch_request("fala em português", Some("5511999999999")),
            Some(Lang::PtBr)
        );
    }

    #[test]
    fn unrelated_text_is_not_a_switch() {
        assert_eq!(parse_language_switch_request("me lembra de pagar a conta", None), None);
    }
}
