//! Parse "what time is it there?" answers during onboarding:
//! `14:30`, `14h30`, `2 da tarde`, `3pm`, bare `15`.

use std::sync::OnceLock;

use regex::Regex;

use crate::normalize::normalize;

fn re(pattern: &'static str, cell: &'static OnceLock<Regex>) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern"))
}

pub fn parse_local_time(text: &str) -> Option<(u32, u32)> {
    let t = normalize(text);
    if t.is_empty() {
        return None;
    }

    // 24h with minutes: 14:30, 14.30, 14h30, 14h 30
    static FULL: OnceLock<Regex> = OnceLock::new();
    if let Some(m) = re(r"\b(\d{1,2})[h:.\s]+(\d{2})\b", &FULL).captures(&t) {
        let h: u32 = m[1].parse().ok()?;
        let min: u32 = m[2].parse().ok()?;
        if h <= 23 && min <= 59 {
            return Some((h, min));
        }
    }

    // 24h hour only: 14h, "14 horas", "14 horas e 30"
    static HOUR: OnceLock<Regex> = OnceLock::new();
    if let Some(m) = re(r"\b(\d{1,2})\s*h(?:oras?)?\s*(?:e\s*(\d{1,2}))?\b", &HOUR).captures(&t) {
        let h: u32 = m[1].parse().ok()?;
        let min: u32 = m.get(2).and_then(|v| v.as_str().parse().ok()).unwrap_or(0);
        if h <= 23 && min <= 59 {
            return Some((h, min));
        }
    }

    // 12h: "2 da tarde", "3pm", "10 da manhã"
    static PM: OnceLock<Regex> = OnceLock::new();
    static AM: OnceLock<Regex> = OnceLock::new();
    let pm_re = re(
        r"\b(\d{1,2})\s*(?:h(?:oras?)?)?\s*(?:da\s*(?:tarde|noite)|pm|p\.m\.|depois\s*do\s*meio[- ]?dia)",
        &PM,
    );
    let am_re = re(r"\b(\d{1,2})\s*(?:h(?:oras?)?)?\s*(?:da\s*manha|am|a\.m\.)", &AM);
    for (rex, add_12) in [(pm_re, true), (am_re, false)] {
        if let Some(m) = rex.captures(&t) {
            let mut h: u32 = m[1].parse().ok()?;
            if (1..=12).contains(&h) {
                if add_12 && h != 12 {
                    h += 12;
                } else if !add_12 && h == 12 {
                    h = 0;
                }
                return Some((h, 0));
            }
        }
    }

    // Bare 0-23 at the end of the message
    static BARE: OnceLock<Regex> = OnceLock::new();
    if let Some(m) = re(r"\b(0?[0-9]|1[0-9]|2[0-3])\s*(?:h|horas?)?\s*$", &BARE).captures(&t) {
        return Some((m[1].parse().ok()?, 0));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_four_hour_forms() {
        assert_eq!(parse_local_time("14:30"), Some((14, 30)));
        assert_eq!(parse_local_time("são 14h30"), Some((14, 30)));
        assert_eq!(parse_local_time("14h"), Some((14, 0)));
        assert_eq!(parse_local_time("aqui são 9 horas"), Some((9, 0)));
    }

    #[test]
    fn twelve_hour_forms() {
        assert_eq!(parse_local_time("3pm"), Some((15, 0)));
        assert_eq!(parse_local_time("2 da tarde"), Some((14, 0)));
        assert_eq!(parse_local_time("10 da manhã"), Some((10, 0)));
        assert_eq!(parse_local_time("12pm"), Some((12, 0)));
        assert_eq!(parse_local_time("12am"), Some((0, 0)));
    }

    #[test]
    fn bare_hour() {
        assert_eq!(parse_local_time("15"), Some((15, 0)));
        assert_eq!(parse_local_time("lisboa"), None);
        assert_eq!(parse_local_time(""), None);
    }
}
