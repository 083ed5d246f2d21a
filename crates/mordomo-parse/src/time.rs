//! Time/date grammar for reminder requests, evaluated against the user's
//! local "now". Outputs are relative (`in_seconds`), recurring
//! (`every_seconds` / `cron_expr`), plus the cleaned reminder message.

use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;

use crate::normalize::normalize;

/// Cron day-of-week numbering: 0=Sunday … 6=Saturday.
pub const WEEKDAYS: &[(&str, u8)] = &[
    ("domingo", 0),
    ("segunda-feira", 1),
    ("segunda", 1),
    ("terca-feira", 2),
    ("terca", 2),
    ("quarta-feira", 3),
    ("quarta", 3),
    ("quinta-feira", 4),
    ("quinta", 4),
    ("sexta-feira", 5),
    ("sexta", 5),
    ("sabado", 6),
];

pub const MONTHS: &[(&str, u32)] = &[
    ("janeiro", 1),
    ("fevereiro", 2),
    ("marco", 3),
    ("abril", 4),
    ("maio", 5),
    ("junho", 6),
    ("julho", 7),
    ("agosto", 8),
    ("setembro", 9),
    ("outubro", 10),
    ("novembro", 11),
    ("dezembro", 12),
];

const MAX_ONE_SHOT_SECS: i64 = 86_400 * 365;
const MAX_RELATIVE_SECS: i64 = 86_400 * 30;

/// Parsed timing of a reminder request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSpec {
    pub in_seconds: Option<i64>,
    pub every_seconds: Option<i64>,
    pub cron_expr: Option<String>,
    /// `a partir de <date>` on recurring requests.
    pub start_date: Option<NaiveDate>,
    /// The requested absolute date already passed; `in_seconds` targets the
    /// same date next year, pending user confirmation.
    pub date_was_past: bool,
    /// Remaining text once the time expression is removed.
    pub message: String,
}

impl TimeSpec {
    pub fn has_timing(&self) -> bool {
        self.in_seconds.is_some() || self.every_seconds.is_some() || self.cron_expr.is_some()
    }
}

fn re(pattern: &'static str, cell: &'static OnceLock<Regex>) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern"))
}

macro_rules! static_re {
    ($name:ident, $pattern:literal) => {
        fn $name() -> &'static Regex {
            static CELL: OnceLock<Regex> = OnceLock::new();
            re($pattern, &CELL)
        }
    };
}

static_re!(re_relative, r"(?:daqui\s+a|em)\s+(\d+)\s*(min|minuto|hora|dia)s?\b");
static_re!(re_every, r"a\s+cada\s+(\d+)\s*(minuto|min|hora|dia)s?\b");
static_re!(re_tomorrow, r"amanha\s+(?:as\s*)?(\d{1,2})(?::(\d{2})|h(\d{2})?)?\b");
static_re!(re_today, r"hoje\s+(?:as\s*)?(\d{1,2})(?::(\d{2})|h(\d{2})?)?\b");
static_re!(re_bare_time, r"\bas\s+(\d{1,2})(?::(\d{2})|h(\d{2})?)?\b");
static_re!(re_ampm, r"\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b");
static_re!(re_daily, r"(?:todo\s+dia|todos\s+os\s+dias|diariamente)\s+(?:as\s*)?(\d{1,2})\s*h?\b");
static_re!(re_monthly, r"mensalmente\s+(?:dia\s+)?(\d{1,2})\s+?(?:as\s*)?(\d{1,2})\s*h?\b");
static_re!(
    re_absolute,
    r"(?:dia\s+)?(\d{1,2})\s*(?:de\s+|/)\s*(\d{1,2}|janeiro|fevereiro|marco|abril|maio|junho|julho|agosto|setembro|outubro|novembro|dezembro)(?:\s*(?:de\s+|/)\s*(\d{4}))?(?:\s+(?:as\s*)?(\d{1,2})\s*h?(?:(\d{2}))?)?"
);
static_re!(
    re_start_date,
    r"a\s+partir\s+de\s+(?:dia\s+)?(\d{1,2})[oa]?\s*(?:de\s+|/)?\s*(\d{1,2}|janeiro|fevereiro|marco|abril|maio|junho|julho|agosto|setembro|outubro|novembro|dezembro)(?:\s*(?:de\s+|/)\s*(\d{4}))?"
);

fn month_number(s: &str) -> Option<u32> {
    if let Ok(n) = s.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    MONTHS.iter().find(|(name, _)| *name == s).map(|(_, n)| *n)
}

/// Strip the matched range and leading connectors, leaving the reminder text.
fn clean_message(original: &str, matched: Option<(usize, usize)>) -> String {
    let mut text = match matched {
        Some((start, end)) => format!("{} {}", &original[..start], &original[end..]),
        None => original.to_string(),
    };
    text = text.trim().trim_start_matches('/').trim().to_string();
    for prefix in [
        "me lembra de ", "me lembre de ", "lembra de ", "lembra-me de ", "lembrar de ",
        "lembrete de ", "lembrete ", "de ", "para ", "sobre ",
    ] {
        let lower = text.to_lowercase();
        if lower.starts_with(prefix) && text.len() > prefix.len() {
            text = text[prefix.len()..].trim().to_string();
            break;
        }
    }
    let text = text.trim().trim_matches(',').trim();
    if text.is_empty() {
        "Lembrete".to_string()
    } else {
        text.to_string()
    }
}

fn unit_to_secs(n: i64, unit: &str) -> i64 {
    if unit.starts_with("hora") {
        n * 3600
    } else if unit.starts_with("dia") {
        n * 86_400
    } else {
        n * 60
    }
}

/// `a partir de 1 de julho` → start date for a recurring schedule.
pub fn extract_start_date(text: &str, now: NaiveDateTime) -> Option<NaiveDate> {
    let t = normalize(text);
    let m = re_start_date().captures(&t)?;
    let day: u32 = m.get(1)?.as_str().parse().ok()?;
    let month = month_number(m.get(2)?.as_str())?;
    let year: i32 = m
        .get(3)
        .and_then(|y| y.as_str().parse().ok())
        .unwrap_or(now.year());
    NaiveDate::from_ymd_opt(year, month, day.min(28))
}

/// Parse the timing of a reminder request. `now` is the user's local time;
/// every relative output is computed against it.
pub fn parse_reminder_time(text: &str, now: NaiveDateTime) -> TimeSpec {
    let t = normalize(text);

    // "em 30 min" / "daqui a 2 horas"
    if let Some(m) = re_relative().captures(&t) {
        let n: i64 = m[1].parse().unwrap_or(0);
        let secs = unit_to_secs(n, &m[2]);
        if secs > 0 && secs <= MAX_RELATIVE_SECS {
            let whole = m.get(0).unwrap();
            return TimeSpec {
                in_seconds: Some(secs),
                message: clean_message(&t, Some((whole.start(), whole.end()))),
                ..Default::default()
            };
        }
    }

    // "a cada 2 horas"
    if let Some(m) = re_every().captures(&t) {
        let n: i64 = m[1].parse().unwrap_or(0);
        let secs = unit_to_secs(n, &m[2]);
        if (1800..=MAX_RELATIVE_SECS).contains(&secs) {
            let whole = m.get(0).unwrap();
            return TimeSpec {
                every_seconds: Some(secs),
                message: clean_message(&t, Some((whole.start(), whole.end()))),
                ..Default::default()
            };
        }
    }

    // "amanhã às 10h"
    if let Some(m) = re_tomorrow().captures(&t) {
        let hour: u32 = m[1].parse::<u32>().unwrap_or(9).min(23);
        let minute: u32 = m
            .get(2)
            .or(m.get(3))
            .and_then(|v| v.as_str().parse().ok())
            .unwrap_or(0);
        let target = (now.date() + Duration::days(1))
            .and_hms_opt(hour, minute.min(59), 0)
            .unwrap_or(now);
        let delta = (target - now).num_seconds();
        if delta > 0 {
            let whole = m.get(0).unwrap();
            return TimeSpec {
                in_seconds: Some(delta),
                message: clean_message(&t, Some((whole.start(), whole.end()))),
                ..Default::default()
            };
        }
    }

    // "todo dia às 8h" / "diariamente às 8h" (with optional "a partir de")
    if let Some(m) = re_daily().captures(&t) {
        let hour: u32 = m[1].parse::<u32>().unwrap_or(9).min(23);
        let start_date = extract_start_date(&t, now);
        let stripped = re_start_date()
            .replace(&re_daily().replace(&t, " "), " ")
            .to_string();
        return TimeSpec {
            cron_expr: Some(format!("0 {hour} * * *")),
            start_date,
            message: clean_message(&stripped, None),
            ..Default::default()
        };
    }

    // "toda (semana) segunda às 10h"
    for (day_name, dow) in WEEKDAYS {
        let pat = format!(r"toda\s+(?:semana\s+)?{}\s+(?:as\s*)?(\d{{1,2}})\s*h?\b", day_name);
        if let Ok(rex) = Regex::new(&pat) {
            if let Some(m) = rex.captures(&t) {
                let hour: u32 = m[1].parse::<u32>().unwrap_or(9).min(23);
                let start_date = extract_start_date(&t, now);
                let stripped = re_start_date().replace(&rex.replace(&t, " "), " ").to_string();
                return TimeSpec {
                    cron_expr: Some(format!("0 {hour} * * {dow}")),
                    start_date,
                    message: clean_message(&stripped, None),
                    ..Default::default()
                };
            }
        }
    }

    // "mensalmente dia 5 às 9h"
    if let Some(m) = re_monthly().captures(&t) {
        let day: u32 = m[1].parse().unwrap_or(1);
        let hour: u32 = m[2].parse::<u32>().unwrap_or(9).min(23);
        if (1..=28).contains(&day) {
            let whole = m.get(0).unwrap();
            return TimeSpec {
                cron_expr: Some(format!("0 {hour} {day} * *")),
                message: clean_message(&t, Some((whole.start(), whole.end()))),
                ..Default::default()
            };
        }
    }

    // Absolute dates: "dia 5 de fevereiro às 9h", "25/12", "5/2/2026 às 10h"
    if let Some(m) = re_absolute().captures(&t) {
        let day: u32 = m[1].parse().unwrap_or(0);
        if let Some(month) = month_number(&m[2]) {
            if (1..=31).contains(&day) {
                let year: i32 = m
                    .get(3)
                    .and_then(|y| y.as_str().parse().ok())
                    .unwrap_or(now.year());
                let hour: u32 = m
                    .get(4)
                    .and_then(|h| h.as_str().parse().ok())
                    .unwrap_or(9);
                let minute: u32 = m
                    .get(5)
                    .and_then(|v| v.as_str().parse().ok())
                    .unwrap_or(0);
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day.min(28)) {
                    let mut target = date.and_hms_opt(hour.min(23), minute.min(59), 0).unwrap();
                    let mut past = false;
                    if target <= now {
                        past = true;
                        if let Some(next_year) =
                            NaiveDate::from_ymd_opt(year + 1, month, day.min(28))
                        {
                            target = next_year.and_hms_opt(hour.min(23), minute.min(59), 0).unwrap();
                        }
                    }
                    let delta = (target - now).num_seconds();
                    if delta > 0 && delta <= MAX_ONE_SHOT_SECS + 86_400 {
                        let whole = m.get(0).unwrap();
                        return TimeSpec {
                            in_seconds: Some(delta),
                            date_was_past: past,
                            message: clean_message(&t, Some((whole.start(), whole.end()))),
                            ..Default::default()
                        };
                    }
                }
            }
        }
    }

    // "hoje às 15h" and bare "às 15h" / "3pm": today, or tomorrow when past.
    for rex in [re_today(), re_bare_time()] {
        if let Some(m) = rex.captures(&t) {
            let hour: u32 = m[1].parse::<u32>().unwrap_or(25);
            if hour <= 23 {
                let minute: u32 = m
                    .get(2)
                    .or(m.get(3))
                    .and_then(|v| v.as_str().parse().ok())
                    .unwrap_or(0);
                let mut target = now.date().and_hms_opt(hour, minute.min(59), 0).unwrap();
                if target <= now {
                    target += Duration::days(1);
                }
                let whole = m.get(0).unwrap();
                return TimeSpec {
                    in_seconds: Some((target - now).num_seconds()),
                    message: clean_message(&t, Some((whole.start(), whole.end()))),
                    ..Default::default()
                };
            }
        }
    }

    // "3pm" / "10:30 am"
    if let Some(m) = re_ampm().captures(&t) {
        let mut hour: u32 = m[1].parse::<u32>().unwrap_or(0);
        let minute: u32 = m.get(2).and_then(|v| v.as_str().parse().ok()).unwrap_or(0);
        let pm = &m[3] == "pm";
        if (1..=12).contains(&hour) {
            if pm && hour != 12 {
                hour += 12;
            } else if !pm && hour == 12 {
                hour = 0;
            }
            let mut target = now.date().and_hms_opt(hour, minute.min(59), 0).unwrap();
            if target <= now {
                target += Duration::days(1);
            }
            let whole = m.get(0).unwrap();
            return TimeSpec {
                in_seconds: Some((target - now).num_seconds()),
                message: clean_message(&t, Some((whole.start(), whole.end()))),
                ..Default::default()
            };
        }
    }

    TimeSpec { message: clean_message(&t, None), ..Default::default() }
}

// --- helpers for the vague-time flow ---------------------------------------

static_re!(re_event_keyword, r"\b(consulta|reuniao|medico|dentista|prova|exame|entrevista|voo|viagem|almoco|jantar|festa|aniversario|apresentacao)\b");
static_re!(re_date_word, r"\b(hoje|amanha|depois de amanha|segunda|terca|quarta|quinta|sexta|sabado|domingo|dia\s+\d{1,2})\b");
static_re!(re_time_word, r"(\b\d{1,2}:\d{2}\b|\b\d{1,2}\s*h\b|\bas\s+\d{1,2}\b|\b\d{1,2}\s*(?:am|pm)\b|\bmeio[- ]dia\b)");

pub fn has_event_keyword(text: &str) -> bool {
    re_event_keyword().is_match(&normalize(text))
}

pub fn has_date_word(text: &str) -> bool {
    re_date_word().is_match(&normalize(text))
}

pub fn has_time_word(text: &str) -> bool {
    re_time_word().is_match(&normalize(text))
}

/// The event keyword is one of the "appointment" family, which gets the
/// friendlier "A que horas é a tua consulta?" phrasing.
pub fn is_consulta_like(text: &str) -> bool {
    let t = normalize(text);
    ["consulta", "medico", "dentista", "exame"].iter().any(|k| t.contains(k))
}

/// "lembrete amanhã 10h" with no actual event text.
pub fn is_vague_reminder_message(message: &str) -> bool {
    let t = normalize(message);
    if t.is_empty() {
        return true;
    }
    matches!(
        t.as_str(),
        "lembrete" | "lembrar" | "lembra" | "alerta" | "aviso" | "reminder" | "me lembra" | "me avisa"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        // 2025-02-10 14:00 local (a Monday)
        NaiveDate::from_ymd_opt(2025, 2, 10)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    #[test]
    fn relative_minutes() {
        let spec = parse_reminder_time("me lembra de tomar remédio em 30 min", now());
        assert_eq!(spec.in_seconds, Some(30 * 60));
        assert_eq!(spec.message, "tomar remedio");
    }

    #[test]
    fn daqui_a_hours() {
        let spec = parse_reminder_time("daqui a 2 horas ligar para a mãe", now());
        assert_eq!(spec.in_seconds, Some(2 * 3600));
        assert!(spec.message.contains("ligar"));
    }

    #[test]
    fn every_interval() {
        let spec = parse_reminder_time("beber água a cada 2 horas", now());
        assert_eq!(spec.every_seconds, Some(7200));
        assert_eq!(spec.message, "beber agua");
    }

    #[test]
    fn every_below_floor_is_not_parsed_as_interval() {
        // 10 min falls through: the guardrail message comes from the safety
        // layer, not the parser.
        let spec = parse_reminder_time("beber água a cada 10 min", now());
        assert_eq!(spec.every_seconds, None);
    }

    #[test]
    fn every_thirty_minutes_is_parsed() {
        let spec = parse_reminder_time("beber água a cada 30 min", now());
        assert_eq!(spec.every_seconds, Some(1800));
    }

    #[test]
    fn tomorrow_at_hour() {
        let spec = parse_reminder_time("consulta amanhã às 10h", now());
        // 14:00 → tomorrow 10:00 = 20h
        assert_eq!(spec.in_seconds, Some(20 * 3600));
    }

    #[test]
    fn daily_cron() {
        let spec = parse_reminder_time("tomar vitamina todo dia às 8h", now());
        assert_eq!(spec.cron_expr.as_deref(), Some("0 8 * * *"));
        assert!(spec.message.contains("vitamina"));
    }

    #[test]
    fn weekly_cron() {
        let spec = parse_reminder_time("toda segunda às 10h revisão semanal", now());
        assert_eq!(spec.cron_expr.as_deref(), Some("0 10 * * 1"));
    }

    #[test]
    fn monthly_cron() {
        let spec = parse_reminder_time("pagar aluguel mensalmente dia 5 às 9h", now());
        assert_eq!(spec.cron_expr.as_deref(), Some("0 9 5 * *"));
    }

    #[test]
    fn absolute_date_future() {
        let spec = parse_reminder_time("pagar a conta dia 5 de março às 9h", now());
        assert!(!spec.date_was_past);
        let expected = NaiveDate::from_ymd_opt(2025, 3, 5)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(spec.in_seconds, Some((expected - now()).num_seconds()));
    }

    #[test]
    fn absolute_date_past_targets_next_year() {
        let spec = parse_reminder_time("lembra de pagar a conta dia 5 de fevereiro às 9h", now());
        assert!(spec.date_was_past);
        let expected = NaiveDate::from_ymd_opt(2026, 2, 5)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(spec.in_seconds, Some((expected - now()).num_seconds()));
        assert!(spec.message.contains("pagar a conta"));
    }

    #[test]
    fn start_date_on_recurring() {
        let spec = parse_reminder_time("tomar vitamina todo dia às 8h a partir de 1 de julho", now());
        assert_eq!(spec.cron_expr.as_deref(), Some("0 8 * * *"));
        assert_eq!(spec.start_date, NaiveDate::from_ymd_opt(2025, 7, 1));
    }

    #[test]
    fn pm_time() {
        let spec = parse_reminder_time("reunião 3pm", now());
        // 14:00 → 15:00 today
        assert_eq!(spec.in_seconds, Some(3600));
    }

    #[test]
    fn bare_time_past_rolls_to_tomorrow() {
        let spec = parse_reminder_time("tomar remédio às 9h", now());
        // 14:00 → tomorrow 09:00 = 19h
        assert_eq!(spec.in_seconds, Some(19 * 3600));
    }

    #[test]
    fn round_trip_wall_clock() {
        // Parsing then re-projecting yields the same local wall-clock instant.
        let spec = parse_reminder_time("consulta amanhã às 10h", now());
        let target = now() + Duration::seconds(spec.in_seconds.unwrap());
        assert_eq!(target.hour(), 10);
        assert_eq!(target.minute(), 0);
        assert_eq!(target.date(), now().date() + Duration::days(1));
    }

    #[test]
    fn no_timing_returns_message_only() {
        let spec = parse_reminder_time("tenho consulta", now());
        assert!(!spec.has_timing());
        assert!(spec.message.contains("consulta"));
    }

    #[test]
    fn vague_flow_helpers() {
        assert!(has_event_keyword("tenho consulta amanhã"));
        assert!(has_date_word("tenho consulta amanhã"));
        assert!(!has_time_word("tenho consulta amanhã"));
        assert!(has_time_word("às 10h"));
        assert!(is_consulta_like("tenho consulta amanhã"));
        assert!(is_vague_reminder_message("lembrete"));
        assert!(!is_vague_reminder_message("pagar a conta"));
    }
}
