//! Weekly-schedule detection: "academia segunda e quarta 19h" and friends.
//! Feeds the recurring-event confirmation flow.

use std::sync::OnceLock;

use regex::Regex;

use crate::normalize::normalize;
use crate::time::WEEKDAYS;

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyPattern {
    /// The activity text with the schedule words removed.
    pub event: String,
    /// Cron day numbers (0=Sunday … 6=Saturday), sorted, deduplicated.
    pub days: Vec<u8>,
    pub hour: u32,
    pub minute: u32,
}

impl WeeklyPattern {
    pub fn cron_expr(&self) -> String {
        let days: Vec<String> = self.days.iter().map(|d| d.to_string()).collect();
        format!("{} {} * * {}", self.minute, self.hour, days.join(","))
    }

    /// Human label like "segunda e quarta às 19h".
    pub fn schedule_label(&self) -> String {
        let names: Vec<&str> = self
            .days
            .iter()
            .filter_map(|d| {
                WEEKDAYS
                    .iter()
                    .find(|(name, n)| n == d && !name.contains('-'))
                    .map(|(name, _)| *name)
            })
            .collect();
        let joined = match names.len() {
            0 => String::new(),
            1 => names[0].to_string(),
            _ => format!("{} e {}", names[..names.len() - 1].join(", "), names[names.len() - 1]),
        };
        if self.minute == 0 {
            format!("{} às {}h", joined, self.hour)
        } else {
            format!("{} às {}:{:02}", joined, self.hour, self.minute)
        }
    }
}

fn time_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| {
        Regex::new(r"(?:as\s+)?(\d{1,2})(?::(\d{2})|h(\d{2})?)\b").expect("static pattern")
    })
}

/// Detect a weekly pattern: at least one weekday plus a time of day.
/// Two or more weekdays ("segunda e quarta") is the classic gym case.
pub fn detect_weekly_pattern(text: &str) -> Option<WeeklyPattern> {
    let t = normalize(text);

    let mut days: Vec<u8> = Vec::new();
    let mut schedule_spans: Vec<(usize, usize)> = Vec::new();
    for (name, dow) in WEEKDAYS {
        // Longest names first in the table, so "segunda-feira" wins over "segunda".
        for m in Regex::new(&format!(r"\b{name}\b")).ok()?.find_iter(&t) {
            if schedule_spans.iter().any(|(s, e)| m.start() >= *s && m.end() <= *e) {
                continue;
            }
            if !days.contains(dow) {
                days.push(*dow);
            }
            schedule_spans.push((m.start(), m.end()));
        }
    }
    if days.is_empty() {
        return None;
    }

    let time_m = time_re().captures(&t)?;
    let hour: u32 = time_m[1].parse().ok()?;
    if hour > 23 {
        return None;
    }
    let minute: u32 = time_m
        .get(2)
        .or(time_m.get(3))
        .and_then(|v| v.as_str().parse().ok())
        .unwrap_or(0);
    if minute > 59 {
        return None;
    }
    schedule_spans.push((time_m.get(0).unwrap().start(), time_m.get(0).unwrap().end()));

    // Remove schedule words and connectors to recover the event text.
    let mut event = String::new();
    let mut last = 0;
    schedule_spans.sort_unstable();
    for (start, end) in &schedule_spans {
        if *start > last {
            event.push_str(&t[last..*start]);
        }
        last = (*end).max(last);
    }
    if last < t.len() {
        event.push_str(&t[last..]);
    }
    let event = event
        .split_whitespace()
        .filter(|w| !matches!(*w, "e" | "na" | "no" | "a" | "as" | "toda" | "todas" | "todo"))
        .collect::<Vec<_>>()
        .join(" ");
    if event.is_empty() {
        return None;
    }

    days.sort_unstable();
    Some(WeeklyPattern { event, days, hour, minute })
}

/// Interpret "until when" answers for the recurring-event flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurringEnd {
    Indefinite,
    EndOfWeek,
    EndOfMonth,
    EndOfYear,
}

pub fn parse_recurring_end(text: &str) -> Option<RecurringEnd> {
    let t = normalize(text);
    if t.contains("indefinid") || t.contains("sempre") || t.contains("forever") {
        return Some(RecurringEnd::Indefinite);
    }
    if t.contains("fim da semana") || t.contains("fim de semana") || t.contains("end of week") {
        return Some(RecurringEnd::EndOfWeek);
    }
    if t.contains("fim do mes") || t.contains("fim de mes") || t.contains("end of month") {
        return Some(RecurringEnd::EndOfMonth);
    }
    if t.contains("fim do ano") || t.contains("fim de ano") || t.contains("end of year") {
        return Some(RecurringEnd::EndOfYear);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gym_two_days() {
        let p = detect_weekly_pattern("academia segunda e quarta 19h").unwrap();
        assert_eq!(p.days, vec![1, 3]);
        assert_eq!(p.hour, 19);
        assert_eq!(p.event, "academia");
        assert_eq!(p.cron_expr(), "0 19 * * 1,3");
    }

    #[test]
    fn single_day_with_minutes() {
        let p = detect_weekly_pattern("inglês terça às 18:30").unwrap();
        assert_eq!(p.days, vec![2]);
        assert_eq!(p.minute, 30);
        assert_eq!(p.cron_expr(), "30 18 * * 2");
    }

    #[test]
    fn label_reads_naturally() {
        let p = detect_weekly_pattern("academia segunda e quarta 19h").unwrap();
        assert_eq!(p.schedule_label(), "segunda e quarta às 19h");
    }

    #[test]
    fn no_time_no_pattern() {
        assert!(detect_weekly_pattern("academia segunda e quarta").is_none());
        assert!(detect_weekly_pattern("me lembra às 19h").is_none());
    }

    #[test]
    fn end_answers() {
        assert_eq!(parse_recurring_end("indefinido"), Some(RecurringEnd::Indefinite));
        assert_eq!(parse_recurring_end("até o fim do mês"), Some(RecurringEnd::EndOfMonth));
        assert_eq!(parse_recurring_end("fim da semana"), Some(RecurringEnd::EndOfWeek));
        assert_eq!(parse_recurring_end("sei lá"), None);
    }
}
