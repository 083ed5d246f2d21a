//! Next-run computation, window clamping, and cron-expression validation.

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::types::Schedule;

/// Only digits, `* , - /` and whitespace; five fields.
pub fn validate_cron_expr(expr: &str) -> bool {
    let s = expr.trim();
    if s.is_empty() || s.len() > 64 {
        return false;
    }
    if !s.chars().all(|c| c.is_ascii_digit() || "*,-/ \t".contains(c)) {
        return false;
    }
    if s.split_whitespace().count() != 5 {
        return false;
    }
    // Must actually parse once the seconds field is prepended.
    parse_cron(s).is_some()
}

/// The `cron` crate wants a seconds field and numbers weekdays 1-7 with
/// Sunday first; stored expressions are classic five-field with 0=Sunday.
/// Digits in the day-of-week field are mapped to names at the boundary so
/// both conventions meet.
fn parse_cron(expr: &str) -> Option<cron::Schedule> {
    let fields: Vec<&str> = expr.trim().split_whitespace().collect();
    if fields.len() != 5 {
        return None;
    }
    let dow = normalize_dow(fields[4]);
    let full = format!("0 {} {} {} {} {}", fields[0], fields[1], fields[2], fields[3], dow);
    cron::Schedule::from_str(&full).ok()
}

fn normalize_dow(field: &str) -> String {
    const NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];
    // Step syntax keeps its digits; plain days/lists/ranges get names.
    if field.contains('/') {
        return field.to_string();
    }
    field
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) if d <= 7 => NAMES[(d % 7) as usize].to_string(),
            _ => c.to_string(),
        })
        .collect()
}

fn tz_of(name: Option<&str>) -> Tz {
    name.and_then(|n| n.parse().ok()).unwrap_or(chrono_tz::UTC)
}

/// Compute the next fire time strictly after `now_ms`, or `None` when the
/// schedule is exhausted (past one-shot, or a window that excludes every
/// future instant). The result always falls inside `[not_before, not_after]`
/// when those are set.
pub fn compute_next_run(schedule: &Schedule, now_ms: i64, last_run_ms: Option<i64>) -> Option<i64> {
    match schedule {
        Schedule::At { at_ms } => {
            if *at_ms > now_ms {
                Some(*at_ms)
            } else {
                None
            }
        }

        Schedule::Every { every_ms, not_before_ms, not_after_ms } => {
            if *every_ms <= 0 {
                return None;
            }
            let base = match last_run_ms {
                Some(last) => (last + every_ms).max(now_ms),
                None => now_ms + every_ms,
            };
            clamp_into_window(base, *not_before_ms, *not_after_ms, Some(*every_ms))
        }

        Schedule::Cron { expr, tz, not_before_ms, not_after_ms } => {
            let parsed = parse_cron(expr)?;
            let zone = tz_of(tz.as_deref());
            // Search from the later of now and the window start.
            let search_from_ms = match not_before_ms {
                Some(nb) => now_ms.max(*nb),
                None => now_ms,
            };
            let from = zone.timestamp_millis_opt(search_from_ms).single()?;
            let next: DateTime<Tz> = parsed.after(&from).next()?;
            let next_ms = next.with_timezone(&Utc).timestamp_millis();
            match not_after_ms {
                Some(na) if next_ms > *na => None,
                _ => Some(next_ms),
            }
        }
    }
}

fn clamp_into_window(
    candidate: i64,
    not_before: Option<i64>,
    not_after: Option<i64>,
    every_ms: Option<i64>,
) -> Option<i64> {
    let mut t = candidate;
    if let Some(nb) = not_before {
        if t < nb {
            // First fire of a windowed interval lands at the window start
            // plus one interval, not at the raw start instant.
            t = match every_ms {
                Some(step) if step > 0 => nb + step,
                _ => nb,
            };
        }
    }
    match not_after {
        Some(na) if t > na => None,
        _ => Some(t),
    }
}

/// Smallest gap between consecutive fires of a cron expression, probing the
/// next handful of occurrences. `None` when the expression cannot be parsed.
pub fn cron_min_interval_secs(expr: &str, tz: Option<&str>, now_ms: i64) -> Option<i64> {
    let parsed = parse_cron(expr)?;
    let zone = tz_of(tz);
    let from = zone.timestamp_millis_opt(now_ms).single()?;
    let times: Vec<i64> = parsed
        .after(&from)
        .take(6)
        .map(|dt| dt.with_timezone(&Utc).timestamp())
        .collect();
    if times.len() < 2 {
        return None;
    }
    times.windows(2).map(|w| w[1] - w[0]).min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const HOUR_MS: i64 = 3_600_000;

    #[test]
    fn at_fires_only_in_the_future() {
        let s = Schedule::At { at_ms: 10_000 };
        assert_eq!(compute_next_run(&s, 5_000, None), Some(10_000));
        assert_eq!(compute_next_run(&s, 10_000, None), None);
        assert_eq!(compute_next_run(&s, 20_000, None), None);
    }

    #[test]
    fn every_respects_last_run_and_now() {
        let s = Schedule::Every { every_ms: HOUR_MS, not_before_ms: None, not_after_ms: None };
        // Never ran: one interval from now
        assert_eq!(compute_next_run(&s, 0, None), Some(HOUR_MS));
        // Ran recently: last + interval
        assert_eq!(compute_next_run(&s, HOUR_MS, Some(HOUR_MS)), Some(2 * HOUR_MS));
        // Process was down past the slot: fires now, not in the past
        assert_eq!(compute_next_run(&s, 10 * HOUR_MS, Some(HOUR_MS)), Some(10 * HOUR_MS));
    }

    #[test]
    fn every_window_clamps_both_ends() {
        let s = Schedule::Every {
            every_ms: HOUR_MS,
            not_before_ms: Some(5 * HOUR_MS),
            not_after_ms: Some(8 * HOUR_MS),
        };
        // Before the window: first fire lands inside it
        let first = compute_next_run(&s, 0, None).unwrap();
        assert!(first >= 5 * HOUR_MS && first <= 8 * HOUR_MS);
        // Past the window: no future instants remain
        assert_eq!(compute_next_run(&s, 9 * HOUR_MS, Some(8 * HOUR_MS)), None);
    }

    #[test]
    fn window_invariant_for_all_fires() {
        let s = Schedule::Every {
            every_ms: HOUR_MS,
            not_before_ms: Some(2 * HOUR_MS),
            not_after_ms: Some(20 * HOUR_MS),
        };
        let mut now = 0;
        let mut last = None;
        while let Some(t) = compute_next_run(&s, now, last) {
            assert!(t >= 2 * HOUR_MS, "fire below not_before: {t}");
            assert!(t <= 20 * HOUR_MS, "fire above not_after: {t}");
            last = Some(t);
            now = t;
        }
    }

    #[test]
    fn cron_evaluates_in_timezone() {
        // Daily at 09:00 in São Paulo (UTC-3) = 12:00 UTC
        let s = Schedule::Cron {
            expr: "0 9 * * *".to_string(),
            tz: Some("America/Sao_Paulo".to_string()),
            not_before_ms: None,
            not_after_ms: None,
        };
        // 2025-02-10 00:00 UTC
        let now_ms = chrono::Utc
            .with_ymd_and_hms(2025, 2, 10, 0, 0, 0)
            .unwrap()
            .timestamp_millis();
        let next = compute_next_run(&s, now_ms, None).unwrap();
        let expected = chrono::Utc
            .with_ymd_and_hms(2025, 2, 10, 12, 0, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(next, expected);
    }

    #[test]
    fn cron_weekday_uses_sunday_zero() {
        // 0=Sunday, 1=Monday in the stored convention.
        let s = Schedule::Cron {
            expr: "0 10 * * 1".to_string(),
            tz: None,
            not_before_ms: None,
            not_after_ms: None,
        };
        // 2025-02-10 is a Monday; from Sunday 09:00 the next fire is Monday 10:00.
        let from = chrono::Utc
            .with_ymd_and_hms(2025, 2, 9, 9, 0, 0)
            .unwrap()
            .timestamp_millis();
        let next = compute_next_run(&s, from, None).unwrap();
        let next_dt = chrono::Utc.timestamp_millis_opt(next).unwrap();
        assert_eq!(next_dt.weekday(), chrono::Weekday::Mon);
        assert_eq!(
            next,
            chrono::Utc
                .with_ymd_and_hms(2025, 2, 10, 10, 0, 0)
                .unwrap()
                .timestamp_millis()
        );

        // Two-day lists map too: Monday and Wednesday.
        let s = Schedule::Cron {
            expr: "0 19 * * 1,3".to_string(),
            tz: None,
            not_before_ms: None,
            not_after_ms: None,
        };
        let next = compute_next_run(&s, from, None).unwrap();
        let next_dt = chrono::Utc.timestamp_millis_opt(next).unwrap();
        assert_eq!(next_dt.weekday(), chrono::Weekday::Mon);
    }

    #[test]
    fn cron_not_after_disables() {
        let now_ms = chrono::Utc
            .with_ymd_and_hms(2025, 2, 10, 0, 0, 0)
            .unwrap()
            .timestamp_millis();
        let s = Schedule::Cron {
            expr: "0 9 * * *".to_string(),
            tz: None,
            not_before_ms: None,
            not_after_ms: Some(now_ms + 3_600_000), // window ends 01:00 UTC
        };
        assert_eq!(compute_next_run(&s, now_ms, None), None);
    }

    #[test]
    fn validate_rejects_garbage() {
        assert!(validate_cron_expr("0 9 * * *"));
        assert!(validate_cron_expr("30 7 * * 1,3"));
        assert!(!validate_cron_expr("0 9 * *"));
        assert!(!validate_cron_expr("0 9 * * * *"));
        assert!(!validate_cron_expr("rm -rf / * * * *"));
        assert!(!validate_cron_expr(""));
    }

    #[test]
    fn min_interval_of_daily_cron_is_a_day() {
        let now_ms = chrono::Utc
            .with_ymd_and_hms(2025, 6, 1, 0, 0, 0)
            .unwrap()
            .timestamp_millis();
        let min = cron_min_interval_secs("0 9 * * *", None, now_ms).unwrap();
        assert_eq!(min, 86_400);
        // */10 minutes → 600s gaps
        let min = cron_min_interval_secs("*/10 * * * *", None, now_ms).unwrap();
        assert_eq!(min, 600);
    }
}
