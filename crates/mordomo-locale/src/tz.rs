//! Timezone inference: Brazilian DDD, country prefix, city name, and
//! local-time offset. The DDD table maps each area code to the IANA zone of
//! the state capital and is preserved as-is for compatibility with existing
//! user records.

use chrono::TimeZone;
use chrono_tz::Tz;

use crate::lang::{digits_from_chat_id, Lang};

/// Brazil: DDD (two digits after 55) → IANA zone of the state capital.
pub const BR_DDD_TO_IANA: &[(u8, &str)] = &[
    (68, "America/Rio_Branco"),   // Acre - Rio Branco
    (82, "America/Maceio"),       // Alagoas - Maceió
    (96, "America/Belem"),        // Amapá - Macapá (Belém zone)
    (92, "America/Manaus"),       // Amazonas - Manaus
    (71, "America/Bahia"),        // Bahia - Salvador
    (85, "America/Fortaleza"),    // Ceará - Fortaleza
    (61, "America/Sao_Paulo"),    // DF - Brasília
    (27, "America/Sao_Paulo"),    // ES - Vitória
    (62, "America/Sao_Paulo"),    // Goiás - Goiânia
    (98, "America/Sao_Paulo"),    // Maranhão - São Luís
    (65, "America/Cuiaba"),       // Mato Grosso - Cuiabá
    (67, "America/Campo_Grande"), // Mato Grosso do Sul - Campo Grande
    (31, "America/Sao_Paulo"),    // MG - Belo Horizonte
    (91, "America/Belem"),        // Pará - Belém
    (83, "America/Sao_Paulo"),    // Paraíba - João Pessoa
    (41, "America/Sao_Paulo"),    // Paraná - Curitiba
    (81, "America/Recife"),       // Pernambuco - Recife
    (86, "America/Sao_Paulo"),    // Piauí - Teresina
    (21, "America/Sao_Paulo"),    // RJ - Rio de Janeiro
    (84, "America/Sao_Paulo"),    // RN - Natal
    (51, "America/Sao_Paulo"),    // RS - Porto Alegre
    (69, "America/Porto_Velho"),  // Rondônia - Porto Velho
    (95, "America/Boa_Vista"),    // Roraima - Boa Vista
    (48, "America/Sao_Paulo"),    // SC - Florianópolis
    (11, "America/Sao_Paulo"),    // SP - São Paulo
    (79, "America/Sao_Paulo"),    // Sergipe - Aracaju
    (63, "America/Sao_Paulo"),    // Tocantins - Palmas
];

/// Country prefix → default IANA zone (Brazil handled separately via DDD).
const DEFAULT_TZ_BY_PREFIX: &[(&str, &str)] = &[
    ("351", "Europe/Lisbon"),
    ("34", "Europe/Madrid"),
    ("52", "America/Mexico_City"),
    ("54", "America/Argentina/Buenos_Aires"),
    ("57", "America/Bogota"),
    ("58", "America/Caracas"),
    ("51", "America/Lima"),
    ("56", "America/Santiago"),
    ("593", "America/Guayaquil"),
    ("598", "America/Montevideo"),
    ("591", "America/La_Paz"),
    ("503", "America/El_Salvador"),
    ("502", "America/Guatemala"),
    ("505", "America/Managua"),
    ("506", "America/Costa_Rica"),
    ("507", "America/Panama"),
    ("53", "America/Havana"),
    ("44", "Europe/London"),
    ("33", "Europe/Paris"),
    ("49", "Europe/Berlin"),
    ("39", "Europe/Rome"),
    ("1", "America/New_York"),
];

/// Default zone per language, used when the chat id carries no digits.
pub fn default_tz_by_lang(lang: Lang) -> &'static str {
    match lang {
        Lang::PtBr => "America/Sao_Paulo",
        Lang::PtPt => "Europe/Lisbon",
        Lang::Es => "Europe/Madrid",
        Lang::En => "America/New_York",
    }
}

/// Common city names (lowercase, with and without diacritics) → IANA zone.
const CITY_TO_IANA: &[(&str, &str)] = &[
    ("lisboa", "Europe/Lisbon"),
    ("lisbon", "Europe/Lisbon"),
    ("porto", "Europe/Lisbon"),
    ("portugal", "Europe/Lisbon"),
    ("são paulo", "America/Sao_Paulo"),
    ("sao paulo", "America/Sao_Paulo"),
    ("brasília", "America/Sao_Paulo"),
    ("brasilia", "America/Sao_Paulo"),
    ("rio", "America/Sao_Paulo"),
    ("rio de janeiro", "America/Sao_Paulo"),
    ("salvador", "America/Bahia"),
    ("bahia", "America/Bahia"),
    ("maceió", "America/Maceio"),
    ("maceio", "America/Maceio"),
    ("manaus", "America/Manaus"),
    ("belém", "America/Belem"),
    ("belem", "America/Belem"),
    ("fortaleza", "America/Fortaleza"),
    ("recife", "America/Recife"),
    ("goiânia", "America/Sao_Paulo"),
    ("goiania", "America/Sao_Paulo"),
    ("cuiabá", "America/Cuiaba"),
    ("cuiaba", "America/Cuiaba"),
    ("campo grande", "America/Campo_Grande"),
    ("rio branco", "America/Rio_Branco"),
    ("porto velho", "America/Porto_Velho"),
    ("boa vista", "America/Boa_Vista"),
    ("curitiba", "America/Sao_Paulo"),
    ("belo horizonte", "America/Sao_Paulo"),
    ("porto alegre", "America/Sao_Paulo"),
    ("florianópolis", "America/Sao_Paulo"),
    ("florianopolis", "America/Sao_Paulo"),
    ("natal", "America/Sao_Paulo"),
    ("madrid", "Europe/Madrid"),
    ("barcelona", "Europe/Madrid"),
    ("buenos aires", "America/Argentina/Buenos_Aires"),
    ("cidade do méxico", "America/Mexico_City"),
    ("mexico city", "America/Mexico_City"),
    ("bogotá", "America/Bogota"),
    ("bogota", "America/Bogota"),
    ("lima", "America/Lima"),
    ("santiago", "America/Santiago"),
    ("montevideo", "America/Montevideo"),
    ("london", "Europe/London"),
    ("londres", "Europe/London"),
    ("paris", "Europe/Paris"),
    ("berlin", "Europe/Berlin"),
    ("roma", "Europe/Rome"),
    ("rome", "Europe/Rome"),
    ("new york", "America/New_York"),
    ("nova york", "America/New_York"),
    ("nova iorque", "America/New_York"),
    ("tokyo", "Asia/Tokyo"),
    ("tóquio", "Asia/Tokyo"),
    ("toquio", "Asia/Tokyo"),
];

/// Infer the default timezone from the phone digits: Brazilian numbers go
/// through the DDD table, other countries through the prefix table; no
/// digits at all → UTC (caller may fall back to the language default).
pub fn phone_to_default_timezone(chat_id: &str) -> String {
    let digits = digits_from_chat_id(chat_id);
    if digits.is_empty() {
        return "UTC".to_string();
    }
    if let Some(rest) = digits.strip_prefix("55") {
        if rest.len() >= 2 {
            if let Ok(ddd) = rest[..2].parse::<u8>() {
                if let Some((_, tz)) = BR_DDD_TO_IANA.iter().find(|(d, _)| *d == ddd) {
                    return (*tz).to_string();
                }
            }
        }
        return "America/Sao_Paulo".to_string();
    }
    let mut prefixes: Vec<&(&str, &str)> = DEFAULT_TZ_BY_PREFIX.iter().collect();
    prefixes.sort_by_key(|(p, _)| std::cmp::Reverse(p.len()));
    for (prefix, tz) in prefixes {
        if digits.starts_with(prefix) {
            return (*tz).to_string();
        }
    }
    "UTC".to_string()
}

pub fn is_valid_iana(tz_name: &str) -> bool {
    tz_name.parse::<Tz>().is_ok()
}

pub fn city_to_iana(city: &str) -> Option<&'static str> {
    let key = city.trim().to_lowercase().replace(['-', '_'], " ");
    CITY_TO_IANA
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, tz)| *tz)
}

/// Map a UTC offset in minutes to a fixed `Etc/GMT±N` zone.
///
/// POSIX sign convention is inverted: a place 3 hours *behind* UTC is
/// `Etc/GMT+3`. Offsets are rounded to the nearest hour and clamped to ±12.
pub fn iana_from_offset_minutes(offset_minutes: i32) -> String {
    let hours = ((offset_minutes as f64) / 60.0).round() as i32;
    let clamped = hours.clamp(-12, 12);
    if clamped == 0 {
        "Etc/GMT".to_string()
    } else if clamped > 0 {
        format!("Etc/GMT-{clamped}")
    } else {
        format!("Etc/GMT+{}", -clamped)
    }
}

/// Render a UTC timestamp (seconds) as `HH:MM` in the user's zone.
pub fn format_utc_timestamp_for_user(utc_secs: i64, tz_name: &str) -> String {
    let tz: Tz = tz_name.parse().unwrap_or(chrono_tz::UTC);
    match tz.timestamp_opt(utc_secs, 0).single() {
        Some(dt) => dt.format("%H:%M").to_string(),
        None => "??:??".to_string(),
    }
}

/// Render a UTC timestamp (seconds) as `DD/MM HH:MM` in the user's zone.
pub fn format_utc_date_time_for_user(utc_secs: i64, tz_name: &str) -> String {
    let tz: Tz = tz_name.parse().unwrap_or(chrono_tz::UTC);
    match tz.timestamp_opt(utc_secs, 0).single() {
        Some(dt) => dt.format("%d/%m %H:%M").to_string(),
        None => "??/?? ??:??".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brazilian_ddd_resolves_capital_zone() {
        assert_eq!(phone_to_default_timezone("5511999999999"), "America/Sao_Paulo");
        assert_eq!(phone_to_default_timezone("5592888887777"), "America/Manaus");
        assert_eq!(phone_to_default_timezone("5568999990000"), "America/Rio_Branco");
        // Unknown DDD falls back to São Paulo
        assert_eq!(phone_to_default_timezone("5599111112222"), "America/Sao_Paulo");
    }

    #[test]
    fn country_prefix_resolution() {
        assert_eq!(phone_to_default_timezone("351912345678"), "Europe/Lisbon");
        assert_eq!(phone_to_default_timezone("593987654321"), "America/Guayaquil");
        assert_eq!(phone_to_default_timezone("14155551234"), "America/New_York");
        assert_eq!(phone_to_default_timezone("abc"), "UTC");
    }

    #[test]
    fn offset_to_etc_gmt_inverts_sign() {
        // 3 hours behind UTC → Etc/GMT+3
        assert_eq!(iana_from_offset_minutes(-180), "Etc/GMT+3");
        // 2 hours ahead → Etc/GMT-2
        assert_eq!(iana_from_offset_minutes(120), "Etc/GMT-2");
        assert_eq!(iana_from_offset_minutes(0), "Etc/GMT");
        // Clamped to ±12
        assert_eq!(iana_from_offset_minutes(15 * 60), "Etc/GMT-12");
    }

    #[test]
    fn etc_gmt_zones_are_valid_iana() {
        for minutes in [-720, -180, 0, 120, 720] {
            assert!(is_valid_iana(&iana_from_offset_minutes(minutes)));
        }
    }

    #[test]
    fn city_lookup_is_diacritic_and_case_tolerant() {
        assert_eq!(city_to_iana("Lisboa"), Some("Europe/Lisbon"));
        assert_eq!(city_to_iana("são paulo"), Some("America/Sao_Paulo"));
        assert_eq!(city_to_iana("Atlantis"), None);
    }
}
