//! Onboarding: timezone first (non-blocking), then preferred name.
//!
//! `fresh → intro_sent → pending_timezone → pending_time_confirm? →
//! pending_preferred_name → done`. A user may ignore the questions and use
//! the system anyway; a soft nudge rides along on one outgoing reply until
//! the timezone is known.

use chrono::{TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use tracing::debug;

use mordomo_core::types::InboundMessage;
use mordomo_llm::{ChatMessage, ChatRequest, LlmProvider, Profile};
use mordomo_locale::templates;
use mordomo_locale::tz::{city_to_iana, iana_from_offset_minutes, is_valid_iana};
use mordomo_parse::onboarding_time::parse_local_time;
use mordomo_sessions::Session;

use crate::confirm::{parse_answer, Answer};
use crate::{Router, RouterOutcome};

pub const META_STAGE: &str = "onboarding_stage";
pub const META_INTRO_SENT: &str = "onboarding_intro_sent";
pub const META_PROPOSED_TZ: &str = "proposed_tz_iana";
pub const META_NUDGE_COUNT: &str = "onboarding_nudge_count";
pub const META_NUDGE_DONE: &str = "nudge_append_done";

const STAGE_TIMEZONE: &str = "pending_timezone";
const STAGE_TIME_CONFIRM: &str = "pending_time_confirm";
const STAGE_NAME: &str = "pending_preferred_name";

/// Run the onboarding machine for this turn. `None` means onboarding has
/// nothing to do and the message continues down the pipeline.
pub async fn handle(
    router: &Router,
    msg: &InboundMessage,
    session: &mut Session,
) -> Option<RouterOutcome> {
    let lang = router.lang_for(msg);
    let stage = session.meta_str(META_STAGE).map(str::to_string);

    // Preferred-name question outlives the timezone stages.
    if stage.as_deref() == Some(STAGE_NAME) {
        return Some(handle_name_answer(router, msg, session));
    }

    let user = router.user_for(msg)?;
    if user.tz_iana.is_some() {
        session.clear_meta(META_STAGE);
        return None;
    }

    if !session.meta_bool(META_INTRO_SENT) {
        session.set_meta_bool(META_INTRO_SENT, true);
        session.set_meta_str(META_STAGE, STAGE_TIMEZONE);
        return Some(RouterOutcome::Handled(vec![
            templates::onboarding_intro(lang).to_string(),
            templates::onboarding_ask_city_or_time(lang).to_string(),
        ]));
    }

    match stage.as_deref() {
        Some(STAGE_TIME_CONFIRM) => Some(handle_time_confirm(router, msg, session)),
        Some(STAGE_TIMEZONE) => Some(handle_timezone_answer(router, msg, session).await),
        _ => {
            // Intro already sent in a previous run but no stage recorded
            // (e.g. session rolled over): go back to asking.
            session.set_meta_str(META_STAGE, STAGE_TIMEZONE);
            Some(RouterOutcome::reply(templates::onboarding_ask_city_or_time(lang)))
        }
    }
}

async fn handle_timezone_answer(
    router: &Router,
    msg: &InboundMessage,
    session: &mut Session,
) -> RouterOutcome {
    let lang = router.lang_for(msg);
    let text = msg.content.trim();

    // "pular"/"skip": stay without a timezone, nudge later.
    let normalized = mordomo_parse::normalize::normalize(text);
    if normalized == "pular" || normalized == "skip" || normalized == "saltar" {
        session.clear_meta(META_STAGE);
        return RouterOutcome::reply(templates::nudge_tz_when_missing(lang));
    }

    // City first: local table, then the parser LLM.
    let city_tz = match city_to_iana(text) {
        Some(tz) => Some((text.to_string(), tz.to_string())),
        None => extract_city_tz_via_llm(router, text).await,
    };
    if let Some((city, tz)) = city_tz {
        if let Some(user) = router.user_for(msg) {
            let _ = router.store.set_timezone(user.id, &tz, Some(&city));
        }
        session.set_meta_str(META_STAGE, STAGE_NAME);
        return RouterOutcome::Handled(vec![
            templates::onboarding_complete(lang).to_string(),
            templates::preferred_name_question(lang).to_string(),
        ]);
    }

    // Local time → fixed-offset zone proposal.
    if let Some((hour, minute)) = parse_local_time(text) {
        let now_utc = Utc
            .timestamp_millis_opt(router.clock.now_ms())
            .single()
            .unwrap_or_else(Utc::now);
        let stated_minutes = hour as i32 * 60 + minute as i32;
        let utc_minutes = now_utc.hour() as i32 * 60 + now_utc.minute() as i32;
        let mut offset = stated_minutes - utc_minutes;
        // Shortest way around the clock
        if offset > 12 * 60 {
            offset -= 24 * 60;
        } else if offset < -12 * 60 {
            offset += 24 * 60;
        }
        let tz_name = iana_from_offset_minutes(offset);
        session.set_meta_str(META_PROPOSED_TZ, &tz_name);
        session.set_meta_str(META_STAGE, STAGE_TIME_CONFIRM);
        let tz: Tz = tz_name.parse().unwrap_or(chrono_tz::UTC);
        let local = now_utc.with_timezone(&tz);
        return RouterOutcome::reply(templates::onboarding_time_confirm(
            lang,
            &local.format("%d/%m").to_string(),
            &format!("{:02}:{:02}", hour, minute),
        ));
    }

    // Neither city nor time: nudge, then fall back to asking just the time.
    let nudges = session.meta_u64(META_NUDGE_COUNT).unwrap_or(0) + 1;
    session.set_meta_u64(META_NUDGE_COUNT, nudges);
    if nudges >= 2 {
        RouterOutcome::reply(templates::onboarding_ask_time_fallback(lang))
    } else {
        RouterOutcome::reply(templates::onboarding_invalid_response(lang))
    }
}

fn handle_time_confirm(
    router: &Router,
    msg: &InboundMessage,
    session: &mut Session,
) -> RouterOutcome {
    let lang = router.lang_for(msg);
    let proposed = session.meta_str(META_PROPOSED_TZ).unwrap_or("UTC").to_string();
    match parse_answer(&msg.content) {
        Answer::No => {
            session.clear_meta(META_PROPOSED_TZ);
            session.set_meta_str(META_STAGE, STAGE_TIMEZONE);
            RouterOutcome::reply(templates::onboarding_ask_time_fallback(lang))
        }
        answer => {
            // Yes — or anything else, which counts as silence and accepts.
            if let Some(user) = router.user_for(msg) {
                let _ = router.store.set_timezone(user.id, &proposed, None);
            }
            session.clear_meta(META_PROPOSED_TZ);
            session.set_meta_str(META_STAGE, STAGE_NAME);
            let mut replies = vec![
                templates::onboarding_tz_set_from_time(lang).to_string(),
                templates::preferred_name_question(lang).to_string(),
            ];
            if answer == Answer::Other {
                // The message wasn't an answer at all; still accept, but say so.
                replies.insert(0, templates::onboarding_complete(lang).to_string());
            }
            RouterOutcome::Handled(replies)
        }
    }
}

fn handle_name_answer(
    router: &Router,
    msg: &InboundMessage,
    session: &mut Session,
) -> RouterOutcome {
    let lang = router.lang_for(msg);
    session.clear_meta(META_STAGE);

    let candidate = msg.content.trim();
    let name = if looks_like_name(candidate) {
        candidate.to_string()
    } else if let Some(push) = msg.push_name.as_deref().filter(|p| looks_like_name(p)) {
        push.to_string()
    } else {
        "utilizador".to_string()
    };

    if let Some(user) = router.user_for(msg) {
        let _ = router.store.set_preferred_name(user.id, &name);
        let session_key = format!("{}:{}", msg.channel, msg.chat_id);
        let profile = format!(
            "Nome preferido: {}\nIdioma: {}\nFuso: {}",
            name,
            user.lang,
            user.tz_iana.as_deref().unwrap_or("—"),
        );
        if let Err(e) = router.memory.upsert_section(&session_key, "## Perfil", &profile) {
            debug!("onboarding memory sync failed: {e}");
        }
        let doc = format!("# {}\n\n{}\n", name, profile);
        if let Err(e) =
            mordomo_memory::write_user_profile(&router.workspace_users_dir, &msg.chat_id, &doc)
        {
            debug!("user profile write failed: {e}");
        }
    }
    RouterOutcome::reply(templates::preferred_name_confirmation(lang, &name))
}

fn looks_like_name(text: &str) -> bool {
    let t = text.trim();
    if t.is_empty() || t.chars().count() > 40 {
        return false;
    }
    let words: Vec<&str> = t.split_whitespace().collect();
    (1..=3).contains(&words.len())
        && t.chars().all(|c| c.is_alphabetic() || c.is_whitespace() || c == '-' || c == '\'')
}

/// Parser-LLM path for the city question: canonical city name first, then
/// its IANA zone, both validated locally. Either failure returns `None`.
async fn extract_city_tz_via_llm(router: &Router, text: &str) -> Option<(String, String)> {
    let parser = router.parser.as_ref()?;
    let prompt = format!(
        "The user was asked which city they are in. They replied: \"{}\". \
         Extract the city name (one city only, standard English name, e.g. Lisbon, São Paulo). \
         If they mention a country/region without a city, use the capital. \
         Reply with ONLY the city name, nothing else.",
        text.chars().take(200).collect::<String>()
    );
    let req = ChatRequest::new(Profile::Parser, vec![ChatMessage::user(prompt)]);
    let city = match parser.chat(&req).await {
        Ok(out) => out.content.lines().next().unwrap_or("").trim().to_string(),
        Err(e) => {
            debug!("city extraction failed: {e}");
            return None;
        }
    };
    if city.is_empty() || city.chars().count() > 64 {
        return None;
    }
    if let Some(tz) = city_to_iana(&city) {
        return Some((city, tz.to_string()));
    }
    let tz = city_to_tz_via_llm(router, &city).await?;
    Some((city, tz))
}

/// Ask the parser LLM for the IANA zone of a city, validating the reply.
pub async fn city_to_tz_via_llm(router: &Router, city: &str) -> Option<String> {
    let parser = router.parser.as_ref()?;
    let prompt = format!(
        "What is the IANA timezone for the city \"{city}\"? \
         Reply with ONLY the IANA timezone identifier, e.g. Europe/Lisbon or America/Sao_Paulo."
    );
    let req = ChatRequest::new(Profile::Parser, vec![ChatMessage::user(prompt)]);
    match parser.chat(&req).await {
        Ok(out) => {
            let tz = out.content.lines().next().unwrap_or("").trim().to_string();
            is_valid_iana(&tz).then_some(tz)
        }
        Err(e) => {
            debug!("timezone lookup failed: {e}");
            None
        }
    }
}
