//! Emoji reactions on reminder messages. The transport resolves the reacted
//! message back to its job id before the event reaches the core.

use mordomo_core::types::InboundMessage;
use mordomo_locale::templates;

use crate::{PendingAction, Router, RouterOutcome};

pub async fn handle(router: &Router, msg: &InboundMessage) -> RouterOutcome {
    let Some(reaction) = &msg.reaction else {
        return RouterOutcome::NotHandled;
    };
    let lang = router.lang_for(msg);
    let job_id = reaction.target_id.trim().to_uppercase();
    if job_id.is_empty() {
        return RouterOutcome::NotHandled;
    }

    match reaction.emoji.as_str() {
        "👍" => {
            let Some(job) = router.cron.get_job(&job_id) else {
                // Follow-up chains carry the root id; try completing anyway so
                // a 👍 on any link cancels the rest.
                let _ = router.cron.mark_complete(&job_id);
                return RouterOutcome::reply(templates::reminder_done_confirmation(lang));
            };
            if job.payload.to.as_deref() != Some(msg.chat_id.as_str()) {
                return RouterOutcome::NotHandled;
            }
            if job.payload.has_deadline {
                // Deadline-protected jobs want an explicit confirmation.
                router.confirmations.install(
                    &msg.channel,
                    &msg.chat_id,
                    PendingAction::CompletionConfirmation { job_id: job_id.clone() },
                );
                return RouterOutcome::reply(format!(
                    "«{}» está feito? (1=sim 2=não)",
                    job.name
                ));
            }
            let _ = router.cron.mark_complete(&job_id);
            RouterOutcome::reply(templates::reminder_done_confirmation(lang))
        }
        "⏰" => match router.cron.snooze(&job_id) {
            Ok(Some(count)) => RouterOutcome::reply(templates::snooze_confirmation(lang, count)),
            Ok(None) => RouterOutcome::reply(templates::snooze_limit_reached(lang)),
            Err(_) => RouterOutcome::NotHandled,
        },
        "👎" => {
            if router.cron.get_job(&job_id).is_none() {
                return RouterOutcome::NotHandled;
            }
            router.confirmations.install(
                &msg.channel,
                &msg.chat_id,
                PendingAction::RescheduleOrCancel { job_id },
            );
            RouterOutcome::reply(templates::reminder_thumbs_down_ask(lang))
        }
        _ => RouterOutcome::NotHandled,
    }
}
