//! Resolution of pending confirmations: the destructive and two-step
//! actions that wait for a `1/2/sim/não` reply.

use serde_json::json;

use mordomo_core::types::InboundMessage;
use mordomo_locale::templates;
use mordomo_sessions::Session;
use mordomo_tools::ToolRegistry;

use crate::confirm::{parse_answer, Answer, PendingAction};
use crate::{Router, RouterOutcome};

/// `None` when the reply is not an answer at all — the confirmation stays
/// installed and the message continues down the chain.
pub async fn resolve(
    router: &Router,
    msg: &InboundMessage,
    session: &mut Session,
    registry: &ToolRegistry,
) -> Option<RouterOutcome> {
    let answer = parse_answer(&msg.content);
    if answer == Answer::Other {
        return None;
    }
    let pending = router.confirmations.take(&msg.channel, &msg.chat_id)?;
    let lang = router.lang_for(msg);

    let outcome = match pending.action {
        PendingAction::Exportar => match answer {
            Answer::Yes => {
                let user = router.user_for(msg)?;
                match router.store.export_user_data(user.id) {
                    Ok(data) if !data.trim().is_empty() => RouterOutcome::Handled(vec![
                        "Aqui estão os teus dados:".to_string(),
                        data,
                    ]),
                    Ok(_) => RouterOutcome::reply("Ainda não há dados para exportar."),
                    Err(_) => RouterOutcome::reply(templates::degraded_service(lang)),
                }
            }
            _ => RouterOutcome::reply(templates::cancelled(lang)),
        },

        PendingAction::DeletarTudo | PendingAction::NukeAll => match answer {
            Answer::Yes => {
                let user = router.user_for(msg)?;
                if router.store.delete_all_user_data(user.id).is_err() {
                    return Some(RouterOutcome::reply(templates::degraded_service(lang)));
                }
                for job in router.cron.jobs_for_chat(&msg.chat_id) {
                    let _ = router.cron.remove_job(&job.id);
                }
                if pending.action == PendingAction::NukeAll {
                    let _ = router.store.reset_profile(user.id);
                    session.metadata.clear();
                }
                RouterOutcome::reply("Tudo apagado. Recomeçamos do zero quando quiseres. 🧹")
            }
            _ => RouterOutcome::reply(templates::cancelled(lang)),
        },

        PendingAction::CompletionConfirmation { job_id } => match answer {
            Answer::Yes => {
                let _ = router.cron.mark_complete(&job_id);
                RouterOutcome::reply(templates::reminder_done_confirmation(lang))
            }
            _ => RouterOutcome::reply("Ok, fica pendente. Eu continuo a lembrar. ⏳"),
        },

        PendingAction::DatePastNextYear { message, in_seconds } => match answer {
            Answer::Yes => {
                let result = registry
                    .execute("cron", json!({ "action": "add", "message": message, "in_seconds": in_seconds }))
                    .await;
                if result.is_error {
                    RouterOutcome::reply(result.content)
                } else {
                    RouterOutcome::Handled(vec![
                        templates::reminder_date_past_scheduled(lang).to_string(),
                        result.content,
                    ])
                }
            }
            _ => RouterOutcome::reply(templates::cancelled(lang)),
        },

        PendingAction::ListOrEventsChoice { items } => match answer {
            Answer::Yes => {
                // 1 = list
                for item in &items {
                    let _ = registry
                        .execute("list", json!({"action": "add", "list_name": "tarefas", "item_text": item}))
                        .await;
                }
                RouterOutcome::reply(format!(
                    "Guardei {} item(ns) na lista «tarefas». ✨",
                    items.len()
                ))
            }
            Answer::No => {
                // 2 = reminders — they still need times
                RouterOutcome::reply(
                    "Ok, lembretes. Diz-me o horário de cada um (ex.: «pagar conta amanhã às 9h»).",
                )
            }
            Answer::Third => {
                for item in &items {
                    let _ = registry
                        .execute("list", json!({"action": "add", "list_name": "tarefas", "item_text": item}))
                        .await;
                }
                RouterOutcome::reply(
                    "Guardei na lista «tarefas». Para os lembretes, diz-me o horário de cada um.",
                )
            }
            Answer::Other => unreachable!(),
        },

        PendingAction::RescheduleOrCancel { job_id } => match answer {
            Answer::Yes => {
                // 1 = change the time: the next message with a time completes it
                session.set_meta_str("pending_reschedule_job_id", &job_id);
                RouterOutcome::reply("Diz o novo horário (ex.: «às 18h» ou «amanhã às 9h»).")
            }
            _ => {
                let _ = router.cron.remove_job_and_deadline_followups(&job_id);
                RouterOutcome::reply(templates::cancelled(lang))
            }
        },

        PendingAction::CreateShoppingListFromRecipe { items } => match answer {
            Answer::Yes => {
                for item in &items {
                    let _ = registry
                        .execute("list", json!({"action": "add", "list_name": "compras", "item_text": item}))
                        .await;
                }
                RouterOutcome::reply(format!(
                    "Adicionei {} ingrediente(s) à lista de compras. 🛒",
                    items.len()
                ))
            }
            _ => RouterOutcome::reply(templates::cancelled(lang)),
        },
    };
    Some(outcome)
}
