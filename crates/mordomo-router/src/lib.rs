//! `mordomo-router` — deterministic dispatch for slash commands, natural
//! language aliases, confirmations, onboarding, reactions, and the
//! multi-turn flows (vague time, recurring events).
//!
//! Precedence per inbound message:
//! 1. pending-confirmation resolution (1/2/sim/não)
//! 2. reactive emoji (👍 done, ⏰ snooze, 👎 reschedule-or-cancel)
//! 3. flow continuation (a flow in progress consumes the turn)
//! 4. slash commands and their localised aliases
//! 5. natural-language intents (lists, reminders with parsed times)
//! 6. flow initiation (vague time, weekly recurring patterns)
//! 7. god-mode `#` commands
//!
//! Handlers return the primary reply plus optional extra messages; `None`
//! hands the turn to the assistant LLM.

pub mod admin;
pub mod commands;
pub mod confirm;
pub mod confirm_actions;
pub mod flows;
pub mod nl;
pub mod onboarding;
pub mod reactions;
pub mod views;

use std::str::FromStr;
use std::sync::Arc;

use mordomo_clock::Clock;
use mordomo_core::types::InboundMessage;
use mordomo_llm::LlmProvider;
use mordomo_locale::{phone_to_default_language, Lang};
use mordomo_memory::MemoryStore;
use mordomo_scheduler::CronService;
use mordomo_sessions::{Session, SessionManager};
use mordomo_store::{Store, User};
use mordomo_tools::ToolRegistry;

pub use admin::GodMode;
pub use confirm::{Answer, PendingAction, PendingConfirmations};

pub enum RouterOutcome {
    /// Head is the primary reply; the tail is sent as extra messages.
    Handled(Vec<String>),
    NotHandled,
}

impl RouterOutcome {
    pub fn reply(text: impl Into<String>) -> Self {
        RouterOutcome::Handled(vec![text.into()])
    }
}

pub struct Router {
    pub store: Arc<Store>,
    pub sessions: Arc<SessionManager>,
    pub memory: Arc<MemoryStore>,
    pub cron: Arc<CronService>,
    pub clock: Clock,
    pub parser: Option<Arc<dyn LlmProvider>>,
    pub confirmations: PendingConfirmations,
    pub god: GodMode,
    /// `workspace/users/` directory for the per-user profile markdown.
    pub workspace_users_dir: std::path::PathBuf,
}

impl Router {
    /// Resolve the response language: stored choice first, phone prefix
    /// otherwise.
    pub fn lang_for(&self, msg: &InboundMessage) -> Lang {
        if let Ok(Some(user)) = self.store.get_user(&msg.chat_id) {
            if let Ok(lang) = Lang::from_str(&user.lang) {
                return lang;
            }
        }
        let phone = msg.phone_for_locale.as_deref().unwrap_or(&msg.chat_id);
        phone_to_default_language(phone)
    }

    pub fn user_for(&self, msg: &InboundMessage) -> Option<User> {
        let lang = {
            let phone = msg.phone_for_locale.as_deref().unwrap_or(&msg.chat_id);
            phone_to_default_language(phone)
        };
        self.store.get_or_create_user(&msg.chat_id, lang.as_str()).ok()
    }

    /// Run the full dispatch chain for one inbound message.
    pub async fn handle(
        &self,
        msg: &InboundMessage,
        session: &mut Session,
        registry: &ToolRegistry,
    ) -> RouterOutcome {
        // 1. Reactions resolve against the referenced reminder.
        if msg.reaction.is_some() {
            return reactions::handle(self, msg).await;
        }

        // 2. Pending confirmations eat short yes/no replies.
        if self.confirmations.peek_active(&msg.channel, &msg.chat_id) {
            if let Some(outcome) = confirm_actions::resolve(self, msg, session, registry).await {
                return outcome;
            }
        }

        // 3. A flow in progress consumes the turn.
        if let Some(outcome) = flows::continue_flow(self, msg, session, registry).await {
            return outcome;
        }

        // 4. Slash commands (and localised aliases).
        if let Some(outcome) = commands::dispatch(self, msg, session, registry).await {
            return outcome;
        }

        // 5. Natural-language intents.
        if let Some(outcome) = nl::dispatch(self, msg, session, registry).await {
            return outcome;
        }

        // 6. New flows: vague time, weekly recurring patterns.
        if let Some(outcome) = flows::maybe_start_flow(self, msg, session) {
            return outcome;
        }

        // 7. God-mode diagnostics.
        if msg.content.trim_start().starts_with('#') {
            if let Some(outcome) = admin::handle(self, msg).await {
                return outcome;
            }
        }

        RouterOutcome::NotHandled
    }
}
