//! `mordomo-agent` — the agent loop: consumes inbound messages, runs the
//! safety filters and the deterministic router, and only then escalates to
//! the assistant LLM with its tools.

pub mod context;
pub mod smart;
pub mod stale;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use rand::seq::SliceRandom;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use mordomo_clock::Clock;
use mordomo_core::types::{InboundMessage, OutboundMessage};
use mordomo_core::MessageBus;
use mordomo_llm::{ChatMessage, ChatRequest, CostMeter, LlmProvider, Profile};
use mordomo_locale::{parse_language_switch_request, templates, Lang};
use mordomo_memory::MemoryStore;
use mordomo_parse::calling::is_calling_phrase;
use mordomo_router::{Router, RouterOutcome};
use mordomo_safety::blocklist::{is_blocked, BlockedStore};
use mordomo_safety::breaker::CircuitBreaker;
use mordomo_safety::injection::is_injection_attempt;
use mordomo_safety::interval::looks_like_insistence;
use mordomo_safety::painpoints::PainpointStore;
use mordomo_safety::rate::RateLimiter;
use mordomo_safety::sanitize::{sanitize_string, MAX_MESSAGE_LEN};
use mordomo_safety::scope::is_clearly_in_scope;
use mordomo_safety::trivial::should_skip_reply;
use mordomo_scheduler::CronService;
use mordomo_sessions::{Session, SessionManager, SessionMessage};
use mordomo_store::Store;
use mordomo_tools::cron::CronTool;
use mordomo_tools::event::EventTool;
use mordomo_tools::list::ListTool;
use mordomo_tools::message::MessageTool;
use mordomo_tools::read_file::ReadFileTool;
use mordomo_tools::search::SearchTool;
use mordomo_tools::{ToolCtx, ToolRegistry};

use crate::smart::DailyMessageCounter;
use crate::stale::StaleRemovalStore;

const SENTIMENT_EVERY_TURNS: usize = 20;

pub struct AgentLoop {
    pub bus: Arc<MessageBus>,
    pub router: Arc<Router>,
    pub store: Arc<Store>,
    pub sessions: Arc<SessionManager>,
    pub memory: Arc<MemoryStore>,
    pub cron: Arc<CronService>,
    pub clock: Clock,
    pub assistant: Option<Arc<dyn LlmProvider>>,
    pub parser: Option<Arc<dyn LlmProvider>>,
    pub breaker: CircuitBreaker,
    pub rate: RateLimiter,
    pub blocked: Arc<BlockedStore>,
    pub painpoints: Arc<PainpointStore>,
    pub cost: Arc<CostMeter>,
    pub stale: StaleRemovalStore,
    pub daily: DailyMessageCounter,
    pub workspace: PathBuf,
    pub search_api_key: Option<String>,
    pub max_tool_iterations: u32,
}

impl AgentLoop {
    /// Main loop: one message at a time, so per-chat ordering holds.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!("agent loop started");
        loop {
            tokio::select! {
                maybe_msg = self.bus.consume_inbound() => {
                    let Some(msg) = maybe_msg else { break };
                    let chat = msg.chat_id.clone();
                    let channel = msg.channel.clone();
                    match self.process_message(msg).await {
                        Ok(replies) => {
                            for reply in replies {
                                self.bus.publish_outbound(reply).await;
                            }
                        }
                        Err(e) => {
                            error!(chat = %chat, "message processing failed: {e}");
                            self.bus
                                .publish_outbound(OutboundMessage::new(
                                    channel,
                                    chat,
                                    "Algo correu mal deste lado. Tenta de novo num instante. 🙏",
                                ))
                                .await;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("agent loop shutting down");
                        break;
                    }
                }
            }
        }
    }

    fn lang_for(&self, msg: &InboundMessage) -> Lang {
        self.router.lang_for(msg)
    }

    fn build_registry(&self, ctx: ToolCtx) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(CronTool::new(
            self.cron.clone(),
            self.store.clone(),
            self.sessions.clone(),
            self.parser.clone(),
            self.clock.clone(),
            ctx.clone(),
        )));
        registry.register(Box::new(ListTool::new(
            self.store.clone(),
            self.parser.clone(),
            ctx.clone(),
        )));
        registry.register(Box::new(EventTool::new(
            self.store.clone(),
            self.clock.clone(),
            ctx.clone(),
        )));
        registry.register(Box::new(ReadFileTool::new(self.workspace.clone())));
        if let Some(key) = &self.search_api_key {
            registry.register(Box::new(SearchTool::new(key.clone())));
        }
        registry.register(Box::new(MessageTool::new(self.bus.clone(), ctx)));
        registry
    }

    fn out(&self, msg: &InboundMessage, content: impl Into<String>) -> OutboundMessage {
        OutboundMessage::new(msg.channel.clone(), msg.chat_id.clone(), content)
    }

    /// The full per-message pipeline.
    pub async fn process_message(
        &self,
        mut msg: InboundMessage,
    ) -> Result<Vec<OutboundMessage>, mordomo_core::MordomoError> {
        // 1. Sanitize
        msg.content = sanitize_string(&msg.content, MAX_MESSAGE_LEN, true);
        if self.router.god.is_muted(&msg.chat_id) {
            return Ok(Vec::new());
        }
        let lang = self.lang_for(&msg);
        let session_key = msg.chat().session_key();
        let mut session = self
            .sessions
            .get_or_create(&session_key)
            .map_err(|e| mordomo_core::MordomoError::Internal(e.to_string()))?;

        // Reactions skip the text pipeline entirely.
        if msg.reaction.is_some() {
            let registry = self.build_registry(self.tool_ctx(&msg, false));
            let outcome = self.router.handle(&msg, &mut session, &registry).await;
            let _ = self.sessions.save(&session);
            return Ok(self.outcomes_to_messages(&msg, outcome));
        }

        // 2. Daily counter for the smart-reminder policy
        let today = self.local_day(&msg);
        self.daily.record(&msg.chat_id, &today);

        // 3. Trivial-reply guard
        if should_skip_reply(&msg.content) {
            debug!("skip reply: trivial message");
            return Ok(Vec::new());
        }

        // 4. Rate limit
        if self.rate.check_and_record(&msg.channel, &msg.chat_id) {
            if self.rate.should_send_notice(&msg.channel, &msg.chat_id) {
                return Ok(vec![self.out(&msg, templates::rate_limited(lang))]);
            }
            return Ok(Vec::new());
        }

        let mut extra: Vec<OutboundMessage> = Vec::new();

        // 5. Deferred stale-removal apology
        if let Some(removed) = self.stale.consume(&msg.chat_id) {
            let list = removed.join(", ");
            extra.push(self.out(
                &msg,
                templates::stale_removal_apology(lang, removed.len(), &list),
            ));
        }

        // 6. Tool context (+ insistence detection for the interval floor)
        let allow_relaxed = self.detect_insistence(&session, &msg).await;
        let registry = self.build_registry(self.tool_ctx(&msg, allow_relaxed));

        // 7. Weekly/monthly recap on first contact of the period
        extra.extend(self.pending_recaps(&msg));

        // 8. Language-switch request
        if let Some(new_lang) =
            parse_language_switch_request(&msg.content, msg.phone_for_locale.as_deref())
        {
            let reply = if new_lang == lang {
                templates::language_already_active(lang).to_string()
            } else {
                if let Some(user) = self.router.user_for(&msg) {
                    let _ = self.store.set_language(user.id, new_lang.as_str());
                }
                templates::language_switch_confirmation(new_lang).to_string()
            };
            extra.push(self.out(&msg, reply));
            return Ok(extra);
        }

        // 9. Calling-phrase guard
        if is_calling_phrase(&msg.content) {
            extra.push(self.out(&msg, templates::calling_ack(lang)));
            return Ok(extra);
        }

        // 10. Command blocklist
        if let Some(reason) = is_blocked(&msg.content) {
            self.blocked.record(
                &msg.channel,
                &msg.chat_id,
                &msg.content,
                reason,
                self.clock.now_ms() / 1000,
            );
            extra.push(self.out(&msg, templates::blocked_command_refusal(lang)));
            return Ok(extra);
        }

        // 11. Prompt-injection guard
        if is_injection_attempt(&msg.content) {
            self.blocked.record(
                &msg.channel,
                &msg.chat_id,
                &msg.content,
                "prompt_injection",
                self.clock.now_ms() / 1000,
            );
            extra.push(self.out(&msg, templates::injection_refusal(lang)));
            return Ok(extra);
        }

        // 12. Onboarding
        if let Some(outcome) =
            mordomo_router::onboarding::handle(self.router.as_ref(), &msg, &mut session).await
        {
            let _ = self.sessions.save(&session);
            extra.extend(self.outcomes_to_messages(&msg, outcome));
            return Ok(extra);
        }

        // 13. Deterministic router
        match self.router.handle(&msg, &mut session, &registry).await {
            RouterOutcome::Handled(replies) => {
                if let Some(head) = replies.first() {
                    session.push(SessionMessage::user(msg.content.clone()));
                    session.push(SessionMessage::assistant(head.clone()));
                }
                let mut msgs: Vec<OutboundMessage> =
                    replies.iter().map(|r| self.out(&msg, r.clone())).collect();
                self.maybe_append_tz_nudge(&msg, &mut session, &mut msgs, lang);
                let _ = self.sessions.save(&session);
                extra.extend(msgs);
                return Ok(extra);
            }
            RouterOutcome::NotHandled => {}
        }

        // 14. Scope filter
        if !self.is_in_scope(&msg, &session).await {
            let fallbacks = templates::out_of_scope_fallbacks(lang);
            let reply = fallbacks
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or("…");
            extra.push(self.out(&msg, reply));
            return Ok(extra);
        }

        // 15. Analytic routing
        if let Some(answer) = self.try_analytic(&msg).await {
            session.push(SessionMessage::user(msg.content.clone()));
            session.push(SessionMessage::assistant(answer.clone()));
            let _ = self.sessions.save(&session);
            extra.push(self.out(&msg, answer));
            return Ok(extra);
        }

        // 16. Circuit breaker
        if self.breaker.is_open() {
            extra.push(self.out(&msg, templates::degraded_service(lang)));
            return Ok(extra);
        }

        // 17. Session compression before prompt building
        self.maybe_compress(&mut session, &session_key).await;

        // 18-20. Assistant tool loop with parser fallback
        let reply = self.assistant_turn(&msg, &session, &registry, lang).await;

        // 21. Persist + periodic sentiment check
        session.push(SessionMessage::user(msg.content.clone()));
        session.push(SessionMessage::assistant(reply.clone()));
        let _ = self.sessions.save(&session);
        self.maybe_sentiment_check(&session, &msg).await;

        extra.push(self.out(&msg, reply));
        Ok(extra)
    }

    fn tool_ctx(&self, msg: &InboundMessage, allow_relaxed: bool) -> ToolCtx {
        ToolCtx {
            channel: msg.channel.clone(),
            chat_id: msg.chat_id.clone(),
            phone_for_locale: msg.phone_for_locale.clone(),
            allow_relaxed_interval: allow_relaxed,
        }
    }

    fn outcomes_to_messages(
        &self,
        msg: &InboundMessage,
        outcome: RouterOutcome,
    ) -> Vec<OutboundMessage> {
        match outcome {
            RouterOutcome::Handled(replies) => {
                replies.into_iter().map(|r| self.out(msg, r)).collect()
            }
            RouterOutcome::NotHandled => Vec::new(),
        }
    }

    fn local_day(&self, msg: &InboundMessage) -> String {
        let tz: Tz = self
            .store
            .get_user(&msg.chat_id)
            .ok()
            .flatten()
            .and_then(|u| u.tz_iana)
            .and_then(|t| t.parse().ok())
            .unwrap_or(chrono_tz::UTC);
        Utc.timestamp_millis_opt(self.clock.now_ms())
            .single()
            .unwrap_or_else(Utc::now)
            .with_timezone(&tz)
            .format("%Y-%m-%d")
            .to_string()
    }

    fn maybe_append_tz_nudge(
        &self,
        msg: &InboundMessage,
        session: &mut Session,
        msgs: &mut Vec<OutboundMessage>,
        lang: Lang,
    ) {
        let has_tz = self
            .store
            .get_user(&msg.chat_id)
            .ok()
            .flatten()
            .map(|u| u.tz_iana.is_some())
            .unwrap_or(false);
        if !has_tz && !session.meta_bool("nudge_append_done") && !msgs.is_empty() {
            session.set_meta_bool("nudge_append_done", true);
            msgs.push(self.out(msg, templates::nudge_tz_when_missing(lang)));
        }
    }

    /// Weekly/monthly recap on the first contact of a new period; idempotent
    /// via audit rows keyed by period id.
    fn pending_recaps(&self, msg: &InboundMessage) -> Vec<OutboundMessage> {
        let Some(user) = self.router.user_for(msg) else {
            return Vec::new();
        };
        let (week_id, month_id) = self.router.period_ids(&user);
        let mut out = Vec::new();
        for (weekly, action, period) in [
            (true, "recap_weekly_delivered", week_id),
            (false, "recap_monthly_delivered", month_id),
        ] {
            let already = self.store.audit_exists(user.id, action, &period).unwrap_or(true);
            if already {
                continue;
            }
            if let Some(content) = self.router.build_recap(&user, weekly) {
                if self.store.audit(user.id, action, Some(&period), None).is_ok() {
                    out.push(self.out(msg, content));
                }
            } else {
                // Nothing to recap; still mark the period so we don't retry
                // on every message.
                let _ = self.store.audit(user.id, action, Some(&period), None);
            }
        }
        out
    }

    /// Interval-floor relaxation: deterministic keywords first, then the
    /// parser LLM for borderline phrasing.
    async fn detect_insistence(&self, session: &Session, msg: &InboundMessage) -> bool {
        let last_assistant = session
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "assistant")
            .map(|m| m.content.as_str());
        if looks_like_insistence(last_assistant, &msg.content) {
            return true;
        }
        let Some(last) = last_assistant else { return false };
        let lower = last.to_lowercase();
        if !lower.contains("intervalo") && !lower.contains("2 horas") {
            return false;
        }
        let Some(parser) = &self.parser else { return false };
        let prompt = format!(
            "O assistente rejeitou um lembrete por «intervalo mínimo 2 horas».\n\
             O utilizador respondeu: «{}»\n\
             O utilizador está a INSISTIR ou RECLAMAR, pedindo exceção? Responde APENAS: SIM ou NAO",
            msg.content.chars().take(200).collect::<String>()
        );
        let req = ChatRequest::new(Profile::Parser, vec![ChatMessage::user(prompt)]);
        match parser.chat(&req).await {
            Ok(out) => {
                self.cost.record(parser.name(), out.tokens_in, out.tokens_out);
                out.content.trim().to_uppercase().starts_with('S')
            }
            Err(_) => false,
        }
    }

    /// Scope filter: fast regex path, then the parser-LLM judge, then the
    /// follow-up admission (previous in-scope user turn).
    async fn is_in_scope(&self, msg: &InboundMessage, session: &Session) -> bool {
        if is_clearly_in_scope(&msg.content) {
            return true;
        }
        if let Some(parser) = &self.parser {
            let prompt = format!(
                "You are a binary classifier for a reminders-and-lists WhatsApp assistant. \
                 Message: \"{}\". Is this in scope (reminders, lists, agenda, events, times, \
                 organizing)? Reply ONLY YES or NO.",
                msg.content.chars().take(300).collect::<String>()
            );
            let req = ChatRequest::new(Profile::Parser, vec![ChatMessage::user(prompt)]);
            match parser.chat(&req).await {
                Ok(out) => {
                    self.cost.record(parser.name(), out.tokens_in, out.tokens_out);
                    if out.content.trim().to_uppercase().starts_with('Y') {
                        return true;
                    }
                    // Follow-up admission: the previous user turn was in scope.
                    return session
                        .messages
                        .iter()
                        .rev()
                        .filter(|m| m.role == "user")
                        .nth(1)
                        .map(|m| is_clearly_in_scope(&m.content))
                        .unwrap_or(false);
                }
                Err(e) => {
                    debug!("scope judge unavailable, regex fallback: {e}");
                }
            }
        }
        false
    }

    /// History/pattern questions answered by the parser model over a data
    /// slice, without waking the assistant.
    async fn try_analytic(&self, msg: &InboundMessage) -> Option<String> {
        let t = mordomo_parse::normalize::normalize(&msg.content);
        let analytic = ["quantas", "quantos", "quantas vezes", "historico", "padrao", "costumo"]
            .iter()
            .any(|k| t.contains(k));
        if !analytic {
            return None;
        }
        let parser = self.parser.as_ref()?;
        let user = self.router.user_for(msg)?;
        let history = self
            .store
            .recent_reminder_history(user.id, None, 30)
            .ok()?
            .into_iter()
            .map(|(kind, message, at)| {
                format!("{} {} {}", kind, message, at.unwrap_or_default())
            })
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Historico de lembretes do utilizador (recentes primeiro):\n{}\n\n\
             Pergunta: «{}»\n\
             Responde em 1-2 frases curtas, no idioma da pergunta.",
            history,
            msg.content.chars().take(200).collect::<String>()
        );
        let req = ChatRequest::new(Profile::Parser, vec![ChatMessage::user(prompt)]);
        match parser.chat(&req).await {
            Ok(out) if !out.content.trim().is_empty() => {
                self.cost.record(parser.name(), out.tokens_in, out.tokens_out);
                Some(out.content.trim().to_string())
            }
            _ => None,
        }
    }

    /// ≥45 messages: the parser model condenses the first 25 into one
    /// summary message; bullets merge into long-term memory.
    async fn maybe_compress(&self, session: &mut Session, session_key: &str) {
        if !session.needs_compression() {
            return;
        }
        let Some(parser) = &self.parser else {
            return;
        };
        let transcript: String = session.messages[..mordomo_sessions::COMPRESS_BATCH]
            .iter()
            .map(|m| format!("[{}] {}", m.role, m.content.chars().take(200).collect::<String>()))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Resume esta conversa em 4-5 frases curtas. Foco em: lembretes criados, listas \
             tocadas, decisões, pedidos. Depois, na linha seguinte, começa por BULLETS: e \
             lista 2-4 pontos essenciais para memória longa (um por linha, com -).\n\n\
             Conversa:\n{transcript}"
        );
        let req = ChatRequest::new(Profile::Parser, vec![ChatMessage::user(prompt)]);
        let out = match parser.chat(&req).await {
            Ok(out) => out,
            Err(e) => {
                debug!("session compression failed: {e}");
                return;
            }
        };
        self.cost.record(parser.name(), out.tokens_in, out.tokens_out);
        let raw = out.content.trim();
        let (summary, bullets) = match raw.split_once("BULLETS:") {
            Some((s, b)) => (s.trim().to_string(), b.trim().to_string()),
            None => (raw.chars().take(500).collect(), String::new()),
        };
        if session.compress_with_summary(summary) {
            let _ = self.sessions.save(session);
        }
        if !bullets.is_empty() {
            let normalized: String = bullets
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| format!("- {}", l.trim().trim_start_matches('-').trim()))
                .collect::<Vec<_>>()
                .join("\n");
            if let Err(e) = self.memory.upsert_section(
                session_key,
                "## Resumo de conversas",
                &normalized.chars().take(600).collect::<String>(),
            ) {
                debug!("memory upsert failed: {e}");
            }
        }
    }

    /// Every 20 user turns, check the last 25 messages for frustration and
    /// register a painpoint for CS outreach.
    async fn maybe_sentiment_check(&self, session: &Session, msg: &InboundMessage) {
        let user_turns = session.messages.iter().filter(|m| m.role == "user").count();
        if user_turns == 0 || user_turns % SENTIMENT_EVERY_TURNS != 0 {
            return;
        }
        let Some(parser) = &self.parser else { return };
        let transcript: String = session
            .recent(25)
            .iter()
            .map(|(role, content)| format!("{role}: {}", content.chars().take(150).collect::<String>()))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Conversa:\n{transcript}\n\nO utilizador demonstra FRUSTRAÇÃO ou RECLAMAÇÃO com o \
             serviço? Responde APENAS: SIM ou NAO"
        );
        let req = ChatRequest::new(Profile::Parser, vec![ChatMessage::user(prompt)]);
        if let Ok(out) = parser.chat(&req).await {
            self.cost.record(parser.name(), out.tokens_in, out.tokens_out);
            if out.content.trim().to_uppercase().starts_with('S') {
                self.painpoints.add(
                    &msg.chat_id,
                    "frustração/reclamação detectada",
                    self.clock.now_ms() / 1000,
                );
                info!(chat = %msg.chat_id.chars().take(20).collect::<String>(), "painpoint registered");
            }
        }
    }

    /// The assistant tool loop, with one parser-profile retry and the
    /// degraded template as last resort.
    async fn assistant_turn(
        &self,
        msg: &InboundMessage,
        session: &Session,
        registry: &ToolRegistry,
        lang: Lang,
    ) -> String {
        let user = self.router.user_for(msg);
        let tz = user
            .as_ref()
            .and_then(|u| u.tz_iana.clone())
            .unwrap_or_else(|| "UTC".to_string());
        let long_term = self
            .memory
            .read_long_term(&msg.chat().session_key())
            .unwrap_or_default();
        let system = context::build_system_prompt(&context::ContextInput {
            lang,
            tz_iana: &tz,
            now_ms: self.clock.now_ms(),
            preferred_name: user.as_ref().and_then(|u| u.preferred_name.as_deref()),
            long_term_memory: &long_term,
            workspace_path: &self.workspace.display().to_string(),
            reference_files: &["identity.md", "rules.md"],
        });

        let mut messages = vec![ChatMessage::system(system)];
        for (role, content) in session.recent(20) {
            match role {
                "user" => messages.push(ChatMessage::user(content)),
                "assistant" => messages.push(ChatMessage::assistant(content)),
                _ => {}
            }
        }
        messages.push(ChatMessage::user(msg.content.clone()));

        let Some(assistant) = &self.assistant else {
            return templates::degraded_service(lang).to_string();
        };

        let tools = registry.to_definitions();
        let mut iterations = 0u32;
        loop {
            let req = ChatRequest::new(Profile::Assistant, messages.clone())
                .with_tools(tools.clone());
            let outcome = match assistant.chat(&req).await {
                Ok(out) => {
                    self.breaker.record_success();
                    self.cost.record(assistant.name(), out.tokens_in, out.tokens_out);
                    out
                }
                Err(e) => {
                    warn!("assistant call failed: {e}");
                    self.breaker.record_failure();
                    return self.parser_fallback(&messages, lang).await;
                }
            };

            if outcome.tool_calls.is_empty() {
                let text = outcome.content.trim();
                if text.is_empty() {
                    return templates::degraded_service(lang).to_string();
                }
                return text.to_string();
            }

            iterations += 1;
            if iterations > self.max_tool_iterations {
                warn!("tool loop exceeded {} iterations", self.max_tool_iterations);
                return templates::degraded_service(lang).to_string();
            }

            let mut assistant_msg = ChatMessage::assistant(outcome.content.clone());
            assistant_msg.tool_calls = Some(outcome.tool_calls.clone());
            messages.push(assistant_msg);
            for call in &outcome.tool_calls {
                let result = registry.execute(&call.name, call.input.clone()).await;
                debug!(tool = %call.name, error = result.is_error, "tool executed");
                messages.push(ChatMessage::tool_result(call.id.clone(), result.content));
            }
        }
    }

    /// One retry on the cheap model without tools before giving up.
    async fn parser_fallback(&self, messages: &[ChatMessage], lang: Lang) -> String {
        let Some(parser) = &self.parser else {
            return templates::degraded_service(lang).to_string();
        };
        let req = ChatRequest::new(Profile::Parser, messages.to_vec());
        match parser.chat(&req).await {
            Ok(out) if !out.content.trim().is_empty() => {
                self.breaker.record_success();
                self.cost.record(parser.name(), out.tokens_in, out.tokens_out);
                out.content.trim().to_string()
            }
            _ => {
                self.breaker.record_failure();
                templates::degraded_service(lang).to_string()
            }
        }
    }
}
