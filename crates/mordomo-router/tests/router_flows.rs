//! End-to-end router scenarios over real (temp-dir) stores: vague-time
//! flow, past-date confirmation, dependent chains via 👍, and slash
//! commands.

use std::sync::Arc;

use chrono::{Datelike, Duration, TimeZone, Utc};
use serde_json::json;

use mordomo_clock::Clock;
use mordomo_core::config::SchedulerConfig;
use mordomo_core::types::{InboundMessage, Reaction};
use mordomo_core::MessageBus;
use mordomo_memory::MemoryStore;
use mordomo_router::{GodMode, PendingConfirmations, Router, RouterOutcome};
use mordomo_scheduler::{CronService, NullHooks};
use mordomo_sessions::{Session, SessionManager};
use mordomo_store::Store;
use mordomo_tools::cron::CronTool;
use mordomo_tools::event::EventTool;
use mordomo_tools::list::ListTool;
use mordomo_tools::{ToolCtx, ToolRegistry};

struct Fixture {
    router: Router,
    registry: ToolRegistry,
    _tmp: tempfile::TempDir,
}

const CHAT: &str = "5511999998888@s.whatsapp.net";

fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let clock = Clock::new();
    let bus = Arc::new(MessageBus::new());
    let store = Arc::new(Store::open_in_memory().unwrap());
    let sessions = Arc::new(SessionManager::new(tmp.path().join("session")));
    let memory = Arc::new(MemoryStore::new(tmp.path().join("memory")));
    let cron = Arc::new(
        CronService::new(
            tmp.path().join("cron").join("jobs.json"),
            clock.clone(),
            SchedulerConfig::default(),
            Arc::new(NullHooks),
            bus,
        )
        .unwrap(),
    );
    // The user exists with a timezone so onboarding stays out of the way.
    let user = store.get_or_create_user(CHAT, "pt-BR").unwrap();
    store.set_timezone(user.id, "UTC", None).unwrap();

    let ctx = ToolCtx {
        channel: "whatsapp".to_string(),
        chat_id: CHAT.to_string(),
        phone_for_locale: None,
        allow_relaxed_interval: false,
    };
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CronTool::new(
        cron.clone(),
        store.clone(),
        sessions.clone(),
        None,
        clock.clone(),
        ctx.clone(),
    )));
    registry.register(Box::new(ListTool::new(store.clone(), None, ctx.clone())));
    registry.register(Box::new(EventTool::new(store.clone(), clock.clone(), ctx)));

    let router = Router {
        store,
        sessions,
        memory,
        cron,
        clock,
        parser: None,
        confirmations: PendingConfirmations::new(),
        god: GodMode::new(None),
        workspace_users_dir: tmp.path().join("workspace").join("users"),
    };
    Fixture { router, registry, _tmp: tmp }
}

fn inbound(content: &str) -> InboundMessage {
    InboundMessage {
        channel: "whatsapp".to_string(),
        chat_id: CHAT.to_string(),
        sender_id: CHAT.to_string(),
        content: content.to_string(),
        timestamp: 0,
        phone_for_locale: None,
        push_name: None,
        reaction: None,
        attachment_ics: None,
    }
}

fn reaction(emoji: &str, target: &str) -> InboundMessage {
    let mut msg = inbound("");
    msg.reaction = Some(Reaction { emoji: emoji.to_string(), target_id: target.to_string() });
    msg
}

async fn send(fx: &Fixture, session: &mut Session, content: &str) -> Vec<String> {
    match fx.router.handle(&inbound(content), session, &fx.registry).await {
        RouterOutcome::Handled(replies) => replies,
        RouterOutcome::NotHandled => Vec::new(),
    }
}

#[tokio::test]
async fn help_lists_commands() {
    let fx = fixture();
    let mut session = Session::new("whatsapp:test");
    let replies = send(&fx, &mut session, "/help").await;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("/lembrete"));
}

#[tokio::test]
async fn vague_time_flow_completes_with_time() {
    let fx = fixture();
    let mut session = Session::new("whatsapp:test");

    let replies = send(&fx, &mut session, "tenho consulta amanhã").await;
    assert!(replies[0].contains("que horas"), "asks for the time: {}", replies[0]);

    let replies = send(&fx, &mut session, "às 10h").await;
    assert!(
        replies[0].contains("agendado"),
        "creates the reminder: {}",
        replies[0]
    );
    let jobs = fx.router.cron.jobs_for_chat(CHAT);
    assert_eq!(jobs.len(), 1);
    // Tomorrow 10:00 UTC (the fixture user timezone); sub-second truncation
    // in the relative computation allows a small tolerance.
    let expected = (Utc.timestamp_millis_opt(fx.router.clock.now_ms()).unwrap()
        + Duration::days(1))
    .date_naive()
    .and_hms_opt(10, 0, 0)
    .unwrap()
    .and_utc()
    .timestamp_millis();
    let got = jobs[0].state.next_run_at_ms.expect("one-shot has a next run");
    assert!((got - expected).abs() < 3_000, "got {got}, expected ≈{expected}");
}

#[tokio::test]
async fn vague_time_flow_gives_up_after_three_attempts() {
    let fx = fixture();
    let mut session = Session::new("whatsapp:test");

    send(&fx, &mut session, "tenho consulta amanhã").await;
    let r1 = send(&fx, &mut session, "xyz").await;
    assert!(r1[0].contains("1 de 3"));
    let r2 = send(&fx, &mut session, "xyz").await;
    assert!(r2[0].contains("2 de 3"));
    let r3 = send(&fx, &mut session, "xyz").await;
    assert!(r3[0].contains("falta de informação"), "{}", r3[0]);
    assert!(fx.router.cron.jobs_for_chat(CHAT).is_empty());
}

#[tokio::test]
async fn past_date_asks_for_next_year_and_schedules_on_yes() {
    let fx = fixture();
    let mut session = Session::new("whatsapp:test");

    // Yesterday is always in the past, whatever today is.
    let yesterday = Utc.timestamp_millis_opt(fx.router.clock.now_ms()).unwrap()
        - Duration::days(1);
    let month_name = [
        "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto",
        "setembro", "outubro", "novembro", "dezembro",
    ][yesterday.month0() as usize];
    let text = format!(
        "me lembra de pagar a conta dia {} de {} às 9h",
        yesterday.day().min(28),
        month_name
    );

    let replies = send(&fx, &mut session, &text).await;
    assert!(replies[0].contains("já passou"), "{}", replies[0]);
    assert!(fx.router.cron.jobs_for_chat(CHAT).is_empty());

    let replies = send(&fx, &mut session, "1").await;
    assert!(replies[0].contains("ano que vem"), "{}", replies[0]);
    assert_eq!(fx.router.cron.jobs_for_chat(CHAT).len(), 1);
}

#[tokio::test]
async fn thumbs_up_releases_dependent_job() {
    let fx = fixture();
    let mut session = Session::new("whatsapp:test");

    // Lunch reminder, then a dependent coffee reminder chained on it.
    let lunch = fx
        .registry
        .execute("cron", json!({"action": "add", "message": "almoço", "in_seconds": 3600}))
        .await;
    assert!(!lunch.is_error);
    let lunch_id = fx.router.cron.jobs_for_chat(CHAT)[0].id.clone();

    let coffee = fx
        .registry
        .execute(
            "cron",
            json!({"action": "add", "message": "tomar o café", "in_seconds": 60,
                   "depends_on_job_id": lunch_id}),
        )
        .await;
    assert!(!coffee.is_error, "{}", coffee.content);
    let coffee_job = fx
        .router
        .cron
        .jobs_for_chat(CHAT)
        .into_iter()
        .find(|j| j.payload.message.contains("café"))
        .unwrap();
    assert!(coffee_job.state.next_run_at_ms.is_none(), "dependent starts inert");

    // 👍 on the lunch delivery completes it and releases the dependent.
    let outcome = fx
        .router
        .handle(&reaction("👍", &lunch_id), &mut session, &fx.registry)
        .await;
    assert!(matches!(outcome, RouterOutcome::Handled(_)));
    let released = fx.router.cron.get_job(&coffee_job.id).unwrap();
    assert!(released.state.next_run_at_ms.is_some());
    assert!(fx.router.cron.get_job(&lunch_id).is_none());
}

#[tokio::test]
async fn snooze_reaction_caps_at_three() {
    let fx = fixture();
    let mut session = Session::new("whatsapp:test");
    fx.registry
        .execute("cron", json!({"action": "add", "message": "remédio", "in_seconds": 3600}))
        .await;
    let job_id = fx.router.cron.jobs_for_chat(CHAT)[0].id.clone();

    for expected in ["1/3", "2/3", "3/3"] {
        let outcome = fx
            .router
            .handle(&reaction("⏰", &job_id), &mut session, &fx.registry)
            .await;
        match outcome {
            RouterOutcome::Handled(replies) => assert!(replies[0].contains(expected)),
            RouterOutcome::NotHandled => panic!("snooze not handled"),
        }
    }
    let outcome = fx
        .router
        .handle(&reaction("⏰", &job_id), &mut session, &fx.registry)
        .await;
    match outcome {
        RouterOutcome::Handled(replies) => assert!(replies[0].contains("limite")),
        RouterOutcome::NotHandled => panic!("snooze limit not handled"),
    }
}

#[tokio::test]
async fn quiet_command_persists_window() {
    let fx = fixture();
    let mut session = Session::new("whatsapp:test");
    let replies = send(&fx, &mut session, "/quiet 22:00 08:00").await;
    assert!(replies[0].contains("22:00"));
    let user = fx.router.store.get_user(CHAT).unwrap().unwrap();
    assert_eq!(user.quiet_start.as_deref(), Some("22:00"));
    assert_eq!(user.quiet_end.as_deref(), Some("08:00"));
}

#[tokio::test]
async fn nuke_requires_confirmation() {
    let fx = fixture();
    let mut session = Session::new("whatsapp:test");
    fx.registry
        .execute("list", json!({"action": "add", "list_name": "compras", "item_text": "arroz"}))
        .await;

    let replies = send(&fx, &mut session, "/nuke").await;
    assert!(replies[0].contains("1=sim"));
    // Declining leaves everything in place
    let replies = send(&fx, &mut session, "2").await;
    assert!(replies[0].to_lowercase().contains("cancelado"));
    let user = fx.router.store.get_user(CHAT).unwrap().unwrap();
    assert_eq!(fx.router.store.list_lists(user.id).unwrap().len(), 1);

    // Accepting wipes lists
    send(&fx, &mut session, "/nuke").await;
    let replies = send(&fx, &mut session, "1").await;
    assert!(replies[0].contains("apagado"), "{}", replies[0]);
    assert!(fx.router.store.list_lists(user.id).unwrap().is_empty());
}

#[tokio::test]
async fn recurring_gym_flow_confirms_then_registers() {
    let fx = fixture();
    let mut session = Session::new("whatsapp:test");

    let replies = send(&fx, &mut session, "academia segunda e quarta 19h").await;
    assert!(replies[0].contains("recorrente"), "{}", replies[0]);

    let replies = send(&fx, &mut session, "sim").await;
    assert!(replies[0].contains("Até quando"), "{}", replies[0]);

    let replies = send(&fx, &mut session, "indefinido").await;
    assert!(replies[0].contains("Registrado") || replies[0].contains("Registado"), "{}", replies[0]);
    let jobs = fx.router.cron.jobs_for_chat(CHAT);
    assert_eq!(jobs.len(), 1);
    match &jobs[0].schedule {
        mordomo_scheduler::Schedule::Cron { expr, .. } => assert_eq!(expr, "0 19 * * 1,3"),
        other => panic!("expected cron schedule, got {other:?}"),
    }
}
