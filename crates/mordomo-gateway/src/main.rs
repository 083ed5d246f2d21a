//! Mordomo entry point: load config, wire the subsystems, spawn the long
//! running tasks, and exit with 0 (ok), 1 (config error), or 2 (transport
//! retries exhausted).

mod hooks;
mod http;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mordomo_agent::smart::DailyMessageCounter;
use mordomo_agent::stale::StaleRemovalStore;
use mordomo_agent::AgentLoop;
use mordomo_clock::Clock;
use mordomo_core::paths::DataDirs;
use mordomo_core::{MessageBus, MordomoConfig};
use mordomo_llm::{CostMeter, LlmProvider, OpenAiCompatProvider};
use mordomo_memory::MemoryStore;
use mordomo_router::{GodMode, PendingConfirmations, Router};
use mordomo_safety::blocklist::BlockedStore;
use mordomo_safety::breaker::CircuitBreaker;
use mordomo_safety::painpoints::PainpointStore;
use mordomo_safety::rate::RateLimiter;
use mordomo_scheduler::CronService;
use mordomo_sessions::SessionManager;
use mordomo_store::Store;
use mordomo_whatsapp::BridgeError;

#[derive(Parser, Debug)]
#[command(name = "mordomo", about = "Conversational personal organizer")]
struct Cli {
    /// Path to the TOML config (default: ./mordomo.toml).
    #[arg(short, long)]
    config: Option<String>,

    /// Data directory override (default: ~/.mordomo).
    #[arg(long)]
    data_dir: Option<String>,
}

fn build_provider(
    config: &MordomoConfig,
    name: &str,
) -> Option<Arc<dyn LlmProvider>> {
    let entry = config.provider(name)?;
    let base_url = entry
        .base_url
        .clone()
        .unwrap_or_else(|| "https://api.deepseek.com".to_string());
    let model = entry.model.clone().unwrap_or_else(|| "deepseek-chat".to_string());
    Some(Arc::new(OpenAiCompatProvider::new(
        name,
        entry.api_key.clone(),
        base_url,
        model,
    )))
}

/// First-run reference documents for the `read_file` tool. Operators edit
/// these in place; existing files are never overwritten.
fn seed_workspace_docs(dirs: &DataDirs) {
    let workspace = dirs.root().join("workspace");
    let _ = std::fs::create_dir_all(&workspace);
    let defaults: [(&str, &str); 2] = [
        (
            "identity.md",
            "# Identidade\n\nSou o Mordomo: assistente de organização no WhatsApp.\n\
             Trato de lembretes, listas, agenda e coleções (filmes, livros, músicas, receitas).\n",
        ),
        (
            "rules.md",
            "# Regras\n\n- Respostas curtas, no idioma do utilizador, no máximo um emoji.\n\
             - Nunca inventar resultados de ferramentas.\n\
             - Fora de organização: redirecionar com simpatia para /help.\n",
        ),
    ];
    for (name, content) in defaults {
        let path = workspace.join(name);
        if !path.exists() {
            let _ = std::fs::write(&path, content);
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let mut config = match MordomoConfig::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("configuration error: {e}");
            return ExitCode::from(1);
        }
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let dirs = DataDirs::new(config.data_dir.as_deref());
    if let Err(e) = dirs.ensure() {
        error!("cannot create data directory: {e}");
        return ExitCode::from(1);
    }
    seed_workspace_docs(&dirs);

    let clock = Clock::new().with_env_override();
    let bus = Arc::new(MessageBus::new());

    let store = match Store::open(&dirs.db_path()) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("cannot open database: {e}");
            return ExitCode::from(1);
        }
    };
    let sessions = Arc::new(SessionManager::new(dirs.session_dir()));
    let memory = Arc::new(MemoryStore::new(dirs.memory_dir()));

    let mut cost_meter = CostMeter::new(dirs.token_usage(config.token_usage_file.as_deref()));
    for (name, provider) in &config.providers {
        if let (Some(pin), Some(pout)) = (provider.price_in_per_mtok, provider.price_out_per_mtok) {
            cost_meter.set_pricing(name, pin, pout);
        }
    }
    let cost = Arc::new(cost_meter);
    let blocked = Arc::new(BlockedStore::new(dirs.blocked_commands()));
    let painpoints = Arc::new(PainpointStore::new(dirs.painpoints()));

    let assistant = build_provider(&config, &config.agent.assistant_provider);
    let parser = config
        .agent
        .parser_provider
        .as_deref()
        .and_then(|name| build_provider(&config, name))
        .or_else(|| assistant.clone());
    if assistant.is_none() {
        warn!(
            "no provider configured for '{}' — LLM features degraded",
            config.agent.assistant_provider
        );
    }

    let cron = match CronService::new(
        dirs.cron_store(),
        clock.clone(),
        config.scheduler.clone(),
        Arc::new(hooks::StoreHooks::new(store.clone())),
        bus.clone(),
    ) {
        Ok(svc) => Arc::new(svc),
        Err(e) => {
            error!("cron store unusable: {e}");
            return ExitCode::from(1);
        }
    };

    // Startup sweep: one-shots that should have fired while we were down
    // are removed, and an apology is queued for the next conversation.
    let stale = StaleRemovalStore::new(dirs.stale_removal_pending());
    match cron.sweep_stale_jobs() {
        Ok(removed) => {
            for (chat_id, names) in removed {
                stale.queue(&chat_id, names);
            }
        }
        Err(e) => warn!("stale sweep failed: {e}"),
    }

    let god = GodMode::new(config.god_mode_password.clone()).with_stores(
        painpoints.clone(),
        blocked.clone(),
        cost.clone(),
    );
    let router = Arc::new(Router {
        store: store.clone(),
        sessions: sessions.clone(),
        memory: memory.clone(),
        cron: cron.clone(),
        clock: clock.clone(),
        parser: parser.clone(),
        confirmations: PendingConfirmations::new(),
        god,
        workspace_users_dir: dirs.workspace_users_dir(),
    });

    let agent = Arc::new(AgentLoop {
        bus: bus.clone(),
        router: router.clone(),
        store: store.clone(),
        sessions: sessions.clone(),
        memory: memory.clone(),
        cron: cron.clone(),
        clock: clock.clone(),
        assistant,
        parser,
        breaker: CircuitBreaker::new(
            config.safety.breaker_failure_threshold,
            config.safety.breaker_recovery_secs,
        ),
        rate: RateLimiter::new(config.safety.rate_limit_per_minute),
        blocked,
        painpoints,
        cost,
        stale,
        daily: DailyMessageCounter::new(dirs.smart_reminder_sent()),
        workspace: dirs.root().join("workspace"),
        search_api_key: config.search_api_key.clone(),
        max_tool_iterations: config.agent.max_tool_iterations,
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let clock_task = tokio::spawn(clock.clone().drift_loop(shutdown_rx.clone()));
    let cron_task = tokio::spawn(cron.clone().run(shutdown_rx.clone()));
    let agent_task = tokio::spawn(agent.clone().run(shutdown_rx.clone()));

    // Admin HTTP surface.
    let admin_state = http::AdminState {
        store: store.clone(),
        config: config.gateway.clone(),
    };
    let admin_addr = format!("{}:{}", config.gateway.bind, config.gateway.port);
    let admin_router = http::build_router(admin_state);
    let admin_task = tokio::spawn(async move {
        match tokio::net::TcpListener::bind(&admin_addr).await {
            Ok(listener) => {
                info!(addr = %admin_addr, "admin HTTP listening");
                if let Err(e) = axum::serve(listener, admin_router).await {
                    error!("admin HTTP server error: {e}");
                }
            }
            Err(e) => error!("admin HTTP bind failed: {e}"),
        }
    });

    // Transport: the WhatsApp bridge, when configured.
    let bridge_task = config.channels.whatsapp.as_ref().map(|wa| {
        let url = wa.bridge_url.clone();
        let bus = bus.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { mordomo_whatsapp::run_bridge(url, bus, shutdown).await })
    });

    info!("mordomo started");

    let exit = if let Some(bridge) = bridge_task {
        tokio::select! {
            result = bridge => match result {
                Ok(Err(BridgeError::RetriesExhausted)) => {
                    error!("bridge unreachable; giving up");
                    ExitCode::from(2)
                }
                _ => ExitCode::SUCCESS,
            },
            _ = tokio::signal::ctrl_c() => ExitCode::SUCCESS,
        }
    } else {
        let _ = tokio::signal::ctrl_c().await;
        ExitCode::SUCCESS
    };

    info!("shutting down");
    let _ = shutdown_tx.send(true);
    for task in [clock_task, cron_task, agent_task] {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(5), task).await;
    }
    admin_task.abort();
    exit
}
