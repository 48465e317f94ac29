use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use tickler_core::config::TicklerConfig;
use tickler_router::Router;
use tickler_scheduler::Scheduler;
use tickler_store::{ChannelStore, ReminderStore};
use tickler_telegram::{TelegramAccess, TelegramAdapter, TelegramTransport};

mod app;
mod http;

/// Telegram reminder bot: scheduler, conversation router and health endpoint.
#[derive(Debug, Parser)]
#[command(name = "tickler-gateway", version, about)]
struct Cli {
    /// Config file. Falls back to TICKLER_CONFIG, then ~/.tickler/tickler.toml.
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tickler_gateway=info,tickler_scheduler=info,tickler_router=info,tickler_telegram=info"
                    .into()
            }),
        )
        .init();

    // load config: --config > TICKLER_CONFIG env > ~/.tickler/tickler.toml
    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| std::env::var("TICKLER_CONFIG").ok())
        .unwrap_or_else(tickler_core::config::default_config_path);
    if !std::path::Path::new(&config_path).exists() {
        warn!(path = %config_path, "config file not found, using defaults and TICKLER_* env");
    }
    let config = TicklerConfig::load(Some(&config_path)).inspect_err(|e| {
        error!(code = e.code(), path = %config_path, "config load failed: {e}");
    })?;

    let bot = tickler_telegram::bot_from_token(config.bot.token.as_deref())?;
    if config.bot.admin_ids.is_empty() {
        warn!("bot.admin_ids is empty; channel management is disabled");
    }

    // initialize SQLite database: one file, one connection per store
    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL;")?;
    tickler_store::db::init_db(&db)?;
    info!("database schema ready");

    let reminders = Arc::new(ReminderStore::new(rusqlite::Connection::open(db_path)?));
    let channels = Arc::new(ChannelStore::new(rusqlite::Connection::open(db_path)?));

    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let access = Arc::new(TelegramAccess::new(
        bot.clone(),
        &config.bot.admin_ids,
        config.bot.channel_link_prefix.clone(),
    ));

    let scheduler = Scheduler::new(reminders, transport.clone(), config.scheduler.clone());
    let router = Arc::new(Router::new(
        Arc::clone(&scheduler),
        channels,
        transport,
        access,
        &config.bot,
    ));

    // spawn scheduler loop in background
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let scheduler_task = tokio::spawn(Arc::clone(&scheduler).run(shutdown_rx));

    if config.health.enabled {
        let addr: SocketAddr = format!("{}:{}", config.health.bind, config.health.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let state = Arc::new(app::AppState::new(Arc::clone(&scheduler)));
        info!("health endpoint listening on {}", addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app::build_router(state)).await {
                warn!(error = %e, "health endpoint stopped");
            }
        });
    }

    let adapter = TelegramAdapter::new(bot, router);
    match adapter.verify().await {
        Ok(username) => info!(bot = %username, "Telegram: token accepted"),
        Err(e) => warn!(error = %e, "Telegram: getMe failed; continuing"),
    }

    tokio::select! {
        _ = adapter.run() => warn!("Telegram dispatcher exited"),
        _ = tokio::signal::ctrl_c() => info!("shutdown signal received"),
    }

    // signal scheduler to stop
    let _ = shutdown_tx.send(true);
    let _ = scheduler_task.await;
    Ok(())
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
