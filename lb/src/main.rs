//! LessonBot - lesson plans over Telegram
//!
//! CLI entry point: runs the bot or works on the plans sheet directly.

use std::fs;
use std::sync::Arc;

use chrono::Local;
use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use lessonbot::cli::{Cli, Command};
use lessonbot::config::{Config, StoreBackend};
use lessonbot::keepalive::run_keepalive;
use lessonbot::query::{self, PlanQuery};
use lessonbot::{BotRunner, ChatTransport, Dispatcher, TelegramClient};
use planstore::{MemoryStore, RowStore, SheetsClient};

fn setup_logging(
    cli_log_level: Option<&str>,
    config_log_level: Option<&str>,
    log_file: Option<&std::path::Path>,
) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level_str = cli_log_level.or(config_log_level);
    let level = match level_str.map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    match log_file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir).context("Failed to create log directory")?;
            }
            let file = fs::File::create(path).context("Failed to create log file")?;
            tracing_subscriber::fmt()
                .with_writer(file)
                .with_ansi(false)
                .with_env_filter(filter)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
    }

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Build the configured row store
fn create_store(config: &Config) -> Result<Arc<dyn RowStore>> {
    debug!(backend = ?config.store.backend, "create_store: called");
    match config.store.backend {
        StoreBackend::Sheets => {
            let options = config.sheets.options()?;
            let key = config.sheets.credentials()?;
            info!(sheet_id = %options.sheet_id, worksheet = %options.worksheet, account = %key.client_email, "Using Google Sheets store");
            let client = SheetsClient::new(options, key).context("Failed to create Sheets client")?;
            Ok(Arc::new(client))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store, plans are lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config first: log level and log file both come from it
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(
        cli.log_level.as_deref(),
        config.log_level.as_deref(),
        config.log_file.as_deref(),
    )
    .context("Failed to setup logging")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None | Some(Command::Run) => cmd_run(&config).await,
        Some(Command::InitSheet) => cmd_init_sheet(&config).await,
        Some(Command::Query { args }) => cmd_query(&config, &args).await,
    }
}

async fn cmd_run(config: &Config) -> Result<()> {
    debug!("cmd_run: called");
    config.validate()?;
    let telegram = config.telegram.resolve()?;
    let store = create_store(config)?;

    store.ensure_table().await.context("Failed to prepare plans worksheet")?;

    let keepalive = if config.keepalive.enabled {
        let bind = config.keepalive.bind.clone();
        let port = config.keepalive.port;
        Some(tokio::spawn(async move {
            if let Err(e) = run_keepalive(&bind, port, shutdown_signal()).await {
                warn!(error = %e, "Keep-alive endpoint stopped");
            }
        }))
    } else {
        info!("Keep-alive endpoint disabled");
        None
    };

    let client = TelegramClient::from_config(&telegram).context("Failed to create Telegram client")?;
    let mut dispatcher = Dispatcher::new(store);
    match client.get_me().await {
        Ok(Some(username)) => {
            info!(%username, "Answering commands addressed to @{}", username);
            dispatcher = dispatcher.with_username(username);
        }
        Ok(None) => warn!("Bot has no username, answering every /cmd@name"),
        Err(e) => warn!(error = %e, "getMe failed, answering every /cmd@name"),
    }

    let transport: Arc<dyn ChatTransport> = Arc::new(client);
    let mut runner = BotRunner::new(dispatcher, transport, telegram.poll_timeout_secs);

    info!("LessonBot running");
    let result = runner.run(shutdown_signal()).await;

    if let Some(handle) = keepalive {
        handle.abort();
    }
    result.context("Bot stopped")?;
    info!("LessonBot stopped");
    Ok(())
}

async fn cmd_init_sheet(config: &Config) -> Result<()> {
    debug!("cmd_init_sheet: called");
    config.validate()?;
    let store = create_store(config)?;
    store.ensure_table().await.context("Failed to prepare plans worksheet")?;
    println!(
        "{} worksheet '{}' is ready",
        "✓".green(),
        config.sheets.worksheet.bold()
    );
    Ok(())
}

async fn cmd_query(config: &Config, args: &[String]) -> Result<()> {
    debug!(?args, "cmd_query: called");
    config.validate()?;
    let store = create_store(config)?;
    let query = PlanQuery::from_args(args, Local::now().date_naive());
    let text = query::run(store.as_ref(), &query).await;

    let mut lines = text.lines();
    if let Some(first) = lines.next() {
        println!("{}", first.bright_cyan().bold());
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}
