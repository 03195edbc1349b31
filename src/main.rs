use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use regen_ai::app::App;
use regen_ai::config::{Config, API_KEY_ENV};
use regen_ai::image::{ImageStudio, PlaceholderImages, DEFAULT_PLACEHOLDER_DELAY};
use regen_ai::{handler, tui, ui, Creativity, IntelliChatClient, Session};

#[derive(Parser)]
#[command(name = "regen")]
#[command(about = "Chat with a hosted AI model and request AI-generated images")]
#[command(version)]
struct Cli {
    /// Display name for your messages
    #[arg(short, long)]
    name: Option<String>,
    /// Creativity level: 0.2, 0.5 or 1 (or focused, balanced, creative)
    #[arg(short, long, value_parser = parse_creativity)]
    creativity: Option<Creativity>,
    /// Chat endpoint URL
    #[arg(long)]
    endpoint: Option<String>,
    /// Config file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log file (defaults to the platform data dir)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_creativity(s: &str) -> Result<Creativity, String> {
    Creativity::from_str(s).ok_or_else(|| format!("unsupported creativity level '{}'", s))
}

/// The terminal belongs to the UI, so logs go to a file
fn init_logging(log_file: Option<PathBuf>) -> Result<WorkerGuard> {
    let path = match log_file {
        Some(path) => path,
        None => dirs::data_local_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?
            .join("regen")
            .join("regen.log"),
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Log path has no file name: {}", path.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    let filter = EnvFilter::try_from_env("REGEN_LOG")
        .unwrap_or_else(|_| EnvFilter::new("regen_ai=info,regen=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.log_file.clone())?;

    tracing::info!("Re-Gen AI v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load_from(&config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        Config::new()
    });

    let mut endpoint = config.chat_endpoint(std::env::var(API_KEY_ENV).ok());
    if let Some(url) = cli.endpoint.clone() {
        endpoint.url = url;
    }
    if endpoint.api_key.is_none() {
        tracing::warn!("No API key configured; set {API_KEY_ENV} or api_key in {}", config_path.display());
    }
    tracing::info!(endpoint = ?endpoint, "Chat endpoint resolved");

    let creativity = cli
        .creativity
        .or_else(|| config.creativity())
        .unwrap_or_default();
    let username = cli
        .name
        .clone()
        .or_else(|| config.username.clone())
        .unwrap_or_default();
    let delay = config
        .placeholder_delay_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_PLACEHOLDER_DELAY);

    let session = Session::new(Arc::new(IntelliChatClient::new(endpoint)))
        .with_creativity(creativity)
        .with_keep_orphaned_replies(config.keep_orphaned_replies.unwrap_or(false));
    let images = ImageStudio::new(Arc::new(PlaceholderImages::new(delay)));

    let mut app = App::new(session, images, username);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    if let Err(e) = &result {
        tracing::error!("Exiting with error: {e:#}");
    }
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new(tui::TICK_RATE);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }

    Ok(())
}
