use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use proutgpt::app::App;
use proutgpt::tui::{self, AppEvent, EventHandler};
use proutgpt::{handler, perform, ui, BackendConfig, BackendMode, ChatBackend, Config, Effect, HttpBackend};

#[derive(Parser)]
#[command(name = "proutgpt")]
#[command(version, about = "Terminal chat for ProutGPT (local Ollama or hosted gateway)")]
struct Cli {
    /// Config file to read startup defaults from
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Backend to start on: local or hosted
    #[arg(long)]
    mode: Option<BackendMode>,
    /// Ollama server address for local mode
    #[arg(short, long)]
    server: Option<String>,
    /// Model to start with
    #[arg(short, long)]
    model: Option<String>,
    /// Where to write logs (the terminal belongs to the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_file.clone())?;

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(server) = cli.server {
        config.server_address = server;
    }

    let mut backend_config = BackendConfig::from_config(&config);
    if let Some(model) = &cli.model {
        if let Err(e) = backend_config.set_model_id(model) {
            warn!(error = %e, "ignoring --model");
        }
    }
    info!(
        mode = %backend_config.mode(),
        model = backend_config.model_id(),
        "starting"
    );

    let backend: Arc<dyn ChatBackend> = Arc::new(HttpBackend::from_config(&config));
    let app = App::new(backend_config);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, app, backend).await;
    tui::restore()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "exiting with error");
    }
    result
}

async fn run(terminal: &mut tui::Tui, mut app: App, backend: Arc<dyn ChatBackend>) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(300));
    let tx = events.sender();

    let spawn_effect = |effect: Effect| {
        let backend = Arc::clone(&backend);
        let tx = tx.clone();
        tokio::spawn(async move {
            let completion = perform(backend.as_ref(), effect).await;
            // The loop may already be gone on quit; nothing left to update then
            let _ = tx.send(AppEvent::Completion(completion));
        });
    };

    for effect in app.controller.on_mount() {
        spawn_effect(effect);
    }

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        for effect in handler::handle_event(&mut app, event) {
            spawn_effect(effect);
        }
    }

    info!("bye");
    Ok(())
}

fn init_logging(log_file: Option<PathBuf>) -> Result<()> {
    let path = match log_file {
        Some(path) => path,
        None => dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("proutgpt")
            .join("proutgpt.log"),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("proutgpt=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();

    Ok(())
}
