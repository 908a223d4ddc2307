use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use deepdive_core::{ApiClient, Backend, Config, Prober};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{AppEvent, EventHandler};

#[derive(Parser, Debug)]
#[command(name = "deepdive", version)]
#[command(about = "Terminal client for a question-answering backend, with offline answers")]
struct Cli {
    /// Backend endpoint (overrides config file and DEEPDIVE_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Initial mode sent with each question
    #[arg(short, long)]
    mode: Option<String>,

    /// Seconds between connectivity probes
    #[arg(long)]
    probe_interval: Option<u64>,

    /// Config file to read instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file (defaults to deepdive.log in the config directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
        .context("failed to load config")?;

        let mut config = config.with_env();
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(mode) = &self.mode {
            config.default_mode = Some(mode.clone());
        }
        if let Some(secs) = self.probe_interval {
            config.probe_interval_secs = secs;
        }

        Ok(config.validated()?)
    }
}

/// Log to a file since the terminal belongs to the UI. Logging is skipped
/// when the file cannot be opened.
fn init_logging(path: Option<PathBuf>) {
    let path = match path.or_else(|| Config::config_dir().ok().map(|d| d.join("deepdive.log"))) {
        Some(path) => path,
        None => return,
    };

    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let file = match std::fs::OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(_) => return,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn build_backend(config: &Config) -> Result<Arc<dyn Backend>> {
    let client = match config.request_timeout() {
        Some(timeout) => ApiClient::with_timeout(&config.api_url, timeout)?,
        None => ApiClient::new(&config.api_url),
    };
    Ok(Arc::new(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_logging(cli.log_file.clone());

    info!(
        "deepdive v{} starting, backend {}",
        env!("CARGO_PKG_VERSION"),
        config.api_url
    );
    if config.request_timeout().is_none() {
        info!("no request timeout configured");
    }

    let backend = build_backend(&config)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let mut app = App::new(&config, backend.clone(), events.sender());

    let tx = events.sender();
    let prober = Prober::start(backend, config.probe_interval(), move |state| {
        let _ = tx.send(AppEvent::Connectivity(state));
    });

    let result = run(&mut terminal, &mut app, &mut events).await;

    prober.stop().await;
    tui::restore()?;

    if let Err(e) = &result {
        warn!("exiting with error: {:#}", e);
    }
    info!("bye");
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}
