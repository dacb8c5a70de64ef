mod config;
mod dispatcher;
mod orchestrator;
mod render;
mod source;
mod synchronizer;
mod terminal;

use clap::Parser;
use common::{ApiClient, Command};
use config::Config;
use orchestrator::{Dashboard, PollSettings, UiEvent};
use render::DashboardView;
use source::SystemClock;
use std::path::PathBuf;
use std::sync::Arc;
use terminal::TerminalSink;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (.yaml, .yml or .toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Backend base URL, overrides the config file
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }

    setup_logging(&config)?;
    log::info!("Starting autodash-dashboard against {}", config.api.base_url);

    let settings = PollSettings {
        fast_tick: config.fast_tick(),
        slow_tick: config.slow_tick(),
        timezone: config.timezone()?,
        automation_job_id: config.polling.automation_job_id.clone(),
    };
    let client = Arc::new(ApiClient::new(&config.api.base_url, config.request_timeout())?);
    let sink = TerminalSink::new(DashboardView::new(config.notification_ttl()));
    let dashboard = Dashboard::new(client, sink, SystemClock, settings);

    let (ui_tx, ui_rx) = mpsc::channel(16);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(read_input(ui_tx));
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        log::info!("Ctrl-C received, shutting down");
        let _ = shutdown_tx.send(true);
    });

    dashboard.run(ui_rx, shutdown_rx).await;

    // A pending stdin read would otherwise hold the runtime open.
    std::process::exit(0)
}

/// Keyboard commands, one per line.
async fn read_input(ui: mpsc::Sender<UiEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                log::error!("Failed to read input: {}", e);
                return;
            }
        };

        match parse_input(&line) {
            Some(event) => {
                if ui.send(event).await.is_err() {
                    return;
                }
            }
            None if line.trim().is_empty() => {}
            None => log::warn!("Unknown input {:?}", line.trim()),
        }
    }
}

fn parse_input(line: &str) -> Option<UiEvent> {
    match line.trim().to_lowercase().as_str() {
        "e" | "execute" => Some(UiEvent::Command(Command::ExecuteNow)),
        "p" | "pause" => Some(UiEvent::Command(Command::Pause)),
        "r" | "resume" => Some(UiEvent::Command(Command::Resume)),
        "f" | "refresh" => Some(UiEvent::Refresh),
        "q" | "quit" => Some(UiEvent::Quit),
        _ => None,
    }
}

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let log_file = std::env::var("AUTODASH_LOG")
        .map(PathBuf::from)
        .ok()
        .or_else(|| config.logging.output.clone())
        .unwrap_or_else(|| PathBuf::from(common::DEFAULT_LOG_FILE));
    let level = config.logging.level.parse::<log::LevelFilter>().unwrap_or(log::LevelFilter::Info);

    // stdout belongs to the renderer, so only the file gets log lines.
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d][%H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(fern::log_file(log_file)?)
        .apply()?;

    Ok(())
}
