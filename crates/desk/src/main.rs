//! # desk
//!
//! Dashboard binary — the composition root. Owns the single
//! `SessionManager` for the process, wires settings into it, and streams
//! session state and notices to the log until interrupted.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use desk_session::transport::WsTransport;
use desk_session::{SessionConfig, SessionManager, endpoint};
use desk_settings::DeskSettings;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, reload};

/// Desk dashboard data plane.
#[derive(Parser, Debug)]
#[command(name = "desk", about = "Trading dashboard session manager")]
struct Cli {
    /// Settings file (defaults to `~/.desk/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to the trading server and supervise the session.
    Run,
    /// Print the effective settings after all layers are applied.
    CheckConfig,
}

fn load_settings(cli: &Cli) -> Result<Arc<DeskSettings>> {
    match &cli.settings {
        Some(path) => {
            let settings = desk_settings::load_settings_from_path(path)
                .with_context(|| format!("failed to load settings from {}", path.display()))?;
            desk_settings::init_settings(settings);
        }
        None => {
            // Default path: a missing file falls back to compiled defaults.
            let _ = desk_settings::get_settings();
        }
    }
    Ok(desk_settings::get_settings())
}

/// The tracing directives to apply: `RUST_LOG` wins over the configured
/// level, so operators can always crank verbosity without touching the
/// settings file.
fn log_directives(rust_log: Option<&str>, configured: &str) -> String {
    match rust_log {
        Some(directives) if !directives.is_empty() => directives.to_string(),
        _ => configured.to_string(),
    }
}

/// Install the subscriber before settings load so load-time warnings
/// (unparsable env overrides, fallback to defaults) are visible. The
/// filter starts at the baseline and is tightened to the configured level
/// once settings are in. Logs go to stderr; stdout is reserved for
/// user-facing output like `check-config`.
fn init_tracing() -> reload::Handle<EnvFilter, Registry> {
    let initial = EnvFilter::new(log_directives(
        std::env::var("RUST_LOG").ok().as_deref(),
        "info",
    ));
    let (filter, handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    handle
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter_handle = init_tracing();
    let settings = load_settings(&cli)?;

    let directives = log_directives(
        std::env::var("RUST_LOG").ok().as_deref(),
        &settings.logging.level,
    );
    if let Err(e) = filter_handle.modify(|filter| *filter = EnvFilter::new(&directives)) {
        tracing::warn!(error = %e, "failed to apply configured log level");
    }

    match cli.command {
        Command::CheckConfig => {
            let rendered = serde_json::to_string_pretty(settings.as_ref())
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
        Command::Run => run(&settings).await,
    }
}

async fn run(settings: &DeskSettings) -> Result<()> {
    let url = endpoint::resolve_ws_url(&settings.server.origin, settings.server.local_port)
        .context("failed to resolve connection URL")?;
    tracing::info!(%url, "starting session supervisor");

    let config = SessionConfig {
        url,
        username: settings.bootstrap.username.clone(),
        initial_capital: settings.bootstrap.initial_capital,
        reconnect: settings.connection.reconnect.clone(),
    };
    let manager = SessionManager::spawn(config, WsTransport);
    let handle = manager.handle();

    // Surface notices and readiness transitions in the log.
    let mut notices = handle.subscribe_notices();
    let session = handle.session();
    let observer = tokio::spawn(async move {
        let mut was_ready = false;
        loop {
            match notices.recv().await {
                Ok(notice) => {
                    match notice.level {
                        desk_core::notice::NoticeLevel::Error => {
                            tracing::warn!(message = %notice.message, "notice");
                        }
                        _ => tracing::info!(message = %notice.message, "notice"),
                    }
                    let ready = session.is_ready();
                    if ready && !was_ready {
                        tracing::info!("session ready");
                    }
                    was_ready = ready;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notice stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    handle.ensure_connected().await;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!("shutting down");
    manager.shutdown().await;
    observer.abort();
    Ok(())
}
