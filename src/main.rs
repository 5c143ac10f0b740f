mod action;
mod app;
mod config;
mod messages;
mod report;
mod session;
mod transport;

use action::ActionName;
use config::Config;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "obsctl")]
#[command(version, about = "Control OBS recording and the replay buffer over obs-websocket 4.x")]
struct Cli {
    /// Action to perform on OBS
    #[arg(short, long, value_enum)]
    action: ActionName,

    /// Path to configuration file (default: ~/.config/obsctl/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    let plan = action::resolve(cli.action);
    tracing::debug!("Action {:?} resolved to {:?}", cli.action, plan);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let outcome = app::run_action(&config, plan, shutdown_rx).await;
    report::print(&outcome);

    Ok(outcome.exit_code(config.exit_nonzero_on_failure))
}

/// Logs go to stdout alongside the result line. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "obsctl=debug" } else { "obsctl=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
