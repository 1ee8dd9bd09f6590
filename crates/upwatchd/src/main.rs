//! upwatchd — the upwatch daemon.
//!
//! Single binary that assembles the monitor's subsystems:
//! - State store (redb): service registry + status history
//! - Probe runner: bounded-concurrency HTTP checks
//! - Optional periodic check loop
//! - REST API
//!
//! # Usage
//!
//! ```text
//! upwatchd --port 8000 --data-dir /var/lib/upwatch --check-interval 60
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::info;

use upwatch_api::ApiState;
use upwatch_probe::{run_check_loop, CheckRunner};

#[derive(Parser)]
#[command(name = "upwatchd", version, about = "upwatch daemon — service status monitor")]
struct Cli {
    /// Port for the REST API.
    #[arg(long, default_value = "8000")]
    port: u16,

    /// Data directory for the embedded store.
    #[arg(long, default_value = "/var/lib/upwatch")]
    data_dir: PathBuf,

    /// Per-probe timeout in seconds.
    #[arg(long, default_value = "10")]
    probe_timeout: u64,

    /// Maximum concurrent probes during a check-all run.
    #[arg(long, default_value = "8")]
    probe_concurrency: usize,

    /// Periodic check interval in seconds (0 disables the loop).
    #[arg(long, default_value = "0")]
    check_interval: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,upwatchd=debug,upwatch=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("upwatch daemon starting");

    // Ensure data directory exists.
    std::fs::create_dir_all(&cli.data_dir)?;
    let db_path = cli.data_dir.join("upwatch.redb");

    // ── Initialize subsystems ──────────────────────────────────

    // State store.
    let store = upwatch_state::StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    // Probe runner, sharing one HTTP client across all checks.
    let client = reqwest::Client::builder().build()?;
    let runner = Arc::new(CheckRunner::new(
        store.clone(),
        client,
        Duration::from_secs(cli.probe_timeout),
        cli.probe_concurrency,
    ));
    info!(
        timeout_secs = cli.probe_timeout,
        concurrency = cli.probe_concurrency,
        "probe runner initialized"
    );

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Background tasks ───────────────────────────────────────

    let check_handle = if cli.check_interval > 0 {
        info!(interval_secs = cli.check_interval, "periodic checking enabled");
        let loop_runner = runner.clone();
        let loop_shutdown = shutdown_rx.clone();
        Some(tokio::spawn(run_check_loop(
            loop_runner,
            Duration::from_secs(cli.check_interval),
            loop_shutdown,
        )))
    } else {
        None
    };

    // ── Start API server ───────────────────────────────────────

    let router = upwatch_api::build_router(ApiState { store, runner });
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));

    info!(%addr, "API server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    // Wait for background tasks.
    if let Some(handle) = check_handle {
        let _ = handle.await;
    }

    info!("upwatch daemon stopped");
    Ok(())
}
