//! drowsed — the drowse daemon.
//!
//! Single binary that assembles the cost-control loop for one ephemeral
//! demo environment:
//! - Parameter store (redb)
//! - Heartbeat recorder (reachability probe)
//! - Idle reaper (teardown decision + workflow dispatch)
//! - Status/wake API
//!
//! # Usage
//!
//! ```text
//! DROWSE_GH_OWNER=acme DROWSE_GH_REPO=demo-env \
//! DROWSE_TOKEN_PARAM=/drowse/gh_token DROWSE_TARGET_URL=https://demo.acme.dev/ \
//! drowsed run --port 8088 --data-dir /var/lib/drowse
//! ```

mod scaler;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use drowse_api::ApiState;
use drowse_core::config::var_or;
use drowse_core::{CapacityScaler, IdleReaper, ReaperConfig, WorkflowDispatcher};
use drowse_dispatch::{GithubDispatcher, WorkflowTarget};
use drowse_probe::{HeartbeatRecorder, ProbeConfig};
use drowse_state::ParamStore;

use crate::scaler::{HttpScaler, NoopScaler};

#[derive(Parser)]
#[command(name = "drowsed", about = "drowse daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the recorder, reaper, and API in one process.
    Run {
        /// Port to listen on.
        #[arg(long, default_value = "8088")]
        port: u16,

        /// Data directory for the parameter store.
        #[arg(long, default_value = "/var/lib/drowse")]
        data_dir: PathBuf,

        /// Reaper tick interval in seconds.
        #[arg(long, default_value = "60")]
        reap_interval: u64,

        /// Heartbeat probe interval in seconds.
        #[arg(long, default_value = "30")]
        probe_interval: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,drowsed=debug,drowse=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            port,
            data_dir,
            reap_interval,
            probe_interval,
        } => run(port, data_dir, reap_interval, probe_interval).await,
    }
}

async fn run(
    port: u16,
    data_dir: PathBuf,
    reap_interval: u64,
    probe_interval: u64,
) -> anyhow::Result<()> {
    info!("drowse daemon starting");

    // Ensure data directory exists.
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("drowse.redb");

    // ── Initialize subsystems ──────────────────────────────────

    // Parameter store.
    let store = ParamStore::open(&db_path)?;
    info!(path = ?db_path, "parameter store opened");

    // Workflow dispatcher.
    let env = |var: &str| std::env::var(var).ok();
    let target = WorkflowTarget::from_env().context("workflow target configuration")?;
    let gh_api_base = var_or(&env, "DROWSE_GH_API_BASE", "https://api.github.com");
    let dispatcher: Arc<dyn WorkflowDispatcher> =
        Arc::new(GithubDispatcher::new(gh_api_base, target).context("dispatcher construction")?);
    info!("workflow dispatcher initialized");

    // Capacity scaler: HTTP when an endpoint is configured, no-op otherwise.
    let scaler: Arc<dyn CapacityScaler> = match env("DROWSE_SCALER_BASE") {
        Some(base) if !base.trim().is_empty() => {
            info!(%base, "capacity scaler initialized");
            Arc::new(HttpScaler::new(base)?)
        }
        _ => Arc::new(NoopScaler),
    };

    // Idle reaper.
    let reaper_config = ReaperConfig::from_env().context("reaper configuration")?;
    let reaper = IdleReaper::new(
        store.clone(),
        dispatcher.clone(),
        scaler,
        reaper_config.clone(),
    );
    info!(
        idle_minutes = reaper_config.idle_minutes,
        cooldown_seconds = reaper_config.cooldown_seconds,
        "idle reaper initialized"
    );

    // Heartbeat recorder.
    let probe_config = ProbeConfig::from_env().context("probe configuration")?;
    let status_param = probe_config.status_param.clone();
    let recorder = HeartbeatRecorder::new(store.clone(), probe_config)?;
    info!(interval = probe_interval, "heartbeat recorder initialized");

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let recorder_shutdown = shutdown_rx.clone();
    let reaper_shutdown = shutdown_rx.clone();

    // ── Start background tasks ─────────────────────────────────

    let recorder_handle = tokio::spawn(async move {
        recorder
            .run(Duration::from_secs(probe_interval), recorder_shutdown)
            .await;
    });

    let reaper_handle = tokio::spawn(async move {
        reaper
            .run(Duration::from_secs(reap_interval), reaper_shutdown)
            .await;
    });

    // ── Start API server ───────────────────────────────────────

    let router = drowse_api::build_router(ApiState {
        store,
        dispatcher,
        token_param: reaper_config.token_param,
        status_param,
        status_stale_after: Duration::from_secs(probe_interval * 3),
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

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
    let _ = recorder_handle.await;
    let _ = reaper_handle.await;

    info!("drowse daemon stopped");
    Ok(())
}
