//! # Fleetward Server
//!
//! Custody and whereabouts service for school transport and tagged assets.
//!
//! ## Overview
//!
//! - **Manifests**: check-in/check-out records, once per subject, bus, session
//!   and day, with a guardian SMS for each transition
//! - **Live locations**: tracker webhook ingestion with a short debounce, an
//!   on-demand merged view of the fleet, and an optional background poller
//! - **Panic alerts**: per-user cooldown and emergency SMS fan-out
//!
//! PostgreSQL is used when `DATABASE_URL` is set; otherwise everything runs on
//! in-memory stores.

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser};
use fleetward_core::time::SystemClock;
use fleetward_server::{
    create_app,
    infra::{
        app_state::{AppDependencies, AppState},
        config::{Config, ConfigLoad, ConfigLoader},
        startup,
    },
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const NOTIFICATION_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "fleetward-server")]
#[command(
    about = "Manifest, live-location and panic-alert service for vehicle fleets"
)]
struct Cli {
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "FLEETWARD_CONFIG")]
    config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_server(cli.serve).await
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &args.env_file {
        loader = loader.with_env_file(path);
    }

    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,fleetward=info,tower_http=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }

    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => {
                warn!(message = %warning.message, "configuration warning")
            }
        }
    }

    Ok(config)
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(&args)?;

    let (unit_of_work, storage) = startup::open_storage(&config).await?;
    let transport = startup::build_transport(&config.notifications)?;
    let tracking = startup::build_tracking_provider(&config.tracking)?;
    let bind = (config.server.host.clone(), config.server.port);

    let state = AppState::assemble(
        config,
        AppDependencies {
            unit_of_work,
            storage,
            transport,
            tracking,
            clock: Arc::new(SystemClock),
        },
    );
    info!(
        offset = %state.ledger.offset(),
        "manifest sessions and service days use this UTC offset"
    );

    let cancel = CancellationToken::new();
    let background = startup::spawn_background_tasks(&state, &cancel);

    let listener = tokio::net::TcpListener::bind((bind.0.as_str(), bind.1))
        .await
        .with_context(|| format!("failed to bind {}:{}", bind.0, bind.1))?;
    let addr = listener.local_addr().context("listener has no local address")?;
    info!(%addr, storage = state.storage.as_str(), "fleetward server listening");

    let app = create_app(state.clone());
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    cancel.cancel();
    for handle in background {
        if let Err(err) = handle.await {
            warn!(error = %err, "background task ended abnormally");
        }
    }

    match tokio::time::timeout(NOTIFICATION_DRAIN_TIMEOUT, state.notifier.wait_idle())
        .await
    {
        Ok(()) => info!(stats = ?state.notifier.stats(), "notification queue drained"),
        Err(_) => warn!(
            stats = ?state.notifier.stats(),
            "timed out draining notification queue"
        ),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
