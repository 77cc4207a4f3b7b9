use std::sync::Arc;

use anyhow::{Context, Result};
use fleetward_core::{
    AppUnitOfWork,
    database::{
        PostgresDatabase,
        memory::{DirectorySeed, MemoryDirectory},
    },
    domain::location_poller::LocationPoller,
    notify::{HttpSmsTransport, LogTransport, MessageTransport},
    tracking::{HttpTrackingProvider, TrackingProvider},
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::infra::{
    app_state::{AppState, StorageMode},
    config::{Config, DirectoryConfig, NotificationConfig, TrackingConfig},
};

/// PostgreSQL when a URL is configured (migrations applied), else the
/// in-memory stores over an optionally seeded directory.
pub async fn open_storage(config: &Config) -> Result<(AppUnitOfWork, StorageMode)> {
    if let Some(url) = config.database.url.as_deref() {
        let db = PostgresDatabase::connect(url, config.database.max_connections)
            .await
            .context("failed to connect to PostgreSQL")?;
        db.migrate().await.context("database migration failed")?;
        info!(?db, "using PostgreSQL storage");
        return Ok((AppUnitOfWork::from_postgres(&db), StorageMode::Postgres));
    }

    let directory = memory_directory(&config.directory).await?;
    warn!("DATABASE_URL not set; records are kept in memory and lost on restart");
    Ok((
        AppUnitOfWork::in_memory(Arc::new(directory)),
        StorageMode::Memory,
    ))
}

async fn memory_directory(config: &DirectoryConfig) -> Result<MemoryDirectory> {
    let Some(path) = config.seed_path.as_deref() else {
        return Ok(MemoryDirectory::new());
    };
    let seed = DirectorySeed::load(path)
        .await
        .with_context(|| format!("failed to load directory seed {}", path.display()))?;
    info!(
        path = %path.display(),
        vehicles = seed.vehicles.len(),
        subjects = seed.subjects.len(),
        staff = seed.staff.len(),
        "directory seeded"
    );
    Ok(MemoryDirectory::from_seed(seed).await)
}

pub fn build_transport(
    config: &NotificationConfig,
) -> Result<Arc<dyn MessageTransport>> {
    match config.gateway_url.as_deref() {
        Some(url) => {
            let transport = HttpSmsTransport::new(
                url,
                config.api_key.clone(),
                config.sender_id.clone(),
                config.request_timeout(),
            )
            .context("failed to build SMS transport")?;
            info!(?transport, "SMS gateway configured");
            Ok(Arc::new(transport))
        }
        None => Ok(Arc::new(LogTransport)),
    }
}

pub fn build_tracking_provider(
    config: &TrackingConfig,
) -> Result<Option<Arc<dyn TrackingProvider>>> {
    let (Some(base_url), Some(api_key)) =
        (config.base_url.as_deref(), config.api_key.clone())
    else {
        return Ok(None);
    };

    let provider =
        HttpTrackingProvider::new(base_url, api_key, config.request_timeout())
            .context("failed to build tracking provider")?;
    info!(?provider, "tracking provider configured");
    Ok(Some(Arc::new(provider)))
}

/// Starts the location poller when an interval and a provider are both set.
pub fn spawn_background_tasks(
    state: &AppState,
    cancel: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();

    if let Some(interval) = state.config().tracking.poll_interval() {
        if state.locations.has_provider() {
            let poller = LocationPoller::new(state.locations.clone(), interval);
            handles.push(poller.spawn(cancel.child_token()));
        } else {
            warn!("location polling requested but no tracking provider is configured");
        }
    }

    handles
}
