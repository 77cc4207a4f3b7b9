use std::{path::PathBuf, time::Duration};

use chrono::FixedOffset;
use fleetward_core::notify::DispatcherConfig;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub directory: DirectoryConfig,
    pub tracking: TrackingConfig,
    pub notifications: NotificationConfig,
    pub alerts: AlertsConfig,
    pub ledger: LedgerConfig,
    pub cors: CorsConfig,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// In-memory stores are used when unset.
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

/// Seed for the in-memory directory when running without a database.
#[derive(Debug, Clone, Default)]
pub struct DirectoryConfig {
    pub seed_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct TrackingConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub request_timeout_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            poll_interval_secs: None,
            request_timeout_secs: 10,
        }
    }
}

impl TrackingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// Messages are only logged when unset.
    pub gateway_url: Option<String>,
    pub api_key: Option<String>,
    pub sender_id: String,
    pub request_timeout_secs: u64,
    pub queue_capacity: usize,
    pub workers: usize,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        let dispatcher = DispatcherConfig::default();
        Self {
            gateway_url: None,
            api_key: None,
            sender_id: "FLEETWARD".to_string(),
            request_timeout_secs: 10,
            queue_capacity: dispatcher.queue_capacity,
            workers: dispatcher.workers,
            max_attempts: dispatcher.max_attempts,
            retry_backoff_ms: 500,
        }
    }
}

impl NotificationConfig {
    pub fn dispatcher(&self) -> DispatcherConfig {
        DispatcherConfig {
            queue_capacity: self.queue_capacity,
            workers: self.workers,
            max_attempts: self.max_attempts,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlertsConfig {
    pub emergency_contacts: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LedgerConfig {
    /// Host local offset at startup when unset.
    pub utc_offset_minutes: Option<i32>,
}

impl LedgerConfig {
    pub fn fixed_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .and_then(|minutes| FixedOffset::east_opt(minutes * 60))
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

impl CorsConfig {
    pub fn is_wildcard_included(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
