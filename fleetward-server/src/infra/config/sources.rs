use serde::{Deserialize, Serialize};
use std::{path::PathBuf, str::FromStr};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub directory: FileDirectoryConfig,
    #[serde(default)]
    pub tracking: FileTrackingConfig,
    #[serde(default)]
    pub notifications: FileNotificationConfig,
    #[serde(default)]
    pub alerts: FileAlertsConfig,
    #[serde(default)]
    pub ledger: FileLedgerConfig,
    #[serde(default)]
    pub cors: FileCorsConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDirectoryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_path: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileTrackingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileNotificationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_backoff_ms: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileAlertsConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emergency_contacts: Vec<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileLedgerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCorsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_url: Option<String>,
    pub database_max_connections: Option<u32>,
    pub directory_seed_path: Option<PathBuf>,
    pub tracking_base_url: Option<String>,
    pub tracking_api_key: Option<String>,
    pub tracking_poll_interval_secs: Option<u64>,
    pub sms_gateway_url: Option<String>,
    pub sms_api_key: Option<String>,
    pub sms_sender_id: Option<String>,
    pub emergency_contacts: Option<Vec<String>>,
    pub ledger_utc_offset_minutes: Option<i32>,
    pub cors_allowed_origins: Option<Vec<String>>,
    /// Variables that were set but could not be parsed.
    pub rejected: Vec<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name lookup; `gather` reads the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env_config = Self::default();
        let text = |name: &str| {
            lookup(name).filter(|value| !value.trim().is_empty())
        };

        env_config.config_path = text("FLEETWARD_CONFIG").map(PathBuf::from);
        env_config.server_host = text("SERVER_HOST");
        env_config.server_port =
            parse_var(&lookup, "SERVER_PORT", &mut env_config.rejected);
        env_config.database_url = text("DATABASE_URL");
        env_config.database_max_connections = parse_var(
            &lookup,
            "DATABASE_MAX_CONNECTIONS",
            &mut env_config.rejected,
        );
        env_config.directory_seed_path =
            text("DIRECTORY_SEED_PATH").map(PathBuf::from);
        env_config.tracking_base_url = text("TRACKING_BASE_URL");
        env_config.tracking_api_key = text("TRACKING_API_KEY");
        env_config.tracking_poll_interval_secs = parse_var(
            &lookup,
            "TRACKING_POLL_INTERVAL_SECS",
            &mut env_config.rejected,
        );
        env_config.sms_gateway_url = text("SMS_GATEWAY_URL");
        env_config.sms_api_key = text("SMS_API_KEY");
        env_config.sms_sender_id = text("SMS_SENDER_ID");
        env_config.emergency_contacts =
            lookup("EMERGENCY_CONTACTS").map(|raw| split_csv(&raw));
        env_config.ledger_utc_offset_minutes = parse_var(
            &lookup,
            "LEDGER_UTC_OFFSET_MINUTES",
            &mut env_config.rejected,
        );
        env_config.cors_allowed_origins =
            lookup("CORS_ALLOWED_ORIGINS").map(|raw| split_csv(&raw));

        env_config
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, rejected: &mut Vec<String>) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            rejected.push(name.to_string());
            None
        }
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|part| {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}
