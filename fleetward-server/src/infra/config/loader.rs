use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use super::{
    models::{
        AlertsConfig, Config, ConfigMetadata, CorsConfig, DatabaseConfig,
        DirectoryConfig, LedgerConfig, NotificationConfig, ServerConfig,
        TrackingConfig,
    },
    sources::{EnvConfig, FileConfig},
    validation::{ConfigWarnings, apply_guard_rails},
};

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] =
    ["fleetward.toml", "config/fleetward.toml"];

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Directory the default locations are resolved against.
    pub search_root: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_search_root<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.search_root = Some(path.into());
        self
    }

    /// Load `.env`, read the process environment, then compose.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let mut load = self.load_with_env(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Compose from an already gathered environment. No `.env` file is read.
    pub fn load_with_env(
        &self,
        env: EnvConfig,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        let (config, warnings) = compose_config(file_config, env, config_path);
        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigLoadError::MissingConfig { path });
                }
                path
            }
            None => {
                let root = self
                    .options
                    .search_root
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("."));
                match DEFAULT_CONFIG_LOCATIONS
                    .iter()
                    .map(|candidate| root.join(candidate))
                    .find(|candidate| candidate.exists())
                {
                    Some(path) => path,
                    None => return Ok((None, None)),
                }
            }
        };

        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
    toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source: err,
    })
}

fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
) -> (Config, ConfigWarnings) {
    let mut warnings = ConfigWarnings::default();

    if file_config.is_none() {
        warnings.push_with_hint(
            "No fleetward.toml detected; using defaults and environment variables",
            "Pass --config or set FLEETWARD_CONFIG to load a configuration file",
        );
    }

    for name in &env.rejected {
        warnings.push(format!("Ignoring {name}: value could not be parsed"));
    }

    let FileConfig {
        server: file_server,
        database: file_database,
        directory: file_directory,
        tracking: file_tracking,
        notifications: file_notifications,
        alerts: file_alerts,
        ledger: file_ledger,
        cors: file_cors,
    } = file_config.unwrap_or_default();

    let server_defaults = ServerConfig::default();
    let server = ServerConfig {
        host: env
            .server_host
            .or(file_server.host)
            .unwrap_or(server_defaults.host),
        port: env
            .server_port
            .or(file_server.port)
            .unwrap_or(server_defaults.port),
    };

    let database_defaults = DatabaseConfig::default();
    let max_connections = match env
        .database_max_connections
        .or(file_database.max_connections)
    {
        Some(0) => {
            warnings.push("database.max_connections must be positive; using the default");
            database_defaults.max_connections
        }
        Some(value) => value,
        None => database_defaults.max_connections,
    };
    let database = DatabaseConfig {
        url: env.database_url.or(file_database.url),
        max_connections,
    };

    let directory = DirectoryConfig {
        seed_path: env.directory_seed_path.or(file_directory.seed_path),
    };

    let tracking_defaults = TrackingConfig::default();
    let tracking = TrackingConfig {
        base_url: env.tracking_base_url.or(file_tracking.base_url),
        api_key: env.tracking_api_key.or(file_tracking.api_key),
        poll_interval_secs: env
            .tracking_poll_interval_secs
            .or(file_tracking.poll_interval_secs)
            .filter(|secs| *secs > 0),
        request_timeout_secs: file_tracking
            .request_timeout_secs
            .unwrap_or(tracking_defaults.request_timeout_secs),
    };

    let notification_defaults = NotificationConfig::default();
    let notifications = NotificationConfig {
        gateway_url: env.sms_gateway_url.or(file_notifications.gateway_url),
        api_key: env.sms_api_key.or(file_notifications.api_key),
        sender_id: env
            .sms_sender_id
            .or(file_notifications.sender_id)
            .unwrap_or(notification_defaults.sender_id),
        request_timeout_secs: file_notifications
            .request_timeout_secs
            .unwrap_or(notification_defaults.request_timeout_secs),
        queue_capacity: file_notifications
            .queue_capacity
            .unwrap_or(notification_defaults.queue_capacity),
        workers: file_notifications
            .workers
            .unwrap_or(notification_defaults.workers),
        max_attempts: file_notifications
            .max_attempts
            .unwrap_or(notification_defaults.max_attempts),
        retry_backoff_ms: file_notifications
            .retry_backoff_ms
            .unwrap_or(notification_defaults.retry_backoff_ms),
    };

    let alerts = AlertsConfig {
        emergency_contacts: env
            .emergency_contacts
            .unwrap_or(file_alerts.emergency_contacts),
    };

    let mut ledger = LedgerConfig {
        utc_offset_minutes: env
            .ledger_utc_offset_minutes
            .or(file_ledger.utc_offset_minutes),
    };
    if let Some(minutes) = ledger.utc_offset_minutes
        && ledger.fixed_offset().is_none()
    {
        warnings.push_with_hint(
            format!("ledger.utc_offset_minutes {minutes} is out of range; using the host offset"),
            "Offsets must lie strictly between -1440 and 1440 minutes",
        );
        ledger.utc_offset_minutes = None;
    }

    let cors = CorsConfig {
        allowed_origins: env
            .cors_allowed_origins
            .or(file_cors.allowed_origins)
            .unwrap_or_else(|| CorsConfig::default().allowed_origins),
    };

    let config = Config {
        server,
        database,
        directory,
        tracking,
        notifications,
        alerts,
        ledger,
        cors,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded: false,
        },
    };

    warnings.extend(apply_guard_rails(&config));
    (config, warnings)
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file {path} does not exist")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> EnvConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvConfig::from_lookup(|name| vars.get(name).cloned())
    }

    fn write_config(dir: &TempDir, relative: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn environment_overrides_file_values() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "fleetward.toml",
            r#"
            [server]
            port = 9000

            [database]
            url = "postgres://fleetward@localhost/fleetward"
            max_connections = 4

            [alerts]
            emergency_contacts = ["+254700000900"]

            [ledger]
            utc_offset_minutes = 180
            "#,
        );

        let load = ConfigLoader::new()
            .with_config_path(&path)
            .load_with_env(env_from(&[("SERVER_PORT", "9100")]))
            .unwrap();
        let config = load.config;

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(
            config.database.url.as_deref(),
            Some("postgres://fleetward@localhost/fleetward")
        );
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.alerts.emergency_contacts, vec!["+254700000900".to_string()]);
        assert_eq!(config.ledger.utc_offset_minutes, Some(180));
        assert_eq!(config.metadata.config_path, Some(path));
        assert!(!load.warnings.contains("No database configured"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = ConfigLoader::new()
            .with_config_path(&missing)
            .load_with_env(EnvConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::MissingConfig { path } if path == missing));
    }

    #[test]
    fn config_path_from_environment_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("env.toml");
        let env = env_from(&[("FLEETWARD_CONFIG", missing.to_str().unwrap())]);
        let err = ConfigLoader::new()
            .with_search_root(dir.path())
            .load_with_env(env)
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "fleetward.toml", "[server\nport = 1");
        let err = ConfigLoader::new()
            .with_config_path(&path)
            .load_with_env(EnvConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::Parse { .. }));
    }

    #[test]
    fn default_locations_are_searched_under_the_root() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "config/fleetward.toml",
            r#"
            [notifications]
            gateway_url = "https://sms.example/send"
            sender_id = "SCHOOLBUS"
            workers = 4
            "#,
        );

        let load = ConfigLoader::new()
            .with_search_root(dir.path())
            .load_with_env(EnvConfig::default())
            .unwrap();

        let notifications = load.config.notifications;
        assert_eq!(notifications.gateway_url.as_deref(), Some("https://sms.example/send"));
        assert_eq!(notifications.sender_id, "SCHOOLBUS");
        assert_eq!(notifications.workers, 4);
        assert_eq!(notifications.max_attempts, 3);
        assert!(!load.warnings.contains("No fleetward.toml detected"));
    }

    #[test]
    fn no_file_falls_back_to_defaults_with_a_warning() {
        let dir = TempDir::new().unwrap();
        let load = ConfigLoader::new()
            .with_search_root(dir.path())
            .load_with_env(EnvConfig::default())
            .unwrap();

        assert_eq!(load.config.server.port, 8080);
        assert!(load.config.database.url.is_none());
        assert!(load.config.metadata.config_path.is_none());
        assert!(load.warnings.contains("No fleetward.toml detected"));
        assert!(load.warnings.contains("No database configured"));
    }

    #[test]
    fn out_of_range_offset_is_dropped_with_a_warning() {
        let dir = TempDir::new().unwrap();
        let env = env_from(&[("LEDGER_UTC_OFFSET_MINUTES", "1440"), ("SERVER_PORT", "x")]);
        let load = ConfigLoader::new()
            .with_search_root(dir.path())
            .load_with_env(env)
            .unwrap();

        assert_eq!(load.config.ledger.utc_offset_minutes, None);
        assert!(load.warnings.contains("out of range"));
        assert!(load.warnings.contains("Ignoring SERVER_PORT"));
    }
}
