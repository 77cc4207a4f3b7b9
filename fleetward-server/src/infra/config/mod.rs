pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    AlertsConfig, Config, ConfigMetadata, CorsConfig, DatabaseConfig,
    DirectoryConfig, LedgerConfig, NotificationConfig, ServerConfig,
    TrackingConfig,
};
pub use validation::{ConfigWarning, ConfigWarnings};
