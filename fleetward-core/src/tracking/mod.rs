//! Fleet-tracking provider contract and its HTTP client.

mod http;
mod parse;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use http::HttpTrackingProvider;
pub use parse::{parse_unit, parse_units};

/// One unit as reported by the tracking provider. Every numeric field is
/// optional because the feed is not trusted to be well-typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerUnit {
    /// Vehicle registration; the correlation key to [`fleetward_model::Vehicle`].
    pub plate: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub direction: Option<f64>,
    pub speed: Option<f64>,
    pub movement_state: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    pub device_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("tracking API error: {0}")]
    Api(String),

    #[error("tracking API rejected the API key")]
    InvalidApiKey,

    /// Stored without its URL; the units URL carries the API key.
    #[error("network error: {0}")]
    Network(reqwest::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TrackingError {
    fn from(err: reqwest::Error) -> Self {
        TrackingError::Network(err.without_url())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackingProvider: Send + Sync {
    /// Latest feed entry for every unit on the account.
    async fn fetch_units(&self) -> Result<Vec<TrackerUnit>, TrackingError>;
}
