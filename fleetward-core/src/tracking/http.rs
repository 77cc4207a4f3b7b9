use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use super::{TrackerUnit, TrackingError, TrackingProvider, parse_units};

/// Pulls the unit list from the fleet-tracking HTTP API.
#[derive(Clone)]
pub struct HttpTrackingProvider {
    http: reqwest::Client,
    units_url: Url,
    api_key: String,
}

impl fmt::Debug for HttpTrackingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTrackingProvider")
            .field("units_url", &self.units_url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl HttpTrackingProvider {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TrackingError> {
        let mut base = Url::parse(base_url).map_err(|err| {
            TrackingError::Api(format!("invalid tracking base url {base_url:?}: {err}"))
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let units_url = base.join("units").map_err(|err| {
            TrackingError::Api(format!("invalid tracking base url {base_url:?}: {err}"))
        })?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            units_url,
            api_key: api_key.into(),
        })
    }

    pub fn units_url(&self) -> &Url {
        &self.units_url
    }
}

#[async_trait]
impl TrackingProvider for HttpTrackingProvider {
    async fn fetch_units(&self) -> Result<Vec<TrackerUnit>, TrackingError> {
        let response = self
            .http
            .get(self.units_url.clone())
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(TrackingError::from)?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(TrackingError::InvalidApiKey);
        }
        if !status.is_success() {
            return Err(TrackingError::Api(format!(
                "tracking request failed with status {status}"
            )));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(TrackingError::from)?;
        parse_units(&body)
    }
}
