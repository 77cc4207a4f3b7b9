use std::{fmt, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use super::{MessageTransport, OutboundMessage, TransportError};

/// JSON SMS gateway client: `POST <gateway_url>` with
/// `{"to", "from", "message"}` and a bearer API key.
#[derive(Clone)]
pub struct HttpSmsTransport {
    http: reqwest::Client,
    gateway_url: Url,
    api_key: Option<String>,
    sender_id: String,
}

impl fmt::Debug for HttpSmsTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSmsTransport")
            .field("gateway_url", &self.gateway_url.as_str())
            .field("sender_id", &self.sender_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct SmsPayload<'a> {
    to: &'a str,
    from: &'a str,
    message: &'a str,
}

impl HttpSmsTransport {
    pub fn new(
        gateway_url: &str,
        api_key: Option<String>,
        sender_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let gateway_url = Url::parse(gateway_url).map_err(|err| {
            TransportError::Unavailable(format!(
                "invalid SMS gateway url {gateway_url:?}: {err}"
            ))
        })?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            gateway_url,
            api_key,
            sender_id: sender_id.into(),
        })
    }
}

#[async_trait]
impl MessageTransport for HttpSmsTransport {
    fn label(&self) -> &'static str {
        "sms"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        let payload = SmsPayload {
            to: &message.to,
            from: &self.sender_id,
            message: &message.body,
        };

        let mut request = self.http.post(self.gateway_url.clone()).json(&payload);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
