use async_trait::async_trait;
use tracing::info;

use super::{MessageTransport, OutboundMessage, TransportError};

/// Writes messages to the log instead of delivering them. Used when no SMS
/// gateway is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl MessageTransport for LogTransport {
    fn label(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        info!(
            kind = %message.kind,
            to = %message.to,
            reference = message.reference.as_deref().unwrap_or("-"),
            body = %message.body,
            "notification (log transport)"
        );
        Ok(())
    }
}
