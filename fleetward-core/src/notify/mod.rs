//! Outbound notifications: message contract, transports and the background
//! dispatcher that isolates delivery from the request path.

mod dispatcher;
mod log;
mod recording;
mod sms;

use std::fmt;

use async_trait::async_trait;

pub use dispatcher::{DispatchStats, DispatcherConfig, NotificationDispatcher};
pub use log::LogTransport;
pub use recording::RecordingTransport;
pub use sms::HttpSmsTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    ManifestTransition,
    EmergencyAlert,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::ManifestTransition => "manifest_transition",
            MessageKind::EmergencyAlert => "emergency_alert",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub kind: MessageKind,
    /// Destination phone number.
    pub to: String,
    pub body: String,
    /// Id of the record that caused the message, for log correlation.
    pub reference: Option<String>,
}

impl OutboundMessage {
    pub fn new(
        kind: MessageKind,
        to: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            to: to.into(),
            body: body.into(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl ToString) -> Self {
        self.reference = Some(reference.to_string());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("gateway rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Delivers one message and reports success or failure.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Short name for logs.
    fn label(&self) -> &'static str;

    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError>;
}
