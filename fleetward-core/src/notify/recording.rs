use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;

use super::{MessageTransport, OutboundMessage, TransportError};

/// Keeps every delivery attempt in memory. Can be switched to fail every
/// attempt.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    attempts: Mutex<Vec<OutboundMessage>>,
    failing: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let transport = Self::default();
        transport.set_failing(true);
        transport
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every attempt, successful or not, in arrival order.
    pub fn attempts(&self) -> Vec<OutboundMessage> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    fn label(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());

        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable(
                "recording transport set to fail".to_string(),
            ));
        }
        Ok(())
    }
}
