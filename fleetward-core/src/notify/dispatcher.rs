use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::sync::{Mutex, Notify, mpsc};
use tracing::{debug, info, warn};

use super::{MessageTransport, OutboundMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub queue_capacity: usize,
    pub workers: usize,
    /// Total delivery attempts per message, including the first.
    pub max_attempts: u32,
    /// Attempt `n` waits `retry_backoff * n` before retrying.
    pub retry_backoff: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            workers: 2,
            max_attempts: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub enqueued: u64,
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

#[derive(Default)]
struct Counters {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    /// Queued plus in flight.
    pending: AtomicUsize,
    idle: Notify,
}

impl Counters {
    fn finish_one(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Bounded background queue in front of a [`MessageTransport`].
///
/// `enqueue` never blocks and never fails the caller: a full queue drops the
/// message with a warning. Workers retry each message up to
/// `max_attempts` and then give up with a warning.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<OutboundMessage>,
    counters: Arc<Counters>,
    transport_name: &'static str,
}

impl fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("transport", &self.transport_name)
            .field("stats", &self.stats())
            .finish()
    }
}

impl NotificationDispatcher {
    /// Spawns the worker tasks on the current Tokio runtime.
    pub fn start(
        transport: Arc<dyn MessageTransport>,
        config: DispatcherConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<OutboundMessage>(config.queue_capacity.max(1));
        let counters = Arc::new(Counters::default());
        let transport_name = transport.label();

        let rx = Arc::new(Mutex::new(rx));
        let workers = config.workers.max(1);
        for worker_id in 0..workers {
            let rx = Arc::clone(&rx);
            let counters = Arc::clone(&counters);
            let transport = Arc::clone(&transport);
            tokio::spawn(async move {
                loop {
                    let message = {
                        let mut guard = rx.lock().await;
                        guard.recv().await
                    };
                    let Some(message) = message else { break };
                    deliver(transport.as_ref(), &message, &counters, config, worker_id)
                        .await;
                    counters.finish_one();
                }
                debug!(worker_id, "notification worker stopped");
            });
        }

        info!(
            workers,
            queue_capacity = config.queue_capacity,
            max_attempts = config.max_attempts,
            transport = transport_name,
            "notification dispatcher started"
        );

        Self {
            tx,
            counters,
            transport_name,
        }
    }

    /// Queue `message` for background delivery. Returns whether it was
    /// accepted.
    pub fn enqueue(&self, message: OutboundMessage) -> bool {
        self.counters.pending.fetch_add(1, Ordering::AcqRel);
        match self.tx.try_send(message) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(err) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                self.counters.finish_one();
                let message = match &err {
                    mpsc::error::TrySendError::Full(message)
                    | mpsc::error::TrySendError::Closed(message) => message,
                };
                warn!(
                    kind = %message.kind,
                    to = %message.to,
                    error = %err,
                    "dropped notification (queue full or closed)"
                );
                false
            }
        }
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    /// Resolves once nothing is queued or in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.counters.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.counters.pending.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

async fn deliver(
    transport: &dyn MessageTransport,
    message: &OutboundMessage,
    counters: &Counters,
    config: DispatcherConfig,
    worker_id: usize,
) {
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match transport.send(message).await {
            Ok(()) => {
                counters.delivered.fetch_add(1, Ordering::Relaxed);
                debug!(
                    worker_id,
                    kind = %message.kind,
                    reference = message.reference.as_deref().unwrap_or("-"),
                    attempt,
                    "notification delivered"
                );
                return;
            }
            Err(err) if attempt < max_attempts => {
                warn!(
                    worker_id,
                    kind = %message.kind,
                    attempt,
                    max_attempts,
                    error = %err,
                    "notification delivery failed; retrying"
                );
                tokio::time::sleep(config.retry_backoff * attempt).await;
                attempt += 1;
            }
            Err(err) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    worker_id,
                    kind = %message.kind,
                    reference = message.reference.as_deref().unwrap_or("-"),
                    attempts = attempt,
                    error = %err,
                    "notification abandoned after retries"
                );
                return;
            }
        }
    }
}
