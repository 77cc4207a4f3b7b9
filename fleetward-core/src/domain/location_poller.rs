use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::location::LocationReconciler;

/// Runs `sync_and_persist` every `interval` until `cancel` fires.
#[derive(Debug, Clone)]
pub struct LocationPoller {
    reconciler: LocationReconciler,
    interval: Duration,
}

impl LocationPoller {
    pub fn new(reconciler: LocationReconciler, interval: Duration) -> Self {
        Self {
            reconciler,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.interval.as_secs(),
            "location poller started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.reconciler.sync_and_persist().await {
                Ok(summary) => info!(
                    created = summary.created,
                    updated = summary.updated,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "location poll complete"
                ),
                Err(err) => warn!(error = %err, "location poll failed"),
            }
        }

        info!("location poller stopped");
    }

    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
