use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use fleetward_model::{IngestOutcome, LocationSample, VehicleId};
use tokio::sync::Mutex;

use crate::{
    database::ports::locations::{LocationFix, LocationRepository},
    domain::location::{apply_fix, coalesces_into, sample_from_fix},
    error::Result,
};

type History = Arc<Mutex<Vec<LocationSample>>>;

/// Per-vehicle history, oldest first, each behind its own lock.
#[derive(Debug, Default)]
pub struct MemoryLocationStore {
    histories: DashMap<VehicleId, History>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn history_for(&self, vehicle_id: VehicleId) -> History {
        // Clone the Arc out so no map shard guard is held across an await.
        self.histories.entry(vehicle_id).or_default().clone()
    }
}

#[async_trait]
impl LocationRepository for MemoryLocationStore {
    async fn record_debounced(
        &self,
        fix: LocationFix,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<(LocationSample, IngestOutcome)> {
        let history = self.history_for(fix.vehicle_id);
        let mut rows = history.lock().await;

        if let Some(latest) = rows.last_mut()
            && coalesces_into(latest, now, window)
        {
            apply_fix(latest, fix, now);
            return Ok((latest.clone(), IngestOutcome::UpdatedExisting));
        }

        let sample = sample_from_fix(fix, now);
        rows.push(sample.clone());
        Ok((sample, IngestOutcome::CreatedNew))
    }

    async fn latest(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<Option<LocationSample>> {
        let Some(history) =
            self.histories.get(&vehicle_id).map(|entry| entry.clone())
        else {
            return Ok(None);
        };
        let rows = history.lock().await;
        Ok(rows.last().cloned())
    }

    async fn history(
        &self,
        vehicle_id: VehicleId,
        limit: usize,
    ) -> Result<Vec<LocationSample>> {
        let Some(history) =
            self.histories.get(&vehicle_id).map(|entry| entry.clone())
        else {
            return Ok(Vec::new());
        };
        let rows = history.lock().await;
        Ok(rows.iter().rev().take(limit).cloned().collect())
    }
}
