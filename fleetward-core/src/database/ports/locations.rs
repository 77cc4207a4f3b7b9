use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fleetward_model::{IngestOutcome, LocationSample, VehicleId};

use crate::error::Result;

/// A normalized position report ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFix {
    pub vehicle_id: VehicleId,
    pub device_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub direction: f64,
    pub speed: f64,
    pub state: Option<String>,
    pub movement_state: String,
    pub provider_timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Coalesce `fix` into the vehicle's latest row when that row was ingested
    /// less than `window` before `now`, otherwise append a new row. Runs as a
    /// critical section keyed by vehicle; concurrent callers for the same
    /// vehicle serialize and the last writer wins on a coalesced row.
    async fn record_debounced(
        &self,
        fix: LocationFix,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<(LocationSample, IngestOutcome)>;

    async fn latest(&self, vehicle_id: VehicleId)
    -> Result<Option<LocationSample>>;

    /// Newest first.
    async fn history(
        &self,
        vehicle_id: VehicleId,
        limit: usize,
    ) -> Result<Vec<LocationSample>>;
}
