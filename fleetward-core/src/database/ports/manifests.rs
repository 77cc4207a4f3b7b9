use async_trait::async_trait;
use chrono::NaiveDate;
use fleetward_model::{
    ManifestEntry, ManifestEntryId, ManifestEventKind, Session, SubjectRef,
    VehicleId,
};

use crate::error::Result;

/// At most one manifest entry may exist per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManifestDedupKey {
    pub subject: SubjectRef,
    pub vehicle_id: VehicleId,
    pub event_kind: ManifestEventKind,
    pub session: Session,
    pub service_day: NaiveDate,
}

impl ManifestDedupKey {
    pub fn of(entry: &ManifestEntry) -> Self {
        Self {
            subject: entry.subject,
            vehicle_id: entry.vehicle_id,
            event_kind: entry.event_kind,
            session: entry.session,
            service_day: entry.service_day,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ManifestWrite {
    Stored(ManifestEntry),
    /// Another entry already holds the dedup key; nothing was written.
    Duplicate,
}

#[async_trait]
pub trait ManifestRepository: Send + Sync {
    /// Insert `entry` unless its dedup key is taken. The check and the insert
    /// are one atomic step.
    async fn insert_if_absent(&self, entry: ManifestEntry)
    -> Result<ManifestWrite>;

    async fn get(&self, id: ManifestEntryId) -> Result<Option<ManifestEntry>>;

    /// Replace the mutable fields of an existing entry. Returns `Duplicate`
    /// when the corrected entry would collide with another one's key, and
    /// `Ok(None)` when `entry.id` does not exist.
    async fn update(&self, entry: ManifestEntry)
    -> Result<Option<ManifestWrite>>;

    async fn list_for_vehicle_day(
        &self,
        vehicle_id: VehicleId,
        service_day: NaiveDate,
    ) -> Result<Vec<ManifestEntry>>;
}
