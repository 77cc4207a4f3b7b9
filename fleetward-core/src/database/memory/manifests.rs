use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use fleetward_model::{ManifestEntry, ManifestEntryId, VehicleId};
use tokio::sync::Mutex;

use crate::{
    database::ports::manifests::{
        ManifestDedupKey, ManifestRepository, ManifestWrite,
    },
    error::Result,
};

#[derive(Debug, Default)]
struct Ledger {
    entries: HashMap<ManifestEntryId, ManifestEntry>,
    keys: HashMap<ManifestDedupKey, ManifestEntryId>,
}

/// Dedup keys and entries share one lock, which plays the part of the unique
/// index.
#[derive(Debug, Default)]
pub struct MemoryManifestStore {
    ledger: Mutex<Ledger>,
}

impl MemoryManifestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.ledger.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ManifestRepository for MemoryManifestStore {
    async fn insert_if_absent(
        &self,
        entry: ManifestEntry,
    ) -> Result<ManifestWrite> {
        let key = ManifestDedupKey::of(&entry);
        let mut ledger = self.ledger.lock().await;
        if ledger.keys.contains_key(&key) {
            return Ok(ManifestWrite::Duplicate);
        }
        ledger.keys.insert(key, entry.id);
        ledger.entries.insert(entry.id, entry.clone());
        Ok(ManifestWrite::Stored(entry))
    }

    async fn get(&self, id: ManifestEntryId) -> Result<Option<ManifestEntry>> {
        Ok(self.ledger.lock().await.entries.get(&id).cloned())
    }

    async fn update(
        &self,
        entry: ManifestEntry,
    ) -> Result<Option<ManifestWrite>> {
        let mut ledger = self.ledger.lock().await;
        let Some(previous) = ledger.entries.get(&entry.id).cloned() else {
            return Ok(None);
        };

        let old_key = ManifestDedupKey::of(&previous);
        let new_key = ManifestDedupKey::of(&entry);
        if old_key != new_key {
            if ledger.keys.contains_key(&new_key) {
                return Ok(Some(ManifestWrite::Duplicate));
            }
            ledger.keys.remove(&old_key);
            ledger.keys.insert(new_key, entry.id);
        }
        ledger.entries.insert(entry.id, entry.clone());
        Ok(Some(ManifestWrite::Stored(entry)))
    }

    async fn list_for_vehicle_day(
        &self,
        vehicle_id: VehicleId,
        service_day: NaiveDate,
    ) -> Result<Vec<ManifestEntry>> {
        let ledger = self.ledger.lock().await;
        let mut entries: Vec<ManifestEntry> = ledger
            .entries
            .values()
            .filter(|entry| {
                entry.vehicle_id == vehicle_id
                    && entry.service_day == service_day
            })
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.created_at);
        Ok(entries)
    }
}
