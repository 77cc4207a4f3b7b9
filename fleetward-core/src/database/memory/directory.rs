use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use fleetward_model::{
    StaffMember, Subject, SubjectRef, UserId, Vehicle, VehicleId,
};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::{
    database::ports::directory::{
        StaffDirectory, SubjectDirectory, VehicleDirectory,
    },
    error::{CoreError, Result},
};

/// Directory contents loaded from a JSON file for database-less runs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DirectorySeed {
    pub vehicles: Vec<Vehicle>,
    pub subjects: Vec<Subject>,
    pub staff: Vec<StaffMember>,
}

impl DirectorySeed {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|err| {
            CoreError::Internal(format!("invalid directory seed: {err}"))
        })
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|err| {
            CoreError::Internal(format!(
                "failed to read directory seed {}: {err}",
                path.display()
            ))
        })?;
        Self::from_json(&raw)
    }
}

#[derive(Debug, Default)]
pub struct MemoryDirectory {
    vehicles: RwLock<HashMap<VehicleId, Vehicle>>,
    subjects: RwLock<HashMap<SubjectRef, Subject>>,
    staff: RwLock<HashMap<UserId, StaffMember>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn from_seed(seed: DirectorySeed) -> Self {
        let directory = Self::new();
        for vehicle in seed.vehicles {
            directory.upsert_vehicle(vehicle).await;
        }
        for subject in seed.subjects {
            directory.upsert_subject(subject).await;
        }
        for member in seed.staff {
            directory.upsert_staff(member).await;
        }
        directory
    }

    pub async fn upsert_vehicle(&self, vehicle: Vehicle) {
        self.vehicles.write().await.insert(vehicle.id, vehicle);
    }

    pub async fn upsert_subject(&self, subject: Subject) {
        self.subjects.write().await.insert(subject.reference, subject);
    }

    pub async fn upsert_staff(&self, member: StaffMember) {
        self.staff.write().await.insert(member.id, member);
    }
}

#[async_trait]
impl VehicleDirectory for MemoryDirectory {
    async fn get(&self, id: VehicleId) -> Result<Option<Vehicle>> {
        Ok(self.vehicles.read().await.get(&id).cloned())
    }

    /// Shared plates resolve to the lowest id, which for v7 ids is the
    /// oldest vehicle.
    async fn find_by_plate(&self, plate: &str) -> Result<Option<Vehicle>> {
        let plate = plate.trim();
        Ok(self
            .vehicles
            .read()
            .await
            .values()
            .filter(|vehicle| vehicle.plate_number.trim() == plate)
            .min_by_key(|vehicle| vehicle.id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Vehicle>> {
        let mut vehicles: Vec<Vehicle> =
            self.vehicles.read().await.values().cloned().collect();
        vehicles.sort_by(|a, b| {
            a.plate_number.cmp(&b.plate_number).then(a.id.cmp(&b.id))
        });
        Ok(vehicles)
    }
}

#[async_trait]
impl SubjectDirectory for MemoryDirectory {
    async fn get(&self, subject: SubjectRef) -> Result<Option<Subject>> {
        Ok(self.subjects.read().await.get(&subject).cloned())
    }
}

#[async_trait]
impl StaffDirectory for MemoryDirectory {
    async fn get(&self, id: UserId) -> Result<Option<StaffMember>> {
        Ok(self.staff.read().await.get(&id).cloned())
    }
}
