use async_trait::async_trait;
use fleetward_model::{
    StaffMember, Subject, SubjectRef, UserId, Vehicle, VehicleId,
};

use crate::error::Result;

#[async_trait]
pub trait VehicleDirectory: Send + Sync {
    async fn get(&self, id: VehicleId) -> Result<Option<Vehicle>>;

    /// Exact match on the trimmed plate string. No case folding or fuzzy
    /// matching happens here.
    async fn find_by_plate(&self, plate: &str) -> Result<Option<Vehicle>>;

    async fn list(&self) -> Result<Vec<Vehicle>>;
}

#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    async fn get(&self, subject: SubjectRef) -> Result<Option<Subject>>;
}

#[async_trait]
pub trait StaffDirectory: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<StaffMember>>;
}
