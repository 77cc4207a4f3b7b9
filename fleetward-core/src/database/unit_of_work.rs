use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "database")]
use super::postgres::{
    PostgresDatabase, PostgresDirectory, PostgresLocationRepository,
    PostgresManifestRepository, PostgresPanicRepository,
};
use super::{
    memory::{
        MemoryDirectory, MemoryLocationStore, MemoryManifestStore,
        MemoryPanicStore,
    },
    ports::{
        directory::{StaffDirectory, SubjectDirectory, VehicleDirectory},
        locations::LocationRepository,
        manifests::ManifestRepository,
        panics::PanicRepository,
    },
};

/// Aggregates every repository port the engines use.
#[derive(Clone)]
pub struct AppUnitOfWork {
    pub vehicles: Arc<dyn VehicleDirectory>,
    pub subjects: Arc<dyn SubjectDirectory>,
    pub staff: Arc<dyn StaffDirectory>,

    pub manifests: Arc<dyn ManifestRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub panics: Arc<dyn PanicRepository>,
}

impl fmt::Debug for AppUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWork")
            .field("vehicles", &type_name_of_val(self.vehicles.as_ref()))
            .field("subjects", &type_name_of_val(self.subjects.as_ref()))
            .field("staff", &type_name_of_val(self.staff.as_ref()))
            .field("manifests", &type_name_of_val(self.manifests.as_ref()))
            .field("locations", &type_name_of_val(self.locations.as_ref()))
            .field("panics", &type_name_of_val(self.panics.as_ref()))
            .finish()
    }
}

impl AppUnitOfWork {
    /// Process-local stores over the given directory.
    pub fn in_memory(directory: Arc<MemoryDirectory>) -> Self {
        Self {
            vehicles: directory.clone(),
            subjects: directory.clone(),
            staff: directory,
            manifests: Arc::new(MemoryManifestStore::new()),
            locations: Arc::new(MemoryLocationStore::new()),
            panics: Arc::new(MemoryPanicStore::new()),
        }
    }

    #[cfg(feature = "database")]
    pub fn from_postgres(db: &PostgresDatabase) -> Self {
        let pool = db.pool().clone();
        let directory = Arc::new(PostgresDirectory::new(pool.clone()));
        Self {
            vehicles: directory.clone(),
            subjects: directory.clone(),
            staff: directory,
            manifests: Arc::new(PostgresManifestRepository::new(pool.clone())),
            locations: Arc::new(PostgresLocationRepository::new(pool.clone())),
            panics: Arc::new(PostgresPanicRepository::new(pool)),
        }
    }
}
