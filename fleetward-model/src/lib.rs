//! Core data model definitions shared across Fleetward crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod api_routes;
#[cfg(feature = "serde")]
pub mod api_types;
pub mod directory;
pub mod error;
pub mod ids;
pub mod location;
pub mod manifest;
pub mod panic;
pub mod subject;
pub mod timestamps;

// Intentionally curated re-exports for downstream consumers.
pub use directory::{StaffMember, StaffRole, Subject, Vehicle};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{
    AssetId, LocationSampleId, ManifestEntryId, PanicEventId, StudentId,
    TenantId, UserId, VehicleId,
};
pub use location::{
    IngestOutcome, LocationSample, Position, VehicleLocationView,
};
pub use manifest::{ManifestEntry, ManifestEventKind, Session};
pub use panic::{PANIC_COOLDOWN_SECS, PanicEvent, PanicStatus};
pub use subject::{SubjectKind, SubjectRef};
pub use timestamps::TimestampInput;
