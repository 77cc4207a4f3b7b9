use chrono::{DateTime, Utc};

use crate::{
    error::{ModelError, Result},
    ids::{LocationSampleId, UserId, VehicleId},
};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ModelError::CoordinateOutOfRange {
                field: "latitude",
                value: latitude,
            });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ModelError::CoordinateOutOfRange {
                field: "longitude",
                value: longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// One stored position reading for a vehicle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationSample {
    pub id: LocationSampleId,
    pub vehicle_id: VehicleId,
    pub device_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub direction: f64,
    pub speed: f64,
    pub state: Option<String>,
    pub movement_state: String,
    pub provider_timestamp: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
}

/// Whether an ingestion coalesced into the latest row or appended a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum IngestOutcome {
    UpdatedExisting,
    CreatedNew,
}

/// Merged per-vehicle view produced by a tracker sync.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct VehicleLocationView {
    #[cfg_attr(feature = "serde", serde(rename = "busId"))]
    pub vehicle_id: VehicleId,
    pub plate_number: String,
    pub driver_id: Option<UserId>,
    pub assistant_id: Option<UserId>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub direction: f64,
    pub speed: f64,
    pub movement_state: String,
    pub last_update: DateTime<Utc>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub device_id: Option<String>,
}
