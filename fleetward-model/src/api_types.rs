//! Request and response bodies for the HTTP surface.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    directory::{StaffMember, Subject, Vehicle},
    ids::{AssetId, PanicEventId, StudentId, UserId, VehicleId},
    location::{IngestOutcome, LocationSample},
    manifest::ManifestEntry,
    panic::PanicStatus,
    timestamps::TimestampInput,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateManifestRequest {
    pub student_id: Option<StudentId>,
    pub asset_id: Option<AssetId>,
    #[serde(alias = "vehicleId")]
    pub bus_id: Option<VehicleId>,
    pub assistant_id: Option<UserId>,
    pub status: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub session: Option<String>,
}

/// `?day=YYYY-MM-DD`; today in the ledger's offset when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestDayQuery {
    pub day: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManifestRequest {
    pub status: Option<String>,
    pub session: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A manifest entry joined with the records it references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRecord {
    #[serde(flatten)]
    pub entry: ManifestEntry,
    #[serde(rename = "subjectDetails")]
    pub subject: Subject,
    #[serde(rename = "bus")]
    pub vehicle: Vehicle,
    pub assistant: StaffMember,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedState {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestLocationRequest {
    pub unit_id: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub direction: Option<f64>,
    pub speed: Option<f64>,
    pub state: Option<NamedState>,
    pub movement_state: Option<NamedState>,
    pub last_update: Option<TimestampInput>,
    pub box_id: Option<DeviceIdInput>,
}

/// Tracker device id; some firmware sends it as a bare number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceIdInput {
    Text(String),
    Number(i64),
}

impl DeviceIdInput {
    /// Normalized text form, or `None` when blank.
    pub fn into_device_id(self) -> Option<String> {
        match self {
            DeviceIdInput::Text(raw) => {
                let trimmed = raw.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            DeviceIdInput::Number(value) => Some(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestLocationResponse {
    #[serde(flatten)]
    pub sample: LocationSample,
    pub outcome: IngestOutcome,
    pub updated_existing: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanicTriggerRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub child_id: Option<StudentId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanicTriggerResponse {
    pub panic_id: PanicEventId,
    pub status: PanicStatus,
    pub triggered_at: DateTime<Utc>,
    /// Cooldown window in seconds, for client-side countdowns.
    pub cooldown: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanicCooldownResponse {
    pub active: bool,
    /// Zero when the caller may trigger now.
    pub remaining_secs: i64,
    pub cooldown: i64,
}
