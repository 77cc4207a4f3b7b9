//! Read-side snapshots of the records owned by the tenant/user/vehicle CRUD
//! services. Fleetward never writes these.

use std::fmt;

use crate::{
    error::{ModelError, Result},
    ids::{TenantId, UserId, VehicleId},
    subject::SubjectRef,
};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Vehicle {
    pub id: VehicleId,
    pub tenant_id: TenantId,
    /// Registration string; the correlation key against the tracker feed.
    pub plate_number: String,
    pub driver_id: Option<UserId>,
    pub assistant_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Subject {
    pub reference: SubjectRef,
    pub tenant_id: TenantId,
    pub display_name: String,
    pub home_vehicle_id: Option<VehicleId>,
    /// Parent (student) or client (asset) account notified on transitions.
    pub recipient_id: Option<UserId>,
    #[cfg_attr(feature = "serde", serde(skip_serializing))]
    pub recipient_phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum StaffRole {
    Admin,
    Driver,
    Assistant,
    Parent,
    Client,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Admin => "ADMIN",
            StaffRole::Driver => "DRIVER",
            StaffRole::Assistant => "ASSISTANT",
            StaffRole::Parent => "PARENT",
            StaffRole::Client => "CLIENT",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(StaffRole::Admin),
            "DRIVER" => Ok(StaffRole::Driver),
            "ASSISTANT" => Ok(StaffRole::Assistant),
            "PARENT" => Ok(StaffRole::Parent),
            "CLIENT" => Ok(StaffRole::Client),
            _ => Err(ModelError::InvalidRole(raw.to_string())),
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct StaffMember {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub display_name: String,
    pub role: StaffRole,
    pub phone: Option<String>,
}
