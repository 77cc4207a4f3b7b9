use std::{fmt, net::IpAddr};

use chrono::{DateTime, Utc};

use crate::{
    error::{ModelError, Result},
    ids::{PanicEventId, StudentId, UserId},
    location::Position,
};

/// Minimum spacing between two panic events raised by the same user.
pub const PANIC_COOLDOWN_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PanicStatus {
    Active,
    Acknowledged,
    Resolved,
}

impl PanicStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanicStatus::Active => "ACTIVE",
            PanicStatus::Acknowledged => "ACKNOWLEDGED",
            PanicStatus::Resolved => "RESOLVED",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "ACTIVE" => Ok(PanicStatus::Active),
            "ACKNOWLEDGED" => Ok(PanicStatus::Acknowledged),
            "RESOLVED" => Ok(PanicStatus::Resolved),
            other => Err(ModelError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for PanicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PanicEvent {
    pub id: PanicEventId,
    pub user_id: UserId,
    #[cfg_attr(feature = "serde", serde(rename = "childId"))]
    pub student_id: StudentId,
    pub position: Position,
    pub created_by: String,
    pub role: Option<String>,
    pub status: PanicStatus,
    pub ip_address: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}
