use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    error::{ModelError, Result},
    ids::{ManifestEntryId, TenantId, UserId, VehicleId},
    location::Position,
    subject::SubjectRef,
};

/// Direction of a custody transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ManifestEventKind {
    CheckedIn,
    CheckedOut,
}

impl ManifestEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestEventKind::CheckedIn => "CHECKED_IN",
            ManifestEventKind::CheckedOut => "CHECKED_OUT",
        }
    }

    /// Normalize a client-supplied status. Case, whitespace, `-` and `_` are
    /// ignored so `"onBoard"`, `"check-in"` and `"CHECKED_IN"` all match.
    pub fn normalize(raw: &str) -> Result<Self> {
        let folded: String = raw
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        match folded.as_str() {
            "checkedin" | "checkin" | "onboard" | "onboarded" | "boarded"
            | "in" => Ok(ManifestEventKind::CheckedIn),
            "checkedout" | "checkout" | "offboard" | "offboarded"
            | "alighted" | "out" => Ok(ManifestEventKind::CheckedOut),
            _ => Err(ModelError::InvalidEventKind(raw.to_string())),
        }
    }

    /// Phrase used in guardian notifications.
    pub fn verb_phrase(&self) -> &'static str {
        match self {
            ManifestEventKind::CheckedIn => "has checked in to",
            ManifestEventKind::CheckedOut => "has checked out of",
        }
    }

    /// Phrase used in duplicate-entry explanations.
    pub fn past_tense(&self) -> &'static str {
        match self {
            ManifestEventKind::CheckedIn => "checked in",
            ManifestEventKind::CheckedOut => "checked out",
        }
    }
}

impl fmt::Display for ManifestEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport leg. Also a partition of the once-per-day dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Session {
    Morning,
    Evening,
}

impl Session {
    /// Morning before local noon, evening from noon on. No timezone
    /// negotiation happens here; callers that care pass the session.
    pub fn for_hour(hour: u32) -> Self {
        if hour < 12 {
            Session::Morning
        } else {
            Session::Evening
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Session::Morning => "MORNING",
            Session::Evening => "EVENING",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Session::Morning => "morning",
            Session::Evening => "evening",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "morning" | "am" => Ok(Session::Morning),
            "evening" | "pm" => Ok(Session::Evening),
            _ => Err(ModelError::InvalidSession(raw.to_string())),
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded check-in or check-out fact.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ManifestEntry {
    pub id: ManifestEntryId,
    pub tenant_id: TenantId,
    pub subject: SubjectRef,
    #[cfg_attr(feature = "serde", serde(rename = "busId"))]
    pub vehicle_id: VehicleId,
    pub assistant_id: UserId,
    #[cfg_attr(feature = "serde", serde(rename = "status"))]
    pub event_kind: ManifestEventKind,
    pub session: Session,
    pub position: Option<Position>,
    /// Calendar day in the ledger's offset; part of the dedup key.
    pub service_day: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub boarding_time: Option<DateTime<Utc>>,
    pub alighting_time: Option<DateTime<Utc>>,
}

impl ManifestEntry {
    /// Recompute the boarding/alighting stamps so exactly the one matching
    /// `event_kind` is set.
    pub fn stamp_transition(&mut self, at: DateTime<Utc>) {
        match self.event_kind {
            ManifestEventKind::CheckedIn => {
                self.boarding_time = Some(at);
                self.alighting_time = None;
            }
            ManifestEventKind::CheckedOut => {
                self.boarding_time = None;
                self.alighting_time = Some(at);
            }
        }
    }
}
