//! Manifest ledger: check-in/check-out facts with once-per-session dedup.

use std::{any::type_name_of_val, fmt, sync::Arc};

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use fleetward_model::{
    ManifestEntry, ManifestEntryId, ManifestEventKind, Position, Session,
    StaffRole, SubjectKind, SubjectRef, UserId, VehicleId,
    api_types::{CreateManifestRequest, ManifestRecord, UpdateManifestRequest},
};
use tracing::{debug, info};

use crate::{
    database::{
        AppUnitOfWork,
        ports::{
            directory::{StaffDirectory, SubjectDirectory, VehicleDirectory},
            manifests::{ManifestRepository, ManifestWrite},
        },
    },
    domain::messages,
    error::{CoreError, Result, ValidationError, require},
    notify::{MessageKind, NotificationDispatcher, OutboundMessage},
    time::Clock,
};

/// A validated create request.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestCommand {
    pub subject: SubjectRef,
    pub vehicle_id: VehicleId,
    pub assistant_id: UserId,
    pub event_kind: ManifestEventKind,
    pub position: Option<Position>,
    /// Derived from the ledger clock when absent.
    pub session: Option<Session>,
}

impl ManifestCommand {
    pub fn from_request(
        request: CreateManifestRequest,
    ) -> std::result::Result<Self, ValidationError> {
        let subject =
            SubjectRef::from_parts(request.student_id, request.asset_id)?;
        let vehicle_id = require(request.bus_id, "busId")?;
        let assistant_id = require(request.assistant_id, "assistantId")?;
        let status = require(request.status, "status")?;
        let event_kind = ManifestEventKind::normalize(&status)?;
        let position = optional_position(request.latitude, request.longitude)?;
        let session = request
            .session
            .as_deref()
            .map(Session::parse)
            .transpose()?;

        Ok(Self {
            subject,
            vehicle_id,
            assistant_id,
            event_kind,
            position,
            session,
        })
    }
}

/// Administrative correction of non-identity fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestPatch {
    pub event_kind: Option<ManifestEventKind>,
    pub session: Option<Session>,
    pub position: Option<Position>,
}

impl ManifestPatch {
    pub fn from_request(
        request: UpdateManifestRequest,
    ) -> std::result::Result<Self, ValidationError> {
        Ok(Self {
            event_kind: request
                .status
                .as_deref()
                .map(ManifestEventKind::normalize)
                .transpose()?,
            session: request
                .session
                .as_deref()
                .map(Session::parse)
                .transpose()?,
            position: optional_position(request.latitude, request.longitude)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.event_kind.is_none()
            && self.session.is_none()
            && self.position.is_none()
    }
}

/// Latitude and longitude travel together.
fn optional_position(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> std::result::Result<Option<Position>, ValidationError> {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => Ok(Some(Position::new(lat, lng)?)),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ValidationError::MissingField("longitude")),
        (None, Some(_)) => Err(ValidationError::MissingField("latitude")),
    }
}

#[derive(Debug, Clone)]
pub struct CreatedManifest {
    pub record: ManifestRecord,
    /// The rendered notification text, also returned to the caller.
    pub message: String,
}

#[derive(Clone)]
pub struct ManifestLedger {
    vehicles: Arc<dyn VehicleDirectory>,
    subjects: Arc<dyn SubjectDirectory>,
    staff: Arc<dyn StaffDirectory>,
    manifests: Arc<dyn ManifestRepository>,
    notifier: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl fmt::Debug for ManifestLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestLedger")
            .field("manifests", &type_name_of_val(self.manifests.as_ref()))
            .field("notifier", &self.notifier)
            .field("clock", &self.clock)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl ManifestLedger {
    /// Session hour and service day are evaluated in UTC until
    /// [`ManifestLedger::with_offset`] says otherwise.
    pub fn new(
        uow: &AppUnitOfWork,
        notifier: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            vehicles: Arc::clone(&uow.vehicles),
            subjects: Arc::clone(&uow.subjects),
            staff: Arc::clone(&uow.staff),
            manifests: Arc::clone(&uow.manifests),
            notifier,
            clock,
            offset: Utc.fix(),
        }
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Session and calendar day for `at` in the ledger's offset.
    pub fn resolve_session(&self, at: DateTime<Utc>) -> (Session, NaiveDate) {
        let local = at.with_timezone(&self.offset);
        (Session::for_hour(local.hour()), local.date_naive())
    }

    pub async fn create(&self, command: ManifestCommand) -> Result<CreatedManifest> {
        let vehicle = self
            .vehicles
            .get(command.vehicle_id)
            .await?
            .ok_or_else(|| CoreError::not_found("bus", command.vehicle_id))?;

        let assistant = self
            .staff
            .get(command.assistant_id)
            .await?
            .ok_or_else(|| CoreError::not_found("assistant", command.assistant_id))?;
        if assistant.role != StaffRole::Assistant {
            return Err(CoreError::Forbidden(format!(
                "user {} has role {} and cannot record manifest entries",
                assistant.id, assistant.role
            )));
        }
        if vehicle.assistant_id != Some(assistant.id) {
            return Err(CoreError::AssistantNotAssigned {
                assistant_id: assistant.id.to_string(),
                vehicle_id: vehicle.id.to_string(),
            });
        }

        let subject = self
            .subjects
            .get(command.subject)
            .await?
            .ok_or_else(|| {
                CoreError::not_found(subject_entity(command.subject), command.subject.to_uuid())
            })?;
        if subject.tenant_id != vehicle.tenant_id {
            return Err(CoreError::Forbidden(format!(
                "{} and bus {} belong to different tenants",
                subject.display_name, vehicle.plate_number
            )));
        }

        let now = self.clock.now();
        let (derived_session, service_day) = self.resolve_session(now);
        let session = command.session.unwrap_or(derived_session);

        let mut entry = ManifestEntry {
            id: ManifestEntryId::new(),
            tenant_id: vehicle.tenant_id,
            subject: command.subject,
            vehicle_id: vehicle.id,
            assistant_id: assistant.id,
            event_kind: command.event_kind,
            session,
            position: command.position,
            service_day,
            created_at: now,
            boarding_time: None,
            alighting_time: None,
        };
        entry.stamp_transition(now);

        let entry = match self.manifests.insert_if_absent(entry).await? {
            ManifestWrite::Stored(entry) => entry,
            ManifestWrite::Duplicate => {
                return Err(CoreError::DuplicateManifestEntry {
                    reason: messages::duplicate_reason(
                        &subject.display_name,
                        command.event_kind,
                        session,
                    ),
                });
            }
        };

        let message = messages::manifest_transition(
            &subject.display_name,
            &vehicle.plate_number,
            entry.event_kind,
            entry.session,
        );

        info!(
            entry_id = %entry.id,
            subject = %entry.subject,
            vehicle_id = %entry.vehicle_id,
            event_kind = %entry.event_kind,
            session = %entry.session,
            "manifest entry recorded"
        );

        match subject.recipient_phone.as_deref() {
            Some(phone) if !phone.trim().is_empty() => {
                self.notifier.enqueue(
                    OutboundMessage::new(
                        MessageKind::ManifestTransition,
                        phone.trim(),
                        message.clone(),
                    )
                    .with_reference(entry.id),
                );
            }
            _ => debug!(
                entry_id = %entry.id,
                subject = %entry.subject,
                "no guardian phone on file; notification skipped"
            ),
        }

        Ok(CreatedManifest {
            record: ManifestRecord {
                entry,
                subject,
                vehicle,
                assistant,
            },
            message,
        })
    }

    pub async fn get(&self, id: ManifestEntryId) -> Result<ManifestRecord> {
        let entry = self
            .manifests
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found("manifest entry", id))?;
        self.hydrate(entry).await
    }

    /// Every entry recorded on `vehicle_id` for `service_day`, oldest first.
    /// Without a day, today in the ledger's offset is used.
    pub async fn list_for_vehicle_day(
        &self,
        vehicle_id: VehicleId,
        service_day: Option<NaiveDate>,
    ) -> Result<Vec<ManifestRecord>> {
        self.vehicles
            .get(vehicle_id)
            .await?
            .ok_or_else(|| CoreError::not_found("bus", vehicle_id))?;
        let day = service_day
            .unwrap_or_else(|| self.resolve_session(self.clock.now()).1);

        let entries = self.manifests.list_for_vehicle_day(vehicle_id, day).await?;
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            records.push(self.hydrate(entry).await?);
        }
        debug!(%vehicle_id, %day, count = records.len(), "listed manifest entries");
        Ok(records)
    }

    /// Corrects an entry without re-running the dedup check. A correction that
    /// lands on another entry's key is still refused by storage.
    pub async fn update(
        &self,
        id: ManifestEntryId,
        patch: ManifestPatch,
    ) -> Result<ManifestRecord> {
        let mut entry = self
            .manifests
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found("manifest entry", id))?;

        if let Some(event_kind) = patch.event_kind
            && event_kind != entry.event_kind
        {
            entry.event_kind = event_kind;
            entry.stamp_transition(entry.created_at);
        }
        if let Some(session) = patch.session {
            entry.session = session;
        }
        if let Some(position) = patch.position {
            entry.position = Some(position);
        }

        let event_kind = entry.event_kind;
        let session = entry.session;
        let subject = entry.subject;
        let entry = match self.manifests.update(entry).await? {
            Some(ManifestWrite::Stored(entry)) => entry,
            Some(ManifestWrite::Duplicate) => {
                let name = self
                    .subjects
                    .get(subject)
                    .await?
                    .map(|s| s.display_name)
                    .unwrap_or_else(|| subject.to_string());
                return Err(CoreError::DuplicateManifestEntry {
                    reason: messages::duplicate_reason(&name, event_kind, session),
                });
            }
            None => return Err(CoreError::not_found("manifest entry", id)),
        };

        info!(entry_id = %entry.id, "manifest entry corrected");
        self.hydrate(entry).await
    }

    async fn hydrate(&self, entry: ManifestEntry) -> Result<ManifestRecord> {
        let vehicle = self
            .vehicles
            .get(entry.vehicle_id)
            .await?
            .ok_or_else(|| CoreError::not_found("bus", entry.vehicle_id))?;
        let subject = self.subjects.get(entry.subject).await?.ok_or_else(|| {
            CoreError::not_found(subject_entity(entry.subject), entry.subject.to_uuid())
        })?;
        let assistant = self
            .staff
            .get(entry.assistant_id)
            .await?
            .ok_or_else(|| CoreError::not_found("assistant", entry.assistant_id))?;

        Ok(ManifestRecord {
            entry,
            subject,
            vehicle,
            assistant,
        })
    }
}

fn subject_entity(subject: SubjectRef) -> &'static str {
    match subject.kind() {
        SubjectKind::Student => "student",
        SubjectKind::Asset => "asset",
    }
}
