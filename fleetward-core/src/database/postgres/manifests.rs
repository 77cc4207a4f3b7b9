use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fleetward_model::{
    ManifestEntry, ManifestEntryId, ManifestEventKind, Position, Session,
    SubjectKind, SubjectRef, TenantId, UserId, VehicleId,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::decode_err;
use crate::{
    database::ports::manifests::{ManifestRepository, ManifestWrite},
    error::Result,
};

/// The unique index `manifest_entries_dedup_key` enforces one entry per
/// (subject, vehicle, event kind, session, service day).
#[derive(Debug, Clone)]
pub struct PostgresManifestRepository {
    pool: PgPool,
}

impl PostgresManifestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, tenant_id, subject_kind, subject_id, vehicle_id, \
     assistant_id, event_kind, session, latitude, longitude, service_day, \
     created_at, boarding_time, alighting_time";

#[derive(Debug, FromRow)]
struct ManifestRow {
    id: Uuid,
    tenant_id: Uuid,
    subject_kind: String,
    subject_id: Uuid,
    vehicle_id: Uuid,
    assistant_id: Uuid,
    event_kind: String,
    session: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    service_day: NaiveDate,
    created_at: DateTime<Utc>,
    boarding_time: Option<DateTime<Utc>>,
    alighting_time: Option<DateTime<Utc>>,
}

impl TryFrom<ManifestRow> for ManifestEntry {
    type Error = crate::error::CoreError;

    fn try_from(row: ManifestRow) -> Result<Self> {
        let kind = SubjectKind::parse(&row.subject_kind)
            .map_err(decode_err("subject kind"))?;
        let position = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Position {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Ok(ManifestEntry {
            id: ManifestEntryId(row.id),
            tenant_id: TenantId(row.tenant_id),
            subject: SubjectRef::from_kind(kind, row.subject_id),
            vehicle_id: VehicleId(row.vehicle_id),
            assistant_id: UserId(row.assistant_id),
            event_kind: ManifestEventKind::normalize(&row.event_kind)
                .map_err(decode_err("manifest event kind"))?,
            session: Session::parse(&row.session)
                .map_err(decode_err("manifest session"))?,
            position,
            service_day: row.service_day,
            created_at: row.created_at,
            boarding_time: row.boarding_time,
            alighting_time: row.alighting_time,
        })
    }
}

#[async_trait]
impl ManifestRepository for PostgresManifestRepository {
    async fn insert_if_absent(
        &self,
        entry: ManifestEntry,
    ) -> Result<ManifestWrite> {
        let row = sqlx::query_as::<_, ManifestRow>(&format!(
            r#"
            INSERT INTO manifest_entries (
                id, tenant_id, subject_kind, subject_id, vehicle_id,
                assistant_id, event_kind, session, latitude, longitude,
                service_day, created_at, boarding_time, alighting_time
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (subject_kind, subject_id, vehicle_id, event_kind, session, service_day)
            DO NOTHING
            RETURNING {COLUMNS}
            "#
        ))
        .bind(entry.id.to_uuid())
        .bind(entry.tenant_id.to_uuid())
        .bind(entry.subject.kind().as_str())
        .bind(entry.subject.to_uuid())
        .bind(entry.vehicle_id.to_uuid())
        .bind(entry.assistant_id.to_uuid())
        .bind(entry.event_kind.as_str())
        .bind(entry.session.as_str())
        .bind(entry.position.map(|p| p.latitude))
        .bind(entry.position.map(|p| p.longitude))
        .bind(entry.service_day)
        .bind(entry.created_at)
        .bind(entry.boarding_time)
        .bind(entry.alighting_time)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(ManifestWrite::Stored(row.try_into()?)),
            None => Ok(ManifestWrite::Duplicate),
        }
    }

    async fn get(&self, id: ManifestEntryId) -> Result<Option<ManifestEntry>> {
        sqlx::query_as::<_, ManifestRow>(&format!(
            "SELECT {COLUMNS} FROM manifest_entries WHERE id = $1"
        ))
        .bind(id.to_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(ManifestEntry::try_from)
        .transpose()
    }

    async fn update(
        &self,
        entry: ManifestEntry,
    ) -> Result<Option<ManifestWrite>> {
        let result = sqlx::query_as::<_, ManifestRow>(&format!(
            r#"
            UPDATE manifest_entries
            SET event_kind = $2,
                session = $3,
                latitude = $4,
                longitude = $5,
                boarding_time = $6,
                alighting_time = $7
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(entry.id.to_uuid())
        .bind(entry.event_kind.as_str())
        .bind(entry.session.as_str())
        .bind(entry.position.map(|p| p.latitude))
        .bind(entry.position.map(|p| p.longitude))
        .bind(entry.boarding_time)
        .bind(entry.alighting_time)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(row)) => Ok(Some(ManifestWrite::Stored(row.try_into()?))),
            Ok(None) => Ok(None),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Ok(Some(ManifestWrite::Duplicate))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn list_for_vehicle_day(
        &self,
        vehicle_id: VehicleId,
        service_day: NaiveDate,
    ) -> Result<Vec<ManifestEntry>> {
        sqlx::query_as::<_, ManifestRow>(&format!(
            "SELECT {COLUMNS} FROM manifest_entries \
             WHERE vehicle_id = $1 AND service_day = $2 \
             ORDER BY created_at, id"
        ))
        .bind(vehicle_id.to_uuid())
        .bind(service_day)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ManifestEntry::try_from)
        .collect()
    }
}
