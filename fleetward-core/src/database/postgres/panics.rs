use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fleetward_model::{
    PanicEvent, PanicEventId, PanicStatus, Position, StudentId, UserId,
};
use ipnetwork::IpNetwork;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{advisory_xact_lock, decode_err};
use crate::{
    database::ports::panics::{PanicInsert, PanicRepository},
    domain::panic::cooldown_remaining,
    error::Result,
};

/// The cooldown check and the insert run under a per-user advisory lock.
#[derive(Debug, Clone)]
pub struct PostgresPanicRepository {
    pool: PgPool,
}

impl PostgresPanicRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, user_id, student_id, latitude, longitude, \
     created_by, role, status, ip_address, user_agent, created_at";

#[derive(Debug, FromRow)]
struct PanicRow {
    id: Uuid,
    user_id: Uuid,
    student_id: Uuid,
    latitude: f64,
    longitude: f64,
    created_by: String,
    role: Option<String>,
    status: String,
    ip_address: Option<IpNetwork>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PanicRow> for PanicEvent {
    type Error = crate::error::CoreError;

    fn try_from(row: PanicRow) -> Result<Self> {
        Ok(PanicEvent {
            id: PanicEventId(row.id),
            user_id: UserId(row.user_id),
            student_id: StudentId(row.student_id),
            position: Position {
                latitude: row.latitude,
                longitude: row.longitude,
            },
            created_by: row.created_by,
            role: row.role,
            status: PanicStatus::parse(&row.status)
                .map_err(decode_err("panic status"))?,
            ip_address: row.ip_address.map(|network| network.ip()),
            user_agent: row.user_agent,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl PanicRepository for PostgresPanicRepository {
    async fn insert_respecting_cooldown(
        &self,
        event: PanicEvent,
        cooldown: Duration,
    ) -> Result<PanicInsert> {
        let mut tx = self.pool.begin().await?;
        advisory_xact_lock(&mut tx, &format!("panic:{}", event.user_id)).await?;

        let last_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT max(created_at) FROM panic_events WHERE user_id = $1",
        )
        .bind(event.user_id.to_uuid())
        .fetch_one(&mut *tx)
        .await?;

        if let Some(last_at) = last_at
            && let Some(remaining_secs) =
                cooldown_remaining(last_at, event.created_at, cooldown)
        {
            tx.rollback().await?;
            return Ok(PanicInsert::CoolingDown { remaining_secs });
        }

        let ip: Option<IpNetwork> = event.ip_address.map(IpNetwork::from);
        let row = sqlx::query_as::<_, PanicRow>(&format!(
            r#"
            INSERT INTO panic_events ({COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(event.id.to_uuid())
        .bind(event.user_id.to_uuid())
        .bind(event.student_id.to_uuid())
        .bind(event.position.latitude)
        .bind(event.position.longitude)
        .bind(&event.created_by)
        .bind(&event.role)
        .bind(event.status.as_str())
        .bind(ip)
        .bind(&event.user_agent)
        .bind(event.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(PanicInsert::Created(row.try_into()?))
    }

    async fn get(&self, id: PanicEventId) -> Result<Option<PanicEvent>> {
        sqlx::query_as::<_, PanicRow>(&format!(
            "SELECT {COLUMNS} FROM panic_events WHERE id = $1"
        ))
        .bind(id.to_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(PanicEvent::try_from)
        .transpose()
    }

    async fn latest_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<PanicEvent>> {
        sqlx::query_as::<_, PanicRow>(&format!(
            "SELECT {COLUMNS} FROM panic_events \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        ))
        .bind(user_id.to_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(PanicEvent::try_from)
        .transpose()
    }
}
