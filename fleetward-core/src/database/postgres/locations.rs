use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fleetward_model::{
    IngestOutcome, LocationSample, LocationSampleId, VehicleId,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::advisory_xact_lock;
use crate::{
    database::ports::locations::{LocationFix, LocationRepository},
    domain::location::{apply_fix, coalesces_into, sample_from_fix},
    error::Result,
};

/// Debounced writes hold a per-vehicle advisory lock for the duration of the
/// read-decide-write transaction.
#[derive(Debug, Clone)]
pub struct PostgresLocationRepository {
    pool: PgPool,
}

impl PostgresLocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, vehicle_id, device_id, latitude, longitude, \
     direction, speed, state, movement_state, provider_timestamp, ingested_at";

#[derive(Debug, FromRow)]
struct SampleRow {
    id: Uuid,
    vehicle_id: Uuid,
    device_id: Option<String>,
    latitude: f64,
    longitude: f64,
    direction: f64,
    speed: f64,
    state: Option<String>,
    movement_state: String,
    provider_timestamp: DateTime<Utc>,
    ingested_at: DateTime<Utc>,
}

impl From<SampleRow> for LocationSample {
    fn from(row: SampleRow) -> Self {
        LocationSample {
            id: LocationSampleId(row.id),
            vehicle_id: VehicleId(row.vehicle_id),
            device_id: row.device_id,
            latitude: row.latitude,
            longitude: row.longitude,
            direction: row.direction,
            speed: row.speed,
            state: row.state,
            movement_state: row.movement_state,
            provider_timestamp: row.provider_timestamp,
            ingested_at: row.ingested_at,
        }
    }
}

fn latest_sql() -> String {
    format!(
        "SELECT {COLUMNS} FROM location_samples \
         WHERE vehicle_id = $1 \
         ORDER BY ingested_at DESC, id DESC LIMIT 1"
    )
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn record_debounced(
        &self,
        fix: LocationFix,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<(LocationSample, IngestOutcome)> {
        let mut tx = self.pool.begin().await?;
        advisory_xact_lock(&mut tx, &format!("location:{}", fix.vehicle_id))
            .await?;

        let latest = sqlx::query_as::<_, SampleRow>(&latest_sql())
            .bind(fix.vehicle_id.to_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .map(LocationSample::from);

        let (sample, outcome) = match latest {
            Some(mut latest) if coalesces_into(&latest, now, window) => {
                apply_fix(&mut latest, fix, now);
                let row = sqlx::query_as::<_, SampleRow>(&format!(
                    r#"
                    UPDATE location_samples
                    SET device_id = $2,
                        latitude = $3,
                        longitude = $4,
                        direction = $5,
                        speed = $6,
                        state = $7,
                        movement_state = $8,
                        provider_timestamp = $9,
                        ingested_at = $10
                    WHERE id = $1
                    RETURNING {COLUMNS}
                    "#
                ))
                .bind(latest.id.to_uuid())
                .bind(&latest.device_id)
                .bind(latest.latitude)
                .bind(latest.longitude)
                .bind(latest.direction)
                .bind(latest.speed)
                .bind(&latest.state)
                .bind(&latest.movement_state)
                .bind(latest.provider_timestamp)
                .bind(latest.ingested_at)
                .fetch_one(&mut *tx)
                .await?;
                (LocationSample::from(row), IngestOutcome::UpdatedExisting)
            }
            _ => {
                let sample = sample_from_fix(fix, now);
                let row = sqlx::query_as::<_, SampleRow>(&format!(
                    r#"
                    INSERT INTO location_samples ({COLUMNS})
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                    RETURNING {COLUMNS}
                    "#
                ))
                .bind(sample.id.to_uuid())
                .bind(sample.vehicle_id.to_uuid())
                .bind(&sample.device_id)
                .bind(sample.latitude)
                .bind(sample.longitude)
                .bind(sample.direction)
                .bind(sample.speed)
                .bind(&sample.state)
                .bind(&sample.movement_state)
                .bind(sample.provider_timestamp)
                .bind(sample.ingested_at)
                .fetch_one(&mut *tx)
                .await?;
                (LocationSample::from(row), IngestOutcome::CreatedNew)
            }
        };

        tx.commit().await?;
        Ok((sample, outcome))
    }

    async fn latest(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<Option<LocationSample>> {
        let row = sqlx::query_as::<_, SampleRow>(&latest_sql())
            .bind(vehicle_id.to_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(LocationSample::from))
    }

    async fn history(
        &self,
        vehicle_id: VehicleId,
        limit: usize,
    ) -> Result<Vec<LocationSample>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, SampleRow>(&format!(
            "SELECT {COLUMNS} FROM location_samples \
             WHERE vehicle_id = $1 \
             ORDER BY ingested_at DESC, id DESC LIMIT $2"
        ))
        .bind(vehicle_id.to_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(LocationSample::from).collect())
    }
}
