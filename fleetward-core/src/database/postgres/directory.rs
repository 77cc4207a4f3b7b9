use async_trait::async_trait;
use fleetward_model::{
    StaffMember, StaffRole, Subject, SubjectRef, TenantId, UserId, Vehicle,
    VehicleId,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::decode_err;
use crate::{
    database::ports::directory::{
        StaffDirectory, SubjectDirectory, VehicleDirectory,
    },
    error::Result,
};

/// Read-only view over the reference tables maintained by the CRUD services.
#[derive(Debug, Clone)]
pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct VehicleRow {
    id: Uuid,
    tenant_id: Uuid,
    plate_number: String,
    driver_id: Option<Uuid>,
    assistant_id: Option<Uuid>,
}

impl From<VehicleRow> for Vehicle {
    fn from(row: VehicleRow) -> Self {
        Vehicle {
            id: VehicleId(row.id),
            tenant_id: TenantId(row.tenant_id),
            plate_number: row.plate_number,
            driver_id: row.driver_id.map(UserId),
            assistant_id: row.assistant_id.map(UserId),
        }
    }
}

#[derive(Debug, FromRow)]
struct SubjectRow {
    tenant_id: Uuid,
    display_name: String,
    home_vehicle_id: Option<Uuid>,
    recipient_id: Option<Uuid>,
    recipient_phone: Option<String>,
}

impl SubjectRow {
    fn into_subject(self, reference: SubjectRef) -> Subject {
        Subject {
            reference,
            tenant_id: TenantId(self.tenant_id),
            display_name: self.display_name,
            home_vehicle_id: self.home_vehicle_id.map(VehicleId),
            recipient_id: self.recipient_id.map(UserId),
            recipient_phone: self.recipient_phone,
        }
    }
}

#[derive(Debug, FromRow)]
struct StaffRow {
    id: Uuid,
    tenant_id: Uuid,
    display_name: String,
    role: String,
    phone: Option<String>,
}

const VEHICLE_COLUMNS: &str =
    "id, tenant_id, plate_number, driver_id, assistant_id";

#[async_trait]
impl VehicleDirectory for PostgresDirectory {
    async fn get(&self, id: VehicleId) -> Result<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1"
        ))
        .bind(id.to_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Vehicle::from))
    }

    async fn find_by_plate(&self, plate: &str) -> Result<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles \
             WHERE btrim(plate_number) = $1 \
             ORDER BY created_at, id LIMIT 1"
        ))
        .bind(plate.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Vehicle::from))
    }

    async fn list(&self) -> Result<Vec<Vehicle>> {
        let rows = sqlx::query_as::<_, VehicleRow>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY plate_number, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Vehicle::from).collect())
    }
}

#[async_trait]
impl SubjectDirectory for PostgresDirectory {
    async fn get(&self, subject: SubjectRef) -> Result<Option<Subject>> {
        let sql = match subject {
            SubjectRef::Student(_) => {
                r#"
                SELECT tenant_id, full_name AS display_name, home_vehicle_id,
                       guardian_id AS recipient_id, guardian_phone AS recipient_phone
                FROM students
                WHERE id = $1
                "#
            }
            SubjectRef::Asset(_) => {
                r#"
                SELECT tenant_id, label AS display_name, home_vehicle_id,
                       client_id AS recipient_id, client_phone AS recipient_phone
                FROM assets
                WHERE id = $1
                "#
            }
        };

        let row = sqlx::query_as::<_, SubjectRow>(sql)
            .bind(subject.to_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.into_subject(subject)))
    }
}

#[async_trait]
impl StaffDirectory for PostgresDirectory {
    async fn get(&self, id: UserId) -> Result<Option<StaffMember>> {
        let row = sqlx::query_as::<_, StaffRow>(
            "SELECT id, tenant_id, display_name, role, phone FROM staff WHERE id = $1",
        )
        .bind(id.to_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(StaffMember {
                id: UserId(row.id),
                tenant_id: TenantId(row.tenant_id),
                display_name: row.display_name,
                role: StaffRole::parse(&row.role).map_err(decode_err("staff role"))?,
                phone: row.phone,
            })
        })
        .transpose()
    }
}
