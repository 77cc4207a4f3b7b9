#![cfg(feature = "postgres-tests")]

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use fleetward_core::{
    database::{
        ports::{
            directory::{StaffDirectory, SubjectDirectory, VehicleDirectory},
            locations::{LocationFix, LocationRepository},
            manifests::{ManifestRepository, ManifestWrite},
            panics::{PanicInsert, PanicRepository},
        },
        postgres::{
            PostgresDirectory, PostgresLocationRepository,
            PostgresManifestRepository, PostgresPanicRepository,
        },
    },
    model::{
        IngestOutcome, ManifestEntry, ManifestEntryId, ManifestEventKind,
        PanicEvent, PanicEventId, PanicStatus, Position, Session, StaffRole,
        StudentId, SubjectRef, TenantId, UserId, VehicleId,
    },
};
use sqlx::PgPool;

struct Seeded {
    tenant: TenantId,
    vehicle: VehicleId,
    assistant: UserId,
    student: StudentId,
}

async fn seed(pool: &PgPool) -> Seeded {
    let seeded = Seeded {
        tenant: TenantId::new(),
        vehicle: VehicleId::new(),
        assistant: UserId::new(),
        student: StudentId::new(),
    };

    sqlx::query(
        "INSERT INTO vehicles (id, tenant_id, plate_number, assistant_id) VALUES ($1, $2, $3, $4)",
    )
    .bind(seeded.vehicle.to_uuid())
    .bind(seeded.tenant.to_uuid())
    .bind(" KDA 123A")
    .bind(seeded.assistant.to_uuid())
    .execute(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO staff (id, tenant_id, display_name, role) VALUES ($1, $2, 'Grace', 'ASSISTANT')",
    )
    .bind(seeded.assistant.to_uuid())
    .bind(seeded.tenant.to_uuid())
    .execute(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO students (id, tenant_id, full_name, home_vehicle_id, guardian_phone) \
         VALUES ($1, $2, 'Amani', $3, '+254700000100')",
    )
    .bind(seeded.student.to_uuid())
    .bind(seeded.tenant.to_uuid())
    .bind(seeded.vehicle.to_uuid())
    .execute(pool)
    .await
    .unwrap();

    seeded
}

fn entry(seeded: &Seeded) -> ManifestEntry {
    let at = Utc.with_ymd_and_hms(2024, 9, 2, 7, 0, 0).unwrap();
    let mut entry = ManifestEntry {
        id: ManifestEntryId::new(),
        tenant_id: seeded.tenant,
        subject: SubjectRef::Student(seeded.student),
        vehicle_id: seeded.vehicle,
        assistant_id: seeded.assistant,
        event_kind: ManifestEventKind::CheckedIn,
        session: Session::Morning,
        position: Some(Position::new(-1.29, 36.82).unwrap()),
        service_day: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
        created_at: at,
        boarding_time: None,
        alighting_time: None,
    };
    entry.stamp_transition(at);
    entry
}

#[sqlx::test(migrator = "fleetward_core::MIGRATOR")]
async fn directory_reads_reference_tables(pool: PgPool) {
    let seeded = seed(&pool).await;
    let directory = PostgresDirectory::new(pool);

    let vehicle = directory.find_by_plate("KDA 123A ").await.unwrap().unwrap();
    assert_eq!(vehicle.id, seeded.vehicle);
    assert_eq!(vehicle.assistant_id, Some(seeded.assistant));
    assert!(directory.find_by_plate("kda 123a").await.unwrap().is_none());

    let staff = StaffDirectory::get(&directory, seeded.assistant)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(staff.role, StaffRole::Assistant);

    let subject = SubjectDirectory::get(&directory, SubjectRef::Student(seeded.student))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subject.display_name, "Amani");
    assert_eq!(subject.recipient_phone.as_deref(), Some("+254700000100"));
}

#[sqlx::test(migrator = "fleetward_core::MIGRATOR")]
async fn manifest_dedup_key_is_enforced_by_the_index(pool: PgPool) {
    let seeded = seed(&pool).await;
    let repo = PostgresManifestRepository::new(pool);

    let first = entry(&seeded);
    assert!(matches!(
        repo.insert_if_absent(first.clone()).await.unwrap(),
        ManifestWrite::Stored(_)
    ));
    assert_eq!(
        repo.insert_if_absent(entry(&seeded)).await.unwrap(),
        ManifestWrite::Duplicate
    );

    let stored = repo.get(first.id).await.unwrap().unwrap();
    assert_eq!(stored, first);

    let mut evening = entry(&seeded);
    evening.session = Session::Evening;
    let evening_id = evening.id;
    repo.insert_if_absent(evening).await.unwrap();

    let mut collide = repo.get(evening_id).await.unwrap().unwrap();
    collide.session = Session::Morning;
    assert_eq!(
        repo.update(collide).await.unwrap(),
        Some(ManifestWrite::Duplicate)
    );

    let mut missing = entry(&seeded);
    missing.id = ManifestEntryId::new();
    assert_eq!(repo.update(missing).await.unwrap(), None);
}

#[sqlx::test(migrator = "fleetward_core::MIGRATOR")]
async fn location_writes_are_debounced(pool: PgPool) {
    let seeded = seed(&pool).await;
    let repo = PostgresLocationRepository::new(pool);
    let t0 = Utc.with_ymd_and_hms(2024, 9, 2, 7, 0, 0).unwrap();
    let window = Duration::seconds(6);
    let fix = |lat: f64| LocationFix {
        vehicle_id: seeded.vehicle,
        device_id: Some("box-7".to_string()),
        latitude: lat,
        longitude: 36.82,
        direction: 0.0,
        speed: 12.0,
        state: None,
        movement_state: "moving".to_string(),
        provider_timestamp: t0,
    };

    let (_, first) = repo.record_debounced(fix(-1.1), t0, window).await.unwrap();
    let (sample, second) = repo
        .record_debounced(fix(-1.2), t0 + Duration::seconds(3), window)
        .await
        .unwrap();
    let (_, third) = repo
        .record_debounced(fix(-1.3), t0 + Duration::seconds(13), window)
        .await
        .unwrap();

    assert_eq!(first, IngestOutcome::CreatedNew);
    assert_eq!(second, IngestOutcome::UpdatedExisting);
    assert_eq!(sample.latitude, -1.2);
    assert_eq!(third, IngestOutcome::CreatedNew);

    let history = repo.history(seeded.vehicle, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].latitude, -1.3);
}

#[sqlx::test(migrator = "fleetward_core::MIGRATOR")]
async fn panic_cooldown_is_checked_in_the_insert(pool: PgPool) {
    let repo = PostgresPanicRepository::new(pool);
    let user = UserId::new();
    let t0 = Utc.with_ymd_and_hms(2024, 9, 2, 7, 0, 0).unwrap();
    let event = |at| PanicEvent {
        id: PanicEventId::new(),
        user_id: user,
        student_id: StudentId::new(),
        position: Position::new(-1.29, 36.82).unwrap(),
        created_by: "parent".to_string(),
        role: Some("PARENT".to_string()),
        status: PanicStatus::Active,
        ip_address: Some("10.0.0.7".parse().unwrap()),
        user_agent: None,
        created_at: at,
    };
    let cooldown = Duration::seconds(60);

    let created = match repo.insert_respecting_cooldown(event(t0), cooldown).await.unwrap() {
        PanicInsert::Created(event) => event,
        other => panic!("expected insert, got {other:?}"),
    };
    assert_eq!(created.ip_address, Some("10.0.0.7".parse().unwrap()));

    assert_eq!(
        repo.insert_respecting_cooldown(event(t0 + Duration::seconds(30)), cooldown)
            .await
            .unwrap(),
        PanicInsert::CoolingDown { remaining_secs: 30 }
    );
    assert!(matches!(
        repo.insert_respecting_cooldown(event(t0 + Duration::seconds(61)), cooldown)
            .await
            .unwrap(),
        PanicInsert::Created(_)
    ));

    let latest = repo.latest_for_user(user).await.unwrap().unwrap();
    assert_eq!(latest.created_at, t0 + Duration::seconds(61));
}
