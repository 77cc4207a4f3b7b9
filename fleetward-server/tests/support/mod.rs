#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use fleetward_core::{
    AppUnitOfWork,
    database::memory::MemoryDirectory,
    notify::RecordingTransport,
    time::ManualClock,
    tracking::{TrackerUnit, TrackingError, TrackingProvider},
};
use fleetward_model::{
    StaffMember, StaffRole, StudentId, Subject, SubjectRef, TenantId, UserId,
    Vehicle, VehicleId,
};
use fleetward_server::{
    create_app,
    infra::{
        app_state::{AppDependencies, AppState, StorageMode},
        config::Config,
    },
};

pub const PLATE: &str = "KDA 123A";
pub const GUARDIAN_PHONE: &str = "+254700000100";
pub const CONTROL_ROOM: &str = "+254700000999";

/// 2024-09-02 07:00:00 UTC, a Monday morning.
pub fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 7, 0, 0).unwrap()
}

/// Tracker feed that always returns the same units.
#[derive(Debug, Default)]
pub struct FixedTracker {
    pub units: Vec<TrackerUnit>,
}

#[async_trait]
impl TrackingProvider for FixedTracker {
    async fn fetch_units(&self) -> Result<Vec<TrackerUnit>, TrackingError> {
        Ok(self.units.clone())
    }
}

#[derive(Debug, Default)]
pub struct TestOptions {
    pub tracker_units: Option<Vec<TrackerUnit>>,
    pub emergency_contacts: Vec<String>,
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub transport: Arc<RecordingTransport>,
    pub vehicle: Vehicle,
    pub assistant: StaffMember,
    pub student: Subject,
}

impl TestApp {
    pub fn student_id(&self) -> StudentId {
        match self.student.reference {
            SubjectRef::Student(id) => id,
            SubjectRef::Asset(_) => unreachable!("fixture subject is a student"),
        }
    }

    /// Let the notification workers finish before inspecting the transport.
    pub async fn drain_notifications(&self) {
        self.state.notifier.wait_idle().await;
    }
}

pub async fn build_test_app() -> Result<TestApp> {
    build_test_app_with(TestOptions::default()).await
}

pub async fn build_test_app_with(options: TestOptions) -> Result<TestApp> {
    let tenant = TenantId::new();
    let assistant = StaffMember {
        id: UserId::new(),
        tenant_id: tenant,
        display_name: "Grace Wanjiru".to_string(),
        role: StaffRole::Assistant,
        phone: Some("+254700000200".to_string()),
    };
    let vehicle = Vehicle {
        id: VehicleId::new(),
        tenant_id: tenant,
        plate_number: PLATE.to_string(),
        driver_id: None,
        assistant_id: Some(assistant.id),
    };
    let student = Subject {
        reference: SubjectRef::Student(StudentId::new()),
        tenant_id: tenant,
        display_name: "Amani Otieno".to_string(),
        home_vehicle_id: Some(vehicle.id),
        recipient_id: Some(UserId::new()),
        recipient_phone: Some(GUARDIAN_PHONE.to_string()),
    };

    let directory = Arc::new(MemoryDirectory::new());
    directory.upsert_vehicle(vehicle.clone()).await;
    directory.upsert_staff(assistant.clone()).await;
    directory.upsert_subject(student.clone()).await;

    let mut config = Config::default();
    config.notifications.workers = 1;
    config.notifications.max_attempts = 2;
    config.notifications.retry_backoff_ms = 1;
    config.ledger.utc_offset_minutes = Some(0);
    config.alerts.emergency_contacts = options.emergency_contacts;

    let clock = Arc::new(ManualClock::new(morning()));
    let transport = Arc::new(RecordingTransport::new());
    let tracking = options.tracker_units.map(|units| {
        Arc::new(FixedTracker { units }) as Arc<dyn TrackingProvider>
    });

    let state = AppState::assemble(
        config,
        AppDependencies {
            unit_of_work: AppUnitOfWork::in_memory(directory),
            storage: StorageMode::Memory,
            transport: transport.clone(),
            tracking,
            clock: clock.clone(),
        },
    );

    let make_service = create_app(state.clone())
        .into_make_service_with_connect_info::<SocketAddr>();
    let server = TestServer::builder()
        .http_transport()
        .build(make_service)
        .map_err(|err| anyhow!(err.to_string()))?;

    Ok(TestApp {
        server,
        state,
        clock,
        transport,
        vehicle,
        assistant,
        student,
    })
}
