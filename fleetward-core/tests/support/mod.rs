#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, TimeZone, Utc};
use fleetward_core::{
    AppUnitOfWork,
    database::memory::MemoryDirectory,
    notify::{DispatcherConfig, NotificationDispatcher, RecordingTransport},
    time::ManualClock,
};
use fleetward_model::{
    StaffMember, StaffRole, StudentId, Subject, SubjectRef, TenantId, UserId,
    Vehicle, VehicleId,
};

pub const PLATE: &str = "KDA 123A";
pub const GUARDIAN_PHONE: &str = "+254700000100";

/// 2024-09-02 07:00:00 UTC, a Monday morning.
pub fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 7, 0, 0).unwrap()
}

pub struct Fixture {
    pub tenant: TenantId,
    pub vehicle: Vehicle,
    pub assistant: StaffMember,
    pub driver: StaffMember,
    pub student: Subject,
    pub directory: Arc<MemoryDirectory>,
    pub uow: AppUnitOfWork,
    pub clock: Arc<ManualClock>,
    pub transport: Arc<RecordingTransport>,
    pub dispatcher: NotificationDispatcher,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_transport(Arc::new(RecordingTransport::new())).await
    }

    pub async fn with_failing_transport() -> Self {
        Self::with_transport(Arc::new(RecordingTransport::failing())).await
    }

    async fn with_transport(transport: Arc<RecordingTransport>) -> Self {
        let tenant = TenantId::new();
        let assistant = StaffMember {
            id: UserId::new(),
            tenant_id: tenant,
            display_name: "Grace Wanjiru".to_string(),
            role: StaffRole::Assistant,
            phone: Some("+254700000200".to_string()),
        };
        let driver = StaffMember {
            id: UserId::new(),
            tenant_id: tenant,
            display_name: "Peter Kamau".to_string(),
            role: StaffRole::Driver,
            phone: None,
        };
        let vehicle = Vehicle {
            id: VehicleId::new(),
            tenant_id: tenant,
            plate_number: PLATE.to_string(),
            driver_id: Some(driver.id),
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
        directory.upsert_staff(driver.clone()).await;
        directory.upsert_subject(student.clone()).await;

        let uow = AppUnitOfWork::in_memory(directory.clone());
        let dispatcher = NotificationDispatcher::start(
            transport.clone(),
            DispatcherConfig {
                queue_capacity: 32,
                workers: 1,
                max_attempts: 2,
                retry_backoff: Duration::from_millis(1),
            },
        );

        Self {
            tenant,
            vehicle,
            assistant,
            driver,
            student,
            directory,
            uow,
            clock: Arc::new(ManualClock::new(morning())),
            transport,
            dispatcher,
        }
    }

    pub fn student_id(&self) -> StudentId {
        match self.student.reference {
            SubjectRef::Student(id) => id,
            SubjectRef::Asset(_) => unreachable!("fixture subject is a student"),
        }
    }
}
