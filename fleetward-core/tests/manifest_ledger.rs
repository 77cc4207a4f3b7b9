mod support;

use chrono::{Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use fleetward_core::{
    CoreError, ErrorKind,
    domain::manifest::{ManifestCommand, ManifestLedger, ManifestPatch},
    model::{
        AssetId, ManifestEventKind, Position, Session, StaffMember, StaffRole,
        Subject, SubjectRef, TenantId, UserId,
        api_types::CreateManifestRequest,
    },
    notify::MessageKind,
};
use support::{Fixture, GUARDIAN_PHONE, PLATE};

fn ledger(fx: &Fixture) -> ManifestLedger {
    ManifestLedger::new(&fx.uow, fx.dispatcher.clone(), fx.clock.clone())
}

fn on_board(fx: &Fixture, status: &str) -> ManifestCommand {
    ManifestCommand::from_request(CreateManifestRequest {
        student_id: Some(fx.student_id()),
        bus_id: Some(fx.vehicle.id),
        assistant_id: Some(fx.assistant.id),
        status: Some(status.to_string()),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn morning_check_in_records_entry_and_notifies_guardian() {
    let fx = Fixture::new().await;
    let ledger = ledger(&fx);

    let created = ledger.create(on_board(&fx, "onBoard")).await.unwrap();
    let entry = &created.record.entry;

    assert_eq!(entry.event_kind, ManifestEventKind::CheckedIn);
    assert_eq!(entry.session, Session::Morning);
    assert_eq!(entry.service_day, NaiveDate::from_ymd_opt(2024, 9, 2).unwrap());
    assert_eq!(entry.boarding_time, Some(support::morning()));
    assert_eq!(entry.alighting_time, None);
    assert_eq!(created.record.vehicle.plate_number, PLATE);
    assert_eq!(created.record.assistant.id, fx.assistant.id);
    assert_eq!(
        created.message,
        format!("Amani Otieno has checked in to bus {PLATE} for the morning session.")
    );

    fx.dispatcher.wait_idle().await;
    let attempts = fx.transport.attempts();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].to, GUARDIAN_PHONE);
    assert_eq!(attempts[0].kind, MessageKind::ManifestTransition);
    assert_eq!(attempts[0].body, created.message);
}

#[tokio::test]
async fn repeat_check_in_is_a_conflict_and_stores_nothing_new() {
    let fx = Fixture::new().await;
    let ledger = ledger(&fx);

    let first = ledger.create(on_board(&fx, "onBoard")).await.unwrap();
    let err = ledger.create(on_board(&fx, "CHECKED_IN")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    match err {
        CoreError::DuplicateManifestEntry { reason } => assert_eq!(
            reason,
            "Amani Otieno has already checked in for this bus in the morning session today"
        ),
        other => panic!("expected duplicate, got {other:?}"),
    }

    let stored = fx
        .uow
        .manifests
        .list_for_vehicle_day(fx.vehicle.id, first.record.entry.service_day)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);

    fx.dispatcher.wait_idle().await;
    assert_eq!(fx.transport.attempt_count(), 1);
}

#[tokio::test]
async fn aliases_share_one_dedup_slot() {
    let fx = Fixture::new().await;
    let ledger = ledger(&fx);

    ledger.create(on_board(&fx, "checkin")).await.unwrap();
    for alias in ["onboard", "in", "CHECKED_IN"] {
        let err = ledger.create(on_board(&fx, alias)).await.unwrap_err();
        assert!(
            matches!(err, CoreError::DuplicateManifestEntry { .. }),
            "{alias}: {err:?}"
        );
    }
}

#[tokio::test]
async fn concurrent_duplicates_store_exactly_one_entry() {
    let fx = Fixture::new().await;
    let ledger = ledger(&fx);

    let attempts = (0..8)
        .map(|_| {
            let ledger = ledger.clone();
            let command = on_board(&fx, "onBoard");
            tokio::spawn(async move { ledger.create(command).await })
        })
        .collect::<Vec<_>>();
    let mut stored = 0;
    let mut conflicts = 0;
    for handle in attempts {
        match handle.await.unwrap() {
            Ok(_) => stored += 1,
            Err(CoreError::DuplicateManifestEntry { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
    assert_eq!((stored, conflicts), (1, 7));
}

#[tokio::test]
async fn session_defaults_follow_the_ledger_clock() {
    let fx = Fixture::new().await;
    let ledger = ledger(&fx);

    fx.clock.set(Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap());
    let morning = ledger.create(on_board(&fx, "in")).await.unwrap();
    assert_eq!(morning.record.entry.session, Session::Morning);

    fx.clock.set(Utc.with_ymd_and_hms(2024, 9, 2, 18, 0, 0).unwrap());
    let evening = ledger.create(on_board(&fx, "in")).await.unwrap();
    assert_eq!(evening.record.entry.session, Session::Evening);
}

#[tokio::test]
async fn session_and_day_use_the_configured_offset() {
    let fx = Fixture::new().await;
    let nairobi = FixedOffset::east_opt(3 * 3600).unwrap();
    let ledger = ledger(&fx).with_offset(nairobi);

    // 22:30 UTC on the 1st is 01:30 local on the 2nd.
    fx.clock.set(Utc.with_ymd_and_hms(2024, 9, 1, 22, 30, 0).unwrap());
    let created = ledger.create(on_board(&fx, "in")).await.unwrap();
    assert_eq!(created.record.entry.session, Session::Morning);
    assert_eq!(
        created.record.entry.service_day,
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
    );
}

#[tokio::test]
async fn explicit_session_and_next_day_open_new_slots() {
    let fx = Fixture::new().await;
    let ledger = ledger(&fx);

    ledger.create(on_board(&fx, "in")).await.unwrap();

    let mut evening = on_board(&fx, "in");
    evening.session = Some(Session::Evening);
    ledger.create(evening).await.unwrap();

    ledger.create(on_board(&fx, "out")).await.unwrap();

    fx.clock.advance(Duration::days(1));
    ledger.create(on_board(&fx, "in")).await.unwrap();
}

#[tokio::test]
async fn check_out_sets_alighting_time_only() {
    let fx = Fixture::new().await;
    let created = ledger(&fx)
        .create(on_board(&fx, "offBoard"))
        .await
        .unwrap();
    assert_eq!(created.record.entry.boarding_time, None);
    assert_eq!(created.record.entry.alighting_time, Some(support::morning()));
    assert!(created.message.contains("has checked out of bus"));
}

#[tokio::test]
async fn referential_checks_reject_bad_requests() {
    let fx = Fixture::new().await;
    let ledger = ledger(&fx);

    let mut unknown_bus = on_board(&fx, "in");
    unknown_bus.vehicle_id = fleetward_core::model::VehicleId::new();
    assert_eq!(
        ledger.create(unknown_bus).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );

    let mut unknown_assistant = on_board(&fx, "in");
    unknown_assistant.assistant_id = UserId::new();
    assert_eq!(
        ledger.create(unknown_assistant).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );

    let mut driver_as_assistant = on_board(&fx, "in");
    driver_as_assistant.assistant_id = fx.driver.id;
    assert!(matches!(
        ledger.create(driver_as_assistant).await.unwrap_err(),
        CoreError::Forbidden(_)
    ));

    let other_assistant = StaffMember {
        id: UserId::new(),
        tenant_id: fx.tenant,
        display_name: "Someone Else".to_string(),
        role: StaffRole::Assistant,
        phone: None,
    };
    fx.directory.upsert_staff(other_assistant.clone()).await;
    let mut unassigned = on_board(&fx, "in");
    unassigned.assistant_id = other_assistant.id;
    assert!(matches!(
        ledger.create(unassigned).await.unwrap_err(),
        CoreError::AssistantNotAssigned { .. }
    ));

    let mut unknown_subject = on_board(&fx, "in");
    unknown_subject.subject = SubjectRef::Asset(AssetId::new());
    assert_eq!(
        ledger.create(unknown_subject).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn subject_from_another_tenant_is_forbidden() {
    let fx = Fixture::new().await;
    let outsider = Subject {
        reference: SubjectRef::Asset(AssetId::new()),
        tenant_id: TenantId::new(),
        display_name: "Parcel 42".to_string(),
        home_vehicle_id: None,
        recipient_id: None,
        recipient_phone: None,
    };
    fx.directory.upsert_subject(outsider.clone()).await;

    let mut command = on_board(&fx, "in");
    command.subject = outsider.reference;
    assert!(matches!(
        ledger(&fx).create(command).await.unwrap_err(),
        CoreError::Forbidden(_)
    ));
}

#[tokio::test]
async fn failing_transport_never_fails_the_entry() {
    let fx = Fixture::with_failing_transport().await;
    let created = ledger(&fx).create(on_board(&fx, "onBoard")).await;
    assert!(created.is_ok());

    fx.dispatcher.wait_idle().await;
    assert_eq!(fx.transport.attempt_count(), 2);
    assert_eq!(fx.dispatcher.stats().failed, 1);
}

#[tokio::test]
async fn subject_without_guardian_phone_skips_notification() {
    let fx = Fixture::new().await;
    let mut quiet = fx.student.clone();
    quiet.recipient_phone = None;
    fx.directory.upsert_subject(quiet).await;

    ledger(&fx).create(on_board(&fx, "in")).await.unwrap();
    fx.dispatcher.wait_idle().await;
    assert_eq!(fx.transport.attempt_count(), 0);
}

#[tokio::test]
async fn update_corrects_kind_and_recomputes_stamps() {
    let fx = Fixture::new().await;
    let ledger = ledger(&fx);
    let created = ledger.create(on_board(&fx, "in")).await.unwrap();

    let updated = ledger
        .update(
            created.record.entry.id,
            ManifestPatch {
                event_kind: Some(ManifestEventKind::CheckedOut),
                position: Some(Position::new(-1.2921, 36.8219).unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.entry.event_kind, ManifestEventKind::CheckedOut);
    assert_eq!(updated.entry.boarding_time, None);
    assert_eq!(updated.entry.alighting_time, Some(created.record.entry.created_at));
    assert_eq!(updated.entry.position.map(|p| p.latitude), Some(-1.2921));

    let fetched = ledger.get(created.record.entry.id).await.unwrap();
    assert_eq!(fetched.entry, updated.entry);
}

#[tokio::test]
async fn update_of_missing_entry_is_not_found() {
    let fx = Fixture::new().await;
    let err = ledger(&fx)
        .update(
            fleetward_core::model::ManifestEntryId::new(),
            ManifestPatch::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn vehicle_day_listing_defaults_to_today() {
    let fx = Fixture::new().await;
    let ledger = ledger(&fx);

    let boarded = ledger.create(on_board(&fx, "checkin")).await.unwrap();
    fx.clock.advance(Duration::minutes(45));
    let alighted = ledger.create(on_board(&fx, "checkout")).await.unwrap();

    let today = ledger
        .list_for_vehicle_day(fx.vehicle.id, None)
        .await
        .unwrap();
    let ids: Vec<_> = today.iter().map(|record| record.entry.id).collect();
    assert_eq!(ids, vec![boarded.record.entry.id, alighted.record.entry.id]);
    assert_eq!(today[0].subject.display_name, "Amani Otieno");

    let next_day = NaiveDate::from_ymd_opt(2024, 9, 3).unwrap();
    assert!(
        ledger
            .list_for_vehicle_day(fx.vehicle.id, Some(next_day))
            .await
            .unwrap()
            .is_empty()
    );

    let err = ledger
        .list_for_vehicle_day(fleetward_core::model::VehicleId::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
