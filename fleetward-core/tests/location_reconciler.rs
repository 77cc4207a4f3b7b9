mod support;

use chrono::Duration;
use fleetward_core::{
    CoreError, ErrorKind,
    domain::location::{LocationReconciler, LocationReport},
    model::{IngestOutcome, VehicleId, api_types::IngestLocationRequest},
};
use support::{Fixture, PLATE};

fn reconciler(fx: &Fixture) -> LocationReconciler {
    LocationReconciler::new(
        fx.uow.vehicles.clone(),
        fx.uow.locations.clone(),
        fx.clock.clone(),
    )
}

fn report(lat: f64, speed: f64) -> LocationReport {
    LocationReport {
        unit_id: PLATE.to_string(),
        latitude: lat,
        longitude: 36.8219,
        direction: Some(90.0),
        speed: Some(speed),
        state: Some("online".to_string()),
        movement_state: Some("moving".to_string()),
        provider_timestamp: None,
        device_id: Some("box-7".to_string()),
    }
}

#[tokio::test]
async fn ingestions_inside_the_window_coalesce() {
    let fx = Fixture::new().await;
    let reconciler = reconciler(&fx);

    let first = reconciler.ingest(report(-1.2900, 10.0)).await.unwrap();
    assert_eq!(first.outcome, IngestOutcome::CreatedNew);

    fx.clock.advance(Duration::seconds(3));
    let second = reconciler.ingest(report(-1.2950, 25.0)).await.unwrap();
    assert_eq!(second.outcome, IngestOutcome::UpdatedExisting);
    assert!(second.updated_existing());
    assert_eq!(second.sample.id, first.sample.id);

    let history = fx.uow.locations.history(fx.vehicle.id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].latitude, -1.2950);
    assert_eq!(history[0].speed, 25.0);
    assert_eq!(
        history[0].ingested_at,
        support::morning() + Duration::seconds(3)
    );
}

#[tokio::test]
async fn ingestions_outside_the_window_append() {
    let fx = Fixture::new().await;
    let reconciler = reconciler(&fx);

    reconciler.ingest(report(-1.2900, 10.0)).await.unwrap();
    fx.clock.advance(Duration::seconds(10));
    let second = reconciler.ingest(report(-1.3000, 30.0)).await.unwrap();
    assert_eq!(second.outcome, IngestOutcome::CreatedNew);

    let history = fx.uow.locations.history(fx.vehicle.id, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].latitude, -1.3000, "newest first");

    let latest = reconciler.latest(fx.vehicle.id).await.unwrap();
    assert_eq!(latest.id, second.sample.id);
}

#[tokio::test]
async fn the_window_boundary_starts_a_new_row() {
    let fx = Fixture::new().await;
    let reconciler = reconciler(&fx);

    reconciler.ingest(report(-1.29, 0.0)).await.unwrap();
    fx.clock.advance(Duration::seconds(6));
    let at_boundary = reconciler.ingest(report(-1.29, 0.0)).await.unwrap();
    assert_eq!(at_boundary.outcome, IngestOutcome::CreatedNew);
}

#[tokio::test]
async fn missing_optional_fields_take_documented_defaults() {
    let fx = Fixture::new().await;
    let request = IngestLocationRequest {
        unit_id: Some(format!("  {PLATE} ")),
        lat: Some(-1.29),
        lng: Some(36.82),
        ..Default::default()
    };

    let ingested = reconciler(&fx)
        .ingest(LocationReport::from_request(request).unwrap())
        .await
        .unwrap();
    assert_eq!(ingested.sample.direction, 0.0);
    assert_eq!(ingested.sample.speed, 0.0);
    assert_eq!(ingested.sample.movement_state, "unknown");
    assert_eq!(ingested.sample.provider_timestamp, support::morning());
    assert_eq!(ingested.sample.vehicle_id, fx.vehicle.id);
}

#[tokio::test]
async fn unknown_unit_is_dropped_with_not_found() {
    let fx = Fixture::new().await;
    let mut unknown = report(-1.29, 0.0);
    unknown.unit_id = "kda 123a".to_string();

    let err = reconciler(&fx).ingest(unknown).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(
        fx.uow.locations.latest(fx.vehicle.id).await.unwrap().is_none()
    );
}

#[tokio::test]
async fn out_of_range_coordinates_are_rejected() {
    let fx = Fixture::new().await;
    let err = reconciler(&fx).ingest(report(123.0, 0.0)).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn latest_without_samples_is_not_found() {
    let fx = Fixture::new().await;
    let err = reconciler(&fx).latest(VehicleId::new()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn sync_without_provider_is_empty() {
    let fx = Fixture::new().await;
    assert!(reconciler(&fx).sync().await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_ingestions_for_one_vehicle_keep_one_row() {
    let fx = Fixture::new().await;
    let reconciler = reconciler(&fx);

    let handles = (0..6_i32)
        .map(|i| {
            let reconciler = reconciler.clone();
            tokio::spawn(async move {
                reconciler.ingest(report(-1.29 - f64::from(i) * 0.001, 5.0)).await
            })
        })
        .collect::<Vec<_>>();
    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().outcome == IngestOutcome::CreatedNew {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(
        fx.uow.locations.history(fx.vehicle.id, 10).await.unwrap().len(),
        1
    );
}
