use axum::{
    Router,
    routing::{get, post},
};
use fleetward_model::api_routes::{relative_to_v1, v1};

use crate::{
    handlers::{locations, manifests, panic},
    infra::app_state::AppState,
};

/// Create all v1 API routes, relative to the `/api/v1` mount point.
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        // Manifest ledger
        .route(
            relative_to_v1(v1::manifests::COLLECTION),
            post(manifests::create_manifest_entry),
        )
        .route(
            relative_to_v1(v1::manifests::ITEM),
            get(manifests::get_manifest_entry)
                .patch(manifests::update_manifest_entry),
        )
        .route(
            relative_to_v1(v1::vehicles::MANIFESTS),
            get(manifests::list_vehicle_manifests),
        )
        // Live locations
        .route(
            relative_to_v1(v1::locations::INGEST),
            post(locations::ingest_location),
        )
        .route(
            relative_to_v1(v1::locations::SYNC),
            post(locations::sync_locations),
        )
        .route(
            relative_to_v1(v1::locations::VEHICLE_LATEST),
            get(locations::latest_vehicle_location),
        )
        // Panic button
        .route(relative_to_v1(v1::panic::TRIGGER), post(panic::trigger_panic))
        .route(relative_to_v1(v1::panic::COOLDOWN), get(panic::panic_cooldown))
        .route(relative_to_v1(v1::panic::ITEM), get(panic::get_panic_event))
}
