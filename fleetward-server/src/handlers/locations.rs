use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use fleetward_core::domain::location::LocationReport;
use fleetward_model::{
    LocationSample, VehicleId, VehicleLocationView,
    api_types::{ApiResponse, IngestLocationRequest, IngestLocationResponse},
};

use crate::infra::{app_state::AppState, errors::AppResult};

/// Tracker webhook: one position report per call.
pub async fn ingest_location(
    State(state): State<AppState>,
    payload: Result<Json<IngestLocationRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<IngestLocationResponse>>> {
    let Json(request) = payload?;
    let report = LocationReport::from_request(request)?;
    let ingested = state.locations.ingest(report).await?;

    let updated_existing = ingested.updated_existing();
    let message = if updated_existing {
        "Location updated"
    } else {
        "Location recorded"
    };
    Ok(Json(
        ApiResponse::success(IngestLocationResponse {
            sample: ingested.sample,
            outcome: ingested.outcome,
            updated_existing,
        })
        .with_message(message),
    ))
}

/// Pull the tracker feed and return the merged per-vehicle view. Read only.
pub async fn sync_locations(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<VehicleLocationView>>>> {
    let views = state.locations.sync().await?;
    Ok(Json(ApiResponse::success(views)))
}

pub async fn latest_vehicle_location(
    State(state): State<AppState>,
    id: Result<Path<VehicleId>, PathRejection>,
) -> AppResult<Json<ApiResponse<LocationSample>>> {
    let Path(vehicle_id) = id?;
    let sample = state.locations.latest(vehicle_id).await?;
    Ok(Json(ApiResponse::success(sample)))
}
