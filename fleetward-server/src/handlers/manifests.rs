use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use fleetward_core::domain::manifest::{
    CreatedManifest, ManifestCommand, ManifestPatch,
};
use fleetward_model::{
    ManifestEntryId, VehicleId,
    api_types::{
        ApiResponse, CreateManifestRequest, ManifestDayQuery, ManifestRecord,
        UpdateManifestRequest,
    },
};

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

/// Record a boarding or alighting. The response carries the guardian message
/// that was queued.
pub async fn create_manifest_entry(
    State(state): State<AppState>,
    payload: Result<Json<CreateManifestRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<ManifestRecord>>)> {
    let Json(request) = payload?;
    let command = ManifestCommand::from_request(request)?;
    let CreatedManifest { record, message } = state.ledger.create(command).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(record).with_message(message)),
    ))
}

pub async fn get_manifest_entry(
    State(state): State<AppState>,
    id: Result<Path<ManifestEntryId>, PathRejection>,
) -> AppResult<Json<ApiResponse<ManifestRecord>>> {
    let Path(id) = id?;
    let record = state.ledger.get(id).await?;
    Ok(Json(ApiResponse::success(record)))
}

pub async fn update_manifest_entry(
    State(state): State<AppState>,
    id: Result<Path<ManifestEntryId>, PathRejection>,
    payload: Result<Json<UpdateManifestRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<ManifestRecord>>> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let patch = ManifestPatch::from_request(request)?;
    if patch.is_empty() {
        return Err(AppError::bad_request(
            "Nothing to update; supply status, session or a position",
        ));
    }

    let record = state.ledger.update(id, patch).await?;
    Ok(Json(
        ApiResponse::success(record).with_message("Manifest entry updated"),
    ))
}

/// Entries recorded on one bus for one service day.
pub async fn list_vehicle_manifests(
    State(state): State<AppState>,
    id: Result<Path<VehicleId>, PathRejection>,
    query: Result<Query<ManifestDayQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<Vec<ManifestRecord>>>> {
    let Path(vehicle_id) = id?;
    let Query(query) = query?;
    let records = state
        .ledger
        .list_for_vehicle_day(vehicle_id, query.day)
        .await?;
    Ok(Json(ApiResponse::success(records)))
}
