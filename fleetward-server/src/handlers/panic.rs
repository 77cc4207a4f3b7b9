use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use fleetward_core::domain::panic::{PanicTrigger, TriggeredPanic};
use fleetward_model::{
    PanicEvent, PanicEventId,
    api_types::{
        ApiResponse, PanicCooldownResponse, PanicTriggerRequest,
        PanicTriggerResponse,
    },
};

use crate::infra::{
    app_state::AppState,
    errors::AppResult,
    identity::{CallerIdentity, ClientContext},
};

/// Raise a panic for the calling user. Refused with 429 while the caller's
/// previous panic is inside the cooldown window.
pub async fn trigger_panic(
    State(state): State<AppState>,
    caller: CallerIdentity,
    client: ClientContext,
    payload: Result<Json<PanicTriggerRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<PanicTriggerResponse>>)> {
    let Json(request) = payload?;

    let created_by = caller.user_id.to_string();
    let trigger = PanicTrigger {
        user_id: caller.user_id,
        phone: caller.phone,
        role: caller.role,
        latitude: request.latitude,
        longitude: request.longitude,
        child_id: request.child_id,
        metadata: client.into_panic_metadata(created_by),
    };

    let TriggeredPanic {
        event,
        cooldown_secs,
    } = state.panics.trigger(trigger).await?;

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::success(PanicTriggerResponse {
                panic_id: event.id,
                status: event.status,
                triggered_at: event.created_at,
                cooldown: cooldown_secs,
            })
            .with_message("Panic alert sent"),
        ),
    ))
}

pub async fn get_panic_event(
    State(state): State<AppState>,
    id: Result<Path<PanicEventId>, PathRejection>,
) -> AppResult<Json<ApiResponse<PanicEvent>>> {
    let Path(id) = id?;
    let event = state.panics.get(id).await?;
    Ok(Json(ApiResponse::success(event)))
}

/// Remaining cooldown for the caller, so clients can restore a countdown.
pub async fn panic_cooldown(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> AppResult<Json<ApiResponse<PanicCooldownResponse>>> {
    let remaining = state.panics.cooldown_remaining_for(caller.user_id).await?;
    Ok(Json(ApiResponse::success(PanicCooldownResponse {
        active: remaining.is_some(),
        remaining_secs: remaining.unwrap_or(0),
        cooldown: state.panics.cooldown_secs(),
    })))
}
