use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::infra::app_state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let stats = state.notifier.stats();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": state.storage.as_str(),
        "tracking": state.locations.has_provider(),
        "notifications": {
            "enqueued": stats.enqueued,
            "delivered": stats.delivered,
            "failed": stats.failed,
            "dropped": stats.dropped,
        },
    }))
}
