pub mod v1;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    routing::get,
};
use fleetward_model::api_routes;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    handlers::health::health_handler,
    infra::{
        app_state::AppState,
        config::CorsConfig,
        identity::{USER_ID_HEADER, USER_PHONE_HEADER, USER_ROLE_HEADER},
    },
};

/// Create the main API router with all versions
pub fn create_api_router() -> Router<AppState> {
    Router::new().nest(api_routes::v1::ROOT, v1::create_v1_router())
}

/// Full application: health probe, versioned API, CORS and request tracing.
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors);

    Router::new()
        .route(api_routes::HEALTH, get(health_handler))
        .merge(create_api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let allow_origin = if config.is_wildcard_included() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(USER_ROLE_HEADER),
            HeaderName::from_static(USER_PHONE_HEADER),
        ])
}
