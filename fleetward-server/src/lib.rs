//! # Fleetward Server
//!
//! HTTP surface over the Fleetward engines: manifest check-ins, live vehicle
//! locations and panic alerts. See [`routes::create_app`] for the router and
//! [`infra::config`] for how configuration is composed.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
pub use routes::create_app;
