//! # Fleetward Core
//!
//! Custody and whereabouts tracking for subjects (students or tagged assets)
//! carried on vehicles:
//!
//! - [`domain::manifest`]: check-in/check-out ledger with once-per-session
//!   deduplication and guardian notifications
//! - [`domain::location`]: reconciles the fleet-tracking feed into per-vehicle
//!   location history with debounced writes
//! - [`domain::panic`]: emergency triggers with a per-user cooldown
//! - [`notify`]: bounded background delivery of SMS-style messages
//!
//! Storage is reached through the async ports in [`database::ports`]. An
//! in-memory adapter is always compiled; the PostgreSQL adapter sits behind the
//! `database` feature (on by default).
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod database;
pub mod domain;
pub mod error;
pub mod notify;
pub mod time;
pub mod tracking;

pub use database::AppUnitOfWork;
pub use error::{CoreError, ErrorKind, Result, ValidationError};
pub use fleetward_model as model;

#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
