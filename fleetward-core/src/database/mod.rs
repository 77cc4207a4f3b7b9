//! Storage ports and their adapters.

pub mod memory;
pub mod ports;
#[cfg(feature = "database")]
pub mod postgres;
mod unit_of_work;

#[cfg(feature = "database")]
pub use postgres::PostgresDatabase;
pub use unit_of_work::AppUnitOfWork;
