pub mod health;
pub mod locations;
pub mod manifests;
pub mod panic;
