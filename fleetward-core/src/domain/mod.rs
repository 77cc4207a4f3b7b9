pub mod location;
pub mod location_poller;
pub mod manifest;
pub mod messages;
pub mod panic;
