//! Repository ports (interfaces) grouped by bounded context.
//!
//! Every check-then-write rule (manifest dedup, panic cooldown, location
//! debounce) is a single port call so adapters can make it atomic.

pub mod directory;
pub mod locations;
pub mod manifests;
pub mod panics;
