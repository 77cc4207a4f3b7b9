//! In-process adapters. Atomicity comes from holding a lock across each
//! check-and-write; per-key state lives behind its own mutex so unrelated
//! vehicles or users never contend.

mod directory;
mod locations;
mod manifests;
mod panics;

pub use directory::{DirectorySeed, MemoryDirectory};
pub use locations::MemoryLocationStore;
pub use manifests::MemoryManifestStore;
pub use panics::MemoryPanicStore;
