//! Infrastructure layer: durable profile storage.

pub mod json_store;
pub mod memory_store;
pub mod paths;

pub use json_store::JsonProfileStore;
pub use memory_store::MemoryProfileStore;
