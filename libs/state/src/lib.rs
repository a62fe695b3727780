//! # Durable State
//!
//! The key-value collaborator the session engine persists through:
//! counters, health metrics, duplicate records and pending
//! acknowledgments. Components only see [`DurableStore`]; deployments
//! choose [`MemoryStore`] or the crash-safe [`FileStore`].

pub mod error;
pub mod file;
pub mod keyspace;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use keyspace::{Keyspace, KEY_ROOT};
pub use memory::MemoryStore;
pub use store::DurableStore;
