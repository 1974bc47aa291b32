//! Stowage Storage Layer
//!
//! Binds a single named slot of a synchronous key/value backend.
//! Each slot key can be claimed by at most one adapter per process.

mod adapter;
mod backend;
mod config;
mod context;
mod database;
mod error;
mod migrations;
mod registry;

pub use adapter::{SlotAdapter, SlotRead};
pub use backend::{Backend, BackendKind, MemoryBackend};
pub use config::StorageConfig;
pub use context::StorageContext;
pub use database::Database;
pub use error::StorageError;
pub use registry::SlotRegistry;

pub type Result<T> = std::result::Result<T, StorageError>;
