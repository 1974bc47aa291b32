//! Storage context
//!
//! One backend of each kind plus the slot registry of the durable one.
//! Session slots claim against the same registry, so a key is bound once
//! across both kinds. Contexts built over the same storage share claims.

use std::sync::Arc;

use crate::backend::{Backend, BackendKind, MemoryBackend};
use crate::config::StorageConfig;
use crate::database::Database;
use crate::registry::SlotRegistry;
use crate::Result;

pub struct StorageContext {
    registry: Arc<SlotRegistry>,
    session: Arc<dyn Backend>,
    local: Arc<dyn Backend>,
}

impl StorageContext {
    /// Build a context around the given durable backend
    pub fn new<B: Backend + 'static>(local: B) -> Self {
        let registry = local.registry();

        Self {
            session: Arc::new(MemoryBackend::with_registry(Arc::clone(&registry))),
            local: Arc::new(local),
            registry,
        }
    }

    /// Durable slots live in the SQLite file named by the config
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let db = Database::open(&config.database_path)?;

        tracing::info!(
            path = %config.database_path.display(),
            "Opened storage context"
        );

        Ok(Self::new(db))
    }

    /// Both kinds held in memory
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    pub fn backend(&self, kind: BackendKind) -> Arc<dyn Backend> {
        match kind {
            BackendKind::Session => Arc::clone(&self.session),
            BackendKind::Local => Arc::clone(&self.local),
        }
    }
}

impl Clone for StorageContext {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            session: Arc::clone(&self.session),
            local: Arc::clone(&self.local),
        }
    }
}
