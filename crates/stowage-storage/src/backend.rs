//! Slot backends
//!
//! A backend is a synchronous string-to-string map. Two kinds exist:
//! ```text
//! Session  - lives as long as the process
//! Local    - durable, survives restarts
//! ```

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::registry::SlotRegistry;
use crate::Result;

/// Raw key/value storage underneath a slot.
pub trait Backend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    fn remove_item(&self, key: &str) -> Result<()>;

    /// Registry of slot keys claimed on this physical storage. Every
    /// handle onto the same storage must return the same registry.
    fn registry(&self) -> Arc<SlotRegistry>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Short-lived, per-process storage
    Session,
    /// Durable storage
    #[default]
    Local,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Session => "session",
            BackendKind::Local => "local",
        }
    }

    /// Returns true if data written through this kind outlives the process
    pub fn is_durable(&self) -> bool {
        matches!(self, BackendKind::Local)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "session" => Ok(BackendKind::Session),
            "local" => Ok(BackendKind::Local),
            _ => Err(format!("Unknown backend kind: {}", s)),
        }
    }
}

/// In-memory backend, used for the session kind and in tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: RwLock<HashMap<String, String>>,
    registry: Arc<SlotRegistry>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim slots against an existing registry instead of a private one
    pub fn with_registry(registry: Arc<SlotRegistry>) -> Self {
        Self {
            items: RwLock::default(),
            registry,
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl Backend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().remove(key);
        Ok(())
    }

    fn registry(&self) -> Arc<SlotRegistry> {
        Arc::clone(&self.registry)
    }
}
