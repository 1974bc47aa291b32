//! Stowage Core
//!
//! A key-value store that packs many entries ("atoms") into a single
//! backend slot. Every atom carries its own expiry, and the whole slot is
//! migrated when the caller's schema version changes.
//!
//! ```
//! use stowage_core::{StorageContext, TimedStore};
//!
//! let ctx = StorageContext::in_memory();
//! let store = TimedStore::builder(&ctx).slot_key("prefs").open().unwrap();
//!
//! let theme = store.atom::<String>("theme");
//! theme.set("dark".to_string()).unwrap();
//! assert_eq!(theme.get().as_deref(), Some("dark"));
//! ```

mod atom;
mod clock;
mod compact;
mod error;
mod model;
mod options;
mod store;

pub use atom::AtomHandle;
pub use clock::{Clock, ManualClock, SystemClock};
pub use compact::{CompactAtom, CompactStoreModel};
pub use error::CoreError;
pub use model::{Atom, AtomKey, StoreModel, Timeout, NEVER_TIMEOUT};
pub use options::{StoreOptions, DEFAULT_SLOT_KEY, DEFAULT_VERSION};
pub use store::{OnVersionChange, StoreBuilder, StoreInfo, TimedStore};

// Re-export storage components
pub use stowage_storage::{
    Backend, BackendKind, Database, MemoryBackend, SlotAdapter, SlotRead, SlotRegistry,
    StorageConfig, StorageContext, StorageError,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A second call leaves the first subscriber in place
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
        tracing::info!("logging initialized");
    }
}
