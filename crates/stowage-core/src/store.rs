//! Timed versioned store
//!
//! Owns the in-memory model for one slot. Every mutation is written
//! through to the slot before the call returns.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use stowage_storage::{BackendKind, SlotAdapter, StorageContext};

use crate::atom::AtomHandle;
use crate::clock::{Clock, SystemClock};
use crate::compact::CompactStoreModel;
use crate::model::{Atom, AtomKey, StoreModel, Timeout};
use crate::options::StoreOptions;
use crate::Result;

/// Migration hook, run once at open when the stored version differs from
/// the requested one. Receives the old atoms and the old version and
/// returns the atoms to keep. If several returned atoms share a key, the
/// last one wins.
pub type OnVersionChange = Box<dyn FnOnce(&[Atom], &str) -> Vec<Atom> + Send>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub slot_key: String,
    pub version: String,
}

pub struct StoreBuilder<'a> {
    ctx: &'a StorageContext,
    options: StoreOptions,
    on_version_change: Option<OnVersionChange>,
    clock: Arc<dyn Clock>,
}

impl<'a> StoreBuilder<'a> {
    fn new(ctx: &'a StorageContext) -> Self {
        Self {
            ctx,
            options: StoreOptions::default(),
            on_version_change: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.options.version = version.into();
        self
    }

    pub fn slot_key(mut self, slot_key: impl Into<String>) -> Self {
        self.options.slot_key = slot_key.into();
        self
    }

    pub fn backend_kind(mut self, kind: BackendKind) -> Self {
        self.options.backend_kind = kind;
        self
    }

    pub fn purge_expired_on_load(mut self, purge: bool) -> Self {
        self.options.purge_expired_on_load = purge;
        self
    }

    pub fn on_version_change<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&[Atom], &str) -> Vec<Atom> + Send + 'static,
    {
        self.on_version_change = Some(Box::new(f));
        self
    }

    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn open(self) -> Result<TimedStore> {
        TimedStore::open(self.ctx, self.options, self.on_version_change, self.clock)
    }
}

pub struct TimedStore {
    model: Arc<RwLock<StoreModel>>,
    adapter: Arc<SlotAdapter>,
    clock: Arc<dyn Clock>,
    /// Requested version, which the model carries once open returns
    version: String,
}

impl TimedStore {
    pub fn builder(ctx: &StorageContext) -> StoreBuilder<'_> {
        StoreBuilder::new(ctx)
    }

    /// Open with the given options, a system clock and no migration hook
    pub fn with_options(ctx: &StorageContext, options: StoreOptions) -> Result<Self> {
        Self::builder(ctx).options(options).open()
    }

    /// The slot is claimed before it is read. A backend error during the
    /// load or the first save leaves the claim held.
    fn open(
        ctx: &StorageContext,
        options: StoreOptions,
        on_version_change: Option<OnVersionChange>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let adapter = SlotAdapter::new(ctx, &options.slot_key, options.backend_kind)?;

        let mut model = match adapter
            .read()?
            .into_value()
            .and_then(CompactStoreModel::validate)
        {
            Some(compact) => StoreModel::from(compact),
            None => StoreModel::fresh(&options.version),
        };

        let store = Self {
            model: Arc::new(RwLock::new(StoreModel::fresh(&options.version))),
            adapter: Arc::new(adapter),
            clock,
            version: options.version,
        };

        if options.purge_expired_on_load {
            let purged = model.purge_expired(store.now());
            tracing::debug!(
                slot_key = %store.adapter.slot_key(),
                purged,
                "Purged expired atoms on load"
            );
            store.save(&model)?;
        }

        if model.version != store.version {
            store.reconcile(&mut model, on_version_change)?;
        }

        tracing::info!(
            slot_key = %store.adapter.slot_key(),
            kind = %store.adapter.kind(),
            version = %store.version,
            atom_count = model.atoms.len(),
            "Opened store"
        );

        *store.model.write() = model;
        Ok(store)
    }

    /// Carry atoms across a version change and persist the result
    fn reconcile(
        &self,
        model: &mut StoreModel,
        on_version_change: Option<OnVersionChange>,
    ) -> Result<()> {
        let old_version = std::mem::replace(&mut model.version, self.version.clone());
        let snapshot = std::mem::take(&mut model.atoms);

        let retained = match on_version_change {
            Some(f) => f(&snapshot, &old_version),
            None => Vec::new(),
        };
        model.replace_atoms(retained);

        tracing::info!(
            slot_key = %self.adapter.slot_key(),
            from = %old_version,
            to = %self.version,
            kept = model.atoms.len(),
            dropped = snapshot.len().saturating_sub(model.atoms.len()),
            "Migrated store version"
        );

        self.save(model)
    }

    fn save(&self, model: &StoreModel) -> Result<()> {
        self.adapter.write(&CompactStoreModel::from(model))?;
        Ok(())
    }

    pub(crate) fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Look up an atom by key, expired or not
    pub fn find_atom(&self, key: impl Into<AtomKey>) -> Option<Atom> {
        let key = key.into();
        self.model.read().find(&key).cloned()
    }

    /// Write an atom that never expires
    pub fn set_atom<V: Serialize>(&self, key: impl Into<AtomKey>, value: V) -> Result<()> {
        self.set_atom_with_timeout(key, value, Timeout::Never)
    }

    /// Insert or overwrite an atom. Overwriting keeps the original creation time.
    pub fn set_atom_with_timeout<V: Serialize>(
        &self,
        key: impl Into<AtomKey>,
        value: V,
        timeout: Timeout,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let now = self.now();

        let mut model = self.model.write();
        model.upsert(key.into(), value, timeout, now);
        self.save(&model)
    }

    /// Returns true if an atom was removed. Nothing is written when the key is absent.
    pub fn remove_atom(&self, key: impl Into<AtomKey>) -> Result<bool> {
        let key = key.into();
        let mut model = self.model.write();
        if !model.remove(&key) {
            return Ok(false);
        }
        self.save(&model)?;
        Ok(true)
    }

    /// A typed handle bound to `key`. The key need not exist.
    pub fn atom<T>(&self, key: impl Into<AtomKey>) -> AtomHandle<T> {
        AtomHandle::new(self.clone(), key.into())
    }

    /// Copy of every atom, in stored order
    pub fn get_atoms(&self) -> Vec<Atom> {
        self.model.read().atoms.clone()
    }

    /// Drop all atoms and erase the slot from the backend
    pub fn clear(&self) -> Result<()> {
        let mut model = self.model.write();
        model.atoms.clear();
        self.adapter.erase()?;

        tracing::debug!(slot_key = %self.adapter.slot_key(), "Cleared store");
        Ok(())
    }

    /// Purge every expired atom, returning how many were removed
    pub fn clear_timeout(&self) -> Result<usize> {
        let now = self.now();
        let mut model = self.model.write();
        let purged = model.purge_expired(now);
        self.save(&model)?;

        tracing::debug!(slot_key = %self.adapter.slot_key(), purged, "Purged expired atoms");
        Ok(purged)
    }

    pub fn info(&self) -> StoreInfo {
        StoreInfo {
            slot_key: self.adapter.slot_key().to_string(),
            version: self.version.clone(),
        }
    }
}

impl Clone for TimedStore {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            adapter: Arc::clone(&self.adapter),
            clock: Arc::clone(&self.clock),
            version: self.version.clone(),
        }
    }
}

impl std::fmt::Debug for TimedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedStore")
            .field("slot_key", &self.adapter.slot_key())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
