//! Atom handles
//!
//! A handle is a store plus a key. It owns no data; every call goes
//! through the store.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;

use crate::model::{Atom, AtomKey, Timeout};
use crate::store::TimedStore;
use crate::Result;

pub struct AtomHandle<T> {
    store: TimedStore,
    key: AtomKey,
    _value: PhantomData<fn() -> T>,
}

impl<T> AtomHandle<T> {
    pub(crate) fn new(store: TimedStore, key: AtomKey) -> Self {
        Self {
            store,
            key,
            _value: PhantomData,
        }
    }

    pub fn key(&self) -> &AtomKey {
        &self.key
    }

    /// The stored atom, whether or not it has expired
    pub fn get_meta(&self) -> Option<Atom> {
        self.store.find_atom(&self.key)
    }

    /// The raw stored value, or `None` if absent or expired.
    /// Expired atoms stay in the store until overwritten, removed or purged.
    pub fn get_value(&self) -> Option<Value> {
        let atom = self.get_meta()?;
        if atom.is_expired_at(self.store.now()) {
            return None;
        }
        Some(atom.value)
    }

    pub fn remove(&self) -> Result<bool> {
        self.store.remove_atom(&self.key)
    }
}

impl<T: DeserializeOwned> AtomHandle<T> {
    pub fn get(&self) -> Option<T> {
        let value = self.get_value()?;
        match serde_json::from_value(value) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key = %self.key, error = %e, "Stored value has an unexpected type");
                None
            }
        }
    }

    pub fn get_or(&self, fallback: T) -> T {
        self.get().unwrap_or(fallback)
    }
}

impl<T: Serialize> AtomHandle<T> {
    pub fn set(&self, value: T) -> Result<()> {
        self.store.set_atom(&self.key, value)
    }

    pub fn set_with_timeout(&self, value: T, timeout: Timeout) -> Result<()> {
        self.store.set_atom_with_timeout(&self.key, value, timeout)
    }
}

impl<T> Clone for AtomHandle<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key.clone(),
            _value: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for AtomHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomHandle")
            .field("store", &self.store)
            .field("key", &self.key)
            .finish()
    }
}
