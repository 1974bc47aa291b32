//! In-memory data model
//!
//! A store holds an ordered list of atoms. Each atom is one keyed value
//! with its own creation time, update time and expiry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Serialized form of [`Timeout::Never`]
pub const NEVER_TIMEOUT: i64 = -1;

/// Any JSON number or string. Numbers compare by their JSON form, so
/// `1` and `1.0` are different keys, as are `1` and `"1"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AtomKey {
    Number(Number),
    Text(String),
}

impl AtomKey {
    /// `None` for NaN and infinities, which JSON cannot carry
    pub fn from_f64(key: f64) -> Option<Self> {
        Number::from_f64(key).map(AtomKey::Number)
    }
}

impl std::fmt::Display for AtomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomKey::Number(n) => write!(f, "{}", n),
            AtomKey::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for AtomKey {
    fn from(key: &str) -> Self {
        AtomKey::Text(key.to_string())
    }
}

impl From<String> for AtomKey {
    fn from(key: String) -> Self {
        AtomKey::Text(key)
    }
}

impl From<&String> for AtomKey {
    fn from(key: &String) -> Self {
        AtomKey::Text(key.clone())
    }
}

impl From<&AtomKey> for AtomKey {
    fn from(key: &AtomKey) -> Self {
        key.clone()
    }
}

impl From<i64> for AtomKey {
    fn from(key: i64) -> Self {
        AtomKey::Number(key.into())
    }
}

impl From<i32> for AtomKey {
    fn from(key: i32) -> Self {
        AtomKey::Number(key.into())
    }
}

impl From<u32> for AtomKey {
    fn from(key: u32) -> Self {
        AtomKey::Number(key.into())
    }
}

impl From<u64> for AtomKey {
    fn from(key: u64) -> Self {
        AtomKey::Number(key.into())
    }
}

/// Absolute expiry of an atom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Timeout {
    #[default]
    Never,
    /// Expires once the current time is strictly past this timestamp
    At(i64),
}

impl Timeout {
    /// Expire `delta` after `now_millis`
    pub fn after(now_millis: i64, delta: chrono::Duration) -> Self {
        Timeout::At(now_millis.saturating_add(delta.num_milliseconds()))
    }

    pub fn at_datetime(at: DateTime<Utc>) -> Self {
        Timeout::At(at.timestamp_millis())
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Timeout::Never)
    }

    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        match self {
            Timeout::Never => false,
            Timeout::At(at) => now_millis > *at,
        }
    }
}

impl From<i64> for Timeout {
    fn from(raw: i64) -> Self {
        if raw == NEVER_TIMEOUT {
            Timeout::Never
        } else {
            Timeout::At(raw)
        }
    }
}

impl From<Timeout> for i64 {
    fn from(timeout: Timeout) -> Self {
        match timeout {
            Timeout::Never => NEVER_TIMEOUT,
            Timeout::At(at) => at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub key: AtomKey,
    pub value: Value,
    /// Set on first write and never changed afterwards
    pub created_at: i64,
    /// Set on every write
    pub updated_at: i64,
    pub timeout: Timeout,
}

impl Atom {
    pub fn new(key: AtomKey, value: Value, now_millis: i64, timeout: Timeout) -> Self {
        Self {
            key,
            value,
            created_at: now_millis,
            updated_at: now_millis,
            timeout,
        }
    }

    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        self.timeout.is_expired_at(now_millis)
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.created_at)
    }

    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.updated_at)
    }
}

/// Full in-memory state of one store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreModel {
    pub version: String,
    pub atoms: Vec<Atom>,
}

impl StoreModel {
    pub fn fresh(version: &str) -> Self {
        Self {
            version: version.to_string(),
            atoms: Vec::new(),
        }
    }

    pub fn position(&self, key: &AtomKey) -> Option<usize> {
        self.atoms.iter().position(|a| &a.key == key)
    }

    pub fn find(&self, key: &AtomKey) -> Option<&Atom> {
        self.atoms.iter().find(|a| &a.key == key)
    }

    /// Insert or overwrite the atom for `key`, keeping its creation time
    pub fn upsert(&mut self, key: AtomKey, value: Value, timeout: Timeout, now_millis: i64) {
        match self.position(&key) {
            Some(index) => {
                let atom = &mut self.atoms[index];
                atom.value = value;
                atom.updated_at = now_millis;
                atom.timeout = timeout;
            }
            None => self.atoms.push(Atom::new(key, value, now_millis, timeout)),
        }
    }

    /// Returns true if an atom was removed
    pub fn remove(&mut self, key: &AtomKey) -> bool {
        match self.position(key) {
            Some(index) => {
                self.atoms.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drop every expired atom, returning how many were dropped
    pub fn purge_expired(&mut self, now_millis: i64) -> usize {
        let before = self.atoms.len();
        self.atoms.retain(|a| !a.is_expired_at(now_millis));
        before - self.atoms.len()
    }

    /// Replace the atom list. A later atom with an already-seen key
    /// replaces the earlier one in place.
    pub fn replace_atoms(&mut self, atoms: Vec<Atom>) {
        let mut merged: Vec<Atom> = Vec::with_capacity(atoms.len());
        for atom in atoms {
            match merged.iter().position(|a| a.key == atom.key) {
                Some(index) => merged[index] = atom,
                None => merged.push(atom),
            }
        }
        self.atoms = merged;
    }
}
