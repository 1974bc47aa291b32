//! On-disk representation
//!
//! The slot holds one JSON document with short field names:
//! ```text
//! { "version": "1.0.0",
//!   "atoms": [ { "k": "theme", "v": "dark", "cr": 1700000000000, "up": 1700000000000, "t": -1 } ] }
//! ```
//! These names and the `-1` never-expires sentinel must not change, or
//! previously written slots stop loading.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::model::{Atom, AtomKey, StoreModel, Timeout};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactAtom {
    pub k: AtomKey,
    #[serde(default)]
    pub v: Value,
    pub cr: i64,
    pub up: i64,
    pub t: Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactStoreModel {
    pub version: String,
    pub atoms: Vec<CompactAtom>,
}

impl CompactStoreModel {
    /// Accept a decoded slot document only if it has the exact compact
    /// shape: a string version, a non-empty atom array in which every
    /// element is well formed, and no key repeated.
    pub fn validate(document: Value) -> Option<Self> {
        let model: CompactStoreModel = match serde_json::from_value(document) {
            Ok(model) => model,
            Err(e) => {
                tracing::debug!(error = %e, "Slot document does not match the compact shape");
                return None;
            }
        };

        if model.atoms.is_empty() {
            tracing::debug!("Slot document has no atoms");
            return None;
        }

        let duplicate = {
            let mut seen = HashSet::with_capacity(model.atoms.len());
            model
                .atoms
                .iter()
                .find(|a| !seen.insert(&a.k))
                .map(|a| a.k.clone())
        };
        if let Some(key) = duplicate {
            tracing::debug!(key = %key, "Slot document repeats a key");
            return None;
        }

        Some(model)
    }
}

impl From<CompactAtom> for Atom {
    fn from(atom: CompactAtom) -> Self {
        Atom {
            key: atom.k,
            value: atom.v,
            created_at: atom.cr,
            updated_at: atom.up,
            timeout: atom.t,
        }
    }
}

impl From<&Atom> for CompactAtom {
    fn from(atom: &Atom) -> Self {
        CompactAtom {
            k: atom.key.clone(),
            v: atom.value.clone(),
            cr: atom.created_at,
            up: atom.updated_at,
            t: atom.timeout,
        }
    }
}

impl From<CompactStoreModel> for StoreModel {
    fn from(model: CompactStoreModel) -> Self {
        StoreModel {
            version: model.version,
            atoms: model.atoms.into_iter().map(Atom::from).collect(),
        }
    }
}

impl From<&StoreModel> for CompactStoreModel {
    fn from(model: &StoreModel) -> Self {
        CompactStoreModel {
            version: model.version.clone(),
            atoms: model.atoms.iter().map(CompactAtom::from).collect(),
        }
    }
}
