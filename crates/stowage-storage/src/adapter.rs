//! Slot adapter
//!
//! Bridges one slot key of one backend to JSON documents. Decode failures
//! never reach the caller: they come back as [`SlotRead::Corrupt`].

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::backend::{Backend, BackendKind};
use crate::context::StorageContext;
use crate::Result;

/// Outcome of reading a slot
#[derive(Debug, Clone, PartialEq)]
pub enum SlotRead {
    /// The slot held a decodable document
    Data(Value),
    /// Nothing is stored under the slot key
    Absent,
    /// The slot held text that is not valid JSON
    Corrupt { reason: String },
}

impl SlotRead {
    /// Collapse to the decoded document, treating corruption as absence
    pub fn into_value(self) -> Option<Value> {
        match self {
            SlotRead::Data(value) => Some(value),
            SlotRead::Absent | SlotRead::Corrupt { .. } => None,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, SlotRead::Corrupt { .. })
    }
}

pub struct SlotAdapter {
    slot_key: String,
    kind: BackendKind,
    backend: Arc<dyn Backend>,
}

impl SlotAdapter {
    /// Claim `slot_key` in the context's registry and bind the backend of `kind`
    pub fn new(ctx: &StorageContext, slot_key: &str, kind: BackendKind) -> Result<Self> {
        ctx.registry().claim(slot_key)?;

        Ok(Self {
            slot_key: slot_key.to_string(),
            kind,
            backend: ctx.backend(kind),
        })
    }

    pub fn slot_key(&self) -> &str {
        &self.slot_key
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Serialize `payload` and overwrite the slot with it
    pub fn write<T: Serialize + ?Sized>(&self, payload: &T) -> Result<()> {
        let text = serde_json::to_string(payload)?;
        self.backend.set_item(&self.slot_key, &text)
    }

    pub fn read(&self) -> Result<SlotRead> {
        let Some(text) = self.backend.get_item(&self.slot_key)? else {
            return Ok(SlotRead::Absent);
        };

        match serde_json::from_str::<Value>(&text) {
            // A stored JSON null reads the same as no entry
            Ok(Value::Null) => Ok(SlotRead::Absent),
            Ok(value) => Ok(SlotRead::Data(value)),
            Err(e) => {
                tracing::warn!(
                    slot_key = %self.slot_key,
                    kind = %self.kind,
                    error = %e,
                    "Slot content is corrupt and cannot be decoded as JSON; treating it as empty"
                );
                Ok(SlotRead::Corrupt {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Remove the slot's physical entry
    pub fn erase(&self) -> Result<()> {
        self.backend.remove_item(&self.slot_key)
    }
}

impl std::fmt::Debug for SlotAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotAdapter")
            .field("slot_key", &self.slot_key)
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use serde_json::json;

    #[test]
    fn test_slot_uniqueness() {
        let ctx = StorageContext::in_memory();
        let _first = SlotAdapter::new(&ctx, "prefs", BackendKind::Local).unwrap();

        let err = SlotAdapter::new(&ctx, "prefs", BackendKind::Local).unwrap_err();
        assert!(matches!(err, StorageError::SlotClaimed(_)));

        // The registry does not care about the backend kind
        let err = SlotAdapter::new(&ctx, "prefs", BackendKind::Session).unwrap_err();
        assert!(matches!(err, StorageError::SlotClaimed(_)));

        SlotAdapter::new(&ctx, "other", BackendKind::Session).unwrap();
    }

    #[test]
    fn test_slot_uniqueness_across_contexts() {
        let db = crate::Database::open_in_memory().unwrap();
        let first = StorageContext::new(db.clone());
        let second = StorageContext::new(db);

        let _owner = SlotAdapter::new(&first, "prefs", BackendKind::Local).unwrap();
        let err = SlotAdapter::new(&second, "prefs", BackendKind::Local).unwrap_err();
        assert!(matches!(err, StorageError::SlotClaimed(_)));
    }

    #[test]
    fn test_claim_survives_drop() {
        let ctx = StorageContext::in_memory();
        drop(SlotAdapter::new(&ctx, "prefs", BackendKind::Local).unwrap());

        assert!(SlotAdapter::new(&ctx, "prefs", BackendKind::Local).is_err());
    }

    #[test]
    fn test_write_read_erase() {
        let ctx = StorageContext::in_memory();
        let adapter = SlotAdapter::new(&ctx, "prefs", BackendKind::Session).unwrap();

        assert_eq!(adapter.read().unwrap(), SlotRead::Absent);

        adapter.write(&json!({ "version": "1", "atoms": [] })).unwrap();
        assert_eq!(
            adapter.read().unwrap(),
            SlotRead::Data(json!({ "version": "1", "atoms": [] }))
        );

        adapter.erase().unwrap();
        assert_eq!(adapter.read().unwrap(), SlotRead::Absent);
        assert!(ctx
            .backend(BackendKind::Session)
            .get_item("prefs")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_corrupt_slot() {
        let ctx = StorageContext::in_memory();
        ctx.backend(BackendKind::Local)
            .set_item("broken", "zxczxc")
            .unwrap();

        let adapter = SlotAdapter::new(&ctx, "broken", BackendKind::Local).unwrap();
        let read = adapter.read().unwrap();
        assert!(read.is_corrupt());
        assert_eq!(read.into_value(), None);
    }

    #[test]
    fn test_durable_backend() {
        let ctx = StorageContext::new(crate::Database::open_in_memory().unwrap());
        let adapter = SlotAdapter::new(&ctx, "prefs", BackendKind::Local).unwrap();

        adapter.write(&json!([1, 2, 3])).unwrap();
        assert_eq!(adapter.read().unwrap().into_value(), Some(json!([1, 2, 3])));
    }
}
