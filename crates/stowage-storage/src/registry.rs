//! Slot key registry
//!
//! Two adapters writing the same physical slot would overwrite each
//! other's view of it, so every slot key may be claimed once. Claims are
//! never released during normal operation.

use parking_lot::Mutex;
use std::collections::HashSet;

use crate::error::StorageError;
use crate::Result;

#[derive(Debug, Default)]
pub struct SlotRegistry {
    claimed: Mutex<HashSet<String>>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a slot key, failing if it is already taken
    pub fn claim(&self, slot_key: &str) -> Result<()> {
        let mut claimed = self.claimed.lock();
        if !claimed.insert(slot_key.to_string()) {
            return Err(StorageError::SlotClaimed(slot_key.to_string()));
        }

        tracing::debug!(slot_key = %slot_key, "Claimed slot");
        Ok(())
    }

    pub fn is_claimed(&self, slot_key: &str) -> bool {
        self.claimed.lock().contains(slot_key)
    }

    /// All claimed keys, sorted
    pub fn claimed(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.claimed.lock().iter().cloned().collect();
        keys.sort();
        keys
    }

    /// Release every claim. Only meant for test harnesses.
    pub fn reset(&self) {
        self.claimed.lock().clear();
    }
}
