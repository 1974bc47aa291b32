//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] stowage_storage::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// True when construction failed because the slot key was already bound
    pub fn is_slot_claimed(&self) -> bool {
        matches!(
            self,
            CoreError::Storage(stowage_storage::StorageError::SlotClaimed(_))
        )
    }
}
