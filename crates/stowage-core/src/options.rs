//! Store options

use serde::{Deserialize, Serialize};
use stowage_storage::BackendKind;

pub const DEFAULT_SLOT_KEY: &str = "STORAGE_TIMING";
pub const DEFAULT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Target schema version; a different stored version triggers migration
    pub version: String,
    /// Physical key of the slot this store owns
    pub slot_key: String,
    pub backend_kind: BackendKind,
    /// Drop expired atoms right after loading
    pub purge_expired_on_load: bool,
}

impl StoreOptions {
    pub fn new(slot_key: impl Into<String>) -> Self {
        Self {
            slot_key: slot_key.into(),
            ..Self::default()
        }
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            slot_key: DEFAULT_SLOT_KEY.to_string(),
            backend_kind: BackendKind::default(),
            purge_expired_on_load: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = StoreOptions::default();
        assert_eq!(options.version, "1.0.0");
        assert_eq!(options.slot_key, "STORAGE_TIMING");
        assert_eq!(options.backend_kind, BackendKind::Local);
        assert!(!options.purge_expired_on_load);
    }

    #[test]
    fn test_partial_config() {
        let options: StoreOptions =
            serde_json::from_str(r#"{"slot_key":"prefs","backend_kind":"session"}"#).unwrap();
        assert_eq!(options.slot_key, "prefs");
        assert_eq!(options.backend_kind, BackendKind::Session);
        assert_eq!(options.version, DEFAULT_VERSION);
    }
}
