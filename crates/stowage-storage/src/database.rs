//! SQLite-backed durable slots

use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::Backend;
use crate::migrations::run_migrations;
use crate::registry::SlotRegistry;
use crate::Result;

/// One registry per database file, shared by every connection to it
static FILE_REGISTRIES: Lazy<Mutex<HashMap<PathBuf, Arc<SlotRegistry>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn registry_for(path: &Path) -> Arc<SlotRegistry> {
    let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    Arc::clone(FILE_REGISTRIES.lock().entry(key).or_default())
}

pub struct Database {
    conn: Arc<Mutex<Connection>>,
    registry: Arc<SlotRegistry>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path.as_ref())?;

        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            registry: registry_for(path.as_ref()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            registry: Arc::new(SlotRegistry::new()),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn get_slot(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row("SELECT value FROM slots WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    pub fn set_slot(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, updated_at],
            )?;
            Ok(())
        })
    }

    pub fn remove_slot(&self, key: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM slots WHERE key = ?1", [key])?;
            Ok(())
        })
    }

    /// Keys of every stored slot, sorted
    pub fn list_slots(&self) -> Result<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT key FROM slots ORDER BY key")?;
            let keys = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(keys)
        })
    }
}

impl Backend for Database {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.get_slot(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.set_slot(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.remove_slot(key)
    }

    fn registry(&self) -> Arc<SlotRegistry> {
        Arc::clone(&self.registry)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            registry: Arc::clone(&self.registry),
        }
    }
}
