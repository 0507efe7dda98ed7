//! Storage backends: the raw string-keyed media the [`Store`] sits on.
//!
//! [`Store`]: super::Store

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

use crate::error::StorageError;

/// A raw key-value medium. Values are opaque strings; typing and
/// fallback behavior live in [`super::Store`].
pub trait StorageBackend {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_raw(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_raw(&mut self, key: &str) -> Result<(), StorageError>;
}

/// SQLite-backed primary medium: a single `kv` table.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open the database at `~/.config/focusloop/focusloop.db`.
    ///
    /// Creates the file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns a classified error if the database cannot be opened or
    /// migrated.
    pub fn open() -> Result<Self, StorageError> {
        let dir = super::data_dir().map_err(|e| StorageError::AccessDenied(e.to_string()))?;
        Self::open_at(dir.join("focusloop.db"))
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path.as_ref())?;
        let backend = Self { conn };
        backend.migrate()?;
        Ok(backend)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let backend = Self { conn };
        backend.migrate()?;
        Ok(backend)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl StorageBackend for SqliteBackend {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_raw(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_raw(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Infallible in-memory medium. Backs the store's transparent fallback
/// and stands alone in ephemeral/test configurations.
#[derive(Default)]
pub struct MemoryBackend {
    map: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.map.get(key).cloned())
    }

    fn set_raw(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_raw(&mut self, key: &str) -> Result<(), StorageError> {
        self.map.remove(key);
        Ok(())
    }
}

/// Returns `~/.config/focusloop[-dev]/` based on FOCUSLOOP_ENV.
///
/// Set FOCUSLOOP_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub(super) fn resolve_data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSLOOP_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusloop-dev")
    } else {
        base_dir.join("focusloop")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_round_trip() {
        let mut backend = MemoryBackend::new();
        assert!(backend.get_raw("missing").unwrap().is_none());
        backend.set_raw("key", "value").unwrap();
        assert_eq!(backend.get_raw("key").unwrap().as_deref(), Some("value"));
        backend.remove_raw("key").unwrap();
        assert!(backend.get_raw("key").unwrap().is_none());
    }

    #[test]
    fn sqlite_backend_round_trip() {
        let mut backend = SqliteBackend::open_memory().unwrap();
        assert!(backend.get_raw("test").unwrap().is_none());
        backend.set_raw("test", "hello").unwrap();
        assert_eq!(backend.get_raw("test").unwrap().as_deref(), Some("hello"));
        backend.set_raw("test", "replaced").unwrap();
        assert_eq!(backend.get_raw("test").unwrap().as_deref(), Some("replaced"));
        backend.remove_raw("test").unwrap();
        assert!(backend.get_raw("test").unwrap().is_none());
    }
}
