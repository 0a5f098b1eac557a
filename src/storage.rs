//! Key-value slots for locally persisted state.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

const MIGRATION_SQL_0001: &str = include_str!("../migrations/0001_local_storage.sql");

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("storage io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("storage database error: {0}")]
  Database(#[from] rusqlite::Error),
  #[error("storage unavailable: {0}")]
  Unavailable(String),
}

pub trait KeyValueStorage: Send {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
  fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
  fn remove(&self, key: &str) -> Result<(), StorageError>;
}

fn now_iso() -> String {
  Utc::now().to_rfc3339()
}

/// SQLite-backed slots. Each call opens its own connection.
#[derive(Clone, Debug)]
pub struct SqliteStorage {
  db_path: PathBuf,
}

impl SqliteStorage {
  pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
    let db_path = db_path.into();
    init_database(&db_path)?;
    Ok(Self { db_path })
  }

  fn connection(&self) -> Result<Connection, StorageError> {
    Ok(Connection::open(&self.db_path)?)
  }
}

fn init_database(db_path: &Path) -> Result<(), StorageError> {
  if let Some(parent) = db_path.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent)?;
    }
  }

  let connection = Connection::open(db_path)?;
  connection.execute_batch(MIGRATION_SQL_0001)?;
  Ok(())
}

impl KeyValueStorage for SqliteStorage {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    let connection = self.connection()?;
    let value = connection
      .query_row(
        "SELECT value FROM local_storage WHERE key = ?1 LIMIT 1",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(value)
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    let connection = self.connection()?;
    connection.execute(
      "INSERT INTO local_storage (key, value, updated_at)
       VALUES (?1, ?2, ?3)
       ON CONFLICT(key) DO UPDATE SET
         value = excluded.value,
         updated_at = excluded.updated_at",
      params![key, value, now_iso()],
    )?;
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    let connection = self.connection()?;
    connection.execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
    Ok(())
  }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
  slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn slots(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
    self
      .slots
      .lock()
      .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))
  }
}

impl KeyValueStorage for MemoryStorage {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    Ok(self.slots()?.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    self.slots()?.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    self.slots()?.remove(key);
    Ok(())
  }
}

impl<T: KeyValueStorage + Sync> KeyValueStorage for std::sync::Arc<T> {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    (**self).get(key)
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    (**self).set(key, value)
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    (**self).remove(key)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn sqlite_round_trip_survives_reopen() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("nested").join("catalog.db");

    let storage = SqliteStorage::open(&db_path).unwrap();
    assert_eq!(storage.get("wishlist").unwrap(), None);
    storage.set("wishlist", r#"["OP01-001"]"#).unwrap();
    storage.set("wishlist", r#"["OP01-002"]"#).unwrap();

    let reopened = SqliteStorage::open(&db_path).unwrap();
    assert_eq!(reopened.get("wishlist").unwrap().as_deref(), Some(r#"["OP01-002"]"#));

    reopened.remove("wishlist").unwrap();
    assert_eq!(storage.get("wishlist").unwrap(), None);
  }

  #[test]
  fn memory_storage_slots_are_independent() {
    let storage = MemoryStorage::new();
    storage.set("a", "1").unwrap();
    storage.set("b", "2").unwrap();
    storage.remove("a").unwrap();
    assert_eq!(storage.get("a").unwrap(), None);
    assert_eq!(storage.get("b").unwrap().as_deref(), Some("2"));
  }
}
