//! Backing medium contract and implementations.
//!
//! The store persists every collection as one string value under one
//! string key. [`Medium`] captures that contract: a synchronous,
//! string-keyed, string-valued durable store with key enumeration.
//! Writes may fail (quota, locked database, disabled storage); the
//! store context catches those failures, the medium only reports them.
//!
//! Two implementations are provided:
//!
//! - [`MemoryMedium`] — plain `HashMap` behind a mutex. Ephemeral;
//!   the default for tests.
//! - [`SqliteMedium`] — a single `kv` table in SQLite, durable across
//!   process restarts.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// Synchronous string-keyed durable store.
///
/// All methods complete before returning; none block on network I/O.
pub trait Medium: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Enumerate every key currently stored.
    fn keys(&self) -> StoreResult<Vec<String>>;
}

fn poisoned<T>(err: PoisonError<T>) -> StoreError {
    StoreError::Medium(format!("medium lock poisoned: {err}"))
}

// ---------------------------------------------------------------------------
// MemoryMedium
// ---------------------------------------------------------------------------

/// In-process medium backed by a `HashMap`. Contents are lost when the
/// process exits.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryMedium {
    /// Create an empty in-memory medium.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Medium for MemoryMedium {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.lock().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .lock()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.lock().map_err(poisoned)?.remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.lock().map_err(poisoned)?.keys().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// SqliteMedium
// ---------------------------------------------------------------------------

/// Durable medium backed by a single SQLite `kv` table.
///
/// The connection is wrapped in a `Mutex` because `rusqlite::Connection`
/// is `!Sync`; each operation holds the lock briefly.
pub struct SqliteMedium {
    conn: Mutex<Connection>,
}

impl SqliteMedium {
    /// Open (or create) the medium database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening key-value medium");

        let conn = Connection::open(path)?;
        Self::configure(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory medium (useful for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("opening in-memory key-value medium");

        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Apply pragmas and create the `kv` table.
    fn configure(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;

             CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
             );",
        )?;
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(poisoned)
    }
}

impl Medium for SqliteMedium {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM kv")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise_medium(medium: &dyn Medium) {
        assert_eq!(medium.get("a").unwrap(), None);

        medium.set("a", "1").unwrap();
        medium.set("b", "2").unwrap();
        assert_eq!(medium.get("a").unwrap().as_deref(), Some("1"));

        medium.set("a", "3").unwrap();
        assert_eq!(medium.get("a").unwrap().as_deref(), Some("3"));

        let mut keys = medium.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        medium.remove("a").unwrap();
        assert_eq!(medium.get("a").unwrap(), None);

        // Removing an absent key is fine.
        medium.remove("a").unwrap();
    }

    #[test]
    fn memory_medium_round_trip() {
        exercise_medium(&MemoryMedium::new());
    }

    #[test]
    fn sqlite_medium_round_trip() {
        exercise_medium(&SqliteMedium::open_in_memory().unwrap());
    }

    #[test]
    fn sqlite_medium_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medium.db");

        {
            let medium = SqliteMedium::open(&path).unwrap();
            medium.set("magang.v3.siswa", r#"{"data":[],"timestamp":0}"#).unwrap();
        }

        let medium = SqliteMedium::open(&path).unwrap();
        assert_eq!(
            medium.get("magang.v3.siswa").unwrap().as_deref(),
            Some(r#"{"data":[],"timestamp":0}"#)
        );
    }
}
