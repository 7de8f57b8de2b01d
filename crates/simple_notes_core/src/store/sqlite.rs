//! SQLite-backed slot store.
//!
//! # Responsibility
//! - Persist slots in `kv_slots` with a store-wide revision per write.
//! - Detect writes by other connections to the same file by comparing the
//!   revisions this handle has already observed.
//!
//! # Invariants
//! - Each handle stamps its writes with a unique writer id.
//! - Revisions come from the single-row `kv_clock` table and never repeat.

use super::{KeyValueStore, StorageEvent, StoreResult};
use crate::db::{open_db, open_db_in_memory};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use uuid::Uuid;

/// Durable [`KeyValueStore`] over a migrated SQLite connection.
pub struct SqliteStore {
    conn: Connection,
    writer: String,
    seen_revisions: HashMap<String, i64>,
}

struct SlotRow {
    key: String,
    value: String,
    revision: i64,
    writer: String,
}

impl SqliteStore {
    /// Opens (or creates) the slot database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    /// Opens a private in-memory slot database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Wraps a connection returned by [`crate::db::open_db`].
    ///
    /// Slots already present count as observed, so only later writes by other
    /// handles are reported as external changes.
    pub fn from_connection(conn: Connection) -> StoreResult<Self> {
        let mut store = Self {
            conn,
            writer: Uuid::new_v4().simple().to_string(),
            seen_revisions: HashMap::new(),
        };
        store.seen_revisions = store
            .load_rows()?
            .into_iter()
            .map(|row| (row.key, row.revision))
            .collect();
        Ok(store)
    }

    /// Writer id stamped on this handle's writes.
    pub fn writer_id(&self) -> &str {
        &self.writer
    }

    fn load_rows(&self) -> StoreResult<Vec<SlotRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, value, revision, writer
             FROM kv_slots
             ORDER BY revision ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut slots = Vec::new();
        while let Some(row) = rows.next()? {
            slots.push(SlotRow {
                key: row.get("key")?,
                value: row.get("value")?,
                revision: row.get("revision")?,
                writer: row.get("writer")?,
            });
        }
        Ok(slots)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_slots WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<String> = tx
            .query_row(
                "SELECT value FROM kv_slots WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        if current.as_deref() == Some(value) {
            return Ok(());
        }

        tx.execute("UPDATE kv_clock SET revision = revision + 1 WHERE id = 1;", [])?;
        let revision: i64 =
            tx.query_row("SELECT revision FROM kv_clock WHERE id = 1;", [], |row| {
                row.get(0)
            })?;
        tx.execute(
            "INSERT INTO kv_slots (key, value, revision, writer)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                revision = excluded.revision,
                writer = excluded.writer;",
            params![key, value, revision, self.writer.as_str()],
        )?;
        tx.commit()?;

        self.seen_revisions.insert(key.to_string(), revision);
        debug!(
            "event=slot_write module=store status=ok backend=sqlite key={} revision={} bytes={}",
            key,
            revision,
            value.len()
        );
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_slots WHERE key = ?1;", [key])?;
        self.seen_revisions.remove(key);
        Ok(())
    }

    fn take_external_changes(&mut self) -> StoreResult<Vec<StorageEvent>> {
        let rows = self.load_rows()?;
        let mut events = Vec::new();

        let mut present = HashSet::with_capacity(rows.len());
        for row in rows {
            present.insert(row.key.clone());
            if self.seen_revisions.get(&row.key) == Some(&row.revision) {
                continue;
            }
            self.seen_revisions.insert(row.key.clone(), row.revision);
            if row.writer != self.writer {
                events.push(StorageEvent {
                    key: row.key,
                    new_value: Some(row.value),
                });
            }
        }

        let mut removed: Vec<String> = self
            .seen_revisions
            .keys()
            .filter(|key| !present.contains(*key))
            .cloned()
            .collect();
        removed.sort();
        for key in removed {
            self.seen_revisions.remove(&key);
            events.push(StorageEvent {
                key,
                new_value: None,
            });
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteStore;
    use crate::store::KeyValueStore;

    #[test]
    fn set_then_get_round_trips() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "[1,2]").unwrap();
        store.set("k", "[3]").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("[3]"));
    }

    #[test]
    fn own_writes_are_not_external_changes() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.set("k", "v").unwrap();
        store.remove("k").unwrap();
        assert!(store.take_external_changes().unwrap().is_empty());
    }

    #[test]
    fn writer_ids_differ_per_handle() {
        let first = SqliteStore::open_in_memory().unwrap();
        let second = SqliteStore::open_in_memory().unwrap();
        assert_ne!(first.writer_id(), second.writer_id());
    }
}
