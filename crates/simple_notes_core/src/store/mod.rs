//! Durable key/value slots.
//!
//! # Responsibility
//! - Define the [`KeyValueStore`] seam the note repository persists through.
//! - Surface writes made by other handles (peers) as [`StorageEvent`]s.
//! - Mirror single typed values into slots via [`binding::StoreBinding`].
//!
//! # Invariants
//! - A handle never receives events for its own writes.
//! - Writing a value equal to the stored one is not reported as a change.
//! - Conflicts resolve as last-write-wins; nothing is merged.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod binding;
pub mod memory;
pub mod sqlite;

pub use binding::{read_slot, StoreBinding};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store transport and capacity failures.
///
/// Callers above the binding layer never see these; they are logged and
/// absorbed there.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    QuotaExceeded {
        key: String,
        required_bytes: usize,
        quota_bytes: usize,
    },
    Serialize(serde_json::Error),
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuotaExceeded {
                key,
                required_bytes,
                quota_bytes,
            } => write!(
                f,
                "quota exceeded writing slot `{key}`: {required_bytes} bytes needed, {quota_bytes} allowed"
            ),
            Self::Serialize(err) => write!(f, "slot value could not be serialized: {err}"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::QuotaExceeded { .. } | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// A slot changed by another handle on the same durable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// Raw serialized value after the change; `None` when the slot was removed.
    pub new_value: Option<String>,
}

/// String-keyed durable storage with an external-change feed.
pub trait KeyValueStore {
    /// Reads the raw value stored under `key`.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    /// Replaces the raw value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
    /// Removes `key`; removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> StoreResult<()>;
    /// Drains changes made by other handles since the previous call, oldest first.
    fn take_external_changes(&mut self) -> StoreResult<Vec<StorageEvent>>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }

    fn take_external_changes(&mut self) -> StoreResult<Vec<StorageEvent>> {
        (**self).take_external_changes()
    }
}
