//! Typed value <-> slot mirroring.
//!
//! # Invariants
//! - Reads never fail: missing, blank, unreadable or malformed content yields
//!   the caller's default.
//! - Writes are best-effort: the in-memory value is updated first and a failed
//!   persist is logged and dropped.

use super::{KeyValueStore, StorageEvent};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Loads the value under `key`, falling back to `default`.
pub fn read_slot<V, S>(store: &S, key: &str, default: V) -> V
where
    V: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key) {
        Ok(Some(raw)) => decode_slot(key, &raw).unwrap_or(default),
        Ok(None) => default,
        Err(err) => {
            warn!(
                "event=slot_read module=store status=error key={} fallback=default error={}",
                key, err
            );
            default
        }
    }
}

fn decode_slot<V: DeserializeOwned>(key: &str, raw: &str) -> Option<V> {
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                "event=slot_decode module=store status=error key={} bytes={} fallback=default error={}",
                key,
                raw.len(),
                err
            );
            None
        }
    }
}

/// Live cell mirrored into one durable slot.
#[derive(Debug, Clone)]
pub struct StoreBinding<V> {
    key: String,
    initial: V,
    value: V,
}

impl<V> StoreBinding<V>
where
    V: Serialize + DeserializeOwned + Clone,
{
    /// Binds `key`, starting from its persisted value or `initial`.
    pub fn bind<S: KeyValueStore + ?Sized>(store: &S, key: impl Into<String>, initial: V) -> Self {
        let key = key.into();
        let value = read_slot(store, &key, initial.clone());
        Self {
            key,
            initial,
            value,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> &V {
        &self.value
    }

    /// Replaces the cell and persists it; persist failures are swallowed.
    pub fn set<S: KeyValueStore + ?Sized>(&mut self, store: &mut S, value: V) {
        self.value = value;
        self.persist(store);
    }

    /// Mutates the cell in place and persists it.
    pub fn update<S, F>(&mut self, store: &mut S, mutate: F)
    where
        S: KeyValueStore + ?Sized,
        F: FnOnce(&mut V),
    {
        mutate(&mut self.value);
        self.persist(store);
    }

    /// Re-reads the slot, discarding the in-memory value.
    pub fn reload<S: KeyValueStore + ?Sized>(&mut self, store: &S) {
        self.value = read_slot(store, &self.key, self.initial.clone());
    }

    /// Applies a change made by another handle.
    ///
    /// Returns `false` when the event belongs to another slot. Removed or
    /// unparseable content resets the cell to its initial value.
    pub fn apply_external(&mut self, event: &StorageEvent) -> bool {
        if event.key != self.key {
            return false;
        }
        self.value = event
            .new_value
            .as_deref()
            .and_then(|raw| decode_slot(&self.key, raw))
            .unwrap_or_else(|| self.initial.clone());
        debug!(
            "event=slot_external module=store status=ok key={} removed={}",
            self.key,
            event.new_value.is_none()
        );
        true
    }

    fn persist<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        let encoded = match serde_json::to_string(&self.value) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(
                    "event=slot_write module=store status=error key={} error_code=encode_failed error={}",
                    self.key, err
                );
                return;
            }
        };
        if let Err(err) = store.set(&self.key, &encoded) {
            warn!(
                "event=slot_write module=store status=error key={} bytes={} error_code=write_dropped error={}",
                self.key,
                encoded.len(),
                err
            );
        }
    }
}
