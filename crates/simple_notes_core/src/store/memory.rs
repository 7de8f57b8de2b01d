//! In-process slot store.
//!
//! Handles created with [`MemoryStore::open_peer`] share one backing map and
//! see each other's writes through [`KeyValueStore::take_external_changes`],
//! the way two open views of one local store do.

use super::{KeyValueStore, StorageEvent, StoreError, StoreResult};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, Default)]
struct SharedSlots {
    slots: BTreeMap<String, String>,
    inboxes: BTreeMap<u64, Vec<StorageEvent>>,
    next_handle: u64,
    quota_bytes: Option<usize>,
    reads_fail: bool,
}

impl SharedSlots {
    fn register_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.inboxes.insert(handle, Vec::new());
        handle
    }

    fn used_bytes_with(&self, key: &str, value: &str) -> usize {
        self.slots
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(existing, stored)| existing.len() + stored.len())
            .sum::<usize>()
            + key.len()
            + value.len()
    }

    /// Queues `event` for every other handle. An unread event for the same
    /// key is replaced, so each inbox holds at most one entry per key.
    fn notify_others(&mut self, origin: u64, event: StorageEvent) {
        for (handle, inbox) in self.inboxes.iter_mut() {
            if *handle != origin {
                inbox.retain(|queued| queued.key != event.key);
                inbox.push(event.clone());
            }
        }
    }
}

/// Volatile [`KeyValueStore`] with optional byte quota.
#[derive(Debug)]
pub struct MemoryStore {
    handle: u64,
    shared: Rc<RefCell<SharedSlots>>,
}

impl MemoryStore {
    /// Creates an empty store with no quota.
    pub fn new() -> Self {
        let shared = Rc::new(RefCell::new(SharedSlots::default()));
        let handle = shared.borrow_mut().register_handle();
        Self { handle, shared }
    }

    /// Creates an empty store whose keys plus values may not exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        let store = Self::new();
        store.set_quota(Some(quota_bytes));
        store
    }

    /// Opens another handle on the same backing slots.
    pub fn open_peer(&self) -> Self {
        let handle = self.shared.borrow_mut().register_handle();
        Self {
            handle,
            shared: Rc::clone(&self.shared),
        }
    }

    /// Changes the quota for every handle on this backing map.
    pub fn set_quota(&self, quota_bytes: Option<usize>) {
        self.shared.borrow_mut().quota_bytes = quota_bytes;
    }

    /// Makes every read fail, for exercising fallback paths.
    pub fn set_reads_fail(&self, fail: bool) {
        self.shared.borrow_mut().reads_fail = fail;
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        if let Ok(mut shared) = self.shared.try_borrow_mut() {
            shared.inboxes.remove(&self.handle);
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let shared = self.shared.borrow();
        if shared.reads_fail {
            return Err(StoreError::Unavailable(format!("reads disabled for `{key}`")));
        }
        Ok(shared.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let mut shared = self.shared.borrow_mut();
        if shared.slots.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }

        if let Some(quota_bytes) = shared.quota_bytes {
            let required_bytes = shared.used_bytes_with(key, value);
            if required_bytes > quota_bytes {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    required_bytes,
                    quota_bytes,
                });
            }
        }

        shared.slots.insert(key.to_string(), value.to_string());
        shared.notify_others(
            self.handle,
            StorageEvent {
                key: key.to_string(),
                new_value: Some(value.to_string()),
            },
        );
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        let mut shared = self.shared.borrow_mut();
        if shared.slots.remove(key).is_some() {
            shared.notify_others(
                self.handle,
                StorageEvent {
                    key: key.to_string(),
                    new_value: None,
                },
            );
        }
        Ok(())
    }

    fn take_external_changes(&mut self) -> StoreResult<Vec<StorageEvent>> {
        let mut shared = self.shared.borrow_mut();
        Ok(shared
            .inboxes
            .get_mut(&self.handle)
            .map(std::mem::take)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use crate::store::{KeyValueStore, StorageEvent, StoreError};

    #[test]
    fn peers_see_each_others_writes_but_not_their_own() {
        let mut first = MemoryStore::new();
        let mut second = first.open_peer();

        first.set("k", "1").unwrap();
        assert!(first.take_external_changes().unwrap().is_empty());
        assert_eq!(
            second.take_external_changes().unwrap(),
            vec![StorageEvent {
                key: "k".to_string(),
                new_value: Some("1".to_string()),
            }]
        );
        assert!(second.take_external_changes().unwrap().is_empty());
        assert_eq!(second.get("k").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn unchanged_writes_are_not_broadcast() {
        let mut first = MemoryStore::new();
        let mut second = first.open_peer();
        first.set("k", "same").unwrap();
        second.take_external_changes().unwrap();

        first.set("k", "same").unwrap();
        assert!(second.take_external_changes().unwrap().is_empty());
    }

    #[test]
    fn removal_is_reported_as_missing_value() {
        let mut first = MemoryStore::new();
        let mut second = first.open_peer();
        first.set("k", "v").unwrap();
        second.take_external_changes().unwrap();
        first.remove("k").unwrap();
        first.remove("k").unwrap();

        let events = second.take_external_changes().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].new_value, None);
    }

    #[test]
    fn unread_events_collapse_to_latest_value_per_key() {
        let mut writer = MemoryStore::new();
        let mut idle = writer.open_peer();
        for revision in 0..1_000 {
            writer.set("notes", &revision.to_string()).unwrap();
            writer.set("selected", &format!("\"{revision}\"")).unwrap();
        }
        writer.set("notes", "final").unwrap();
        writer.remove("selected").unwrap();

        assert_eq!(
            idle.take_external_changes().unwrap(),
            vec![
                StorageEvent {
                    key: "notes".to_string(),
                    new_value: Some("final".to_string()),
                },
                StorageEvent {
                    key: "selected".to_string(),
                    new_value: None,
                },
            ]
        );
    }

    #[test]
    fn quota_rejects_oversized_writes_and_keeps_previous_value() {
        let mut store = MemoryStore::with_quota(8);
        store.set("k", "12345").unwrap();
        let err = store.set("k", "123456789").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { quota_bytes: 8, .. }));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("12345"));
    }

    #[test]
    fn failing_reads_surface_unavailable() {
        let store = MemoryStore::new();
        store.set_reads_fail(true);
        assert!(matches!(store.get("k"), Err(StoreError::Unavailable(_))));
    }
}
