//! Canonical note collection and selection.
//!
//! # Responsibility
//! - Own the note list and selected id, each mirrored into its own slot.
//! - Provide create/select/update/delete/duplicate with the collection
//!   invariants below, plus recency-sorted and query-filtered views.
//!
//! # Invariants
//! - Note ids are unique across the collection, including after loading or
//!   receiving external content (duplicates keep their first occurrence).
//! - A non-null selection always names a present note; otherwise it is
//!   repaired to the most recently updated note, or null when empty.
//! - Unknown ids are silent no-ops; no operation returns an error.

use crate::clock::Clock;
use crate::config::NotesConfig;
use crate::model::id::new_id;
use crate::model::note::{Note, NoteId, NotePatch};
use crate::search::filter::{filter_notes, most_recent, sort_by_recency};
use crate::store::{KeyValueStore, StoreBinding};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

/// Prompt shown before a note is deleted.
pub const DELETE_CONFIRM_PROMPT: &str = "Delete this note? This action cannot be undone.";

/// Synchronous yes/no capability consulted before deleting a note.
pub trait ConfirmDelete {
    fn confirm_delete(&mut self, prompt: &str, note: &Note) -> bool;
}

impl<F> ConfirmDelete for F
where
    F: FnMut(&Note) -> bool,
{
    fn confirm_delete(&mut self, _prompt: &str, note: &Note) -> bool {
        self(note)
    }
}

/// Note list + selection + search query, persisted through a [`KeyValueStore`].
pub struct NoteRepository<S: KeyValueStore> {
    store: S,
    clock: Arc<dyn Clock>,
    notes: StoreBinding<Vec<Note>>,
    selection: StoreBinding<Option<NoteId>>,
    query: String,
}

impl<S: KeyValueStore> NoteRepository<S> {
    /// Loads both slots from `store` and repairs whatever they disagree on.
    pub fn open(store: S, clock: Arc<dyn Clock>, config: &NotesConfig) -> Self {
        let notes = StoreBinding::bind(&store, config.notes_key.as_str(), Vec::new());
        let selection = StoreBinding::bind(&store, config.selected_key.as_str(), None);
        let mut repo = Self {
            store,
            clock,
            notes,
            selection,
            query: String::new(),
        };
        repo.normalize();
        info!(
            "event=repo_open module=repo status=ok notes={} selected={}",
            repo.notes.get().len(),
            repo.selection.get().is_some()
        );
        repo
    }

    /// Creates an untitled note, inserts it first, and selects it.
    pub fn create(&mut self) -> Note {
        let note = Note::untitled(new_id(), self.clock.now_ms());
        let inserted = note.clone();
        self.notes
            .update(&mut self.store, |notes| notes.insert(0, inserted));
        self.selection.set(&mut self.store, Some(note.id.clone()));
        debug!("event=note_create module=repo status=ok note_id={}", note.id);
        note
    }

    /// Selects `id`; stale ids are repaired immediately.
    pub fn select(&mut self, id: &str) {
        self.selection.set(&mut self.store, Some(id.to_string()));
        self.repair_selection();
    }

    /// Applies `patch` to `id` and refreshes its timestamp.
    ///
    /// Returns `false` (and changes nothing) when `id` is unknown.
    pub fn update(&mut self, id: &str, patch: NotePatch) -> bool {
        if self.get(id).is_none() {
            debug!("event=note_update module=repo status=skipped reason=unknown_id note_id={id}");
            return false;
        }
        let now_ms = self.clock.now_ms();
        self.notes.update(&mut self.store, |notes| {
            if let Some(note) = notes.iter_mut().find(|note| note.id == id) {
                note.apply(patch, now_ms);
            }
        });
        debug!("event=note_update module=repo status=ok note_id={id}");
        true
    }

    /// Deletes `id` once `confirm` agrees.
    ///
    /// Unknown ids return `false` without prompting. Deleting the selected note
    /// moves the selection to the most recently updated remaining note.
    pub fn delete<C>(&mut self, id: &str, confirm: &mut C) -> bool
    where
        C: ConfirmDelete + ?Sized,
    {
        let Some(target) = self.get(id) else {
            return false;
        };
        if !confirm.confirm_delete(DELETE_CONFIRM_PROMPT, target) {
            debug!("event=note_delete module=repo status=declined note_id={id}");
            return false;
        }

        self.notes
            .update(&mut self.store, |notes| notes.retain(|note| note.id != id));
        if self.selected_id() == Some(id) {
            let next = most_recent(self.notes.get()).map(|note| note.id.clone());
            self.selection.set(&mut self.store, next);
        }
        self.repair_selection();
        debug!(
            "event=note_delete module=repo status=ok note_id={id} remaining={}",
            self.notes.get().len()
        );
        true
    }

    /// Copies `id` into a new selected note titled `Copy - <title>`.
    pub fn duplicate(&mut self, id: &str) -> Option<Note> {
        let original = self.get(id)?;
        let copy = Note::duplicate_of(original, new_id(), self.clock.now_ms());
        let inserted = copy.clone();
        self.notes
            .update(&mut self.store, |notes| notes.insert(0, inserted));
        self.selection.set(&mut self.store, Some(copy.id.clone()));
        debug!(
            "event=note_duplicate module=repo status=ok source_id={id} note_id={}",
            copy.id
        );
        Some(copy)
    }

    /// Replaces the search query. Not persisted.
    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Notes in collection (storage) order.
    pub fn notes(&self) -> &[Note] {
        self.notes.get()
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.get().iter().find(|note| note.id == id)
    }

    /// All notes, newest first.
    pub fn sorted_notes(&self) -> Vec<&Note> {
        sort_by_recency(self.notes.get())
    }

    /// Notes matching the current query, newest first.
    pub fn visible_notes(&self) -> Vec<&Note> {
        filter_notes(&self.sorted_notes(), &self.query)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selection.get().as_deref()
    }

    /// The selected note, if the selection is set.
    pub fn active_note(&self) -> Option<&Note> {
        let selected = self.selected_id()?;
        self.get(selected)
    }

    /// Applies writes made by other handles on the same store.
    ///
    /// Returns `true` when either slot changed.
    pub fn sync_external(&mut self) -> bool {
        let events = match self.store.take_external_changes() {
            Ok(events) => events,
            Err(err) => {
                warn!("event=repo_sync module=repo status=error error={err}");
                return false;
            }
        };

        let mut changed = false;
        for event in &events {
            changed |= self.notes.apply_external(event);
            changed |= self.selection.apply_external(event);
        }
        if changed {
            self.normalize();
            info!(
                "event=repo_sync module=repo status=ok events={} notes={}",
                events.len(),
                self.notes.get().len()
            );
        }
        changed
    }

    /// Re-reads both slots from the store.
    pub fn reload(&mut self) {
        self.notes.reload(&self.store);
        self.selection.reload(&self.store);
        self.normalize();
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Releases the underlying store, e.g. to reopen it later.
    pub fn into_store(self) -> S {
        self.store
    }

    fn normalize(&mut self) {
        self.drop_duplicate_ids();
        self.repair_selection();
    }

    fn drop_duplicate_ids(&mut self) {
        let has_duplicates = {
            let mut seen = HashSet::new();
            self.notes
                .get()
                .iter()
                .any(|note| !seen.insert(note.id.as_str()))
        };
        if !has_duplicates {
            return;
        }

        let before = self.notes.get().len();
        self.notes.update(&mut self.store, |notes| {
            let mut kept = HashSet::new();
            notes.retain(|note| kept.insert(note.id.clone()));
        });
        warn!(
            "event=repo_normalize module=repo status=repaired dropped_duplicates={}",
            before - self.notes.get().len()
        );
    }

    fn repair_selection(&mut self) {
        let Some(selected) = self.selected_id() else {
            return;
        };
        if self.get(selected).is_some() {
            return;
        }
        let replacement = most_recent(self.notes.get()).map(|note| note.id.clone());
        debug!(
            "event=selection_repair module=repo status=ok stale_id={selected} replacement={}",
            replacement.as_deref().unwrap_or("none")
        );
        self.selection.set(&mut self.store, replacement);
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteRepository, DELETE_CONFIRM_PROMPT};
    use crate::clock::ManualClock;
    use crate::config::NotesConfig;
    use crate::model::note::{Note, NotePatch};
    use crate::store::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn open(store: MemoryStore) -> (NoteRepository<MemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let repo = NoteRepository::open(store, clock.clone(), &NotesConfig::default());
        (repo, clock)
    }

    #[test]
    fn create_selects_and_persists_the_new_note() {
        let (mut repo, _) = open(MemoryStore::new());
        let note = repo.create();

        assert_eq!(note.title, "Untitled");
        assert_eq!(note.body, "");
        assert_eq!(note.updated_at, 1_000);
        assert_eq!(repo.selected_id(), Some(note.id.as_str()));
        assert_eq!(repo.active_note(), Some(&note));

        let raw = repo.store().get("notes.v1").unwrap().unwrap();
        let persisted: Vec<Note> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, vec![note.clone()]);
        let selected = repo.store().get("notes.selectedId.v1").unwrap().unwrap();
        assert_eq!(selected, format!("\"{}\"", note.id));
    }

    #[test]
    fn select_of_unknown_id_is_repaired_to_most_recent() {
        let (mut repo, clock) = open(MemoryStore::new());
        let older = repo.create();
        clock.advance(10);
        let newer = repo.create();
        repo.select(&older.id);
        assert_eq!(repo.selected_id(), Some(older.id.as_str()));

        repo.select("missing");
        assert_eq!(repo.selected_id(), Some(newer.id.as_str()));
    }

    #[test]
    fn declined_delete_changes_nothing() {
        let (mut repo, _) = open(MemoryStore::new());
        let note = repo.create();
        let mut prompts = Vec::new();
        let mut decline = |candidate: &Note| {
            prompts.push(candidate.id.clone());
            false
        };

        assert!(!repo.delete(&note.id, &mut decline));
        assert_eq!(prompts, vec![note.id.clone()]);
        assert_eq!(repo.notes().len(), 1);
    }

    #[test]
    fn delete_of_unknown_id_never_prompts() {
        let (mut repo, _) = open(MemoryStore::new());
        repo.create();
        let mut asked = false;
        let mut confirm = |_: &Note| {
            asked = true;
            true
        };
        assert!(!repo.delete("missing", &mut confirm));
        assert!(!asked);
    }

    #[test]
    fn update_of_unknown_id_is_a_no_op() {
        let (mut repo, _) = open(MemoryStore::new());
        let note = repo.create();
        assert!(!repo.update("missing", NotePatch::title("x")));
        assert_eq!(repo.notes(), &[note]);
    }

    #[test]
    fn duplicate_ids_in_persisted_content_keep_first_occurrence() {
        let mut store = MemoryStore::new();
        store
            .set(
                "notes.v1",
                r#"[{"id":"a","title":"one","body":"","updatedAt":1},
                    {"id":"a","title":"two","body":"","updatedAt":2}]"#,
            )
            .unwrap();
        let (repo, _) = open(store);
        assert_eq!(repo.notes().len(), 1);
        assert_eq!(repo.notes()[0].title, "one");
    }

    #[test]
    fn prompt_text_warns_about_permanence() {
        assert!(DELETE_CONFIRM_PROMPT.contains("cannot be undone"));
    }
}
