//! Caller-facing notes surface.
//!
//! # Responsibility
//! - Expose the shell contract: create/select/update/delete/duplicate,
//!   search query, buffered editing, explicit save and timer ticks.
//! - Keep the editor buffer pointed at the active note after every change.
//! - Shape list rows (display title + plain-text preview).
//!
//! # Invariants
//! - The editor buffer is resynchronized before any autosave can fire, so a
//!   pending commit never lands on a different note than it was typed into.
//! - No method reports failure; store problems are logged and absorbed.

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, NotesConfig};
use crate::editor::buffer::{EditorBuffer, PendingCommit};
use crate::model::note::{Note, NoteId, NotePatch};
use crate::repo::note_repo::{ConfirmDelete, NoteRepository};
use crate::store::KeyValueStore;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static LINE_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n").expect("valid line regex"));

/// Preview text for notes whose body is blank.
pub const EMPTY_PREVIEW: &str = "No content";

/// One row of the note list as a shell renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListItem {
    pub id: NoteId,
    /// Display title; "Untitled" for empty titles.
    pub title: String,
    pub preview: String,
    pub is_active: bool,
}

/// Notes surface over a repository, an editor buffer and a clock.
pub struct NoteService<S: KeyValueStore> {
    repo: NoteRepository<S>,
    editor: EditorBuffer,
    clock: Arc<dyn Clock>,
    config: NotesConfig,
}

impl<S: KeyValueStore> NoteService<S> {
    /// Opens the service over `store` with validated `config`.
    pub fn open(store: S, clock: Arc<dyn Clock>, config: NotesConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(store, clock, config))
    }

    /// Opens the service with the wall clock and default configuration.
    pub fn open_default(store: S) -> Self {
        Self::assemble(store, Arc::new(SystemClock), NotesConfig::default())
    }

    fn assemble(store: S, clock: Arc<dyn Clock>, config: NotesConfig) -> Self {
        let repo = NoteRepository::open(store, Arc::clone(&clock), &config);
        let mut service = Self {
            repo,
            editor: EditorBuffer::new(config.autosave_delay_ms),
            clock,
            config,
        };
        service.resync_editor();
        service
    }

    pub fn create_note(&mut self) -> Note {
        let note = self.repo.create();
        self.resync_editor();
        note
    }

    pub fn select_note(&mut self, id: &str) {
        self.repo.select(id);
        self.resync_editor();
    }

    pub fn update_note(&mut self, id: &str, patch: NotePatch) {
        self.repo.update(id, patch);
        self.resync_editor();
    }

    /// Deletes `id` after `confirm` agrees; returns whether it was deleted.
    pub fn delete_note<C>(&mut self, id: &str, confirm: &mut C) -> bool
    where
        C: ConfirmDelete + ?Sized,
    {
        let deleted = self.repo.delete(id, confirm);
        self.resync_editor();
        deleted
    }

    pub fn duplicate_note(&mut self, id: &str) -> Option<Note> {
        let copy = self.repo.duplicate(id);
        self.resync_editor();
        copy
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.repo.set_query(text);
    }

    /// Buffers a title keystroke for the open note.
    pub fn edit_title(&mut self, title: impl Into<String>) {
        self.resync_editor();
        let now_ms = self.clock.now_ms();
        self.editor.set_title(title, now_ms);
    }

    /// Buffers a body keystroke for the open note.
    pub fn edit_body(&mut self, body: impl Into<String>) {
        self.resync_editor();
        let now_ms = self.clock.now_ms();
        self.editor.set_body(body, now_ms);
    }

    /// Commits the buffer immediately; a scheduled autosave stays scheduled.
    ///
    /// Returns `false` when no note is open.
    pub fn save(&mut self) -> bool {
        self.resync_editor();
        match self.editor.save_now() {
            Some(commit) => {
                self.commit(commit, "save");
                true
            }
            None => false,
        }
    }

    /// Fires the autosave if its idle period has elapsed.
    ///
    /// Returns `true` when a commit was written.
    pub fn tick(&mut self) -> bool {
        self.resync_editor();
        let now_ms = self.clock.now_ms();
        match self.editor.poll(now_ms) {
            Some(commit) => {
                self.commit(commit, "autosave");
                true
            }
            None => false,
        }
    }

    /// When the host loop should call [`Self::tick`] next.
    pub fn next_wakeup_ms(&self) -> Option<i64> {
        self.editor.next_deadline_ms()
    }

    /// Pulls in changes written by other handles on the same store.
    pub fn sync_external(&mut self) -> bool {
        let changed = self.repo.sync_external();
        self.resync_editor();
        changed
    }

    pub fn visible_notes(&self) -> Vec<&Note> {
        self.repo.visible_notes()
    }

    pub fn sorted_notes(&self) -> Vec<&Note> {
        self.repo.sorted_notes()
    }

    pub fn active_note(&self) -> Option<&Note> {
        self.repo.active_note()
    }

    pub fn query(&self) -> &str {
        self.repo.query()
    }

    /// Rows for the visible notes, newest first.
    pub fn list_items(&self) -> Vec<NoteListItem> {
        let active_id = self.repo.selected_id();
        self.repo
            .visible_notes()
            .into_iter()
            .map(|note| NoteListItem {
                id: note.id.clone(),
                title: note.display_title().to_string(),
                preview: derive_preview(&note.body, self.config.preview_chars),
                is_active: active_id == Some(note.id.as_str()),
            })
            .collect()
    }

    pub fn editor(&self) -> &EditorBuffer {
        &self.editor
    }

    pub fn repository(&self) -> &NoteRepository<S> {
        &self.repo
    }

    pub fn config(&self) -> &NotesConfig {
        &self.config
    }

    /// Releases the underlying store.
    pub fn into_store(self) -> S {
        self.repo.into_store()
    }

    fn resync_editor(&mut self) {
        self.editor.sync_with(self.repo.active_note());
    }

    fn commit(&mut self, commit: PendingCommit, trigger: &str) {
        let (note_id, patch) = commit.into_patch();
        let applied = self.repo.update(&note_id, patch);
        debug!(
            "event=editor_commit module=service status={} trigger={} note_id={}",
            if applied { "ok" } else { "skipped" },
            trigger,
            note_id
        );
    }
}

/// Single-line preview of `body`: line breaks become spaces, capped at
/// `max_chars`; blank bodies read "No content".
pub fn derive_preview(body: &str, max_chars: usize) -> String {
    if body.trim().is_empty() {
        return EMPTY_PREVIEW.to_string();
    }
    LINE_BREAK_RE
        .replace_all(body, " ")
        .chars()
        .take(max_chars)
        .collect()
}
