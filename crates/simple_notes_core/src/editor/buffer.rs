//! Transient title/body buffer for the open note.
//!
//! # Invariants
//! - The buffer belongs to exactly one note id; switching ids reseeds the
//!   text and cancels the pending commit before it can fire.
//! - Changes to the same note made elsewhere do not reseed the buffer.
//! - A commit always carries the id the buffer was seeded from.

use super::debounce::Debouncer;
use crate::model::note::{Note, NoteId, NotePatch, UNTITLED};
use log::debug;

/// Buffered edits ready to be written through the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommit {
    pub note_id: NoteId,
    pub title: String,
    pub body: String,
}

impl PendingCommit {
    pub fn into_patch(self) -> (NoteId, NotePatch) {
        (self.note_id, NotePatch::full(self.title, self.body))
    }
}

#[derive(Debug, Clone)]
pub struct EditorBuffer {
    note_id: Option<NoteId>,
    title: String,
    body: String,
    debounce: Debouncer,
}

impl EditorBuffer {
    pub fn new(autosave_delay_ms: i64) -> Self {
        Self {
            note_id: None,
            title: String::new(),
            body: String::new(),
            debounce: Debouncer::new(autosave_delay_ms),
        }
    }

    pub fn note_id(&self) -> Option<&str> {
        self.note_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn has_pending_commit(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Deadline of the pending autosave, if one is scheduled.
    pub fn next_deadline_ms(&self) -> Option<i64> {
        self.debounce.deadline_ms()
    }

    /// Points the buffer at `active`, reseeding only when the id changes.
    ///
    /// Returns `true` when the buffer was reseeded or cleared.
    pub fn sync_with(&mut self, active: Option<&Note>) -> bool {
        let active_id = active.map(|note| note.id.as_str());
        if self.note_id.as_deref() == active_id {
            return false;
        }

        if let Some(token) = self.debounce.cancel() {
            debug!(
                "event=autosave_cancel module=editor status=ok reason=note_switch token={token:?}"
            );
        }
        match active {
            Some(note) => {
                self.note_id = Some(note.id.clone());
                self.title = if note.title.is_empty() {
                    UNTITLED.to_string()
                } else {
                    note.title.clone()
                };
                self.body = note.body.clone();
            }
            None => {
                self.note_id = None;
                self.title.clear();
                self.body.clear();
            }
        }
        true
    }

    /// Replaces the buffered title and restarts the idle timer.
    ///
    /// Ignored while no note is open.
    pub fn set_title(&mut self, title: impl Into<String>, now_ms: i64) {
        if self.note_id.is_none() {
            return;
        }
        self.title = title.into();
        self.debounce.schedule(now_ms);
    }

    /// Replaces the buffered body and restarts the idle timer.
    ///
    /// Ignored while no note is open.
    pub fn set_body(&mut self, body: impl Into<String>, now_ms: i64) {
        if self.note_id.is_none() {
            return;
        }
        self.body = body.into();
        self.debounce.schedule(now_ms);
    }

    /// Returns the commit due at `now_ms`, consuming the timer.
    pub fn poll(&mut self, now_ms: i64) -> Option<PendingCommit> {
        self.debounce.fire_if_due(now_ms)?;
        self.snapshot()
    }

    /// Returns the current buffer as a commit without touching the timer.
    pub fn save_now(&self) -> Option<PendingCommit> {
        self.snapshot()
    }

    fn snapshot(&self) -> Option<PendingCommit> {
        Some(PendingCommit {
            note_id: self.note_id.clone()?,
            title: self.title.clone(),
            body: self.body.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::EditorBuffer;
    use crate::model::note::Note;

    fn note(id: &str, title: &str, body: &str) -> Note {
        Note {
            id: id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            updated_at: 0,
        }
    }

    #[test]
    fn seeds_from_active_note_and_defaults_empty_title() {
        let mut buffer = EditorBuffer::new(350);
        assert!(buffer.sync_with(Some(&note("a", "", "text"))));
        assert_eq!(buffer.title(), "Untitled");
        assert_eq!(buffer.body(), "text");
        assert_eq!(buffer.note_id(), Some("a"));
    }

    #[test]
    fn same_id_with_new_fields_does_not_reseed() {
        let mut buffer = EditorBuffer::new(350);
        buffer.sync_with(Some(&note("a", "T", "B")));
        buffer.set_body("typing", 0);

        assert!(!buffer.sync_with(Some(&note("a", "T2", "B2"))));
        assert_eq!(buffer.body(), "typing");
        assert!(buffer.has_pending_commit());
    }

    #[test]
    fn burst_of_edits_yields_one_commit_with_final_text() {
        let mut buffer = EditorBuffer::new(350);
        buffer.sync_with(Some(&note("a", "T", "")));
        buffer.set_title("H", 0);
        buffer.set_title("He", 100);
        buffer.set_title("Hello", 300);

        assert_eq!(buffer.poll(400), None);
        let commit = buffer.poll(650).expect("timer due");
        assert_eq!(commit.note_id, "a");
        assert_eq!(commit.title, "Hello");
        assert_eq!(buffer.poll(10_000), None);
    }

    #[test]
    fn switching_notes_drops_the_pending_commit() {
        let mut buffer = EditorBuffer::new(350);
        buffer.sync_with(Some(&note("a", "A", "")));
        buffer.set_body("draft for a", 0);
        buffer.sync_with(Some(&note("b", "B", "b body")));

        assert!(!buffer.has_pending_commit());
        assert_eq!(buffer.poll(1_000), None);
        assert_eq!(buffer.body(), "b body");
    }

    #[test]
    fn edits_without_an_open_note_are_ignored() {
        let mut buffer = EditorBuffer::new(350);
        buffer.set_title("orphan", 0);
        assert_eq!(buffer.title(), "");
        assert!(!buffer.has_pending_commit());
        assert_eq!(buffer.save_now(), None);
    }

    #[test]
    fn save_now_leaves_the_timer_scheduled() {
        let mut buffer = EditorBuffer::new(350);
        buffer.sync_with(Some(&note("a", "A", "")));
        buffer.set_body("x", 0);
        let saved = buffer.save_now().expect("note open");
        assert_eq!(saved.body, "x");
        assert!(buffer.has_pending_commit());
    }
}
