//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted note record and its partial-update shape.
//! - Provide display helpers shared by list and editor projections.
//!
//! # Invariants
//! - `id` is immutable once assigned and unique within a collection.
//! - `updated_at` never moves backwards for a given note.

use serde::{Deserialize, Serialize};

/// Opaque note identifier produced by [`crate::model::id::new_id`].
pub type NoteId = String;

/// Title used for fresh notes and shown for empty titles.
pub const UNTITLED: &str = "Untitled";

/// Prefix applied to duplicated note titles.
pub const COPY_PREFIX: &str = "Copy - ";

/// Persisted note record.
///
/// Serialized as `{id, title, body, updatedAt}` so the slot layout stays
/// readable by any JSON tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub body: String,
    /// Unix epoch milliseconds of the last create/update.
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl Note {
    /// Creates an untitled, empty note.
    pub fn untitled(id: NoteId, now_ms: i64) -> Self {
        Self {
            id,
            title: UNTITLED.to_string(),
            body: String::new(),
            updated_at: now_ms,
        }
    }

    /// Builds the copy produced by duplicate: prefixed title, same body.
    pub fn duplicate_of(original: &Note, id: NoteId, now_ms: i64) -> Self {
        Self {
            id,
            title: format!("{COPY_PREFIX}{}", original.display_title()),
            body: original.body.clone(),
            updated_at: now_ms,
        }
    }

    /// Title as shown to the user; empty titles read as "Untitled".
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    /// Applies `patch` and refreshes the timestamp.
    ///
    /// The timestamp is clamped to the previous value so a clock step
    /// backwards cannot reorder history.
    pub fn apply(&mut self, patch: NotePatch, now_ms: i64) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(body) = patch.body {
            self.body = body;
        }
        self.updated_at = now_ms.max(self.updated_at);
    }
}

/// Partial update for [`Note`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl NotePatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: None,
        }
    }

    pub fn body(body: impl Into<String>) -> Self {
        Self {
            title: None,
            body: Some(body.into()),
        }
    }

    pub fn full(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: Some(body.into()),
        }
    }
}
