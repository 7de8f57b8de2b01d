//! Core state and persistence logic for Simple Notes.
//! This crate is the single source of truth for note invariants: unique ids,
//! a valid selection, and debounced edits reaching durable storage.

pub mod clock;
pub mod config;
pub mod db;
pub mod editor;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, NotesConfig};
pub use editor::buffer::{EditorBuffer, PendingCommit};
pub use editor::debounce::{Debouncer, TimerToken};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::id::new_id;
pub use model::note::{Note, NoteId, NotePatch};
pub use repo::note_repo::{ConfirmDelete, NoteRepository, DELETE_CONFIRM_PROMPT};
pub use service::note_service::{derive_preview, NoteListItem, NoteService};
pub use store::{
    read_slot, KeyValueStore, MemoryStore, SqliteStore, StorageEvent, StoreBinding, StoreError,
    StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
