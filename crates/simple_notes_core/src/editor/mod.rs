//! Debounced editing of the open note.
//!
//! # Responsibility
//! - Hold keystroke-level title/body state apart from the repository.
//! - Coalesce bursts of edits into one commit after an idle period.

pub mod buffer;
pub mod debounce;
