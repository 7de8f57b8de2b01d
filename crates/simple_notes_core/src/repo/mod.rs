//! Note repository.
//!
//! # Responsibility
//! - Own the authoritative note collection and selection.
//! - Persist every mutation through the slot store bindings.
//!
//! # Invariants
//! - Repository operations never fail; store errors are absorbed below it.

pub mod note_repo;
