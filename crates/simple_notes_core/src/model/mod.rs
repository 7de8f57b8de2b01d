//! Domain model for notes.
//!
//! # Responsibility
//! - Define the persisted note record and partial-update shape.
//! - Generate unique note identifiers.
//!
//! # Invariants
//! - Every note is addressed by an id that is never reused in a collection.

pub mod id;
pub mod note;
