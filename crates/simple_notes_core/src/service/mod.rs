//! Use-case surface consumed by presentation shells.
//!
//! # Responsibility
//! - Combine repository, editor buffer and clock behind one API.
//! - Keep shells decoupled from storage and timer details.

pub mod note_service;
