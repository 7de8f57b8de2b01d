//! Derived list views.
//!
//! # Responsibility
//! - Order notes by recency for display.
//! - Filter the ordered list by a free-text query.
//!
//! # Invariants
//! - Views are recomputed from the collection and never persisted.

pub mod filter;
