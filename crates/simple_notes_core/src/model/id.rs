//! Note identifier generation.
//!
//! Ids look like `<millis base36>-<6 random base36 chars>`. The time part is
//! strictly increasing within a process, so two ids from one process never
//! collide even when the random suffixes do.

use crate::clock::system_now_ms;
use crate::model::note::NoteId;
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

const RANDOM_SUFFIX_LEN: usize = 6;
const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

static LAST_ISSUED_MS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Returns a fresh note id based on the wall clock.
pub fn new_id() -> NoteId {
    new_id_at(system_now_ms())
}

/// Returns a fresh note id using `now_ms` as the time hint.
///
/// When `now_ms` is not past the last issued time, the last issued time plus
/// one is used instead.
pub fn new_id_at(now_ms: i64) -> NoteId {
    let issued = next_time_component(now_ms);
    format!("{}-{}", to_base36(issued.max(0) as u64), random_suffix())
}

fn next_time_component(now_ms: i64) -> i64 {
    let mut current = LAST_ISSUED_MS.load(Ordering::Relaxed);
    loop {
        let candidate = if now_ms > current {
            now_ms
        } else {
            current.saturating_add(1)
        };
        match LAST_ISSUED_MS.compare_exchange_weak(
            current,
            candidate,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate,
            Err(observed) => current = observed,
        }
    }
}

fn random_suffix() -> String {
    let random = Uuid::new_v4().as_u128();
    let mut encoded = to_base36_u128(random);
    encoded.truncate(RANDOM_SUFFIX_LEN);
    while encoded.len() < RANDOM_SUFFIX_LEN {
        encoded.push('0');
    }
    encoded
}

fn to_base36(value: u64) -> String {
    to_base36_u128(u128::from(value))
}

fn to_base36_u128(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{new_id, new_id_at, to_base36};
    use std::collections::HashSet;

    #[test]
    fn base36_matches_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn ids_have_time_and_suffix_parts() {
        let id = new_id();
        let (time, suffix) = id.split_once('-').expect("id has a dash");
        assert!(!time.is_empty());
        assert_eq!(suffix.len(), 6);
        assert!(id
            .chars()
            .all(|c| c == '-' || c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn ids_are_unique_even_with_a_frozen_clock() {
        let ids: HashSet<String> = (0..2_000).map(|_| new_id_at(42)).collect();
        assert_eq!(ids.len(), 2_000);
    }
}
