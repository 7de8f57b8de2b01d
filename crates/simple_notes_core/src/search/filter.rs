//! Recency ordering and query filtering over note collections.
//!
//! # Invariants
//! - Ordering is descending by `updated_at`; ties keep collection order.
//! - Filtered results keep the recency order of the full list.

use crate::model::note::Note;

/// Returns `notes` ordered newest first.
pub fn sort_by_recency(notes: &[Note]) -> Vec<&Note> {
    let mut sorted: Vec<&Note> = notes.iter().collect();
    // `sort_by` is stable, so equal timestamps keep insertion order.
    sorted.sort_by(|left, right| right.updated_at.cmp(&left.updated_at));
    sorted
}

/// Returns the most recently updated note, if any.
pub fn most_recent(notes: &[Note]) -> Option<&Note> {
    sort_by_recency(notes).into_iter().next()
}

/// Whether `query` filters anything at all.
pub fn is_blank_query(query: &str) -> bool {
    query.trim().is_empty()
}

/// Keeps the entries of `sorted` whose title or body contains `query`,
/// ignoring case.
///
/// Blank queries keep everything. Non-blank queries are matched as typed
/// (lower-cased, not trimmed).
pub fn filter_notes<'a>(sorted: &[&'a Note], query: &str) -> Vec<&'a Note> {
    if is_blank_query(query) {
        return sorted.to_vec();
    }
    let needle = query.to_lowercase();
    sorted
        .iter()
        .copied()
        .filter(|note| matches_needle(note, &needle))
        .collect()
}

fn matches_needle(note: &Note, needle: &str) -> bool {
    note.title.to_lowercase().contains(needle) || note.body.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::{filter_notes, most_recent, sort_by_recency};
    use crate::model::note::Note;

    fn note(id: &str, title: &str, body: &str, updated_at: i64) -> Note {
        Note {
            id: id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            updated_at,
        }
    }

    fn ids(notes: &[&Note]) -> Vec<String> {
        notes.iter().map(|note| note.id.clone()).collect()
    }

    #[test]
    fn sort_is_newest_first_and_stable_on_ties() {
        let notes = vec![
            note("a", "", "", 10),
            note("b", "", "", 30),
            note("c", "", "", 10),
        ];
        assert_eq!(ids(&sort_by_recency(&notes)), vec!["b", "a", "c"]);
        assert_eq!(most_recent(&notes).map(|n| n.id.as_str()), Some("b"));
        assert!(most_recent(&[]).is_none());
    }

    #[test]
    fn query_matches_title_or_body_case_insensitively() {
        let notes = vec![
            note("cat", "Category list", "x", 2),
            note("dog", "Dog", "no cats here", 1),
            note("fish", "Fish", "bubbles", 3),
        ];
        let sorted = sort_by_recency(&notes);
        assert_eq!(ids(&filter_notes(&sorted, "cat")), vec!["cat", "dog"]);
        assert_eq!(ids(&filter_notes(&sorted, "CAT")), vec!["cat", "dog"]);
        assert_eq!(ids(&filter_notes(&sorted, "bubble")), vec!["fish"]);
    }

    #[test]
    fn blank_query_returns_full_sorted_list() {
        let notes = vec![note("a", "A", "", 1), note("b", "B", "", 2)];
        let sorted = sort_by_recency(&notes);
        assert_eq!(ids(&filter_notes(&sorted, "   ")), vec!["b", "a"]);
    }

    #[test]
    fn non_blank_query_is_not_trimmed() {
        let notes = vec![note("a", "concatenate", "", 1)];
        let sorted = sort_by_recency(&notes);
        assert!(filter_notes(&sorted, " cat").is_empty());
        assert_eq!(filter_notes(&sorted, "cat").len(), 1);
    }
}
