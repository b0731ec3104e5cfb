//! Search functionality for the notebook.
//!
//! A search is a linear, case-insensitive substring scan over every note's
//! title, raw content and tags. It is recomputed on each query change and its
//! results are never persisted.

use crate::models::Note;
use crate::state::SearchState;

/// Check if a search input should clear the search rather than run one.
pub fn is_blank_query(query: &str) -> bool {
    query.trim().is_empty()
}

/// Check if `note` matches an already lowercased query.
///
/// Matches the title, the raw content markup, or any single tag.
pub fn note_matches(note: &Note, needle: &str) -> bool {
    note.title.to_lowercase().contains(needle)
        || note.content.to_lowercase().contains(needle)
        || note.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
}

/// Execute a search over `notes`.
///
/// The query is matched as typed (lowercased, not trimmed), so a leading or
/// trailing space is part of the needle.
///
/// # Returns
/// `None` for a blank query, which means "no active search". Otherwise the
/// query and the ids of matching notes in collection order.
pub fn execute_search(notes: &[Note], query: &str) -> Option<SearchState> {
    if is_blank_query(query) {
        return None;
    }

    let needle = query.to_lowercase();
    let result_ids = notes
        .iter()
        .filter(|note| note_matches(note, &needle))
        .map(|note| note.id.clone())
        .collect();

    Some(SearchState {
        query: query.to_string(),
        result_ids,
    })
}
