//! In-memory state of an open notebook.
//!
//! `AppState` is the single source of truth the view reads: the note and
//! category collections plus the session-only selection, filter, search and
//! pending-delete state. It is mutated only through [`crate::notebook::Notebook`].

use std::collections::HashMap;
use std::fmt;

use crate::models::{Category, Note, Theme};
use crate::seed::DEFAULT_CATEGORY_ID;

/// Which notes the list shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Every note
    #[default]
    All,
    /// Pinned notes only
    Pinned,
    /// Notes in one category
    Category(String),
}

impl CategoryFilter {
    pub fn key(&self) -> &str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Pinned => "pinned",
            CategoryFilter::Category(id) => id,
        }
    }

    /// Check if `note` is shown under this filter
    pub fn matches(&self, note: &Note) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Pinned => note.is_pinned,
            CategoryFilter::Category(id) => note.category_id == *id,
        }
    }

    /// The category this filter names, if any
    pub fn category_id(&self) -> Option<&str> {
        match self {
            CategoryFilter::Category(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// An active search: the query and the ids of matching notes, in collection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    pub query: String,
    pub result_ids: Vec<String>,
}

/// Something waiting for the user to confirm its deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Note(String),
    Category(String),
}

/// Sort notes for display: pinned first, then most recently updated.
///
/// The sort is stable, so notes with equal keys keep their collection order.
pub fn sort_for_display(notes: &mut [&Note]) {
    notes.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });
}

/// In-memory notebook state
#[derive(Debug, Clone)]
pub struct AppState {
    pub(crate) notes: Vec<Note>,
    pub(crate) categories: Vec<Category>,
    pub(crate) selection: Option<String>,
    pub(crate) filter: CategoryFilter,
    pub(crate) search: Option<SearchState>,
    pub(crate) theme: Theme,
    pub(crate) pending_delete: Option<DeleteTarget>,
    pub(crate) dirty: bool,
}

impl AppState {
    pub fn new(notes: Vec<Note>, categories: Vec<Category>, theme: Theme) -> Self {
        Self {
            notes,
            categories,
            selection: None,
            filter: CategoryFilter::All,
            search: None,
            theme,
            pending_delete: None,
            dirty: false,
        }
    }

    /// All notes in collection (insertion) order
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub(crate) fn note_mut(&mut self, id: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn has_category(&self, id: &str) -> bool {
        self.category(id).is_some()
    }

    /// ID of the selected note
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// The selected note
    pub fn current_note(&self) -> Option<&Note> {
        self.selection.as_deref().and_then(|id| self.note(id))
    }

    pub(crate) fn current_note_mut(&mut self) -> Option<&mut Note> {
        let id = self.selection.clone()?;
        self.note_mut(&id)
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// True while the selected note has edits that were not saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn pending_delete(&self) -> Option<&DeleteTarget> {
        self.pending_delete.as_ref()
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    pub fn search_query(&self) -> Option<&str> {
        self.search.as_ref().map(|s| s.query.as_str())
    }

    /// Notes matching the active search, in collection order.
    ///
    /// Empty when no search is active.
    pub fn search_results(&self) -> Vec<&Note> {
        match &self.search {
            Some(search) => search
                .result_ids
                .iter()
                .filter_map(|id| self.note(id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Notes under the current filter, in display order
    pub fn visible_notes(&self) -> Vec<&Note> {
        self.notes_for(&self.filter)
    }

    /// Notes under `filter`, in display order
    pub fn notes_for(&self, filter: &CategoryFilter) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().filter(|n| filter.matches(n)).collect();
        sort_for_display(&mut notes);
        notes
    }

    /// Number of pinned notes
    pub fn pinned_count(&self) -> usize {
        self.notes.iter().filter(|n| n.is_pinned).count()
    }

    /// Number of notes per category id
    pub fn category_counts(&self) -> HashMap<&str, usize> {
        let mut counts: HashMap<&str, usize> = self
            .categories
            .iter()
            .map(|c| (c.id.as_str(), 0))
            .collect();
        for note in &self.notes {
            if let Some(count) = counts.get_mut(note.category_id.as_str()) {
                *count += 1;
            }
        }
        counts
    }

    /// Heading for the note list under the current filter
    pub fn filter_label(&self) -> &str {
        match &self.filter {
            CategoryFilter::All => "All notes",
            CategoryFilter::Pinned => "Pinned notes",
            CategoryFilter::Category(id) => self
                .category(id)
                .map(|c| c.name.as_str())
                .unwrap_or("All notes"),
        }
    }

    /// Display name of a note's category
    pub fn category_name_of(&self, note: &Note) -> &str {
        self.category(&note.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("Uncategorized")
    }

    /// Category a new note should go into under the current filter
    pub(crate) fn category_for_new_note(&self) -> String {
        match self.filter.category_id() {
            Some(id) if self.has_category(id) => id.to_string(),
            _ => DEFAULT_CATEGORY_ID.to_string(),
        }
    }
}
