//! Note and category operations.
//!
//! A [`Notebook`] owns the in-memory [`AppState`], the [`SyncLayer`] that
//! writes it through to the document store, and the best-effort
//! [`AttachmentStore`]. The view calls one method per user action and then
//! re-reads [`Notebook::state`].
//!
//! Methods take `&mut self`, so there is a single writer. Input checks run
//! before any mutation; a rejected action leaves the state untouched.

use std::collections::HashSet;

use crate::attachments::{extract_attachment_ids, AttachmentStore};
use crate::blob_store::{BlobStore, DirectoryBlobStore};
use crate::config::{Config, NotebookOptions};
use crate::database::SqliteDocumentStore;
use crate::document_store::DocumentStore;
use crate::error::{NoteError, NoteResult};
use crate::models::{Attachment, Category, Note, Theme};
use crate::search::execute_search;
use crate::seed::{default_category, DEFAULT_CATEGORY_ID};
use crate::state::{AppState, CategoryFilter, DeleteTarget};
use crate::sync::SyncLayer;
use crate::validation::{
    normalize_title, validate_category_name, validate_color, validate_tag_name,
    validate_theme_name,
};

/// What the view shows in a delete confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    pub target: DeleteTarget,
    /// Note title or category name
    pub name: String,
    /// Notes that will move to the default category (category deletes only)
    pub moved_notes: usize,
}

/// An open notebook
pub struct Notebook<D, B> {
    state: AppState,
    sync: SyncLayer<D>,
    attachments: AttachmentStore<B>,
    untitled_label: String,
}

/// Open a notebook backed by the SQLite database and attachment directory
/// named in `config`.
///
/// The attachment directory is opened best-effort; if it cannot be used the
/// notebook still opens, without image persistence.
pub async fn open_from_config(
    config: &Config,
) -> NoteResult<Notebook<SqliteDocumentStore, DirectoryBlobStore>> {
    let docs = SqliteDocumentStore::new(config.database_file())?;
    let attachments =
        AttachmentStore::connect(DirectoryBlobStore::open(config.attachment_directory())).await;
    Notebook::open(docs, attachments, config.notebook_options())
}

impl<D: DocumentStore, B: BlobStore> Notebook<D, B> {
    /// Load a notebook from `docs`, seeding and repairing as needed.
    pub fn open(
        docs: D,
        attachments: AttachmentStore<B>,
        options: NotebookOptions,
    ) -> NoteResult<Self> {
        let sync = SyncLayer::new(docs, options.corrupt_data_policy);
        let loaded = sync.load()?;

        let mut notebook = Self {
            state: AppState::new(loaded.notes, loaded.categories, loaded.theme),
            sync,
            attachments,
            untitled_label: options.untitled_label,
        };
        notebook.repair()?;
        Ok(notebook)
    }

    /// Restore the category invariants on loaded data.
    ///
    /// The default category must exist and every note must point at a
    /// category that does.
    fn repair(&mut self) -> NoteResult<()> {
        if !self.state.has_category(DEFAULT_CATEGORY_ID) {
            self.state.categories.push(default_category());
            self.sync.save_categories(&self.state.categories)?;
            tracing::info!(id = DEFAULT_CATEGORY_ID, "Restored missing default category");
        }

        let known: Vec<String> = self.state.categories.iter().map(|c| c.id.clone()).collect();
        let mut repointed = 0;
        for note in &mut self.state.notes {
            if !known.contains(&note.category_id) {
                tracing::debug!(
                    note = %note.id,
                    category = %note.category_id,
                    "Note points at an unknown category"
                );
                note.category_id = DEFAULT_CATEGORY_ID.to_string();
                note.touch();
                repointed += 1;
            }
        }
        if repointed > 0 {
            self.sync.save_notes(&self.state.notes)?;
            tracing::info!(count = repointed, "Moved orphaned notes to the default category");
        }
        Ok(())
    }

    /// Current state, for rendering
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn sync(&self) -> &SyncLayer<D> {
        &self.sync
    }

    pub fn attachments(&self) -> &AttachmentStore<B> {
        &self.attachments
    }

    /// Title given to notes saved without one
    pub fn untitled_label(&self) -> &str {
        &self.untitled_label
    }

    /// Title to show for a note, falling back to the untitled label
    pub fn display_title<'a>(&'a self, note: &'a Note) -> &'a str {
        if note.title.trim().is_empty() {
            &self.untitled_label
        } else {
            &note.title
        }
    }

    fn persist_notes(&self) -> NoteResult<()> {
        self.sync.save_notes(&self.state.notes)
    }

    fn persist_categories(&self) -> NoteResult<()> {
        self.sync.save_categories(&self.state.categories)
    }

    /// Re-run the active search against the current notes.
    fn refresh_search(&mut self) {
        if let Some(query) = self.state.search.as_ref().map(|s| s.query.clone()) {
            self.state.search = execute_search(&self.state.notes, &query);
        }
    }

    // --- Notes ---

    /// Create an empty note and select it.
    ///
    /// The note goes into the filtered category when the filter names one,
    /// otherwise into the default category.
    pub fn create_note(&mut self) -> NoteResult<String> {
        let note = Note::new(self.state.category_for_new_note());
        let id = note.id.clone();
        self.state.notes.push(note);
        self.persist_notes()?;

        self.state.selection = Some(id.clone());
        self.state.dirty = false;
        tracing::debug!(id = %id, "Created note");
        Ok(id)
    }

    /// Select a note for editing. Unsaved edits to the previous note are dropped.
    pub fn select_note(&mut self, id: &str) -> NoteResult<()> {
        if self.state.note(id).is_none() {
            return Err(NoteError::not_found(format!("note {}", id)));
        }
        self.state.selection = Some(id.to_string());
        self.state.dirty = false;
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.state.selection = None;
        self.state.dirty = false;
    }

    /// Record that the editor holds unsaved input
    pub fn mark_dirty(&mut self) {
        if self.state.selection.is_some() {
            self.state.dirty = true;
        }
    }

    /// Save the editor's title and content into the selected note.
    ///
    /// # Returns
    /// `Ok(false)` if no note is selected.
    pub fn save_note(&mut self, title: &str, content: &str) -> NoteResult<bool> {
        let Some(note) = self.state.current_note_mut() else {
            return Ok(false);
        };

        note.title = normalize_title(title, &self.untitled_label);
        note.content = content.to_string();
        note.touch();
        let id = note.id.clone();

        self.persist_notes()?;
        self.state.dirty = false;
        self.refresh_search();
        tracing::debug!(id = %id, "Saved note");
        Ok(true)
    }

    /// Delete a note, or the selected note when `target` is `None`.
    ///
    /// Attachments referenced by the note's images are removed best-effort
    /// first, unless another note still shows them; a blob store failure
    /// never stops the delete.
    ///
    /// # Returns
    /// `Ok(false)` if there was no target and no selection.
    pub async fn delete_note(&mut self, target: Option<&str>) -> NoteResult<bool> {
        let id = match target {
            Some(id) => id.to_string(),
            None => match &self.state.selection {
                Some(id) => id.clone(),
                None => return Ok(false),
            },
        };
        let Some(index) = self.state.notes.iter().position(|n| n.id == id) else {
            return Err(NoteError::not_found(format!("note {}", id)));
        };

        let retained: HashSet<String> = self
            .state
            .notes
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .flat_map(|(_, note)| extract_attachment_ids(&note.content))
            .collect();
        let removed = self
            .attachments
            .remove_referenced(&self.state.notes[index].content, &retained)
            .await;

        self.state.notes.remove(index);
        if self.state.selection.as_deref() == Some(id.as_str()) {
            self.state.selection = None;
            self.state.dirty = false;
        }
        if let Some(search) = &mut self.state.search {
            search.result_ids.retain(|r| *r != id);
        }
        self.persist_notes()?;

        tracing::debug!(id = %id, attachments = removed, "Deleted note");
        Ok(true)
    }

    /// Flip a note's pinned flag.
    ///
    /// # Returns
    /// The new pinned state.
    pub fn toggle_pin(&mut self, id: &str) -> NoteResult<bool> {
        let note = self
            .state
            .note_mut(id)
            .ok_or_else(|| NoteError::not_found(format!("note {}", id)))?;
        note.is_pinned = !note.is_pinned;
        note.touch();
        let pinned = note.is_pinned;

        self.persist_notes()?;
        self.refresh_search();
        Ok(pinned)
    }

    /// Add a tag to the selected note.
    ///
    /// The tag is held in memory until the next [`Notebook::save_note`].
    ///
    /// # Returns
    /// `Ok(false)` if no note is selected.
    pub fn add_tag(&mut self, tag: &str) -> NoteResult<bool> {
        let tag = validate_tag_name(tag)?;
        let Some(note) = self.state.current_note_mut() else {
            return Ok(false);
        };
        if note.has_tag(&tag) {
            return Err(NoteError::duplicate("tag", tag));
        }
        note.tags.push(tag);
        self.state.dirty = true;
        self.refresh_search();
        Ok(true)
    }

    /// Remove a tag from the selected note; held in memory until the next save.
    ///
    /// # Returns
    /// `Ok(true)` if the tag was present.
    pub fn remove_tag(&mut self, tag: &str) -> NoteResult<bool> {
        let Some(note) = self.state.current_note_mut() else {
            return Ok(false);
        };
        let Some(index) = note.tags.iter().position(|t| t == tag) else {
            return Ok(false);
        };
        note.tags.remove(index);
        self.state.dirty = true;
        self.refresh_search();
        Ok(true)
    }

    /// Store an image and return the markup the editor should insert.
    ///
    /// The attachment is saved best-effort; the markup is returned even if the
    /// blob store is unavailable.
    ///
    /// # Returns
    /// `Ok(None)` if no note is selected.
    pub async fn insert_image(
        &mut self,
        name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> NoteResult<Option<String>> {
        if self.state.selection.is_none() {
            return Ok(None);
        }
        let attachment = Attachment::from_image_bytes(name, mime_type, bytes)?;
        if !self.attachments.save(&attachment).await {
            tracing::warn!(id = %attachment.id, "Image inserted without being persisted");
        }
        self.state.dirty = true;
        Ok(Some(attachment.to_markup()))
    }

    // --- Categories ---

    /// Create a category, returning its ID.
    pub fn create_category(&mut self, name: &str, color: &str) -> NoteResult<String> {
        let name = validate_category_name(name)?;
        let color = validate_color(color)?;

        let category = Category::new(name, color);
        let id = category.id.clone();
        self.state.categories.push(category);
        self.persist_categories()?;

        tracing::debug!(id = %id, "Created category");
        Ok(id)
    }

    /// Rename and recolor a category.
    pub fn update_category(&mut self, id: &str, name: &str, color: &str) -> NoteResult<()> {
        let name = validate_category_name(name)?;
        let color = validate_color(color)?;
        let category = self
            .state
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| NoteError::not_found(format!("category {}", id)))?;

        category.name = name;
        category.color = color;
        self.persist_categories()
    }

    /// Delete a category, moving its notes to the default category.
    ///
    /// # Returns
    /// The number of notes that were moved.
    pub fn delete_category(&mut self, id: &str) -> NoteResult<usize> {
        if id == DEFAULT_CATEGORY_ID {
            return Err(NoteError::validation(
                "category",
                "the default category cannot be deleted",
            ));
        }
        let Some(index) = self.state.categories.iter().position(|c| c.id == id) else {
            return Err(NoteError::not_found(format!("category {}", id)));
        };

        let mut moved = 0;
        for note in self.state.notes.iter_mut().filter(|n| n.category_id == id) {
            note.category_id = DEFAULT_CATEGORY_ID.to_string();
            note.touch();
            moved += 1;
        }
        self.state.categories.remove(index);

        self.persist_categories()?;
        self.persist_notes()?;

        if self.state.filter.category_id() == Some(id) {
            self.select_filter(CategoryFilter::All)?;
        }
        tracing::debug!(id, moved, "Deleted category");
        Ok(moved)
    }

    // --- Filtering & search ---

    /// Change the note list filter.
    ///
    /// Clears any search. The selection is kept only if the selected note is
    /// still shown under the new filter.
    pub fn select_filter(&mut self, filter: CategoryFilter) -> NoteResult<()> {
        if let Some(id) = filter.category_id() {
            if !self.state.has_category(id) {
                return Err(NoteError::not_found(format!("category {}", id)));
            }
        }

        self.state.search = None;
        let keep = self
            .state
            .current_note()
            .map(|note| filter.matches(note))
            .unwrap_or(false);
        if !keep {
            self.state.selection = None;
            self.state.dirty = false;
        }
        self.state.filter = filter;
        Ok(())
    }

    /// Run a search; a blank query clears it.
    ///
    /// # Returns
    /// The number of matching notes.
    pub fn search(&mut self, query: &str) -> usize {
        self.state.search = execute_search(&self.state.notes, query);
        self.state
            .search
            .as_ref()
            .map(|s| s.result_ids.len())
            .unwrap_or(0)
    }

    pub fn clear_search(&mut self) {
        self.state.search = None;
    }

    /// Select a note from the search results and leave search mode.
    pub fn open_search_result(&mut self, id: &str) -> NoteResult<()> {
        self.select_note(id)?;
        self.clear_search();
        Ok(())
    }

    // --- Theme ---

    /// Switch theme; written through immediately.
    pub fn set_theme(&mut self, theme: Theme) -> NoteResult<()> {
        validate_theme_name(theme.as_str())?;
        self.sync.save_theme(&theme)?;
        tracing::debug!(theme = %theme, "Theme changed");
        self.state.theme = theme;
        Ok(())
    }

    // --- Pending deletes ---

    /// Ask to delete a note, or the selected note when `target` is `None`.
    ///
    /// # Returns
    /// `Ok(None)` if there was no target and no selection.
    pub fn request_delete_note(
        &mut self,
        target: Option<&str>,
    ) -> NoteResult<Option<DeleteConfirmation>> {
        let id = match target.or(self.state.selection.as_deref()) {
            Some(id) => id.to_string(),
            None => return Ok(None),
        };
        let note = self
            .state
            .note(&id)
            .ok_or_else(|| NoteError::not_found(format!("note {}", id)))?;

        let confirmation = DeleteConfirmation {
            target: DeleteTarget::Note(id),
            name: self.display_title(note).to_string(),
            moved_notes: 0,
        };
        self.state.pending_delete = Some(confirmation.target.clone());
        Ok(Some(confirmation))
    }

    /// Ask to delete a category.
    pub fn request_delete_category(&mut self, id: &str) -> NoteResult<DeleteConfirmation> {
        if id == DEFAULT_CATEGORY_ID {
            return Err(NoteError::validation(
                "category",
                "the default category cannot be deleted",
            ));
        }
        let category = self
            .state
            .category(id)
            .ok_or_else(|| NoteError::not_found(format!("category {}", id)))?;

        let confirmation = DeleteConfirmation {
            target: DeleteTarget::Category(id.to_string()),
            name: category.name.clone(),
            moved_notes: self.state.notes.iter().filter(|n| n.category_id == id).count(),
        };
        self.state.pending_delete = Some(confirmation.target.clone());
        Ok(confirmation)
    }

    /// Carry out the pending delete.
    ///
    /// # Returns
    /// `Ok(false)` if nothing was pending or the target is already gone.
    pub async fn confirm_delete(&mut self) -> NoteResult<bool> {
        let Some(target) = self.state.pending_delete.take() else {
            return Ok(false);
        };
        match target {
            DeleteTarget::Note(id) => {
                if self.state.note(&id).is_none() {
                    return Ok(false);
                }
                self.delete_note(Some(&id)).await
            }
            DeleteTarget::Category(id) => {
                if !self.state.has_category(&id) {
                    return Ok(false);
                }
                self.delete_category(&id).map(|_| true)
            }
        }
    }

    /// Drop the pending delete without acting on it
    pub fn dismiss_pending(&mut self) {
        self.state.pending_delete = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob_store::MemoryBlobStore;
    use crate::document_store::MemoryDocumentStore;
    use crate::error::Severity;
    use crate::sync::{CATEGORIES_KEY, NOTES_KEY, THEME_KEY};
    use tempfile::TempDir;

    type TestNotebook = Notebook<MemoryDocumentStore, MemoryBlobStore>;

    fn notebook() -> TestNotebook {
        Notebook::open(
            MemoryDocumentStore::new(),
            AttachmentStore::new(MemoryBlobStore::new()),
            NotebookOptions::default(),
        )
        .unwrap()
    }

    fn stored_notes(nb: &TestNotebook) -> Vec<Note> {
        let raw = nb.sync().store().get(NOTES_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    fn stored_categories(nb: &TestNotebook) -> Vec<Category> {
        let raw = nb.sync().store().get(CATEGORIES_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_open_seeds_fresh_store() {
        let nb = notebook();
        assert_eq!(nb.state().notes().len(), 3);
        assert_eq!(nb.state().categories().len(), 4);
        assert_eq!(nb.state().theme(), &Theme::Spring);
        assert!(nb.state().selection().is_none());
        assert!(!nb.state().is_dirty());
    }

    #[test]
    fn test_open_repairs_missing_default_and_orphans() {
        let notes = r#"[{"id":"n1","title":"Lost","content":"","categoryId":"gone",
            "createdAt":"2023-07-20T08:30:00Z","updatedAt":"2023-07-20T08:30:00Z"}]"#;
        let categories = r##"[{"id":"work","name":"Work","color":"#3498db"}]"##;
        let store =
            MemoryDocumentStore::with_entries([(NOTES_KEY, notes), (CATEGORIES_KEY, categories)]);

        let nb = Notebook::open(
            store,
            AttachmentStore::<MemoryBlobStore>::unavailable(),
            NotebookOptions::default(),
        )
        .unwrap();

        assert!(nb.state().has_category(DEFAULT_CATEGORY_ID));
        let note = nb.state().note("n1").unwrap();
        assert_eq!(note.category_id, DEFAULT_CATEGORY_ID);
        assert!(note.updated_at > note.created_at);

        assert_eq!(stored_notes(&nb)[0].category_id, DEFAULT_CATEGORY_ID);
        assert!(stored_categories(&nb)
            .iter()
            .any(|c| c.id == DEFAULT_CATEGORY_ID));
    }

    #[test]
    fn test_create_note_defaults() {
        let mut nb = notebook();
        let id = nb.create_note().unwrap();

        let note = nb.state().note(&id).unwrap();
        assert!(id.starts_with("note-"));
        assert_eq!(note.category_id, DEFAULT_CATEGORY_ID);
        assert!(note.title.is_empty() && note.content.is_empty() && note.tags.is_empty());
        assert_eq!(note.created_at, note.updated_at);
        assert_eq!(nb.state().selection(), Some(id.as_str()));
        assert_eq!(nb.state().notes().last().unwrap().id, id);
        assert!(stored_notes(&nb).iter().any(|n| n.id == id));
    }

    #[test]
    fn test_create_note_uses_category_filter() {
        let mut nb = notebook();
        nb.select_filter(CategoryFilter::Category("study".to_string()))
            .unwrap();
        let id = nb.create_note().unwrap();
        assert_eq!(nb.state().note(&id).unwrap().category_id, "study");

        nb.select_filter(CategoryFilter::Pinned).unwrap();
        let id = nb.create_note().unwrap();
        assert_eq!(nb.state().note(&id).unwrap().category_id, DEFAULT_CATEGORY_ID);
    }

    #[test]
    fn test_created_ids_are_unique() {
        let mut nb = notebook();
        let a = nb.create_note().unwrap();
        let b = nb.create_note().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_save_note() {
        let mut nb = notebook();
        let id = nb.create_note().unwrap();
        nb.mark_dirty();
        assert!(nb.state().is_dirty());

        assert!(nb.save_note("  Plan  ", "<p>Body</p>").unwrap());
        let note = nb.state().note(&id).unwrap();
        assert_eq!(note.title, "Plan");
        assert_eq!(note.content, "<p>Body</p>");
        assert!(note.updated_at >= note.created_at);
        assert!(!nb.state().is_dirty());

        let stored = stored_notes(&nb);
        assert_eq!(stored.iter().find(|n| n.id == id).unwrap().title, "Plan");
    }

    #[test]
    fn test_save_without_selection_is_noop() {
        let mut nb = notebook();
        let before = stored_notes(&nb);
        assert!(!nb.save_note("x", "y").unwrap());
        assert!(!nb.save_note(&"x".repeat(501), "y").unwrap());
        assert_eq!(stored_notes(&nb), before);
    }

    #[test]
    fn test_save_note_with_long_title() {
        let mut nb = notebook();
        let id = nb.create_note().unwrap();
        let title = "t".repeat(501);

        assert!(nb.save_note(&title, "<p>Keep me</p>").unwrap());
        let stored = stored_notes(&nb);
        let note = stored.iter().find(|n| n.id == id).unwrap();
        assert_eq!(note.title, title);
        assert_eq!(note.content, "<p>Keep me</p>");
        assert!(!nb.state().is_dirty());
    }

    #[test]
    fn test_long_tag_and_category_names() {
        let mut nb = notebook();
        let id = nb.create_note().unwrap();
        let tag = "a".repeat(101);
        assert!(nb.add_tag(&tag).unwrap());
        assert_eq!(nb.state().note(&id).unwrap().tags, vec![tag]);

        let name = "c".repeat(101);
        let category = nb.create_category(&name, "#000").unwrap();
        assert_eq!(nb.state().category(&category).unwrap().name, name);
    }

    #[test]
    fn test_empty_title_placeholder_after_reload() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("notes.db");

        let id = {
            let mut nb = Notebook::open(
                SqliteDocumentStore::new(&db_path).unwrap(),
                AttachmentStore::<MemoryBlobStore>::unavailable(),
                NotebookOptions::default(),
            )
            .unwrap();
            let id = nb.create_note().unwrap();
            nb.save_note("   ", "<p>text</p>").unwrap();
            id
        };

        let nb = Notebook::open(
            SqliteDocumentStore::new(&db_path).unwrap(),
            AttachmentStore::<MemoryBlobStore>::unavailable(),
            NotebookOptions::default(),
        )
        .unwrap();
        let note = nb.state().note(&id).unwrap();
        assert_eq!(note.title, "Untitled");
        assert_eq!(note.content, "<p>text</p>");
        assert_eq!(nb.state().notes().len(), 4);
    }

    #[test]
    fn test_custom_untitled_label() {
        let mut nb = Notebook::open(
            MemoryDocumentStore::new(),
            AttachmentStore::<MemoryBlobStore>::unavailable(),
            NotebookOptions {
                untitled_label: "No title".to_string(),
                ..NotebookOptions::default()
            },
        )
        .unwrap();
        let id = nb.create_note().unwrap();
        assert_eq!(nb.display_title(nb.state().note(&id).unwrap()), "No title");
        nb.save_note("", "").unwrap();
        assert_eq!(nb.state().note(&id).unwrap().title, "No title");
    }

    #[test]
    fn test_reload_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("notes.db");

        let (notes, categories) = {
            let mut nb = Notebook::open(
                SqliteDocumentStore::new(&db_path).unwrap(),
                AttachmentStore::<MemoryBlobStore>::unavailable(),
                NotebookOptions::default(),
            )
            .unwrap();
            nb.create_note().unwrap();
            nb.save_note("Kept", "<p>kept</p>").unwrap();
            nb.add_tag("keep").unwrap();
            nb.save_note("Kept", "<p>kept</p>").unwrap();
            nb.toggle_pin("note-2").unwrap();
            nb.create_category("Travel", "#123456").unwrap();
            nb.set_theme(Theme::Winter).unwrap();
            (nb.state().notes().to_vec(), nb.state().categories().to_vec())
        };

        let nb = Notebook::open(
            SqliteDocumentStore::new(&db_path).unwrap(),
            AttachmentStore::<MemoryBlobStore>::unavailable(),
            NotebookOptions::default(),
        )
        .unwrap();
        assert_eq!(nb.state().notes(), notes.as_slice());
        assert_eq!(nb.state().categories(), categories.as_slice());
        assert_eq!(nb.state().theme(), &Theme::Winter);
    }

    #[tokio::test]
    async fn test_delete_selected_note() {
        let mut nb = notebook();
        let id = nb.create_note().unwrap();

        assert!(nb.delete_note(None).await.unwrap());
        assert!(nb.state().note(&id).is_none());
        assert!(nb.state().selection().is_none());
        assert!(!stored_notes(&nb).iter().any(|n| n.id == id));

        // Nothing selected any more
        assert!(!nb.delete_note(None).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_other_note_keeps_selection() {
        let mut nb = notebook();
        nb.select_note("note-1").unwrap();
        assert!(nb.delete_note(Some("note-3")).await.unwrap());
        assert_eq!(nb.state().selection(), Some("note-1"));

        let err = nb.delete_note(Some("note-3")).await.unwrap_err();
        assert!(matches!(err, NoteError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_note_removes_its_images() {
        let mut nb = notebook();
        nb.create_note().unwrap();
        let markup = nb
            .insert_image("cat.png", "image/png", b"\x89PNG")
            .await
            .unwrap()
            .unwrap();
        let other = nb
            .insert_image("dog.png", "image/png", b"\x89PNG")
            .await
            .unwrap()
            .unwrap();
        assert!(nb.state().is_dirty());
        nb.save_note("Pets", &format!("<p>{}</p>", markup)).unwrap();

        let backend = nb.attachments().backend().unwrap();
        assert_eq!(backend.len().await, 2);

        nb.delete_note(None).await.unwrap();
        let backend = nb.attachments().backend().unwrap();
        assert_eq!(backend.len().await, 1);
        let remaining = crate::attachments::extract_attachment_ids(&other);
        assert!(backend.get(&remaining[0]).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_note_keeps_shared_images() {
        let mut nb = notebook();
        let first = nb.create_note().unwrap();
        let markup = nb
            .insert_image("map.png", "image/png", b"\x89PNG")
            .await
            .unwrap()
            .unwrap();
        nb.save_note("Route", &markup).unwrap();
        let second = nb.create_note().unwrap();
        nb.save_note("Route copy", &format!("<p>{}</p>", markup)).unwrap();

        assert!(nb.delete_note(Some(&first)).await.unwrap());
        let ids = crate::attachments::extract_attachment_ids(&markup);
        let backend = nb.attachments().backend().unwrap();
        assert!(backend.get(&ids[0]).await.unwrap().is_some());

        assert!(nb.delete_note(Some(&second)).await.unwrap());
        let backend = nb.attachments().backend().unwrap();
        assert!(backend.get(&ids[0]).await.unwrap().is_none());
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_note_without_blob_store() {
        let mut nb: TestNotebook = Notebook::open(
            MemoryDocumentStore::new(),
            AttachmentStore::unavailable(),
            NotebookOptions::default(),
        )
        .unwrap();
        nb.create_note().unwrap();
        let markup = nb
            .insert_image("cat.png", "image/png", b"x")
            .await
            .unwrap()
            .unwrap();
        nb.save_note("Cat", &markup).unwrap();

        assert!(nb.delete_note(None).await.unwrap());
        assert_eq!(nb.state().notes().len(), 3);
    }

    #[tokio::test]
    async fn test_insert_image_checks() {
        let mut nb = notebook();
        assert_eq!(nb.insert_image("a.png", "image/png", b"x").await.unwrap(), None);

        nb.create_note().unwrap();
        let err = nb
            .insert_image("a.txt", "text/plain", b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, NoteError::Validation { .. }));
        assert!(!nb.state().is_dirty());
    }

    #[test]
    fn test_toggle_pin() {
        let mut nb = notebook();
        let before = nb.state().note("note-2").unwrap().updated_at;

        assert!(nb.toggle_pin("note-2").unwrap());
        let note = nb.state().note("note-2").unwrap();
        assert!(note.is_pinned);
        assert!(note.updated_at >= before);
        assert!(stored_notes(&nb)[1].is_pinned);

        assert!(!nb.toggle_pin("note-2").unwrap());
        assert!(nb.toggle_pin("missing").is_err());
    }

    #[test]
    fn test_pinned_filter_ordering() {
        let mut nb = notebook();
        nb.toggle_pin("note-3").unwrap();
        nb.select_filter(CategoryFilter::Pinned).unwrap();

        let ids: Vec<&str> = nb
            .state()
            .visible_notes()
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        // note-3 was touched after note-1 was seeded
        assert_eq!(ids, vec!["note-3", "note-1"]);
    }

    #[test]
    fn test_add_tag() {
        let mut nb = notebook();
        assert!(!nb.add_tag("x").unwrap());

        let id = nb.create_note().unwrap();
        assert!(nb.add_tag(" trip ").unwrap());
        assert!(nb.state().is_dirty());
        assert_eq!(nb.state().note(&id).unwrap().tags, vec!["trip"]);

        // Held in memory until save
        assert!(stored_notes(&nb)
            .iter()
            .find(|n| n.id == id)
            .unwrap()
            .tags
            .is_empty());
    }

    #[test]
    fn test_add_duplicate_tag_is_warning() {
        let mut nb = notebook();
        let id = nb.create_note().unwrap();
        nb.add_tag("trip").unwrap();

        let err = nb.add_tag("trip").unwrap_err();
        assert!(matches!(err, NoteError::Duplicate { .. }));
        assert_eq!(err.severity(), Severity::Warning);
        assert_eq!(nb.state().note(&id).unwrap().tags.len(), 1);
    }

    #[test]
    fn test_add_empty_tag_is_error() {
        let mut nb = notebook();
        nb.create_note().unwrap();
        let err = nb.add_tag("   ").unwrap_err();
        assert_eq!(err.severity(), Severity::Error);
        assert!(!nb.state().is_dirty());
    }

    #[test]
    fn test_remove_tag() {
        let mut nb = notebook();
        nb.select_note("note-2").unwrap();
        assert!(nb.remove_tag("meeting").unwrap());
        assert!(nb.state().is_dirty());
        assert_eq!(nb.state().current_note().unwrap().tags, vec!["work"]);
        assert!(!nb.remove_tag("meeting").unwrap());
    }

    #[test]
    fn test_category_crud() {
        let mut nb = notebook();
        let id = nb.create_category(" Recipes ", "#aa0000").unwrap();
        assert!(id.starts_with("category-"));
        assert_eq!(nb.state().category(&id).unwrap().name, "Recipes");

        nb.update_category(&id, "Cooking", "#00aa00").unwrap();
        let stored = stored_categories(&nb);
        let category = stored.iter().find(|c| c.id == id).unwrap();
        assert_eq!(category.name, "Cooking");
        assert_eq!(category.color, "#00aa00");
    }

    #[test]
    fn test_category_validation_leaves_state() {
        let mut nb = notebook();
        assert!(nb.create_category("  ", "#000").is_err());
        assert!(nb.create_category("Name", "").is_err());
        assert_eq!(nb.state().categories().len(), 4);

        let err = nb.update_category("work", "", "#000").unwrap_err();
        assert!(matches!(err, NoteError::Validation { .. }));
        assert_eq!(nb.state().category("work").unwrap().name, "Work");

        let err = nb.update_category("nope", "Name", "#000").unwrap_err();
        assert!(matches!(err, NoteError::NotFound(_)));
    }

    #[test]
    fn test_delete_category_reassigns_notes() {
        let mut nb = notebook();
        let before = nb.state().note("note-2").unwrap().updated_at;

        assert_eq!(nb.delete_category("work").unwrap(), 1);
        let note = nb.state().note("note-2").unwrap();
        assert_eq!(note.category_id, DEFAULT_CATEGORY_ID);
        assert!(note.updated_at >= before);
        assert!(!nb.state().has_category("work"));

        assert!(!stored_categories(&nb).iter().any(|c| c.id == "work"));
        assert_eq!(stored_notes(&nb)[1].category_id, DEFAULT_CATEGORY_ID);
    }

    #[test]
    fn test_default_category_cannot_be_deleted() {
        let mut nb = notebook();
        assert!(matches!(
            nb.delete_category(DEFAULT_CATEGORY_ID),
            Err(NoteError::Validation { .. })
        ));
        assert!(matches!(
            nb.request_delete_category(DEFAULT_CATEGORY_ID),
            Err(NoteError::Validation { .. })
        ));
        assert!(matches!(
            nb.delete_category("missing"),
            Err(NoteError::NotFound(_))
        ));
        assert!(nb.state().has_category(DEFAULT_CATEGORY_ID));
    }

    #[tokio::test]
    async fn test_travel_category_scenario() {
        let mut nb = notebook();
        let travel = nb.create_category("Travel", "#000").unwrap();

        nb.select_filter(CategoryFilter::Category(travel.clone()))
            .unwrap();
        let note_id = nb.create_note().unwrap();
        nb.save_note("Lisbon", "<p>Trams</p>").unwrap();
        let saved_at = nb.state().note(&note_id).unwrap().updated_at;
        assert_eq!(nb.state().note(&note_id).unwrap().category_id, travel);
        assert_eq!(nb.state().category_counts()[travel.as_str()], 1);

        let confirmation = nb.request_delete_category(&travel).unwrap();
        assert_eq!(confirmation.name, "Travel");
        assert_eq!(confirmation.moved_notes, 1);
        assert!(nb.confirm_delete().await.unwrap());

        assert!(!nb.state().has_category(&travel));
        assert_eq!(nb.state().filter(), &CategoryFilter::All);
        let note = nb.state().note(&note_id).unwrap();
        assert_eq!(note.category_id, DEFAULT_CATEGORY_ID);
        assert!(note.updated_at > saved_at);
        assert_eq!(nb.state().selection(), Some(note_id.as_str()));
        assert!(nb.state().pending_delete().is_none());
    }

    #[test]
    fn test_filter_change_selection_rules() {
        let mut nb = notebook();
        nb.select_note("note-2").unwrap();

        nb.select_filter(CategoryFilter::Category("work".to_string()))
            .unwrap();
        assert_eq!(nb.state().selection(), Some("note-2"));

        nb.select_filter(CategoryFilter::All).unwrap();
        assert_eq!(nb.state().selection(), Some("note-2"));

        nb.select_filter(CategoryFilter::Pinned).unwrap();
        assert!(nb.state().selection().is_none());

        assert!(nb
            .select_filter(CategoryFilter::Category("nope".to_string()))
            .is_err());
        assert_eq!(nb.state().filter(), &CategoryFilter::Pinned);
    }

    #[test]
    fn test_filter_change_clears_search() {
        let mut nb = notebook();
        nb.search("study");
        assert!(nb.state().is_searching());
        nb.select_filter(CategoryFilter::All).unwrap();
        assert!(!nb.state().is_searching());
    }

    #[test]
    fn test_search_title_tag_union_and_reset() {
        let mut nb = notebook();
        nb.create_note().unwrap();
        nb.save_note("Work plan", "").unwrap();

        // note-2 carries the "work" tag, the new note has it in its title
        assert_eq!(nb.search("WORK"), 2);
        let ids: Vec<&str> = nb
            .state()
            .search_results()
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(ids[0], "note-2");
        assert_eq!(ids.len(), 2);

        assert_eq!(nb.search("   "), 0);
        assert!(!nb.state().is_searching());
        assert!(nb.state().search_results().is_empty());
    }

    #[test]
    fn test_edits_refresh_active_search() {
        let mut nb = notebook();
        assert_eq!(nb.search("meeting"), 1);

        let id = nb.create_note().unwrap();
        nb.save_note("Meeting prep", "").unwrap();
        assert_eq!(nb.state().search_results().len(), 2);

        nb.save_note("Groceries", "").unwrap();
        let ids: Vec<&str> = nb
            .state()
            .search_results()
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(ids, vec!["note-2"]);

        assert!(nb.add_tag("meeting-followup").unwrap());
        assert_eq!(nb.state().search_results().len(), 2);
        assert!(nb.remove_tag("meeting-followup").unwrap());
        assert_eq!(nb.state().search_results().len(), 1);

        nb.toggle_pin(&id).unwrap();
        assert_eq!(nb.state().search_query(), Some("meeting"));
        assert_eq!(nb.state().search_results().len(), 1);
    }

    #[test]
    fn test_open_search_result() {
        let mut nb = notebook();
        nb.search("study");
        nb.open_search_result("note-3").unwrap();
        assert_eq!(nb.state().selection(), Some("note-3"));
        assert!(!nb.state().is_searching());
    }

    #[test]
    fn test_set_theme() {
        let mut nb = notebook();
        nb.set_theme(Theme::Autumn).unwrap();
        assert_eq!(nb.state().theme(), &Theme::Autumn);
        assert_eq!(
            nb.sync().store().get(THEME_KEY).unwrap().as_deref(),
            Some("autumn")
        );

        nb.set_theme(Theme::from("neon")).unwrap();
        assert_eq!(nb.state().theme().display_name(), "Default");
        assert!(nb.set_theme(Theme::from("")).is_err());
        assert_eq!(nb.state().theme().as_str(), "neon");
    }

    #[tokio::test]
    async fn test_pending_note_delete() {
        let mut nb = notebook();
        assert_eq!(nb.request_delete_note(None).unwrap(), None);

        let id = nb.create_note().unwrap();
        let confirmation = nb.request_delete_note(None).unwrap().unwrap();
        assert_eq!(confirmation.target, DeleteTarget::Note(id.clone()));
        assert_eq!(confirmation.name, "Untitled");

        nb.dismiss_pending();
        assert!(nb.state().pending_delete().is_none());
        assert!(!nb.confirm_delete().await.unwrap());
        assert!(nb.state().note(&id).is_some());

        nb.request_delete_note(Some("note-1")).unwrap();
        assert!(nb.confirm_delete().await.unwrap());
        assert!(nb.state().note("note-1").is_none());
        assert_eq!(nb.state().selection(), Some(id.as_str()));
    }

    #[test]
    fn test_updated_never_before_created() {
        let mut nb = notebook();
        nb.create_note().unwrap();
        nb.save_note("a", "b").unwrap();
        nb.toggle_pin("note-1").unwrap();
        nb.delete_category("study").unwrap();
        for note in nb.state().notes() {
            assert!(note.updated_at >= note.created_at);
        }
    }

    #[tokio::test]
    async fn test_open_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::new(Some(temp_dir.path().to_path_buf())).unwrap();

        let mut nb = open_from_config(&config).await.unwrap();
        assert!(nb.attachments().is_available());
        assert_eq!(nb.state().notes().len(), 3);

        nb.create_note().unwrap();
        let markup = nb
            .insert_image("cat.png", "image/png", b"x")
            .await
            .unwrap()
            .unwrap();
        let ids = crate::attachments::extract_attachment_ids(&markup);
        assert!(temp_dir
            .path()
            .join("attachments")
            .join(format!("{}.json", ids[0]))
            .exists());
    }
}
