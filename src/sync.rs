//! Synchronization between the in-memory state and the document store.
//!
//! Loading happens once at startup. Missing collections are seeded and written
//! immediately; a missing theme falls back to the default without a write.
//! After that every mutation writes the whole affected collection.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::document_store::DocumentStore;
use crate::error::{NoteError, NoteResult};
use crate::models::{Category, Note, Theme};
use crate::seed::{default_categories, sample_notes, DEFAULT_THEME};

/// Key of the notes collection
pub const NOTES_KEY: &str = "notes";
/// Key of the categories collection
pub const CATEGORIES_KEY: &str = "categories";
/// Key of the active theme
pub const THEME_KEY: &str = "theme";

/// Prefix the web client used for its storage keys
pub const LEGACY_KEY_PREFIX: &str = "yiwang-";

/// Suffix of the key a corrupt document is backed up to before a reset.
///
/// Later backups of the same key get a counter: `notes.corrupt.1`, `.2`, ...
pub const CORRUPT_BACKUP_SUFFIX: &str = ".corrupt";

/// What to do when a stored collection cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptDataPolicy {
    /// Back up the raw value and start over from the built-in defaults
    #[default]
    Reset,
    /// Refuse to start
    Fail,
}

/// Everything read from the document store at startup.
#[derive(Debug, Clone)]
pub struct LoadedState {
    pub notes: Vec<Note>,
    pub categories: Vec<Category>,
    pub theme: Theme,
}

/// Bridge between the in-memory state and a document store
pub struct SyncLayer<D> {
    store: D,
    policy: CorruptDataPolicy,
}

impl<D: DocumentStore> SyncLayer<D> {
    pub fn new(store: D, policy: CorruptDataPolicy) -> Self {
        Self { store, policy }
    }

    /// The underlying document store
    pub fn store(&self) -> &D {
        &self.store
    }

    /// Load notes, categories and theme, seeding whatever is missing.
    pub fn load(&self) -> NoteResult<LoadedState> {
        self.migrate_legacy_keys()?;

        let notes = match self.load_collection::<Note>(NOTES_KEY)? {
            Some(notes) => notes,
            None => {
                let notes = sample_notes(Utc::now());
                self.save_notes(&notes)?;
                tracing::info!(count = notes.len(), "Seeded sample notes");
                notes
            }
        };

        let categories = match self.load_collection::<Category>(CATEGORIES_KEY)? {
            Some(categories) => categories,
            None => {
                let categories = default_categories();
                self.save_categories(&categories)?;
                tracing::info!(count = categories.len(), "Seeded default categories");
                categories
            }
        };

        let theme = match self.store.get(THEME_KEY)? {
            Some(raw) => Theme::from(raw.as_str()),
            None => DEFAULT_THEME,
        };

        tracing::debug!(
            notes = notes.len(),
            categories = categories.len(),
            theme = %theme,
            "Loaded notebook"
        );

        Ok(LoadedState {
            notes,
            categories,
            theme,
        })
    }

    /// Write the whole notes collection
    pub fn save_notes(&self, notes: &[Note]) -> NoteResult<()> {
        self.save_collection(NOTES_KEY, notes)
    }

    /// Write the whole categories collection
    pub fn save_categories(&self, categories: &[Category]) -> NoteResult<()> {
        self.save_collection(CATEGORIES_KEY, categories)
    }

    /// Write the active theme, verbatim
    pub fn save_theme(&self, theme: &Theme) -> NoteResult<()> {
        self.store.put(THEME_KEY, theme.as_str())
    }

    fn save_collection<T: Serialize>(&self, key: &str, items: &[T]) -> NoteResult<()> {
        let json = serde_json::to_string(items)?;
        self.store.put(key, &json)
    }

    /// Read a JSON array from `key`.
    ///
    /// Returns `None` when the key is absent, or when the value is corrupt and
    /// the policy says to reset.
    fn load_collection<T: DeserializeOwned>(&self, key: &str) -> NoteResult<Option<Vec<T>>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };

        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(items) => Ok(Some(items)),
            Err(e) => match self.policy {
                CorruptDataPolicy::Fail => Err(NoteError::CorruptDocument {
                    key: key.to_string(),
                    source: e,
                }),
                CorruptDataPolicy::Reset => {
                    let backup_key = self.free_backup_key(key)?;
                    self.store.put(&backup_key, &raw)?;
                    tracing::warn!(
                        key,
                        backup_key = %backup_key,
                        error = %e,
                        "Stored document is corrupt; resetting to defaults"
                    );
                    Ok(None)
                }
            },
        }
    }

    /// First backup key for `key` that holds no earlier backup
    fn free_backup_key(&self, key: &str) -> NoteResult<String> {
        let base = format!("{}{}", key, CORRUPT_BACKUP_SUFFIX);
        if !self.store.contains(&base)? {
            return Ok(base);
        }
        let mut n = 1u32;
        loop {
            let candidate = format!("{}.{}", base, n);
            if !self.store.contains(&candidate)? {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    /// Move values stored under the web client's prefixed keys to the plain keys.
    ///
    /// A plain key that already has a value wins; the legacy value is left alone.
    fn migrate_legacy_keys(&self) -> NoteResult<()> {
        for key in [NOTES_KEY, CATEGORIES_KEY, THEME_KEY] {
            let legacy_key = format!("{}{}", LEGACY_KEY_PREFIX, key);
            if self.store.contains(key)? {
                continue;
            }
            if let Some(value) = self.store.get(&legacy_key)? {
                self.store.put(key, &value)?;
                self.store.delete(&legacy_key)?;
                tracing::info!(from = %legacy_key, to = key, "Migrated legacy document key");
            }
        }
        Ok(())
    }
}
