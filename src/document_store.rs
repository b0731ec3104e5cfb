//! String-keyed document storage.
//!
//! The document store holds whole serialized collections (notes, categories)
//! and the active theme, one string value per key. Writes replace the value
//! for a key entirely.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{NoteError, NoteResult};

/// Trait for document store implementations.
///
/// Implementations must make a successful `put` visible to every later `get`
/// on the same store, including after the process restarts for durable stores.
pub trait DocumentStore: Send {
    /// Read the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> NoteResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> NoteResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> NoteResult<()>;

    /// Check if a value is stored under `key`.
    fn contains(&self, key: &str) -> NoteResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Volatile document store, used for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }

    /// Sorted list of keys currently stored
    pub fn keys(&self) -> NoteResult<Vec<String>> {
        let mut keys: Vec<String> = self.lock()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn lock(&self) -> NoteResult<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| NoteError::Other("document store lock poisoned".to_string()))
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, key: &str) -> NoteResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> NoteResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> NoteResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
