//! Abstract blob storage for note attachments.
//!
//! Attachment records (images encoded as data URLs) are stored apart from the
//! note documents, addressed by attachment ID. All operations are async; the
//! notebook treats them as best-effort and never lets a blob failure block a
//! note save or delete.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::Attachment;
use crate::validation::validate_attachment_id;

/// Errors that can occur during blob storage operations.
#[derive(Error, Debug)]
pub enum BlobStoreError {
    /// The store could not be opened
    #[error("Failed to open blob store: {0}")]
    Open(String),
    /// `add` was called for an ID that already exists
    #[error("Attachment already exists: {0}")]
    AlreadyExists(String),
    /// The ID cannot be used as a storage key
    #[error("Invalid attachment id: {0}")]
    InvalidId(String),
    /// A stored record could not be decoded
    #[error("Corrupt attachment record {id}: {message}")]
    Corrupt { id: String, message: String },
    /// Local file system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Record encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for blob store implementations.
///
/// # Example
///
/// ```ignore
/// use notecore::blob_store::{BlobStore, BlobStoreError};
/// use notecore::models::Attachment;
///
/// async fn save(store: &impl BlobStore, attachment: &Attachment) -> Result<(), BlobStoreError> {
///     store.put(attachment).await
/// }
/// ```
pub trait BlobStore: Send + Sync {
    /// Fetch a record by ID.
    ///
    /// # Returns
    /// * `Ok(Some(Attachment))` - If the record exists
    /// * `Ok(None)` - If it doesn't
    fn get(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Attachment>, BlobStoreError>> + Send;

    /// Insert or replace a record.
    fn put(&self, attachment: &Attachment)
        -> impl Future<Output = Result<(), BlobStoreError>> + Send;

    /// Insert a new record.
    ///
    /// Fails with `BlobStoreError::AlreadyExists` if the ID is taken.
    fn add(&self, attachment: &Attachment)
        -> impl Future<Output = Result<(), BlobStoreError>> + Send;

    /// Delete a record by ID.
    ///
    /// # Returns
    /// * `Ok(true)` - If a record was removed
    /// * `Ok(false)` - If there was nothing to remove
    fn delete(&self, id: &str) -> impl Future<Output = Result<bool, BlobStoreError>> + Send;

    /// Name of the backend, used in log output.
    fn backend_name(&self) -> &'static str;
}

/// In-memory blob store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    records: Mutex<HashMap<String, Attachment>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Check if the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    async fn get(&self, id: &str) -> Result<Option<Attachment>, BlobStoreError> {
        Ok(self.records.lock().await.get(id).cloned())
    }

    async fn put(&self, attachment: &Attachment) -> Result<(), BlobStoreError> {
        self.records
            .lock()
            .await
            .insert(attachment.id.clone(), attachment.clone());
        Ok(())
    }

    async fn add(&self, attachment: &Attachment) -> Result<(), BlobStoreError> {
        let mut records = self.records.lock().await;
        if records.contains_key(&attachment.id) {
            return Err(BlobStoreError::AlreadyExists(attachment.id.clone()));
        }
        records.insert(attachment.id.clone(), attachment.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, BlobStoreError> {
        Ok(self.records.lock().await.remove(id).is_some())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Blob store keeping one JSON file per attachment in a directory.
///
/// Files are named `{id}.json`; IDs are restricted to `[A-Za-z0-9_-]` so they
/// can never escape the directory.
#[derive(Debug)]
pub struct DirectoryBlobStore {
    directory: PathBuf,
    /// Serializes add's check-then-write
    write_lock: Mutex<()>,
}

impl DirectoryBlobStore {
    /// Open the store, creating the directory if needed.
    pub async fn open(directory: impl Into<PathBuf>) -> Result<Self, BlobStoreError> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory).await.map_err(|e| {
            BlobStoreError::Open(format!("{}: {}", directory.display(), e))
        })?;
        let metadata = tokio::fs::metadata(&directory).await?;
        if !metadata.is_dir() {
            return Err(BlobStoreError::Open(format!(
                "{} is not a directory",
                directory.display()
            )));
        }
        tracing::debug!(directory = %directory.display(), "Opened attachment directory");
        Ok(Self {
            directory,
            write_lock: Mutex::new(()),
        })
    }

    /// Directory the records are stored in
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn record_path(&self, id: &str) -> Result<PathBuf, BlobStoreError> {
        validate_attachment_id(id).map_err(|_| BlobStoreError::InvalidId(id.to_string()))?;
        Ok(self.directory.join(format!("{}.json", id)))
    }

    async fn write_record(&self, path: &Path, attachment: &Attachment) -> Result<(), BlobStoreError> {
        let content = serde_json::to_string(attachment)?;
        // Write to a sibling file first so a crash never leaves a half-written record
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }
}

impl BlobStore for DirectoryBlobStore {
    async fn get(&self, id: &str) -> Result<Option<Attachment>, BlobStoreError> {
        let path = self.record_path(id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let attachment = serde_json::from_str(&content).map_err(|e| BlobStoreError::Corrupt {
            id: id.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(attachment))
    }

    async fn put(&self, attachment: &Attachment) -> Result<(), BlobStoreError> {
        let path = self.record_path(&attachment.id)?;
        let _lock = self.write_lock.lock().await;
        self.write_record(&path, attachment).await
    }

    async fn add(&self, attachment: &Attachment) -> Result<(), BlobStoreError> {
        let path = self.record_path(&attachment.id)?;
        let _lock = self.write_lock.lock().await;
        if tokio::fs::try_exists(&path).await? {
            return Err(BlobStoreError::AlreadyExists(attachment.id.clone()));
        }
        self.write_record(&path, attachment).await
    }

    async fn delete(&self, id: &str) -> Result<bool, BlobStoreError> {
        let path = self.record_path(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "directory"
    }
}
