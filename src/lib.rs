//! notecore - persistence and state core of a local note-taking application.
//!
//! This library provides:
//! - Data models (Note, Category, Attachment, Theme)
//! - Document storage (in-memory and SQLite) for the note and category collections
//! - Blob storage (in-memory and directory-backed) for image attachments
//! - The sync layer that loads, seeds and writes the collections through
//! - Note and category operations on an open [`Notebook`]
//! - Search and presentation helpers
//! - Configuration management
//!
//! # Feature Flags
//!
//! - `desktop`: Detect the platform config directory when none is given.

pub mod attachments;
pub mod blob_store;
pub mod config;
pub mod database;
pub mod display;
pub mod document_store;
pub mod error;
pub mod models;
pub mod notebook;
pub mod search;
pub mod seed;
pub mod state;
pub mod sync;
pub mod validation;

// Re-export commonly used types
pub use attachments::AttachmentStore;
pub use blob_store::{BlobStore, BlobStoreError, DirectoryBlobStore, MemoryBlobStore};
pub use config::{Config, NotebookOptions};
pub use database::SqliteDocumentStore;
pub use document_store::{DocumentStore, MemoryDocumentStore};
pub use error::{NoteError, NoteResult, Severity};
pub use models::{Attachment, Category, Note, Theme};
pub use notebook::{open_from_config, DeleteConfirmation, Notebook};
pub use state::{AppState, CategoryFilter, DeleteTarget};
pub use sync::{CorruptDataPolicy, SyncLayer};
