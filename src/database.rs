//! SQLite-backed document store.
//!
//! Documents live in a single `documents` table keyed by name. Each write
//! replaces the stored value and records the write time as Unix seconds.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::document_store::DocumentStore;
use crate::error::NoteResult;

/// Document store persisted in an SQLite database file
pub struct SqliteDocumentStore {
    conn: Connection,
}

impl SqliteDocumentStore {
    /// Open (or create) the database at `db_path`
    pub fn new<P: AsRef<Path>>(db_path: P) -> NoteResult<Self> {
        let conn = Connection::open(db_path)?;

        // WAL lets a second reader (e.g. a backup tool) see committed documents
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let mut db = Self { conn };
        db.init_database()?;
        db.migrate_add_modified_at()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn new_in_memory() -> NoteResult<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.init_database()?;
        db.migrate_add_modified_at()?;
        Ok(db)
    }

    /// Initialize database schema
    pub fn init_database(&mut self) -> NoteResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                modified_at INTEGER
            );
            "#,
        )?;
        Ok(())
    }

    /// Add the modified_at column to databases created before it existed.
    ///
    /// This is idempotent - it checks if the column exists before adding it.
    fn migrate_add_modified_at(&mut self) -> NoteResult<()> {
        if !self.column_exists("documents", "modified_at")? {
            self.conn
                .execute("ALTER TABLE documents ADD COLUMN modified_at INTEGER", [])?;
            tracing::info!("Added modified_at column to documents");
        }
        Ok(())
    }

    fn column_exists(&self, table: &str, column: &str) -> NoteResult<bool> {
        let sql = format!("PRAGMA table_info({})", table);
        let mut stmt = self.conn.prepare(&sql)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names.iter().any(|name| name == column))
    }

    /// All stored keys, sorted
    pub fn keys(&self) -> NoteResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM documents ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// When the document under `key` was last written, if known
    pub fn modified_at(&self, key: &str) -> NoteResult<Option<DateTime<Utc>>> {
        let seconds: Option<Option<i64>> = self
            .conn
            .query_row(
                "SELECT modified_at FROM documents WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(seconds
            .flatten()
            .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0)))
    }

    /// Close the database connection
    pub fn close(self) -> NoteResult<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn get(&self, key: &str) -> NoteResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM documents WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> NoteResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO documents (key, value, modified_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, modified_at = excluded.modified_at
            "#,
            params![key, value, Utc::now().timestamp()],
        )?;
        tracing::debug!(key, bytes = value.len(), "Wrote document");
        Ok(())
    }

    fn delete(&self, key: &str) -> NoteResult<()> {
        self.conn
            .execute("DELETE FROM documents WHERE key = ?", [key])?;
        Ok(())
    }
}
