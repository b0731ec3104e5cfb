//! Data models for notecore.
//!
//! This module defines the core entities: Note, Category, Attachment and Theme.
//! Field names serialize in camelCase so the persisted documents keep the
//! layout the web client has always written.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Build a new time-ordered identifier with the given prefix.
///
/// UUID7 keeps ids unique within a session even when several are created
/// in the same millisecond.
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::now_v7().simple())
}

/// Represents a note in the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier, stable for the lifetime of the note
    pub id: String,
    /// Title; may be empty in memory, never after a save
    pub title: String,
    /// Rich-text markup
    pub content: String,
    /// ID of the category this note belongs to
    pub category_id: String,
    /// When the note was created (never changes)
    pub created_at: DateTime<Utc>,
    /// When the note was last modified
    pub updated_at: DateTime<Utc>,
    /// Pinned notes sort ahead of everything else
    #[serde(default)]
    pub is_pinned: bool,
    /// Tags in insertion order, no duplicates
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Note {
    /// Create a new empty note in the given category
    pub fn new(category_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id("note"),
            title: String::new(),
            content: String::new(),
            category_id: category_id.into(),
            created_at: now,
            updated_at: now,
            is_pinned: false,
            tags: Vec::new(),
        }
    }

    /// Bump the modification timestamp.
    ///
    /// Never moves `updated_at` before `created_at`, even if the clock did.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.created_at);
    }

    /// Check if the note carries the given tag (exact match)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A user-defined grouping of notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: String,
    /// Display name (never empty)
    pub name: String,
    /// Display color, e.g. "#3498db"
    pub color: String,
}

impl Category {
    /// Create a new category with a generated ID
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: generate_id("category"),
            name: name.into(),
            color: color.into(),
        }
    }
}

/// An image attached to a note, stored in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Unique identifier, referenced from note markup via `data-id`
    pub id: String,
    /// Original filename
    pub name: String,
    /// Payload as a data URL (`data:<mime>;base64,<payload>`)
    pub data: String,
    /// MIME type, e.g. "image/png"
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Color theme of the application.
///
/// Unknown theme names are kept verbatim so a value written by a newer
/// client survives a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Theme {
    Spring,
    Summer,
    Autumn,
    Winter,
    Other(String),
}

impl Theme {
    /// All built-in themes
    pub const BUILT_IN: [Theme; 4] = [Theme::Spring, Theme::Summer, Theme::Autumn, Theme::Winter];

    /// The stored string form
    pub fn as_str(&self) -> &str {
        match self {
            Theme::Spring => "spring",
            Theme::Summer => "summer",
            Theme::Autumn => "autumn",
            Theme::Winter => "winter",
            Theme::Other(name) => name,
        }
    }

    /// Human-readable name; unrecognized themes display as "Default"
    pub fn display_name(&self) -> &'static str {
        match self {
            Theme::Spring => "Spring",
            Theme::Summer => "Summer",
            Theme::Autumn => "Autumn",
            Theme::Winter => "Winter",
            Theme::Other(_) => "Default",
        }
    }

    /// Check if this is one of the built-in themes
    pub fn is_built_in(&self) -> bool {
        !matches!(self, Theme::Other(_))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Spring
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Theme::from(s))
    }
}

impl From<&str> for Theme {
    fn from(s: &str) -> Self {
        match s {
            "spring" => Theme::Spring,
            "summer" => Theme::Summer,
            "autumn" => Theme::Autumn,
            "winter" => Theme::Winter,
            other => Theme::Other(other.to_string()),
        }
    }
}
