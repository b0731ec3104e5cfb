//! Image attachments embedded in note content.
//!
//! Images are encoded as data URLs, stored in the blob store and inserted into
//! the note markup as `<img>` elements carrying a `data-id` attribute. When a
//! note is deleted its markup is scanned for those ids so the blobs can be
//! removed as well.
//!
//! The blob store may be unavailable (it failed to open, or the host has no
//! place to keep it). [`AttachmentStore`] absorbs that: every operation logs
//! and degrades to a no-op instead of returning an error.

use std::collections::HashSet;
use std::future::Future;
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;

use crate::blob_store::{BlobStore, BlobStoreError};
use crate::error::{NoteError, NoteResult};
use crate::models::{generate_id, Attachment};
use crate::validation::validate_image_mime;

impl Attachment {
    /// Build an attachment from raw image bytes.
    ///
    /// Rejects anything that is not an `image/*` MIME type.
    pub fn from_image_bytes(name: &str, mime_type: &str, bytes: &[u8]) -> NoteResult<Self> {
        validate_image_mime(mime_type)?;
        Ok(Self {
            id: generate_id("image"),
            name: name.to_string(),
            data: format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes)),
            mime_type: mime_type.to_string(),
        })
    }

    /// Decode the data URL payload back into bytes.
    pub fn decode_payload(&self) -> NoteResult<Vec<u8>> {
        let (header, payload) = self
            .data
            .split_once(',')
            .ok_or_else(|| NoteError::validation("data", "not a data URL"))?;
        if !header.starts_with("data:") || !header.ends_with(";base64") {
            return Err(NoteError::validation("data", "expected a base64 data URL"));
        }
        STANDARD
            .decode(payload)
            .map_err(|e| NoteError::validation("data", format!("invalid base64: {}", e)))
    }

    /// Markup inserted into the editor for this image.
    pub fn to_markup(&self) -> String {
        format!(
            r#"<img src="{}" alt="{}" class="editor-image" data-id="{}" style="max-width: 100%; height: auto;">"#,
            escape_attribute(&self.data),
            escape_attribute(&self.name),
            escape_attribute(&self.id),
        )
    }
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn img_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<img\b[^>]*>").expect("img tag pattern is valid"))
}

fn data_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bdata-id\s*=\s*"([^"]*)""#).expect("data-id pattern is valid")
    })
}

/// Extract the attachment ids referenced by `<img data-id="...">` elements.
///
/// Images without a `data-id` (pasted in, or inserted by older clients) are
/// skipped. Ids are returned once each, in order of first appearance.
pub fn extract_attachment_ids(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    img_tag_regex()
        .find_iter(content)
        .filter_map(|tag| data_id_regex().captures(tag.as_str()))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}

/// Best-effort front for an optional blob store.
pub struct AttachmentStore<B> {
    backend: Option<B>,
}

impl<B: BlobStore> AttachmentStore<B> {
    /// Wrap an already opened blob store.
    pub fn new(backend: B) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// A store with no backend; every operation is a no-op.
    pub fn unavailable() -> Self {
        Self { backend: None }
    }

    /// Await the opening of a blob store.
    ///
    /// A failure is logged and yields an unavailable store rather than an
    /// error, so note persistence is never held up by attachments.
    pub async fn connect<F>(open: F) -> Self
    where
        F: Future<Output = Result<B, BlobStoreError>>,
    {
        match open.await {
            Ok(backend) => {
                tracing::debug!(backend = backend.backend_name(), "Attachment store ready");
                Self::new(backend)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Attachment store unavailable; images will not be persisted"
                );
                Self::unavailable()
            }
        }
    }

    /// Check if a backend is connected
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// The connected backend, if any
    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    /// Save an attachment, replacing a record with the same id.
    ///
    /// Returns true if the record was written.
    pub async fn save(&self, attachment: &Attachment) -> bool {
        let Some(backend) = &self.backend else {
            return false;
        };

        let result = match backend.get(&attachment.id).await {
            Ok(Some(_)) => backend.put(attachment).await,
            Ok(None) => backend.add(attachment).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                tracing::debug!(id = %attachment.id, name = %attachment.name, "Saved attachment");
                true
            }
            Err(e) => {
                tracing::error!(id = %attachment.id, error = %e, "Failed to save attachment");
                false
            }
        }
    }

    /// Load an attachment; failures and missing records both yield `None`.
    pub async fn load(&self, id: &str) -> Option<Attachment> {
        let backend = self.backend.as_ref()?;
        match backend.get(id).await {
            Ok(attachment) => attachment,
            Err(e) => {
                tracing::error!(id, error = %e, "Failed to load attachment");
                None
            }
        }
    }

    /// Remove the attachments referenced by `content`, except those in
    /// `retained`.
    ///
    /// `retained` holds ids still referenced elsewhere; those records stay.
    /// Returns the number of records actually removed.
    pub async fn remove_referenced(&self, content: &str, retained: &HashSet<String>) -> usize {
        let Some(backend) = &self.backend else {
            return 0;
        };

        let mut removed = 0;
        for id in extract_attachment_ids(content) {
            if retained.contains(&id) {
                tracing::debug!(id = %id, "Attachment still referenced; keeping it");
                continue;
            }
            match backend.delete(&id).await {
                Ok(true) => removed += 1,
                Ok(false) => tracing::debug!(id = %id, "Referenced attachment was already gone"),
                Err(e) => tracing::error!(id = %id, error = %e, "Failed to delete attachment"),
            }
        }
        removed
    }
}
