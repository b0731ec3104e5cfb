//! Input validation for notecore.
//!
//! All validators return NoteError::Validation on failure and never touch state.
//! Validators that accept free text return the trimmed value to store.

use crate::error::{NoteError, NoteResult};

pub const MAX_THEME_NAME_LENGTH: usize = 50;

/// Characters allowed in attachment IDs (used as file names by some blob stores)
fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Validate a tag name, returning the trimmed name.
pub fn validate_tag_name(name: &str) -> NoteResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(NoteError::validation("tag", "tag name must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Validate a category name, returning the trimmed name.
pub fn validate_category_name(name: &str) -> NoteResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(NoteError::validation(
            "category_name",
            "category name must not be empty",
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate a category color.
///
/// The color is a display attribute only; it just has to be present.
pub fn validate_color(color: &str) -> NoteResult<String> {
    let trimmed = color.trim();
    if trimmed.is_empty() {
        return Err(NoteError::validation("color", "color must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Normalize a note title for saving.
///
/// Titles are trimmed; an empty result is replaced with `placeholder`.
/// Any length is accepted.
pub fn normalize_title(title: &str, placeholder: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        placeholder.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Validate a theme name.
pub fn validate_theme_name(name: &str) -> NoteResult<()> {
    if name.trim().is_empty() {
        return Err(NoteError::validation("theme", "theme name must not be empty"));
    }
    if name.len() > MAX_THEME_NAME_LENGTH {
        return Err(NoteError::validation(
            "theme",
            format!("theme name must be at most {} bytes", MAX_THEME_NAME_LENGTH),
        ));
    }
    Ok(())
}

/// Validate the MIME type of an uploaded file; only images are accepted.
pub fn validate_image_mime(mime_type: &str) -> NoteResult<()> {
    match mime_type.strip_prefix("image/") {
        Some(subtype) if !subtype.is_empty() => Ok(()),
        _ => Err(NoteError::validation(
            "mime_type",
            format!("expected an image file, got '{}'", mime_type),
        )),
    }
}

/// Validate an attachment ID.
pub fn validate_attachment_id(id: &str) -> NoteResult<()> {
    if id.is_empty() || !id.chars().all(is_id_char) {
        return Err(NoteError::validation(
            "attachment_id",
            format!("invalid attachment id '{}'", id),
        ));
    }
    Ok(())
}
