//! Built-in data written on first run.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Category, Note, Theme};

/// ID of the reserved category that orphaned notes fall back to
pub const DEFAULT_CATEGORY_ID: &str = "personal";

/// Theme used until the user picks one
pub const DEFAULT_THEME: Theme = Theme::Spring;

/// Title used when a note is saved without one
pub const DEFAULT_UNTITLED_LABEL: &str = "Untitled";

/// The four categories every new notebook starts with.
pub fn default_categories() -> Vec<Category> {
    [
        ("work", "Work", "#3498db"),
        (DEFAULT_CATEGORY_ID, "Personal", "#e74c3c"),
        ("study", "Study", "#2ecc71"),
        ("ideas", "Ideas", "#f39c12"),
    ]
    .into_iter()
    .map(|(id, name, color)| Category {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
    })
    .collect()
}

/// The reserved default category as seeded.
pub fn default_category() -> Category {
    Category {
        id: DEFAULT_CATEGORY_ID.to_string(),
        name: "Personal".to_string(),
        color: "#e74c3c".to_string(),
    }
}

/// Sample notes shown on first run.
///
/// The welcome note is pinned and dated `now`; the others are a day older.
pub fn sample_notes(now: DateTime<Utc>) -> Vec<Note> {
    let yesterday = now - Duration::days(1);
    vec![
        Note {
            id: "note-1".to_string(),
            title: "Welcome to your notebook".to_string(),
            content: concat!(
                "<p>This is your first note! Use the notebook to capture ideas and keep them organized.</p>",
                "<p>You can:</p>",
                "<ul><li>Create and edit notes</li><li>Add categories and tags</li>",
                "<li>Insert images</li><li>Search your notes</li><li>Switch themes</li></ul>"
            )
            .to_string(),
            category_id: DEFAULT_CATEGORY_ID.to_string(),
            created_at: now,
            updated_at: now,
            is_pinned: true,
            tags: vec!["welcome".to_string(), "guide".to_string()],
        },
        Note {
            id: "note-2".to_string(),
            title: "Meeting notes".to_string(),
            content: concat!(
                "<h2>Project status meeting</h2>",
                "<p><strong>Attendees:</strong> the team</p>",
                "<h3>Agenda:</h3>",
                "<ul><li>Progress review</li><li>Open issues</li><li>Next steps</li></ul>",
                "<p>First milestone is due Friday.</p>"
            )
            .to_string(),
            category_id: "work".to_string(),
            created_at: yesterday,
            updated_at: yesterday,
            is_pinned: false,
            tags: vec!["meeting".to_string(), "work".to_string()],
        },
        Note {
            id: "note-3".to_string(),
            title: "Study plan".to_string(),
            content: concat!(
                "<h2>This week</h2>",
                "<ol><li>Finish the advanced JavaScript course</li>",
                "<li>Learn CSS grid layout</li><li>Practice building components</li></ol>",
                "<p>At least two hours a day.</p>"
            )
            .to_string(),
            category_id: "study".to_string(),
            created_at: yesterday,
            updated_at: yesterday,
            is_pinned: false,
            tags: vec!["study".to_string(), "plan".to_string()],
        },
    ]
}
