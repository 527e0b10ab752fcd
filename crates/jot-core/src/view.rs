use serde::Serialize;

use crate::{RawNote, Tag};

/// A note with its tag ids resolved against the registry. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinedNote {
    pub id: String,
    pub title: String,
    pub markdown: String,
    pub tags: Vec<Tag>,
}

/// A note summary for listings (single-line, truncated body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteSummary {
    pub id: String,
    pub title: String,
    pub tags: Vec<Tag>,
    pub body_preview: String,
}

/// Resolve every note's `tag_ids` against `tags`.
///
/// Ids that do not resolve are dropped. Note order and the order of
/// resolved tags within each note follow the inputs.
pub fn join(notes: &[RawNote], tags: &[Tag]) -> Vec<JoinedNote> {
    notes
        .iter()
        .map(|note| JoinedNote {
            id: note.id.clone(),
            title: note.title.clone(),
            markdown: note.markdown.clone(),
            tags: note
                .tag_ids
                .iter()
                .filter_map(|id| tags.iter().find(|t| &t.id == id))
                .cloned()
                .collect(),
        })
        .collect()
}

impl JoinedNote {
    pub fn has_tag(&self, id: &str) -> bool {
        self.tags.iter().any(|t| t.id == id)
    }

    pub fn tag_labels(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.label.as_str()).collect()
    }

    /// Convert to summary with truncated body preview.
    pub fn to_summary(&self, max_len: usize) -> NoteSummary {
        // Convert newlines to spaces and take first max_len characters
        let normalized: String = self
            .markdown
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        let trimmed = normalized.trim();

        let body_preview = if trimmed.chars().count() > max_len {
            let head: String = trimmed.chars().take(max_len).collect();
            format!("{}...", head)
        } else {
            trimmed.to_string()
        };

        NoteSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            tags: self.tags.clone(),
            body_preview,
        }
    }
}
