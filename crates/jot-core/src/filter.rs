use crate::{JoinedNote, Tag};

/// Title substring plus required-tag filter over joined notes.
///
/// A note passes when its title contains `title` (case-insensitive) and it
/// carries every tag in `tags`, compared by id. Empty criteria match all.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub title: String,
    pub tags: Vec<Tag>,
}

impl NoteFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.tags.is_empty()
    }

    pub fn matches(&self, note: &JoinedNote) -> bool {
        let title_ok = self.title.is_empty()
            || note
                .title
                .to_lowercase()
                .contains(&self.title.to_lowercase());

        title_ok && self.tags.iter().all(|tag| note.has_tag(&tag.id))
    }

    pub fn apply(&self, notes: &[JoinedNote]) -> Vec<JoinedNote> {
        notes.iter().filter(|n| self.matches(n)).cloned().collect()
    }
}

/// Filter `notes` by title substring and tag intersection, preserving order.
pub fn filter(notes: &[JoinedNote], title_query: &str, required_tags: &[Tag]) -> Vec<JoinedNote> {
    NoteFilter::new()
        .with_title(title_query)
        .with_tags(required_tags.to_vec())
        .apply(notes)
}
