use serde::{Deserialize, Serialize};

use crate::generate_id;

/// A note as persisted: tags are held by id, not embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNote {
    pub id: String,
    pub title: String,
    pub markdown: String,
    #[serde(rename = "tagIds", default)]
    pub tag_ids: Vec<String>,
}

/// Parameters for creating a new note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteData {
    pub title: String,
    pub markdown: String,
    pub tag_ids: Vec<String>,
}

/// Parameters for updating an existing note. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateNote {
    pub title: Option<String>,
    pub markdown: Option<String>,
    pub tag_ids: Option<Vec<String>>,
}

impl UpdateNote {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.markdown.is_none() && self.tag_ids.is_none()
    }

    /// Names of the fields this update touches, in declaration order.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.markdown.is_some() {
            fields.push("markdown");
        }
        if self.tag_ids.is_some() {
            fields.push("tags");
        }
        fields
    }
}

/// Ordered collection of raw notes, persisted as a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteRepository {
    notes: Vec<RawNote>,
}

impl NoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new note under a freshly generated id and return that id.
    pub fn create(&mut self, data: NoteData) -> String {
        let id = generate_id();
        self.insert(id.clone(), data);
        id
    }

    /// Append a new note under a caller-chosen id.
    pub fn insert(&mut self, id: String, data: NoteData) {
        self.notes.push(RawNote {
            id,
            title: data.title,
            markdown: data.markdown,
            tag_ids: data.tag_ids,
        });
    }

    /// Merge `update` into the note with `id`, keeping its id and position.
    /// Returns false if absent.
    pub fn update(&mut self, id: &str, update: UpdateNote) -> bool {
        let Some(note) = self.notes.iter_mut().find(|n| n.id == id) else {
            return false;
        };

        if let Some(title) = update.title {
            note.title = title;
        }
        if let Some(markdown) = update.markdown {
            note.markdown = markdown;
        }
        if let Some(tag_ids) = update.tag_ids {
            note.tag_ids = tag_ids;
        }
        true
    }

    /// Remove the note with `id`. Returns false if absent.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        self.notes.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&RawNote> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn list(&self) -> &[RawNote] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl From<Vec<RawNote>> for NoteRepository {
    fn from(notes: Vec<RawNote>) -> Self {
        Self { notes }
    }
}
