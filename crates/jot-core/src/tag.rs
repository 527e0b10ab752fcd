use serde::{Deserialize, Serialize};

/// A labeled category. Notes reference tags by `id`, never by label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub label: String,
}

impl Tag {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Ordered collection of tags, persisted as a plain JSON array.
///
/// Ids are expected to be unique but this is not checked on `add`; lookups
/// resolve to the first record with a matching id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagRegistry {
    tags: Vec<Tag>,
}

/// Tag with the number of notes referencing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: Tag,
    pub count: usize,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tag to the end of the registry.
    pub fn add(&mut self, tag: Tag) {
        self.tags.push(tag);
    }

    /// Replace the label of the tag with `id`. Returns false if absent.
    pub fn rename(&mut self, id: &str, label: impl Into<String>) -> bool {
        match self.tags.iter_mut().find(|t| t.id == id) {
            Some(tag) => {
                tag.label = label.into();
                true
            }
            None => false,
        }
    }

    /// Remove the tag with `id`. Notes referencing it are left untouched.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t.id != id);
        self.tags.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == id)
    }

    /// First tag whose label equals `label` exactly.
    pub fn find_by_label(&self, label: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.label == label)
    }

    pub fn list(&self) -> &[Tag] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl From<Vec<Tag>> for TagRegistry {
    fn from(tags: Vec<Tag>) -> Self {
        Self { tags }
    }
}
