use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::{
    filter::NoteFilter, generate_id, join, Error, JoinedNote, KeyValueStore, NoteData,
    NoteRepository, Persisted, RawNote, Tag, TagCount, TagRegistry, UpdateNote,
};

/// Store key holding the JSON array of raw notes.
pub const NOTES_KEY: &str = "NOTES";
/// Store key holding the JSON array of tags.
pub const TAGS_KEY: &str = "TAGS";

/// The note and tag collections together with the store they persist to.
///
/// All mutation goes through the methods here; each change is written to
/// the store before the method returns. Deleting a tag does not touch the
/// notes that reference it: the join drops the dangling ids.
pub struct NotesState<S: KeyValueStore> {
    store: S,
    notes: Persisted<NoteRepository>,
    tags: Persisted<TagRegistry>,
    view: RefCell<Option<Rc<[JoinedNote]>>>,
}

impl<S: KeyValueStore> NotesState<S> {
    /// Load both collections from `store`, defaulting to empty.
    pub fn open(store: S) -> Result<Self, Error> {
        let notes = Persisted::load(&store, NOTES_KEY, NoteRepository::new())?;
        let tags = Persisted::load(&store, TAGS_KEY, TagRegistry::new())?;
        debug!(
            "Loaded {} notes and {} tags",
            notes.get().len(),
            tags.get().len()
        );

        Ok(Self {
            store,
            notes,
            tags,
            view: RefCell::new(None),
        })
    }

    pub fn notes(&self) -> &[RawNote] {
        self.notes.get().list()
    }

    pub fn tags(&self) -> &[Tag] {
        self.tags.get().list()
    }

    /// Add a new note and return its id.
    pub fn create_note(&mut self, data: NoteData) -> Result<String, Error> {
        let data = NoteData {
            title: validate_title(&data.title)?,
            ..data
        };

        let id = self.notes.update(&self.store, |notes| notes.create(data))?;
        self.invalidate();
        debug!("Created note {}", id);
        Ok(id)
    }

    /// Merge `update` into the note with `id`. Returns false if absent.
    pub fn update_note(&mut self, id: &str, update: UpdateNote) -> Result<bool, Error> {
        let update = UpdateNote {
            title: update.title.as_deref().map(validate_title).transpose()?,
            ..update
        };

        let updated = self
            .notes
            .modify(&self.store, |notes| notes.update(id, update))?;
        if updated {
            self.invalidate();
            debug!("Updated note {}", id);
        }
        Ok(updated)
    }

    /// Create a note tagged with `labels`, creating tags that do not exist
    /// yet. The note data is checked before any tag is written.
    pub fn create_note_with_labels(
        &mut self,
        data: NoteData,
        labels: &[String],
    ) -> Result<String, Error> {
        let title = validate_title(&data.title)?;

        let mut tag_ids = data.tag_ids;
        for tag in self.resolve_or_create_tags(labels)? {
            if !tag_ids.contains(&tag.id) {
                tag_ids.push(tag.id);
            }
        }

        self.create_note(NoteData {
            title,
            markdown: data.markdown,
            tag_ids,
        })
    }

    /// Merge `update` into the note with `id`; when `labels` is given the
    /// note's tags are replaced by them, creating tags as needed. Nothing is
    /// written if the note is absent or the update is invalid.
    pub fn update_note_with_labels(
        &mut self,
        id: &str,
        update: UpdateNote,
        labels: Option<&[String]>,
    ) -> Result<bool, Error> {
        if let Some(title) = update.title.as_deref() {
            validate_title(title)?;
        }
        if self.notes.get().get(id).is_none() {
            return Ok(false);
        }

        let tag_ids = match labels {
            Some(labels) => Some(
                self.resolve_or_create_tags(labels)?
                    .into_iter()
                    .map(|t| t.id)
                    .collect(),
            ),
            None => update.tag_ids,
        };

        self.update_note(id, UpdateNote { tag_ids, ..update })
    }

    /// Delete the note with `id`. Returns false if absent.
    pub fn delete_note(&mut self, id: &str) -> Result<bool, Error> {
        let deleted = self.notes.modify(&self.store, |notes| notes.delete(id))?;
        if deleted {
            self.invalidate();
            debug!("Deleted note {}", id);
        }
        Ok(deleted)
    }

    /// Append a tag with a caller-supplied id, stored as given.
    pub fn add_tag(&mut self, tag: Tag) -> Result<(), Error> {
        debug!("Added tag {} ({})", tag.id, tag.label);
        self.tags.update(&self.store, |tags| tags.add(tag))?;
        self.invalidate();
        Ok(())
    }

    /// Create a tag under a fresh id and return it.
    pub fn create_tag(&mut self, label: &str) -> Result<Tag, Error> {
        let tag = Tag::new(generate_id(), label);
        self.add_tag(tag.clone())?;
        Ok(tag)
    }

    /// Relabel the tag with `id`. Returns false if absent.
    pub fn rename_tag(&mut self, id: &str, label: &str) -> Result<bool, Error> {
        let renamed = self
            .tags
            .modify(&self.store, |tags| tags.rename(id, label))?;
        if renamed {
            self.invalidate();
            debug!("Renamed tag {}", id);
        }
        Ok(renamed)
    }

    /// Remove the tag with `id`. Returns false if absent.
    pub fn remove_tag(&mut self, id: &str) -> Result<bool, Error> {
        let removed = self.tags.modify(&self.store, |tags| tags.remove(id))?;
        if removed {
            self.invalidate();
            debug!("Removed tag {}", id);
        }
        Ok(removed)
    }

    /// Resolve labels to existing tags, creating any that do not exist yet.
    ///
    /// Labels match exactly. Returns the selection in input order without
    /// duplicates; empty labels are skipped.
    pub fn resolve_or_create_tags(&mut self, labels: &[String]) -> Result<Vec<Tag>, Error> {
        let mut selected: Vec<Tag> = Vec::new();
        for label in labels {
            if label.is_empty() {
                continue;
            }

            let tag = match self.tags.get().find_by_label(label) {
                Some(tag) => tag.clone(),
                None => self.create_tag(label)?,
            };
            if !selected.iter().any(|t| t.id == tag.id) {
                selected.push(tag);
            }
        }
        Ok(selected)
    }

    /// Look up existing tags by label. Unknown labels are an error.
    pub fn find_tags_by_label(&self, labels: &[String]) -> Result<Vec<Tag>, Error> {
        labels
            .iter()
            .filter(|l| !l.is_empty())
            .map(|label| {
                self.tags
                    .get()
                    .find_by_label(label)
                    .cloned()
                    .ok_or_else(|| Error::NotFound(format!("tag '{}'", label)))
            })
            .collect()
    }

    /// Every tag with the number of notes referencing it, in registry order.
    pub fn tag_counts(&self) -> Vec<TagCount> {
        self.tags()
            .iter()
            .map(|tag| TagCount {
                tag: tag.clone(),
                count: self
                    .notes()
                    .iter()
                    .filter(|n| n.tag_ids.contains(&tag.id))
                    .count(),
            })
            .collect()
    }

    /// All notes with tags resolved. Recomputed after any mutation.
    pub fn joined_notes(&self) -> Rc<[JoinedNote]> {
        if let Some(view) = self.view.borrow().as_ref() {
            return Rc::clone(view);
        }

        let view: Rc<[JoinedNote]> = join(self.notes(), self.tags()).into();
        *self.view.borrow_mut() = Some(Rc::clone(&view));
        view
    }

    /// The joined note with `id`, if any.
    pub fn note(&self, id: &str) -> Option<JoinedNote> {
        self.joined_notes().iter().find(|n| n.id == id).cloned()
    }

    pub fn filter(&self, filter: &NoteFilter) -> Vec<JoinedNote> {
        filter.apply(&self.joined_notes())
    }

    fn invalidate(&self) {
        self.view.borrow_mut().take();
    }
}

fn validate_title(title: &str) -> Result<String, Error> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::Validation("title cannot be empty".into()));
    }
    Ok(title.to_string())
}
