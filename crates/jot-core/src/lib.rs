//! Jot core library - note and tag collections, their joined view and
//! filtering, and typed persistence over a key-value store.
//!
//! This crate contains no filesystem I/O and can be compiled for any target.

mod error;
mod filter;
mod note;
mod state;
mod store;
mod tag;
mod view;

pub use error::Error;
pub use filter::{filter, NoteFilter};
pub use note::{NoteData, NoteRepository, RawNote, UpdateNote};
pub use state::{NotesState, NOTES_KEY, TAGS_KEY};
pub use store::{read, write, KeyValueStore, MemoryStore, Persisted};
pub use tag::{Tag, TagCount, TagRegistry};
pub use view::{join, JoinedNote, NoteSummary};

/// A fresh random id for a note or tag.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
