pub mod events;
pub mod note;

pub use events::{NoteAction, NoteEvent};
