//! Conversion between database entities and `ActivityPub` types.

#![allow(missing_docs)]

mod note;
mod user;

pub use note::{ApNoteExt, NoteToApNote};
pub use user::{ApPersonExt, UrlConfig, UserToApPerson};
