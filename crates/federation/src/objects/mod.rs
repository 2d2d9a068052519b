//! `ActivityPub` object types.

#![allow(missing_docs)]

mod note;

pub use note::{ApAttachment, ApNote, ApObjectType, ApPollOption, ApPollReplies, ApTag};
