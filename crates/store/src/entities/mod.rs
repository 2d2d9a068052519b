//! Sea-ORM entity definitions for the federation data model.

pub mod actor;
pub mod actor_key;
pub mod follow;
pub mod instance_setting;
pub mod invitation_code;
pub mod note;
pub mod note_attachment;
pub mod note_tag;
pub mod outbox_item;
pub mod poll;
pub mod poll_vote;
pub mod portable_gateway;
pub mod share;
