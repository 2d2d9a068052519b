//! `ActivityPub` request handlers.

#![allow(missing_docs)]

mod actor;
mod collections;
mod gateway;
mod inbox;
mod note;
mod webfinger;

pub use actor::{ActorApState, user_handler};
pub use collections::{
    CollectionQuery, CollectionState, OrderedCollection, OrderedCollectionPage, followers_handler,
    outbox_handler,
};
pub use gateway::{
    GatewayState, actor_handler as gateway_actor_handler, followers_handler as gateway_followers_handler,
    inbox_handler as gateway_inbox_handler, outbox_handler as gateway_outbox_handler,
};
pub use inbox::{shared_inbox_handler, user_inbox_handler};
pub use note::{NoteApState, note_handler};
pub use webfinger::{WebfingerResponse, WebfingerState, webfinger_handler};
