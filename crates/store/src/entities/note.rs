//! Note entity: a post or reply.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Visibility derived from a note's `to`/`cc` audience.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Visibility {
    #[sea_orm(string_value = "public")]
    Public,
    #[sea_orm(string_value = "followers")]
    Followers,
    #[sea_orm(string_value = "direct")]
    Direct,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "note")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub actor_id: String,

    /// Canonical remote id; NULL for notes authored locally.
    #[sea_orm(nullable, unique)]
    pub uri: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,

    pub visibility: Visibility,

    /// Raw `to` audience (actor ids or the public URI), JSON array.
    #[sea_orm(column_type = "JsonBinary")]
    pub to: Json,

    /// Raw `cc` audience, JSON array.
    #[sea_orm(column_type = "JsonBinary")]
    pub cc: Json,

    #[sea_orm(nullable, indexed)]
    pub in_reply_to_id: Option<String>,

    /// Root of the thread this note belongs to; equals `id` for roots.
    #[sea_orm(nullable, indexed)]
    pub reply_root_id: Option<String>,

    #[sea_orm(nullable)]
    pub quote_id: Option<String>,

    /// Group actor this note is scoped to, if any.
    #[sea_orm(nullable, indexed)]
    pub group_id: Option<String>,

    pub published_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub edited_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(default_value = false)]
    pub deleted: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::actor::Entity",
        from = "Column::ActorId",
        to = "super::actor::Column::Id"
    )]
    Actor,

    #[sea_orm(belongs_to = "Entity", from = "Column::InReplyToId", to = "Column::Id")]
    InReplyTo,

    #[sea_orm(has_many = "super::note_attachment::Entity")]
    Attachments,

    #[sea_orm(has_many = "super::note_tag::Entity")]
    Tags,

    #[sea_orm(has_one = "super::poll::Entity")]
    Poll,
}

impl Related<super::actor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actor.def()
    }
}

impl Related<super::note_attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl Related<super::note_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tags.def()
    }
}

impl Related<super::poll::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Poll.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this note is a reply to another note.
    #[must_use]
    pub const fn is_reply(&self) -> bool {
        self.in_reply_to_id.is_some()
    }

    /// Whether this note is the root of its own thread.
    #[must_use]
    pub fn is_thread_root(&self) -> bool {
        self.reply_root_id.as_deref() == Some(self.id.as_str()) || self.reply_root_id.is_none()
    }
}
