//! Poll attached to a note, adapted from the teacher's poll entity down to
//! the fields an `ActivityPub` `Question` object needs.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "poll")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub note_id: String,

    /// Option labels in display order.
    #[sea_orm(column_type = "JsonBinary")]
    pub options: Json,

    /// Vote counts, parallel to `options`.
    #[sea_orm(column_type = "JsonBinary")]
    pub votes: Json,

    #[sea_orm(default_value = false)]
    pub multiple: bool,

    pub expires_at: DateTimeWithTimeZone,

    #[sea_orm(default_value = false)]
    pub closed: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::note::Entity",
        from = "Column::NoteId",
        to = "super::note::Column::Id",
        on_delete = "Cascade"
    )]
    Note,

    #[sea_orm(has_many = "super::poll_vote::Entity")]
    Votes,
}

impl Related<super::note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Note.def()
    }
}

impl Related<super::poll_vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Votes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the poll's deadline has passed.
    #[must_use]
    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.closed || now >= self.expires_at
    }
}
