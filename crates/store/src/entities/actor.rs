//! Actor entity: a social identity on some host, local or remote.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Actor kind, per ActivityStreams actor types.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ActorKind {
    #[sea_orm(string_value = "person")]
    Person,
    #[sea_orm(string_value = "service")]
    Service,
    #[sea_orm(string_value = "application")]
    Application,
    #[sea_orm(string_value = "group")]
    Group,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "actor")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub kind: ActorKind,

    #[sea_orm(unique)]
    pub preferred_username: String,

    pub username_lower: String,

    /// NULL = local actor, Some(host) = remote actor.
    #[sea_orm(nullable, indexed)]
    pub host: Option<String>,

    #[sea_orm(nullable)]
    pub name: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,

    #[sea_orm(nullable)]
    pub inbox: Option<String>,

    #[sea_orm(nullable)]
    pub outbox: Option<String>,

    #[sea_orm(nullable)]
    pub followers_url: Option<String>,

    #[sea_orm(nullable)]
    pub shared_inbox: Option<String>,

    #[sea_orm(default_value = false)]
    pub manually_approves_followers: bool,

    /// Aliases this actor is also known as (JSON array of absolute URLs).
    #[sea_orm(column_type = "JsonBinary")]
    pub also_known_as: Json,

    /// Forwarding pointer set by a Move activity.
    #[sea_orm(nullable)]
    pub moved_to: Option<String>,

    /// `did:key:...` component for portable identities.
    #[sea_orm(nullable, unique)]
    pub did_key: Option<String>,

    /// Canonical absolute actor id for remote actors; NULL for local ones,
    /// whose canonical id is derived from `base_url` + preferred_username.
    #[sea_orm(nullable, unique)]
    pub uri: Option<String>,

    #[sea_orm(default_value = 0)]
    pub followers_count: i32,

    #[sea_orm(default_value = 0)]
    pub following_count: i32,

    #[sea_orm(default_value = 0)]
    pub notes_count: i32,

    #[sea_orm(default_value = false)]
    pub is_suspended: bool,

    #[sea_orm(nullable)]
    pub last_fetched_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::note::Entity")]
    Notes,

    #[sea_orm(has_many = "super::actor_key::Entity")]
    Keys,

    #[sea_orm(has_many = "super::portable_gateway::Entity")]
    Gateways,
}

impl Related<super::note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

impl Related<super::actor_key::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Keys.def()
    }
}

impl Related<super::portable_gateway::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gateways.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this row represents a locally hosted actor.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.host.is_none()
    }

    /// Whether this actor carries a portable (`did:key`) identity.
    #[must_use]
    pub const fn is_portable(&self) -> bool {
        self.did_key.is_some()
    }
}
