//! Actor key material, one row per (actor, algorithm).
//!
//! A local actor may hold both an RSA and an Ed25519 key simultaneously so
//! the signer can draw against `Ed25519Threshold`/`RFC9421Threshold`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Signature algorithm a key belongs to.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum KeyAlgorithm {
    #[sea_orm(string_value = "rsa")]
    Rsa,
    #[sea_orm(string_value = "ed25519")]
    Ed25519,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "actor_key")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key_id: String,

    #[sea_orm(indexed)]
    pub actor_id: String,

    pub algorithm: KeyAlgorithm,

    /// PEM for RSA, multibase-encoded raw bytes for Ed25519.
    #[sea_orm(column_type = "Text")]
    pub public_key: String,

    /// Present for local actors only.
    #[sea_orm(column_type = "Text", nullable)]
    pub private_key: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::actor::Entity",
        from = "Column::ActorId",
        to = "super::actor::Column::Id",
        on_delete = "Cascade"
    )]
    Actor,
}

impl Related<super::actor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
