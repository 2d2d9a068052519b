//! A single outbound delivery: one activity addressed to one recipient
//! inbox, tracked through the retry pipeline.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum DeliveryState {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "dead")]
    Dead,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "outbox_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub actor_id: String,

    /// Target inbox URL, already collapsed to a shared inbox where possible.
    #[sea_orm(indexed)]
    pub inbox_url: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub activity: Json,

    pub state: DeliveryState,

    #[sea_orm(default_value = 0)]
    pub attempts: i32,

    #[sea_orm(nullable)]
    pub last_error: Option<String>,

    #[sea_orm(nullable, indexed)]
    pub next_attempt_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub delivered_at: Option<DateTimeWithTimeZone>,
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

impl Model {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.state, DeliveryState::Delivered | DeliveryState::Dead)
    }
}
