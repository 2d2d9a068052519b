//! Invitation code gating local registration.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invitation_code")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub code: String,

    #[sea_orm(nullable, indexed)]
    pub created_by: Option<String>,

    #[sea_orm(nullable, indexed)]
    pub used_by: Option<String>,

    #[sea_orm(nullable)]
    pub used_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub expires_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::actor::Entity",
        from = "Column::CreatedBy",
        to = "super::actor::Column::Id"
    )]
    Creator,

    #[sea_orm(
        belongs_to = "super::actor::Entity",
        from = "Column::UsedBy",
        to = "super::actor::Column::Id"
    )]
    User,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.used_by.is_none()
    }
}
