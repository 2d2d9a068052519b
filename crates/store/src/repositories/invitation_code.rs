//! Invitation code repository.

use std::sync::Arc;

use crate::entities::invitation_code::{self, Entity as InvitationCode};
use plaza_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Invitation code repository for database operations.
#[derive(Clone)]
pub struct InvitationCodeRepository {
    db: Arc<DatabaseConnection>,
}

impl InvitationCodeRepository {
    /// Create a new invitation code repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an unused, unexpired code by its code string.
    pub async fn find_valid(&self, code: &str) -> AppResult<Option<invitation_code::Model>> {
        let found = InvitationCode::find()
            .filter(invitation_code::Column::Code.eq(code))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(found.filter(|c| {
            c.is_available() && c.expires_at.is_none_or(|exp| exp > chrono::Utc::now())
        }))
    }

    /// Create a new invitation code.
    pub async fn create(&self, model: invitation_code::ActiveModel) -> AppResult<invitation_code::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Redeem a code by a newly registered actor.
    pub async fn redeem(&self, id: &str, used_by: &str) -> AppResult<()> {
        let found = InvitationCode::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        let mut active: invitation_code::ActiveModel = found.into();
        active.used_by = Set(Some(used_by.to_string()));
        active.used_at = Set(Some(chrono::Utc::now().into()));
        active.update(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
