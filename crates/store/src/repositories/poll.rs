//! Poll repository.

use std::sync::Arc;

use crate::entities::poll::{self, Entity as Poll};
use plaza_common::{AppError, AppResult};
use sea_orm::{sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the poll attached to a note.
    pub async fn find_by_note_id(&self, note_id: &str) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(note_id).one(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a poll for a note.
    pub async fn create(&self, model: poll::ActiveModel) -> AppResult<poll::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment the vote count at `choice`, returning the updated row.
    pub async fn record_vote(&self, note_id: &str, choice: usize) -> AppResult<poll::Model> {
        let found =
            self.find_by_note_id(note_id).await?.ok_or_else(|| AppError::NotFound(note_id.to_string()))?;

        let mut votes: Vec<i64> = serde_json::from_value(found.votes.clone()).unwrap_or_default();
        if let Some(count) = votes.get_mut(choice) {
            *count += 1;
        }

        let mut active: poll::ActiveModel = found.into();
        active.votes = Set(serde_json::to_value(votes).unwrap_or(serde_json::json!([])));
        active.update(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Close polls whose deadline has passed, returning how many were closed.
    pub async fn close_expired(&self) -> AppResult<u64> {
        let result = Poll::update_many()
            .col_expr(poll::Column::Closed, Expr::value(true))
            .filter(poll::Column::Closed.eq(false))
            .filter(poll::Column::ExpiresAt.lte(chrono::Utc::now()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}
