//! Poll vote repository.

use std::sync::Arc;

use crate::entities::poll_vote::{self, Entity as PollVote};
use plaza_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Poll vote repository for database operations.
#[derive(Clone)]
pub struct PollVoteRepository {
    db: Arc<DatabaseConnection>,
}

impl PollVoteRepository {
    /// Create a new poll vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Whether an actor has already voted on a poll, for idempotent Vote
    /// activity ingestion.
    pub async fn has_voted(&self, note_id: &str, actor_id: &str) -> AppResult<bool> {
        PollVote::find()
            .filter(poll_vote::Column::NoteId.eq(note_id))
            .filter(poll_vote::Column::ActorId.eq(actor_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
            .map(|v| v.is_some())
    }

    /// Record a vote.
    pub async fn create(&self, model: poll_vote::ActiveModel) -> AppResult<poll_vote::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }
}
