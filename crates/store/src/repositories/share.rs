//! Share (boost/announce) repository.

use std::sync::Arc;

use crate::entities::share::{self, Entity as Share};
use plaza_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter};

/// Share repository for database operations.
#[derive(Clone)]
pub struct ShareRepository {
    db: Arc<DatabaseConnection>,
}

impl ShareRepository {
    /// Create a new share repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a share by its canonical Announce activity id.
    pub async fn find_by_uri(&self, uri: &str) -> AppResult<Option<share::Model>> {
        Share::find().filter(share::Column::Uri.eq(uri)).one(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a share by actor/note pair.
    pub async fn find_by_pair(&self, actor_id: &str, note_id: &str) -> AppResult<Option<share::Model>> {
        Share::find()
            .filter(share::Column::ActorId.eq(actor_id))
            .filter(share::Column::NoteId.eq(note_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new share.
    pub async fn create(&self, model: share::ActiveModel) -> AppResult<share::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a share, for an inbound Undo(Announce).
    pub async fn delete_by_pair(&self, actor_id: &str, note_id: &str) -> AppResult<()> {
        if let Some(s) = self.find_by_pair(actor_id, note_id).await? {
            s.delete(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }
}
