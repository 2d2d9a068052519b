//! Note repository.

use std::sync::Arc;

use crate::entities::note::{self, Entity as Note};
use plaza_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// Note repository for database operations.
#[derive(Clone)]
pub struct NoteRepository {
    db: Arc<DatabaseConnection>,
}

impl NoteRepository {
    /// Create a new note repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a note by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<note::Model>> {
        Note::find_by_id(id).one(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a note by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<note::Model> {
        self.find_by_id(id).await?.ok_or_else(|| AppError::NoteNotFound(id.to_string()))
    }

    /// Find a note by its canonical `ActivityPub` id.
    pub async fn find_by_uri(&self, uri: &str) -> AppResult<Option<note::Model>> {
        Note::find().filter(note::Column::Uri.eq(uri)).one(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find notes by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<note::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Note::find()
            .filter(note::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the other notes belonging to a thread, given the root id.
    pub async fn find_by_reply_root(&self, root_id: &str, limit: u64) -> AppResult<Vec<note::Model>> {
        Note::find()
            .filter(note::Column::ReplyRootId.eq(root_id))
            .order_by_asc(note::Column::PublishedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new note.
    pub async fn create(&self, model: note::ActiveModel) -> AppResult<note::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a note.
    pub async fn update(&self, model: note::ActiveModel) -> AppResult<note::Model> {
        model.update(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Tombstone a note in place, for a received or locally issued Delete.
    pub async fn mark_deleted(&self, id: &str) -> AppResult<()> {
        let found = self.get_by_id(id).await?;
        let mut active: note::ActiveModel = found.into();
        active.deleted = Set(true);
        active.content = Set(None);
        active.update(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List an actor's outbox items (non-deleted, public-facing visibility
    /// only), newest first.
    pub async fn find_public_by_actor(
        &self,
        actor_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<note::Model>> {
        Note::find()
            .filter(note::Column::ActorId.eq(actor_id))
            .filter(note::Column::Deleted.eq(false))
            .filter(note::Column::Visibility.eq(note::Visibility::Public))
            .order_by_desc(note::Column::PublishedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count an actor's public notes.
    pub async fn count_public_by_actor(&self, actor_id: &str) -> AppResult<u64> {
        Note::find()
            .filter(note::Column::ActorId.eq(actor_id))
            .filter(note::Column::Deleted.eq(false))
            .filter(note::Column::Visibility.eq(note::Visibility::Public))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record an edit timestamp after an Update activity is applied.
    pub async fn touch_edited(&self, id: &str, content: Option<String>) -> AppResult<()> {
        let found = self.get_by_id(id).await?;
        let mut active: note::ActiveModel = found.into();
        active.content = Set(content);
        active.edited_at = Set(Some(chrono::Utc::now().into()));
        active.update(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_note(id: &str, actor_id: &str) -> note::Model {
        note::Model {
            id: id.to_string(),
            actor_id: actor_id.to_string(),
            uri: None,
            content: Some("hello".to_string()),
            visibility: note::Visibility::Public,
            to: serde_json::json!([]),
            cc: serde_json::json!([]),
            in_reply_to_id: None,
            reply_root_id: None,
            quote_id: None,
            group_id: None,
            published_at: Utc::now().into(),
            edited_at: None,
            deleted: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn find_by_id_found() {
        let n = test_note("n1", "a1");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[n.clone()]]).into_connection(),
        );

        let repo = NoteRepository::new(db);
        let result = repo.find_by_id("n1").await.unwrap();
        assert_eq!(result.unwrap().actor_id, "a1");
    }

    #[tokio::test]
    async fn get_by_id_missing_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<note::Model>::new()])
                .into_connection(),
        );

        let repo = NoteRepository::new(db);
        let result = repo.get_by_id("missing").await;
        assert!(matches!(result, Err(AppError::NoteNotFound(id)) if id == "missing"));
    }
}
