//! Note tag repository.

use std::sync::Arc;

use crate::entities::note_tag::{self, Entity as NoteTag, TagKind};
use plaza_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Note tag repository for database operations.
#[derive(Clone)]
pub struct NoteTagRepository {
    db: Arc<DatabaseConnection>,
}

impl NoteTagRepository {
    /// Create a new note tag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find all tags for a note.
    pub async fn find_by_note_id(&self, note_id: &str) -> AppResult<Vec<note_tag::Model>> {
        NoteTag::find()
            .filter(note_tag::Column::NoteId.eq(note_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the mention tags for a note, used to resolve reply-forwarding
    /// recipients.
    pub async fn find_mentions(&self, note_id: &str) -> AppResult<Vec<note_tag::Model>> {
        NoteTag::find()
            .filter(note_tag::Column::NoteId.eq(note_id))
            .filter(note_tag::Column::Kind.eq(TagKind::Mention))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Persist a new tag.
    pub async fn create(&self, model: note_tag::ActiveModel) -> AppResult<note_tag::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }
}
