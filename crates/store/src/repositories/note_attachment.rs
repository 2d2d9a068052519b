//! Note attachment repository.

use std::sync::Arc;

use crate::entities::note_attachment::{self, Entity as NoteAttachment};
use plaza_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// Note attachment repository for database operations.
#[derive(Clone)]
pub struct NoteAttachmentRepository {
    db: Arc<DatabaseConnection>,
}

impl NoteAttachmentRepository {
    /// Create a new note attachment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find all attachments for a note, in creation order.
    pub async fn find_by_note_id(&self, note_id: &str) -> AppResult<Vec<note_attachment::Model>> {
        NoteAttachment::find()
            .filter(note_attachment::Column::NoteId.eq(note_id))
            .order_by_asc(note_attachment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Persist a new attachment.
    pub async fn create(&self, model: note_attachment::ActiveModel) -> AppResult<note_attachment::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }
}
