//! Outbox item repository.

use std::sync::Arc;

use crate::entities::outbox_item::{self, DeliveryState, Entity as OutboxItem};
use plaza_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

/// Outbox item repository for database operations.
#[derive(Clone)]
pub struct OutboxItemRepository {
    db: Arc<DatabaseConnection>,
}

impl OutboxItemRepository {
    /// Create a new outbox item repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an item by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<outbox_item::Model>> {
        OutboxItem::find_by_id(id).one(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Enqueue a new delivery.
    pub async fn create(&self, model: outbox_item::ActiveModel) -> AppResult<outbox_item::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Items due for (re)delivery, oldest first, capped at `limit`.
    pub async fn find_due(&self, limit: u64) -> AppResult<Vec<outbox_item::Model>> {
        OutboxItem::find()
            .filter(outbox_item::Column::State.eq(DeliveryState::Pending))
            .filter(outbox_item::Column::NextAttemptAt.lte(chrono::Utc::now()))
            .order_by_asc(outbox_item::Column::NextAttemptAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark an item delivered.
    pub async fn mark_delivered(&self, id: &str) -> AppResult<()> {
        let found = self.find_by_id(id).await?.ok_or_else(|| AppError::NotFound(id.to_string()))?;
        let mut active: outbox_item::ActiveModel = found.into();
        active.state = Set(DeliveryState::Delivered);
        active.delivered_at = Set(Some(chrono::Utc::now().into()));
        active.update(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Record a failed attempt and reschedule, or mark dead once attempts
    /// are exhausted.
    pub async fn record_failure(
        &self,
        id: &str,
        error: &str,
        next_attempt_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> AppResult<()> {
        let found = self.find_by_id(id).await?.ok_or_else(|| AppError::NotFound(id.to_string()))?;
        let attempts = found.attempts;
        let mut active: outbox_item::ActiveModel = found.into();
        active.attempts = Set(attempts + 1);
        active.last_error = Set(Some(error.to_string()));
        match next_attempt_at {
            Some(at) => {
                active.state = Set(DeliveryState::Pending);
                active.next_attempt_at = Set(Some(at.into()));
            }
            None => {
                active.state = Set(DeliveryState::Dead);
                active.next_attempt_at = Set(None);
            }
        }
        active.update(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
