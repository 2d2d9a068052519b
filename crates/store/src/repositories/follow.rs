//! Follow repository, covering the full pending/accepted/rejected
//! state machine in one table.

use std::sync::Arc;

use crate::entities::follow::{self, Entity as Follow, FollowState};
use plaza_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a follow relationship by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<follow::Model>> {
        Follow::find_by_id(id).one(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the row for a given follower/followee pair, regardless of state.
    pub async fn find_by_pair(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<Option<follow::Model>> {
        Follow::find()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FolloweeId.eq(followee_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a pending or accepted row by the Follow activity's id, used to
    /// correlate an inbound Accept/Reject with the request it answers.
    pub async fn find_by_activity_uri(&self, activity_uri: &str) -> AppResult<Option<follow::Model>> {
        Follow::find()
            .filter(follow::Column::ActivityUri.eq(activity_uri))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether `follower_id` has an accepted follow of `followee_id`.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        Ok(self
            .find_by_pair(follower_id, followee_id)
            .await?
            .is_some_and(|f| f.state == FollowState::Accepted))
    }

    /// Create a new follow request, in `Pending` state unless the target
    /// auto-accepts.
    pub async fn create(&self, model: follow::ActiveModel) -> AppResult<follow::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Transition a follow row to `Accepted`.
    pub async fn accept(&self, id: &str) -> AppResult<follow::Model> {
        let found = self.find_by_id(id).await?.ok_or_else(|| AppError::NotFound(id.to_string()))?;
        let mut active: follow::ActiveModel = found.into();
        active.state = Set(FollowState::Accepted);
        active.accepted_at = Set(Some(chrono::Utc::now().into()));
        active.update(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Transition a follow row to `Rejected`.
    pub async fn reject(&self, id: &str) -> AppResult<follow::Model> {
        let found = self.find_by_id(id).await?.ok_or_else(|| AppError::NotFound(id.to_string()))?;
        let mut active: follow::ActiveModel = found.into();
        active.state = Set(FollowState::Rejected);
        active.update(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a follow relationship outright, for an inbound Undo(Follow).
    pub async fn delete_by_pair(&self, follower_id: &str, followee_id: &str) -> AppResult<()> {
        if let Some(f) = self.find_by_pair(follower_id, followee_id).await? {
            f.delete(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Accepted followees of an actor (who it follows), paginated.
    pub async fn find_following(
        &self,
        actor_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<follow::Model>> {
        let mut query = Follow::find()
            .filter(follow::Column::FollowerId.eq(actor_id))
            .filter(follow::Column::State.eq(FollowState::Accepted))
            .order_by_desc(follow::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(follow::Column::Id.lt(id));
        }

        query.limit(limit).all(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Accepted followers of an actor, paginated — the set the Syncer
    /// reconciles against remote followers collections.
    pub async fn find_followers(
        &self,
        actor_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<follow::Model>> {
        let mut query = Follow::find()
            .filter(follow::Column::FolloweeId.eq(actor_id))
            .filter(follow::Column::State.eq(FollowState::Accepted))
            .order_by_desc(follow::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(follow::Column::Id.lt(id));
        }

        query.limit(limit).all(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// All accepted follower actor ids of `actor_id`, unpaginated — used to
    /// compute the follower digest.
    pub async fn all_follower_ids(&self, actor_id: &str) -> AppResult<Vec<String>> {
        Follow::find()
            .filter(follow::Column::FolloweeId.eq(actor_id))
            .filter(follow::Column::State.eq(FollowState::Accepted))
            .select_only()
            .column(follow::Column::FollowerId)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count accepted followers of an actor.
    pub async fn count_followers(&self, actor_id: &str) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::FolloweeId.eq(actor_id))
            .filter(follow::Column::State.eq(FollowState::Accepted))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count accepted followees of an actor.
    pub async fn count_following(&self, actor_id: &str) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::FollowerId.eq(actor_id))
            .filter(follow::Column::State.eq(FollowState::Accepted))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_follow(id: &str, follower_id: &str, followee_id: &str, state: FollowState) -> follow::Model {
        follow::Model {
            id: id.to_string(),
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            state,
            activity_uri: None,
            created_at: Utc::now().into(),
            accepted_at: None,
        }
    }

    #[tokio::test]
    async fn is_following_true_when_accepted() {
        let f = test_follow("f1", "a1", "a2", FollowState::Accepted);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[f.clone()]]).into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert!(repo.is_following("a1", "a2").await.unwrap());
    }

    #[tokio::test]
    async fn is_following_false_when_pending() {
        let f = test_follow("f1", "a1", "a2", FollowState::Pending);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[f.clone()]]).into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert!(!repo.is_following("a1", "a2").await.unwrap());
    }
}
