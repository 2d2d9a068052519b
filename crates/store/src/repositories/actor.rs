//! Actor repository.

use std::sync::Arc;

use crate::entities::actor::{self, Entity as Actor};
use plaza_common::{AppError, AppResult};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

/// Actor repository for database operations.
#[derive(Clone)]
pub struct ActorRepository {
    db: Arc<DatabaseConnection>,
}

impl ActorRepository {
    /// Create a new actor repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an actor by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<actor::Model>> {
        Actor::find_by_id(id).one(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an actor by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<actor::Model> {
        self.find_by_id(id).await?.ok_or_else(|| AppError::ActorNotFound(id.to_string()))
    }

    /// Find actors by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<actor::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Actor::find()
            .filter(actor::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an actor by username and host. `host = None` means local.
    pub async fn find_by_username_and_host(
        &self,
        username: &str,
        host: Option<&str>,
    ) -> AppResult<Option<actor::Model>> {
        let mut query =
            Actor::find().filter(actor::Column::UsernameLower.eq(username.to_lowercase()));

        query = match host {
            Some(h) => query.filter(actor::Column::Host.eq(h)),
            None => query.filter(actor::Column::Host.is_null()),
        };

        query.one(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a local actor by preferred username.
    pub async fn find_local_by_username(&self, username: &str) -> AppResult<Option<actor::Model>> {
        self.find_by_username_and_host(username, None).await
    }

    /// Find an actor by its canonical `ActivityPub` id, local or remote.
    pub async fn find_by_uri(&self, uri: &str) -> AppResult<Option<actor::Model>> {
        Actor::find().filter(actor::Column::Uri.eq(uri)).one(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a portable actor by its `did:key` component.
    pub async fn find_by_did_key(&self, did_key: &str) -> AppResult<Option<actor::Model>> {
        Actor::find()
            .filter(actor::Column::DidKey.eq(did_key))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new actor.
    pub async fn create(&self, model: actor::ActiveModel) -> AppResult<actor::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an actor.
    pub async fn update(&self, model: actor::ActiveModel) -> AppResult<actor::Model> {
        model.update(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// List local actors (paginated), used by the instance actor index.
    pub async fn find_local_actors(&self, limit: u64, offset: u64) -> AppResult<Vec<actor::Model>> {
        Actor::find()
            .filter(actor::Column::Host.is_null())
            .filter(actor::Column::IsSuspended.eq(false))
            .order_by_desc(actor::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment notes count atomically.
    pub async fn increment_notes_count(&self, actor_id: &str) -> AppResult<()> {
        Actor::update_many()
            .col_expr(actor::Column::NotesCount, Expr::col(actor::Column::NotesCount).add(1))
            .filter(actor::Column::Id.eq(actor_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement notes count atomically, floored at zero.
    pub async fn decrement_notes_count(&self, actor_id: &str) -> AppResult<()> {
        Actor::update_many()
            .col_expr(actor::Column::NotesCount, Expr::cust("GREATEST(notes_count - 1, 0)"))
            .filter(actor::Column::Id.eq(actor_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment followers count atomically.
    pub async fn increment_followers_count(&self, actor_id: &str) -> AppResult<()> {
        Actor::update_many()
            .col_expr(actor::Column::FollowersCount, Expr::col(actor::Column::FollowersCount).add(1))
            .filter(actor::Column::Id.eq(actor_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement followers count atomically, floored at zero.
    pub async fn decrement_followers_count(&self, actor_id: &str) -> AppResult<()> {
        Actor::update_many()
            .col_expr(actor::Column::FollowersCount, Expr::cust("GREATEST(followers_count - 1, 0)"))
            .filter(actor::Column::Id.eq(actor_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment following count atomically.
    pub async fn increment_following_count(&self, actor_id: &str) -> AppResult<()> {
        Actor::update_many()
            .col_expr(actor::Column::FollowingCount, Expr::col(actor::Column::FollowingCount).add(1))
            .filter(actor::Column::Id.eq(actor_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement following count atomically, floored at zero.
    pub async fn decrement_following_count(&self, actor_id: &str) -> AppResult<()> {
        Actor::update_many()
            .col_expr(actor::Column::FollowingCount, Expr::cust("GREATEST(following_count - 1, 0)"))
            .filter(actor::Column::Id.eq(actor_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Record that a remote actor's profile was just refetched.
    pub async fn touch_last_fetched(&self, actor_id: &str) -> AppResult<()> {
        let found = self.get_by_id(actor_id).await?;
        let mut active: actor::ActiveModel = found.into();
        active.last_fetched_at = Set(Some(chrono::Utc::now().into()));
        active.update(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Apply a Move activity's forwarding pointer.
    pub async fn set_moved_to(&self, actor_id: &str, target_id: &str) -> AppResult<()> {
        let found = self.get_by_id(actor_id).await?;
        let mut active: actor::ActiveModel = found.into();
        active.moved_to = Set(Some(target_id.to_string()));
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        active.update(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Mark an actor as suspended, e.g. after receiving a Delete for it.
    pub async fn mark_as_suspended(&self, actor_id: &str) -> AppResult<()> {
        let found = self.get_by_id(actor_id).await?;
        let mut active: actor::ActiveModel = found.into();
        active.is_suspended = Set(true);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        active.update(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count local actors, for `instance_setting`-backed node info.
    pub async fn count_local_actors(&self) -> AppResult<u64> {
        Actor::find()
            .filter(actor::Column::Host.is_null())
            .filter(actor::Column::IsSuspended.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
