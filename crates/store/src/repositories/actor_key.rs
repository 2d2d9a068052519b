//! Actor key repository.

use std::sync::Arc;

use crate::entities::actor_key::{self, Entity as ActorKey, KeyAlgorithm};
use plaza_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Actor key repository for database operations.
#[derive(Clone)]
pub struct ActorKeyRepository {
    db: Arc<DatabaseConnection>,
}

impl ActorKeyRepository {
    /// Create a new actor key repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a key by its id (the `keyId` fragment used in signatures).
    pub async fn find_by_key_id(&self, key_id: &str) -> AppResult<Option<actor_key::Model>> {
        ActorKey::find_by_id(key_id).one(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all keys belonging to an actor.
    pub async fn find_by_actor_id(&self, actor_id: &str) -> AppResult<Vec<actor_key::Model>> {
        ActorKey::find()
            .filter(actor_key::Column::ActorId.eq(actor_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an actor's key of a specific algorithm.
    pub async fn find_by_actor_and_algorithm(
        &self,
        actor_id: &str,
        algorithm: KeyAlgorithm,
    ) -> AppResult<Option<actor_key::Model>> {
        ActorKey::find()
            .filter(actor_key::Column::ActorId.eq(actor_id))
            .filter(actor_key::Column::Algorithm.eq(algorithm))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Persist a new key.
    pub async fn create(&self, model: actor_key::ActiveModel) -> AppResult<actor_key::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_key(key_id: &str, actor_id: &str) -> actor_key::Model {
        actor_key::Model {
            key_id: key_id.to_string(),
            actor_id: actor_id.to_string(),
            algorithm: KeyAlgorithm::Ed25519,
            public_key: "z6Mk...".to_string(),
            private_key: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn find_by_key_id_found() {
        let k = test_key("a1#ed25519-key", "a1");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[k.clone()]]).into_connection(),
        );

        let repo = ActorKeyRepository::new(db);
        let result = repo.find_by_key_id("a1#ed25519-key").await.unwrap();
        assert_eq!(result.unwrap().actor_id, "a1");
    }
}
