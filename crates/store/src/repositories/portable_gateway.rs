//! Portable gateway repository.

use std::sync::Arc;

use crate::entities::portable_gateway::{self, Entity as PortableGateway};
use plaza_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Portable gateway repository for database operations.
#[derive(Clone)]
pub struct PortableGatewayRepository {
    db: Arc<DatabaseConnection>,
}

impl PortableGatewayRepository {
    /// Create a new portable gateway repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the gateway registration for an actor on a given host.
    pub async fn find_by_actor_and_host(
        &self,
        actor_id: &str,
        host: &str,
    ) -> AppResult<Option<portable_gateway::Model>> {
        PortableGateway::find()
            .filter(portable_gateway::Column::ActorId.eq(actor_id))
            .filter(portable_gateway::Column::Host.eq(host))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all hosts registered as gateways for an actor.
    pub async fn find_by_actor(&self, actor_id: &str) -> AppResult<Vec<portable_gateway::Model>> {
        PortableGateway::find()
            .filter(portable_gateway::Column::ActorId.eq(actor_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Register a host as a gateway for an actor.
    pub async fn create(&self, model: portable_gateway::ActiveModel) -> AppResult<portable_gateway::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))
    }
}
