//! Redis-backed outbox enqueueing.
//!
//! Turns a planned delivery (an activity plus its resolved inbox set) into
//! `outbox_item` rows and pushes a [`DeliverJob`] per row onto the apalis
//! queue for `deliver_worker` to pick up.

use apalis::prelude::*;
use plaza_common::{AppResult, IdGenerator};
use plaza_store::entities::outbox_item::{self, DeliveryState};
use plaza_store::repositories::OutboxItemRepository;
use sea_orm::Set;
use serde_json::Value;

use crate::jobs::DeliverJob;

/// Queues `ActivityPub` deliveries onto Redis for the apalis deliver worker.
#[derive(Clone)]
pub struct RedisDeliveryService {
    storage: apalis_redis::RedisStorage<DeliverJob>,
    outbox_repo: OutboxItemRepository,
    id_gen: IdGenerator,
}

impl RedisDeliveryService {
    /// Create a new Redis delivery service.
    #[must_use]
    pub fn new(storage: apalis_redis::RedisStorage<DeliverJob>, outbox_repo: OutboxItemRepository) -> Self {
        Self { storage, outbox_repo, id_gen: IdGenerator::new() }
    }

    /// Record one outbox item per inbox and queue its delivery.
    pub async fn queue_delivery(&self, actor_id: &str, activity: &Value, inboxes: &[String]) -> AppResult<()> {
        for inbox_url in inboxes {
            let item = outbox_item::ActiveModel {
                id: Set(self.id_gen.generate()),
                actor_id: Set(actor_id.to_string()),
                inbox_url: Set(inbox_url.clone()),
                activity: Set(activity.clone()),
                state: Set(DeliveryState::Pending),
                attempts: Set(0),
                last_error: Set(None),
                next_attempt_at: Set(Some(chrono::Utc::now().into())),
                created_at: Set(chrono::Utc::now().into()),
                delivered_at: Set(None),
            };

            let item = self.outbox_repo.create(item).await?;

            self.storage
                .clone()
                .push(DeliverJob::new(item.id.clone()))
                .await
                .map_err(|e| plaza_common::AppError::Queue(format!("failed to queue delivery job: {e}")))?;

            tracing::debug!(inbox = %inbox_url, item_id = %item.id, "queued outbox delivery");
        }

        Ok(())
    }
}
