//! Redis integration tests.
//!
//! These tests require a running Redis instance and `PostgreSQL` instance
//! (the outbox table lives in Postgres; only the job queue itself is
//! backed by Redis).
//! Run with: `cargo test --test redis_integration -- --ignored`
//!
//! Set `REDIS_URL` environment variable to point to your Redis instance.
//! Default: <redis://localhost:6379>

use plaza_queue::{DeliverJob, RedisDeliveryService};
use plaza_store::entities::outbox_item::DeliveryState;
use plaza_store::repositories::OutboxItemRepository;
use plaza_store::test_utils::TestDatabase;
use serde_json::json;
use std::sync::Arc;

fn get_redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
}

async fn connect_storage() -> apalis_redis::RedisStorage<DeliverJob> {
    let client = redis::Client::open(get_redis_url()).expect("invalid redis url");
    let conn = redis::aio::ConnectionManager::new(client).await.expect("failed to connect to redis");
    apalis_redis::RedisStorage::<DeliverJob>::new(conn)
}

/// Test that we can connect to Redis for the job queue.
#[tokio::test]
#[ignore = "requires running Redis instance"]
async fn test_redis_connection() {
    let _storage = connect_storage().await;
}

/// Test that queueing a delivery creates one outbox row per inbox and
/// pushes a job for each onto the Redis-backed queue.
#[tokio::test]
#[ignore = "requires running Redis and PostgreSQL instances"]
async fn test_queue_delivery_creates_outbox_rows() {
    let db = TestDatabase::new().await.expect("failed to connect to test database");
    plaza_store::migrate(db.connection()).await.expect("failed to run migrations");

    let outbox_repo = OutboxItemRepository::new(Arc::new(db.connection().clone()));
    let storage = connect_storage().await;
    let service = RedisDeliveryService::new(storage, outbox_repo.clone());

    let activity = json!({"type": "Create", "id": "https://local.example/activities/1"});
    let inboxes =
        vec!["https://remote-a.example/inbox".to_string(), "https://remote-b.example/inbox".to_string()];

    service.queue_delivery("actor-1", &activity, &inboxes).await.expect("failed to queue delivery");

    let due = outbox_repo.find_due(10).await.expect("failed to read outbox");
    let queued: Vec<_> = due.iter().filter(|item| item.actor_id == "actor-1").collect();

    assert_eq!(queued.len(), 2);
    for item in queued {
        assert_eq!(item.state, DeliveryState::Pending);
        assert_eq!(item.attempts, 0);
    }

    db.cleanup().await.expect("failed to clean up test database");
}
