//! Outbox delivery job.

use serde::{Deserialize, Serialize};

/// Job to deliver a single queued outbox item to its target inbox.
///
/// The job only carries the row id; `deliver_worker` re-reads the item so
/// retries always act on current state (attempts, `next_attempt_at`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverJob {
    pub outbox_item_id: String,
}

impl DeliverJob {
    #[must_use]
    pub const fn new(outbox_item_id: String) -> Self {
        Self { outbox_item_id }
    }
}
