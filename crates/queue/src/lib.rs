//! Background job queue for `ActivityPub` delivery, built on apalis and Redis.

pub mod delivery_impl;
pub mod jobs;
pub mod rate_limit;
pub mod retry;
pub mod scheduler;
pub mod shared_inbox;
pub mod sync;
pub mod workers;

pub use delivery_impl::RedisDeliveryService;
pub use jobs::*;
pub use rate_limit::{InstanceRateLimiter, RateLimitConfig, RateLimitResult};
pub use retry::{DeadLetterEntry, RetryConfig};
pub use scheduler::{JobExecutor, ScheduledJob, SchedulerConfig, SchedulerState, run_scheduler};
pub use shared_inbox::{BatchDeliveryTarget, RecipientInfo};
pub use sync::{FollowerDigest, FollowerSyncOutcome, FollowerSyncer};
pub use workers::*;
