//! Scheduled jobs for periodic maintenance tasks.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::interval;

/// Scheduled job types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScheduledJob {
    /// Reconcile local actors' followers against the remote hosts that
    /// host them.
    FollowersSync,
}

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between follower-sync rounds (default: 1 hour).
    pub followers_sync_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { followers_sync_interval: Duration::from_secs(3600) }
    }
}

/// Scheduler state for tracking job runs.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    pub last_followers_sync: Option<DateTime<Utc>>,
}

/// Job executor trait for scheduled jobs.
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync {
    /// Run one follower-sync round across all local actors, returning the
    /// number reconciled.
    async fn followers_sync(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;
}

/// Run the scheduler with the given configuration and executor.
pub async fn run_scheduler<E: JobExecutor + 'static>(config: SchedulerConfig, executor: Arc<E>) {
    let followers_sync_interval = config.followers_sync_interval;

    tokio::spawn(async move {
        let mut interval = interval(followers_sync_interval);
        loop {
            interval.tick().await;
            match executor.followers_sync().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(count, "reconciled followers for local actors");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "follower sync round failed");
                }
            }
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.followers_sync_interval, Duration::from_secs(3600));
    }

    #[test]
    fn test_scheduler_state_default() {
        let state = SchedulerState::default();
        assert!(state.last_followers_sync.is_none());
    }
}
