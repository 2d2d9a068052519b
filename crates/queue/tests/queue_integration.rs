//! Queue integration tests.
//!
//! These tests verify the queue components work correctly together.

use std::time::Duration;

use plaza_queue::{InstanceRateLimiter, RateLimitConfig, RateLimitResult, SchedulerConfig, SchedulerState};

#[tokio::test]
async fn test_rate_limiter_multiple_instances_isolation() {
    let config = RateLimitConfig {
        max_requests: 10,
        window: Duration::from_secs(60),
        cooldown: Duration::from_secs(300),
    };
    let limiter = InstanceRateLimiter::new(config);

    // Instance A makes requests
    for _ in 0..5 {
        assert_eq!(
            limiter.check("instance-a.example.com").await,
            RateLimitResult::Allowed
        );
    }

    // Instance B should have full quota
    for _ in 0..10 {
        assert_eq!(
            limiter.check("instance-b.example.com").await,
            RateLimitResult::Allowed
        );
    }

    // Instance A should still have quota
    assert_eq!(
        limiter.check("instance-a.example.com").await,
        RateLimitResult::Allowed
    );

    // Instance B should be in cooldown
    match limiter.check("instance-b.example.com").await {
        RateLimitResult::Cooldown { .. } => {}
        other => panic!("Expected Cooldown, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limiter_concurrent_access() {
    let config = RateLimitConfig {
        max_requests: 100,
        window: Duration::from_secs(60),
        cooldown: Duration::from_secs(10),
    };
    let limiter = InstanceRateLimiter::new(config);

    // Spawn multiple tasks accessing the same instance
    let handles: Vec<_> = (0..50)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.check("concurrent.example.com").await })
        })
        .collect();

    let mut allowed_count = 0;
    for handle in handles {
        if matches!(handle.await, Ok(RateLimitResult::Allowed)) {
            allowed_count += 1;
        }
    }

    // All 50 should be allowed (limit is 100)
    assert_eq!(allowed_count, 50);
    assert_eq!(limiter.instance_count().await, 1);
}

#[tokio::test]
async fn test_rate_limiter_cleanup() {
    let config = RateLimitConfig {
        max_requests: 5,
        window: Duration::from_millis(10), // Very short window
        cooldown: Duration::from_millis(10),
    };
    let limiter = InstanceRateLimiter::new(config);

    // Create entries for multiple instances
    limiter.check("cleanup-1.example.com").await;
    limiter.check("cleanup-2.example.com").await;
    limiter.check("cleanup-3.example.com").await;

    assert_eq!(limiter.instance_count().await, 3);

    // Wait for windows to expire
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Cleanup should remove expired entries
    limiter.cleanup().await;

    assert_eq!(limiter.instance_count().await, 0);
}

#[test]
fn test_scheduler_state_default() {
    let state = SchedulerState::default();
    assert!(state.last_followers_sync.is_none());
}

#[test]
fn test_scheduler_config_intervals() {
    let config = SchedulerConfig::default();
    assert!(config.followers_sync_interval >= Duration::from_secs(60));
}
