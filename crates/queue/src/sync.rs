//! Follower synchronizer.
//!
//! A local actor's accepted followers drift from reality over time: a
//! remote server can lose or forget a follow relationship without ever
//! sending an `Undo(Follow)` (a wiped database, a botched migration, a
//! moderation action that skips federation). The syncer periodically
//! reconciles each local actor's [`FollowRepository::find_followers`] set
//! against the remote side by refetching followers that have gone stale,
//! pruning ones that no longer resolve, and producing a digest of the
//! current set for use in delivery's `Collection-Synchronization` header.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use plaza_common::AppResult;
use plaza_federation::client::{ApClient, ApClientError};
use plaza_store::entities::actor;
use plaza_store::repositories::{ActorRepository, FollowRepository};
use sha2::{Digest as Sha2Digest, Sha256};
use tracing::{debug, warn};

/// A follower's entry is refetched if it hasn't been checked in this long.
const DEFAULT_STALE_AFTER: Duration = Duration::days(7);

/// Digest of a local actor's current followers collection, sorted and
/// hashed so it can be compared cheaply against what a remote server
/// believes it holds. `host` is `None` for the whole-collection digest and
/// `Some(host)` for the subset restricted to followers on that host, which
/// is the shape attached to a `Collection-Synchronization` header on a
/// delivery to that host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowerDigest {
    pub actor_id: String,
    pub host: Option<String>,
    pub follower_count: usize,
    pub sha256_hex: String,
}

impl FollowerDigest {
    fn compute(actor_id: &str, host: Option<&str>, follower_uris: &BTreeSet<String>) -> Self {
        let mut hasher = Sha256::new();
        for uri in follower_uris {
            hasher.update(uri.as_bytes());
            hasher.update(b"\n");
        }
        Self {
            actor_id: actor_id.to_string(),
            host: host.map(str::to_string),
            follower_count: follower_uris.len(),
            sha256_hex: format!("{:x}", hasher.finalize()),
        }
    }
}

/// Result of reconciling one local actor's followers against the remote
/// side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowerSyncOutcome {
    pub actor_id: String,
    pub checked: usize,
    pub refreshed: usize,
    pub pruned: usize,
    pub digest: FollowerDigest,
}

/// Reconciles local actors' followers lists against the remote servers
/// that host them.
#[derive(Clone)]
pub struct FollowerSyncer {
    actor_repo: ActorRepository,
    follow_repo: FollowRepository,
    ap_client: ApClient,
    stale_after: Duration,
}

impl FollowerSyncer {
    #[must_use]
    pub const fn new(actor_repo: ActorRepository, follow_repo: FollowRepository, ap_client: ApClient) -> Self {
        Self { actor_repo, follow_repo, ap_client, stale_after: DEFAULT_STALE_AFTER }
    }

    #[must_use]
    pub const fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Reconcile one local actor's followers.
    ///
    /// Remote followers that haven't been refetched in `stale_after` are
    /// probed via `ApClient::fetch_actor`; one that now resolves to nothing
    /// (410, or 404) is pruned from the follow table instead of lingering
    /// as a dead delivery target.
    pub async fn sync_actor(&self, local_actor: &actor::Model) -> AppResult<FollowerSyncOutcome> {
        let follower_ids = self.follow_repo.all_follower_ids(&local_actor.id).await?;
        let followers = self.actor_repo.find_by_ids(&follower_ids).await?;

        let mut checked = 0usize;
        let mut refreshed = 0usize;
        let mut pruned = 0usize;
        let mut live_uris = BTreeSet::new();

        for follower in &followers {
            let Some(uri) = follower_uri(follower) else {
                live_uris.insert(follower.id.clone());
                continue;
            };

            if follower.host.is_none() || !self.is_stale(follower) {
                live_uris.insert(uri);
                continue;
            }

            checked += 1;
            match self.ap_client.fetch_actor(&uri).await {
                Ok(_) => {
                    self.actor_repo.touch_last_fetched(&follower.id).await?;
                    refreshed += 1;
                    live_uris.insert(uri);
                }
                Err(ApClientError::Gone(_)) => {
                    debug!(follower = %uri, "follower actor gone, pruning follow");
                    self.follow_repo.delete_by_pair(&follower.id, &local_actor.id).await?;
                    pruned += 1;
                }
                Err(e) => {
                    warn!(follower = %uri, error = %e, "follower refetch failed, leaving follow in place");
                    live_uris.insert(uri);
                }
            }
        }

        let digest = FollowerDigest::compute(&local_actor.id, None, &live_uris);
        Ok(FollowerSyncOutcome { actor_id: local_actor.id.clone(), checked, refreshed, pruned, digest })
    }

    /// Canonicalize the digest of `local_actor`'s followers restricted to
    /// `host`, without probing anything remotely. This is what gets
    /// attached to a `Collection-Synchronization` header on the next
    /// delivery to that host, letting the peer notice drift on its own
    /// without waiting for a full sync round.
    pub async fn digest_for_host(&self, local_actor: &actor::Model, host: &str) -> AppResult<FollowerDigest> {
        let follower_ids = self.follow_repo.all_follower_ids(&local_actor.id).await?;
        let followers = self.actor_repo.find_by_ids(&follower_ids).await?;

        let uris: BTreeSet<String> = followers
            .iter()
            .filter(|f| f.host.as_deref() == Some(host))
            .filter_map(follower_uri)
            .collect();

        Ok(FollowerDigest::compute(&local_actor.id, Some(host), &uris))
    }

    /// Reconcile every local actor's followers, one after another.
    pub async fn sync_all_local_actors(&self, batch_size: u64) -> AppResult<Vec<FollowerSyncOutcome>> {
        let mut outcomes = Vec::new();
        let mut offset = 0u64;

        loop {
            let actors = self.actor_repo.find_local_actors(batch_size, offset).await?;
            if actors.is_empty() {
                break;
            }
            let page_len = actors.len() as u64;

            for local_actor in &actors {
                outcomes.push(self.sync_actor(local_actor).await?);
            }

            offset += page_len;
            if page_len < batch_size {
                break;
            }
        }

        Ok(outcomes)
    }

    fn is_stale(&self, follower: &actor::Model) -> bool {
        match follower.last_fetched_at {
            None => true,
            Some(last) => {
                let last: DateTime<Utc> = last.into();
                Utc::now() - last >= self.stale_after
            }
        }
    }
}

fn follower_uri(a: &actor::Model) -> Option<String> {
    a.uri.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use plaza_store::entities::actor::ActorKind;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_actor(id: &str, host: Option<&str>, uri: Option<&str>, last_fetched_at: Option<DateTime<Utc>>) -> actor::Model {
        actor::Model {
            id: id.to_string(),
            kind: ActorKind::Person,
            preferred_username: id.to_string(),
            username_lower: id.to_string(),
            host: host.map(str::to_string),
            name: None,
            summary: None,
            inbox: Some(format!("https://{}/inbox", host.unwrap_or("local"))),
            outbox: None,
            followers_url: None,
            shared_inbox: None,
            manually_approves_followers: false,
            also_known_as: serde_json::json!([]),
            moved_to: None,
            did_key: None,
            uri: uri.map(str::to_string),
            followers_count: 0,
            following_count: 0,
            notes_count: 0,
            is_suspended: false,
            last_fetched_at: last_fetched_at.map(Into::into),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_syncer() -> FollowerSyncer {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        FollowerSyncer::new(ActorRepository::new(db.clone()), FollowRepository::new(db), ApClient::new("https://local.example"))
    }

    #[test]
    fn digest_is_stable_for_same_set() {
        let set: BTreeSet<String> = ["https://a.example/users/1", "https://b.example/users/2"]
            .into_iter()
            .map(str::to_string)
            .collect();
        let a = FollowerDigest::compute("actor1", None, &set);
        let b = FollowerDigest::compute("actor1", None, &set);
        assert_eq!(a.sha256_hex, b.sha256_hex);
        assert_eq!(a.follower_count, 2);
    }

    #[test]
    fn digest_changes_when_set_changes() {
        let set_a: BTreeSet<String> = ["https://a.example/users/1"].into_iter().map(str::to_string).collect();
        let set_b: BTreeSet<String> =
            ["https://a.example/users/1", "https://b.example/users/2"].into_iter().map(str::to_string).collect();
        assert_ne!(
            FollowerDigest::compute("actor1", None, &set_a).sha256_hex,
            FollowerDigest::compute("actor1", None, &set_b).sha256_hex
        );
    }

    #[test]
    fn host_digest_excludes_other_hosts() {
        let set: BTreeSet<String> = ["https://a.example/users/1"].into_iter().map(str::to_string).collect();
        let digest = FollowerDigest::compute("actor1", Some("a.example"), &set);
        assert_eq!(digest.host.as_deref(), Some("a.example"));
        assert_eq!(digest.follower_count, 1);
    }

    #[test]
    fn remote_follower_with_no_fetch_history_is_stale() {
        let syncer = test_syncer();
        let remote_follower = test_actor("a2", Some("remote.example"), Some("https://remote.example/users/a2"), None);
        assert!(syncer.is_stale(&remote_follower));
    }

    #[test]
    fn recently_fetched_remote_follower_is_not_stale() {
        let syncer = test_syncer();
        let remote_follower =
            test_actor("a3", Some("remote.example"), Some("https://remote.example/users/a3"), Some(Utc::now()));
        assert!(!syncer.is_stale(&remote_follower));
    }
}
