//! Remote actor caching with Redis.
//!
//! Caches resolved remote `ActivityPub` actors to avoid re-fetching on
//! every inbound delivery. Entries expire after a TTL; a short-lived
//! negative cache remembers recently failed lookups so a chatty or dead
//! remote host doesn't get hammered.

#![allow(missing_docs)]

use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default cache TTL: 24 hours.
const DEFAULT_CACHE_TTL_SECS: i64 = 24 * 60 * 60;

/// Short cache TTL for failed lookups: 5 minutes.
const FAILED_LOOKUP_TTL_SECS: i64 = 5 * 60;

/// Cached remote actor data, enough to deliver to and display the actor
/// without a round trip to their origin server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRemoteActor {
    pub id: String,
    pub actor_type: String,
    pub preferred_username: String,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub inbox: String,
    pub shared_inbox: Option<String>,
    pub outbox: Option<String>,
    pub followers: Option<String>,
    /// RSA public key id + PEM, for legacy signature verification.
    pub public_key_id: Option<String>,
    pub public_key_pem: Option<String>,
    /// Ed25519 public key, multibase-encoded, for RFC 9421/integrity-proof
    /// verification and `did:key` derivation.
    pub ed25519_public_key_multibase: Option<String>,
    /// Portable-identity alias URLs (`alsoKnownAs`).
    pub also_known_as: Vec<String>,
    /// Target of a `Move` activity, if this actor has relocated.
    pub moved_to: Option<String>,
    pub host: String,
    pub cached_at: chrono::DateTime<chrono::Utc>,
}

impl CachedRemoteActor {
    /// Build a cached actor from the raw `ActivityPub` actor JSON.
    pub fn from_json(json: &serde_json::Value, host: &str) -> Option<Self> {
        let id = json.get("id")?.as_str()?.to_string();
        let actor_type = json.get("type")?.as_str()?.to_string();
        let preferred_username = json.get("preferredUsername")?.as_str()?.to_string();
        let name = json.get("name").and_then(|v| v.as_str()).map(String::from);
        let summary = json.get("summary").and_then(|v| v.as_str()).map(String::from);
        let inbox = json.get("inbox")?.as_str()?.to_string();

        let shared_inbox = json
            .get("endpoints")
            .and_then(|e| e.get("sharedInbox"))
            .and_then(|v| v.as_str())
            .map(String::from);

        let outbox = json.get("outbox").and_then(|v| v.as_str()).map(String::from);
        let followers = json.get("followers").and_then(|v| v.as_str()).map(String::from);

        let public_key_id = json
            .get("publicKey")
            .and_then(|k| k.get("id"))
            .and_then(|v| v.as_str())
            .map(String::from);
        let public_key_pem = json
            .get("publicKey")
            .and_then(|k| k.get("publicKeyPem"))
            .and_then(|v| v.as_str())
            .map(String::from);

        let ed25519_public_key_multibase = json
            .get("assertionMethod")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|m| m.get("publicKeyMultibase"))
            .and_then(|v| v.as_str())
            .map(String::from);

        let also_known_as = json
            .get("alsoKnownAs")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).map(String::from).collect())
            .unwrap_or_default();

        let moved_to = json.get("movedTo").and_then(|v| v.as_str()).map(String::from);

        if public_key_pem.is_none() && ed25519_public_key_multibase.is_none() {
            return None;
        }

        Some(Self {
            id,
            actor_type,
            preferred_username,
            name,
            summary,
            inbox,
            shared_inbox,
            outbox,
            followers,
            public_key_id,
            public_key_pem,
            ed25519_public_key_multibase,
            also_known_as,
            moved_to,
            host: host.to_string(),
            cached_at: chrono::Utc::now(),
        })
    }

    /// Whether this entry is older than the given TTL.
    #[must_use]
    pub fn is_stale(&self, ttl_secs: i64) -> bool {
        chrono::Utc::now().signed_duration_since(self.cached_at).num_seconds() > ttl_secs
    }
}

/// Remote actor cache, Redis-backed.
#[derive(Clone)]
pub struct RemoteActorCache {
    redis: Arc<RedisClient>,
    ttl_secs: i64,
}

impl RemoteActorCache {
    /// Build a cache with the default 24-hour TTL.
    #[must_use]
    pub const fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis, ttl_secs: DEFAULT_CACHE_TTL_SECS }
    }

    /// Build a cache with a custom TTL.
    #[must_use]
    pub const fn with_ttl(redis: Arc<RedisClient>, ttl: Duration) -> Self {
        Self { redis, ttl_secs: ttl.as_secs() as i64 }
    }

    fn cache_key(actor_url: &str) -> String {
        format!("remote_actor:{actor_url}")
    }

    fn failed_key(actor_url: &str) -> String {
        format!("remote_actor_failed:{actor_url}")
    }

    /// Look up a cached actor by id URL.
    pub async fn get(&self, actor_url: &str) -> Result<Option<CachedRemoteActor>, CacheError> {
        let key = Self::cache_key(actor_url);
        let result: Option<String> = self.redis.get(key).await.map_err(|e| CacheError::Redis(e.to_string()))?;

        let Some(json_str) = result else {
            debug!(actor_url = %actor_url, "cache miss for remote actor");
            return Ok(None);
        };

        let actor: CachedRemoteActor =
            serde_json::from_str(&json_str).map_err(|e| CacheError::Serialization(e.to_string()))?;

        if actor.is_stale(self.ttl_secs) {
            debug!(actor_url = %actor_url, "cache entry is stale");
            return Ok(None);
        }

        debug!(actor_url = %actor_url, "cache hit for remote actor");
        Ok(Some(actor))
    }

    /// Whether a lookup for this actor URL recently failed.
    pub async fn is_failed_lookup(&self, actor_url: &str) -> Result<bool, CacheError> {
        let exists: i64 = self
            .redis
            .exists(Self::failed_key(actor_url))
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;
        Ok(exists > 0)
    }

    /// Store a resolved actor.
    pub async fn set(&self, actor: &CachedRemoteActor) -> Result<(), CacheError> {
        let key = Self::cache_key(&actor.id);
        let json_str = serde_json::to_string(actor).map_err(|e| CacheError::Serialization(e.to_string()))?;

        self.redis
            .set::<(), _, _>(key, json_str, Some(Expiration::EX(self.ttl_secs)), None, false)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;

        info!(actor_url = %actor.id, host = %actor.host, "cached remote actor");
        Ok(())
    }

    /// Record a failed lookup in the negative cache.
    pub async fn set_failed(&self, actor_url: &str) -> Result<(), CacheError> {
        self.redis
            .set::<(), _, _>(Self::failed_key(actor_url), "1", Some(Expiration::EX(FAILED_LOOKUP_TTL_SECS)), None, false)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;

        warn!(actor_url = %actor_url, "marked actor lookup as failed");
        Ok(())
    }

    /// Drop a cached actor, e.g. on receiving an `Update` or a 410 `Gone`.
    pub async fn invalidate(&self, actor_url: &str) -> Result<(), CacheError> {
        self.redis
            .del::<(), _>(Self::cache_key(actor_url))
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;
        info!(actor_url = %actor_url, "invalidated cached remote actor");
        Ok(())
    }

    /// Clear a negative-cache entry, e.g. after a manual retry.
    pub async fn clear_failed(&self, actor_url: &str) -> Result<(), CacheError> {
        self.redis
            .del::<(), _>(Self::failed_key(actor_url))
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;
        Ok(())
    }
}

/// Cache error type.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}
