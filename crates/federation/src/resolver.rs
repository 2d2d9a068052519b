//! The Resolver: turns an actor reference into a local row.
//!
//! Accepts three reference shapes: an absolute actor id URL, a
//! `name@host` handle (resolved through `WebFinger`), and a `did:key:...`
//! portable identity (resolved strictly from what's already known locally,
//! since a did:key carries no host to fetch from). A single in-flight
//! fetch per URL is enforced so a burst of inbound activities naming the
//! same unknown actor doesn't stampede the remote server.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::sync::Arc;

use plaza_common::{decode_ed25519_multibase, ed25519_did_key, AppError, IdGenerator};
use plaza_store::entities::actor::{self, ActorKind};
use plaza_store::entities::actor_key::{self, KeyAlgorithm};
use plaza_store::repositories::{ActorKeyRepository, ActorRepository};
use serde_json::Value;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CachedRemoteActor, RemoteActorCache};
use crate::client::{ApClient, ApClientError};

/// How long a resolved remote actor row is trusted before it's refetched.
const REFRESH_AFTER_SECS: i64 = 24 * 60 * 60;

/// Error type for actor resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("malformed actor reference: {0}")]
    InvalidReference(String),
    #[error("webfinger lookup failed: {0}")]
    WebfingerFailed(String),
    #[error("actor not found: {0}")]
    NotFound(String),
    #[error("actor is permanently gone: {0}")]
    Gone(String),
    #[error("federation error: {0}")]
    Federation(String),
    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<ApClientError> for ResolveError {
    fn from(err: ApClientError) -> Self {
        match err {
            ApClientError::Gone(url) => Self::Gone(url),
            other => Self::Federation(other.to_string()),
        }
    }
}

/// Per-key single-flight guard so concurrent resolutions of the same
/// reference share one outbound fetch.
#[derive(Default)]
struct SingleFlight {
    inflight: Mutex<HashMap<String, Arc<Notify>>>,
}

impl SingleFlight {
    /// Returns `true` if the caller owns the fetch for `key` and must call
    /// [`Self::leave`] when done. Returns `false` if another caller already
    /// owns it and this call waited for it to finish.
    async fn enter(&self, key: &str) -> bool {
        let notify = {
            let mut map = self.inflight.lock().await;
            if let Some(existing) = map.get(key) {
                Some(existing.clone())
            } else {
                map.insert(key.to_string(), Arc::new(Notify::new()));
                None
            }
        };

        match notify {
            Some(n) => {
                n.notified().await;
                false
            }
            None => true,
        }
    }

    async fn leave(&self, key: &str) {
        let mut map = self.inflight.lock().await;
        if let Some(notify) = map.remove(key) {
            notify.notify_waiters();
        }
    }
}

/// Resolves actor references to local rows, fetching and caching from the
/// origin server when the reference names a remote actor not yet known.
#[derive(Clone)]
pub struct Resolver {
    actor_repo: ActorRepository,
    actor_key_repo: ActorKeyRepository,
    cache: RemoteActorCache,
    client: ApClient,
    id_gen: IdGenerator,
    single_flight: Arc<SingleFlight>,
}

impl Resolver {
    /// Build a new resolver.
    #[must_use]
    pub fn new(
        actor_repo: ActorRepository,
        actor_key_repo: ActorKeyRepository,
        cache: RemoteActorCache,
        client: ApClient,
    ) -> Self {
        Self {
            actor_repo,
            actor_key_repo,
            cache,
            client,
            id_gen: IdGenerator::new(),
            single_flight: Arc::new(SingleFlight::default()),
        }
    }

    /// Resolve an actor reference, fetching it if it's remote and unknown.
    pub async fn resolve(&self, reference: &str) -> Result<actor::Model, ResolveError> {
        if let Some(did_key) = reference.strip_prefix("did:key:") {
            return self.resolve_did_key(did_key).await;
        }

        if reference.starts_with("http://") || reference.starts_with("https://") {
            let url = Url::parse(reference)
                .map_err(|e| ResolveError::InvalidReference(format!("{reference}: {e}")))?;
            return self.resolve_url(&url).await;
        }

        let handle = reference.strip_prefix('@').unwrap_or(reference);
        let (name, host) = handle
            .split_once('@')
            .ok_or_else(|| ResolveError::InvalidReference(format!("not a URL, handle or did:key: {reference}")))?;

        self.resolve_handle(name, host).await
    }

    async fn resolve_did_key(&self, did_key: &str) -> Result<actor::Model, ResolveError> {
        self.actor_repo
            .find_by_did_key(&format!("did:key:{did_key}"))
            .await?
            .ok_or_else(|| ResolveError::NotFound(format!("did:key:{did_key}")))
    }

    async fn resolve_handle(&self, name: &str, host: &str) -> Result<actor::Model, ResolveError> {
        if let Some(actor) = self.actor_repo.find_by_username_and_host(name, Some(host)).await? {
            if !is_stale(&actor) {
                return Ok(actor);
            }
        }

        let acct = format!("{name}@{host}");
        let jrd = self.client.webfinger(&acct, host).await?;

        let actor_url = jrd
            .get("links")
            .and_then(Value::as_array)
            .and_then(|links| {
                links.iter().find(|l| {
                    l.get("rel").and_then(Value::as_str) == Some("self")
                        && l.get("type")
                            .and_then(Value::as_str)
                            .is_some_and(|t| t.contains("activity+json") || t.contains("ld+json"))
                })
            })
            .and_then(|l| l.get("href"))
            .and_then(Value::as_str)
            .ok_or_else(|| ResolveError::WebfingerFailed(format!("no self link in webfinger response for {acct}")))?;

        let url = Url::parse(actor_url)
            .map_err(|e| ResolveError::WebfingerFailed(format!("invalid self link {actor_url}: {e}")))?;

        self.resolve_url(&url).await
    }

    async fn resolve_url(&self, url: &Url) -> Result<actor::Model, ResolveError> {
        let key = url.as_str().to_string();

        loop {
            if let Some(actor) = self.actor_repo.find_by_uri(url.as_str()).await? {
                if !is_stale(&actor) {
                    return Ok(actor);
                }
            }

            if self.single_flight.enter(&key).await {
                let result = self.fetch_and_upsert(url).await;
                self.single_flight.leave(&key).await;
                return result;
            }
            // Lost the race: the owner just finished, loop back and re-read the row.
        }
    }

    async fn fetch_and_upsert(&self, url: &Url) -> Result<actor::Model, ResolveError> {
        if self.cache.is_failed_lookup(url.as_str()).await.unwrap_or(false) {
            return Err(ResolveError::NotFound(url.to_string()));
        }

        info!(actor_url = %url, "fetching remote actor");
        let json = match self.client.fetch_actor(url.as_str()).await {
            Ok(json) => json,
            Err(ApClientError::Gone(gone_url)) => {
                let _ = self.cache.set_failed(url.as_str()).await;
                return Err(ResolveError::Gone(gone_url));
            }
            Err(e) => {
                let _ = self.cache.set_failed(url.as_str()).await;
                return Err(ResolveError::Federation(e.to_string()));
            }
        };

        let returned_id = json
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ResolveError::InvalidReference("actor document has no id".to_string()))?;

        // One alias-redirect hop: a server may answer a lookup for an old id
        // with the document for its current one.
        let url = if returned_id != url.as_str() {
            debug!(requested = %url, returned = %returned_id, "actor id differs from requested URL, following once");
            Url::parse(returned_id)
                .map_err(|e| ResolveError::InvalidReference(format!("actor id {returned_id} is not a URL: {e}")))?
        } else {
            url.clone()
        };

        let host = url
            .host_str()
            .ok_or_else(|| ResolveError::InvalidReference("actor URL has no host".to_string()))?
            .to_string();

        let cached = CachedRemoteActor::from_json(&json, &host)
            .ok_or_else(|| ResolveError::InvalidReference("actor document carries no recognized public key".to_string()))?;

        let _ = self.cache.set(&cached).await;

        self.upsert_actor(&json, &cached, &url).await.map_err(ResolveError::from)
    }

    async fn upsert_actor(
        &self,
        json: &Value,
        cached: &CachedRemoteActor,
        url: &Url,
    ) -> Result<actor::Model, AppError> {
        let host = url.host_str().unwrap_or_default().to_string();
        let now = chrono::Utc::now();

        let kind = match json.get("type").and_then(Value::as_str) {
            Some("Service") => ActorKind::Service,
            Some("Application") => ActorKind::Application,
            Some("Group") => ActorKind::Group,
            _ => ActorKind::Person,
        };

        let also_known_as = serde_json::to_value(&cached.also_known_as).unwrap_or_else(|_| serde_json::json!([]));

        let did_key = cached
            .ed25519_public_key_multibase
            .as_deref()
            .and_then(|mb| decode_ed25519_multibase(mb).ok())
            .map(|key| ed25519_did_key(&key));

        let existing = self.actor_repo.find_by_uri(url.as_str()).await?;

        let actor = if let Some(existing) = existing {
            let mut active: actor::ActiveModel = existing.into();
            active.kind = sea_orm::Set(kind);
            active.name = sea_orm::Set(cached.name.clone());
            active.summary = sea_orm::Set(cached.summary.clone());
            active.inbox = sea_orm::Set(Some(cached.inbox.clone()));
            active.outbox = sea_orm::Set(cached.outbox.clone());
            active.followers_url = sea_orm::Set(cached.followers.clone());
            active.shared_inbox = sea_orm::Set(cached.shared_inbox.clone());
            active.also_known_as = sea_orm::Set(also_known_as);
            active.moved_to = sea_orm::Set(cached.moved_to.clone());
            active.did_key = sea_orm::Set(did_key);
            active.last_fetched_at = sea_orm::Set(Some(now.into()));
            active.updated_at = sea_orm::Set(Some(now.into()));
            self.actor_repo.update(active).await?
        } else {
            let model = actor::ActiveModel {
                id: sea_orm::Set(self.id_gen.generate()),
                kind: sea_orm::Set(kind),
                preferred_username: sea_orm::Set(cached.preferred_username.clone()),
                username_lower: sea_orm::Set(cached.preferred_username.to_lowercase()),
                host: sea_orm::Set(Some(host)),
                name: sea_orm::Set(cached.name.clone()),
                summary: sea_orm::Set(cached.summary.clone()),
                inbox: sea_orm::Set(Some(cached.inbox.clone())),
                outbox: sea_orm::Set(cached.outbox.clone()),
                followers_url: sea_orm::Set(cached.followers.clone()),
                shared_inbox: sea_orm::Set(cached.shared_inbox.clone()),
                manually_approves_followers: sea_orm::Set(
                    json.get("manuallyApprovesFollowers").and_then(Value::as_bool).unwrap_or(false),
                ),
                also_known_as: sea_orm::Set(also_known_as),
                moved_to: sea_orm::Set(cached.moved_to.clone()),
                did_key: sea_orm::Set(did_key),
                uri: sea_orm::Set(Some(url.to_string())),
                last_fetched_at: sea_orm::Set(Some(now.into())),
                created_at: sea_orm::Set(now.into()),
                ..Default::default()
            };
            self.actor_repo.create(model).await?
        };

        self.persist_keys(&actor.id, cached).await?;

        info!(actor_id = %actor.id, host = ?actor.host, "resolved remote actor");
        Ok(actor)
    }

    async fn persist_keys(&self, actor_id: &str, cached: &CachedRemoteActor) -> Result<(), AppError> {
        if let (Some(key_id), Some(pem)) = (&cached.public_key_id, &cached.public_key_pem) {
            if self.actor_key_repo.find_by_key_id(key_id).await?.is_none() {
                let model = actor_key::ActiveModel {
                    key_id: sea_orm::Set(key_id.clone()),
                    actor_id: sea_orm::Set(actor_id.to_string()),
                    algorithm: sea_orm::Set(KeyAlgorithm::Rsa),
                    public_key: sea_orm::Set(pem.clone()),
                    private_key: sea_orm::Set(None),
                    created_at: sea_orm::Set(chrono::Utc::now().into()),
                };
                self.actor_key_repo.create(model).await?;
            }
        }

        if let Some(multibase) = &cached.ed25519_public_key_multibase {
            let key_id = format!("{}#ed25519-key", cached.id);
            if self.actor_key_repo.find_by_key_id(&key_id).await?.is_none() {
                let model = actor_key::ActiveModel {
                    key_id: sea_orm::Set(key_id),
                    actor_id: sea_orm::Set(actor_id.to_string()),
                    algorithm: sea_orm::Set(KeyAlgorithm::Ed25519),
                    public_key: sea_orm::Set(multibase.clone()),
                    private_key: sea_orm::Set(None),
                    created_at: sea_orm::Set(chrono::Utc::now().into()),
                };
                self.actor_key_repo.create(model).await?;
            }
        }

        Ok(())
    }
}

fn is_stale(actor: &actor::Model) -> bool {
    actor.last_fetched_at.is_none_or(|last| {
        chrono::Utc::now().signed_duration_since(last).num_seconds() > REFRESH_AFTER_SECS
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_flight_second_caller_waits_for_first() {
        let flight = SingleFlight::default();
        assert!(flight.enter("k").await);
        let flight = Arc::new(flight);
        let flight2 = flight.clone();
        let waiter = tokio::spawn(async move { flight2.enter("k").await });
        tokio::task::yield_now().await;
        flight.leave("k").await;
        assert!(!waiter.await.unwrap());
    }

    #[test]
    fn invalid_reference_is_rejected() {
        let err = ResolveError::InvalidReference("garbage".to_string());
        assert!(err.to_string().contains("garbage"));
    }
}
