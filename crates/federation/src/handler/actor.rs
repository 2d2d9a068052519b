//! `ActivityPub` actor (Person) endpoint handler.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use plaza_store::entities::actor_key::KeyAlgorithm;
use plaza_store::repositories::{ActorKeyRepository, ActorRepository};
use tracing::{error, info};
use url::Url;

use crate::convert::{UrlConfig, UserToApPerson};

/// State required for the actor `ActivityPub` handler.
#[derive(Clone)]
pub struct ActorApState {
    pub actor_repo: ActorRepository,
    pub key_repo: ActorKeyRepository,
    pub url_config: UrlConfig,
}

impl ActorApState {
    /// Create a new actor AP state.
    #[must_use]
    pub const fn new(actor_repo: ActorRepository, key_repo: ActorKeyRepository, base_url: Url) -> Self {
        Self { actor_repo, key_repo, url_config: UrlConfig::new(base_url) }
    }
}

/// Handle GET /user/{name} for `ActivityPub` Person retrieval.
///
/// Only local actors are served here; remote actors live at their own
/// origin and should be fetched from there.
pub async fn user_handler(State(state): State<ActorApState>, Path(name): Path<String>) -> impl IntoResponse {
    info!(name = %name, "ActivityPub actor lookup");

    let actor = match state.actor_repo.find_by_username_and_host(&name, None).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            info!(name = %name, "actor not found");
            return (StatusCode::NOT_FOUND, "actor not found").into_response();
        }
        Err(e) => {
            error!(error = %e, "failed to fetch actor");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };

    if actor.is_suspended {
        return (StatusCode::GONE, "actor is suspended").into_response();
    }

    let keys = match state.key_repo.find_by_actor_id(&actor.id).await {
        Ok(keys) => keys,
        Err(e) => {
            error!(error = %e, actor_id = %actor.id, "failed to fetch actor keys");
            Vec::new()
        }
    };

    let public_key_pem =
        keys.iter().find(|k| k.algorithm == KeyAlgorithm::Rsa).map(|k| k.public_key.as_str());
    let ed25519_multibase =
        keys.iter().find(|k| k.algorithm == KeyAlgorithm::Ed25519).map(|k| k.public_key.as_str());

    let person = actor.to_ap_person(&state.url_config, public_key_pem, ed25519_multibase);

    (StatusCode::OK, [("Content-Type", "application/activity+json; charset=utf-8")], Json(person))
        .into_response()
}
