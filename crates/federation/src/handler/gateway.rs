//! Portable (`did:key`) actor gateway endpoints.
//!
//! A portable actor's home keys live with the actor itself rather than a
//! single instance, so any instance willing to act as its gateway can serve
//! its actor document and collections at
//! `/.well-known/apgateway/{did}/actor...` under that gateway's own host.
//! The first request against a host registers it as a gateway for the actor.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::Host;
use chrono::Utc;
use plaza_common::IdGenerator;
use plaza_store::entities::portable_gateway;
use plaza_store::repositories::{ActorRepository, FollowRepository, PortableGatewayRepository};
use sea_orm::Set;
use tracing::{error, info, warn};
use url::Url;

use crate::actors::{ApPerson, ApVerificationMethod};
use crate::handler::collections::CollectionQuery;
use crate::inbox::InboxState;

/// State required for the portable-actor gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub actor_repo: ActorRepository,
    pub follow_repo: FollowRepository,
    pub gateway_repo: PortableGatewayRepository,
    pub inbox: InboxState,
    pub id_gen: IdGenerator,
}

impl GatewayState {
    /// Create a new gateway state.
    #[must_use]
    pub fn new(
        actor_repo: ActorRepository,
        follow_repo: FollowRepository,
        gateway_repo: PortableGatewayRepository,
        inbox: InboxState,
    ) -> Self {
        Self { actor_repo, follow_repo, gateway_repo, inbox, id_gen: IdGenerator::new() }
    }

    fn actor_url(host: &str, did: &str) -> Url {
        Url::parse(&format!("https://{host}/.well-known/apgateway/{did}/actor")).expect("valid URL")
    }
}

async fn register_gateway(state: &GatewayState, actor_id: &str, host: &str) {
    match state.gateway_repo.find_by_actor_and_host(actor_id, host).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            let model = portable_gateway::ActiveModel {
                id: Set(state.id_gen.generate()),
                actor_id: Set(actor_id.to_string()),
                host: Set(host.to_string()),
                registered_at: Set(Utc::now().into()),
            };
            if let Err(e) = state.gateway_repo.create(model).await {
                warn!(error = %e, actor_id, host, "failed to register gateway host");
            }
        }
        Err(e) => warn!(error = %e, actor_id, host, "failed to look up gateway registration"),
    }
}

/// Handle GET /.well-known/apgateway/{did}/actor.
pub async fn actor_handler(
    State(state): State<GatewayState>,
    Host(host): Host,
    Path(did): Path<String>,
) -> impl IntoResponse {
    info!(did = %did, host = %host, "portable actor gateway lookup");

    let did_key = format!("did:key:{did}");
    let actor = match state.actor_repo.find_by_did_key(&did_key).await {
        Ok(Some(a)) => a,
        Ok(None) => return (StatusCode::NOT_FOUND, "actor not found").into_response(),
        Err(e) => {
            error!(error = %e, "failed to fetch portable actor");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };

    if actor.is_suspended {
        return (StatusCode::GONE, "actor is suspended").into_response();
    }

    register_gateway(&state, &actor.id, &host).await;

    let id = GatewayState::actor_url(&host, &did);
    let inbox = Url::parse(&format!("{id}/inbox")).expect("valid URL");
    let outbox = Url::parse(&format!("{id}/outbox")).expect("valid URL");
    let followers = Url::parse(&format!("{id}/followers")).expect("valid URL");

    let mut person = ApPerson::new(id.clone(), actor.preferred_username.clone(), inbox, outbox);
    person.name = actor.name.clone();
    person.summary = actor.summary.clone();
    person.followers = Some(followers);
    person.manually_approves_followers = Some(actor.manually_approves_followers);

    if let Some(ref did_key) = actor.did_key {
        person.assertion_method = Some(vec![ApVerificationMethod {
            id: format!("{id}#ed25519-key"),
            kind: "Multikey".to_string(),
            controller: id.clone(),
            public_key_multibase: did_key.strip_prefix("did:key:").unwrap_or(did_key).to_string(),
        }]);
    }

    (StatusCode::OK, [("Content-Type", "application/activity+json; charset=utf-8")], Json(person)).into_response()
}

/// Handle POST /.well-known/apgateway/{did}/actor/inbox.
///
/// Inbound activities for portable actors go through the same dispatch
/// pipeline as any other inbox; this endpoint exists only to resolve the
/// `did` path segment to the concrete actor id before handing off.
pub async fn inbox_handler(
    State(state): State<GatewayState>,
    Host(host): Host,
    Path(did): Path<String>,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    let did_key = format!("did:key:{did}");

    let actor = match state.actor_repo.find_by_did_key(&did_key).await {
        Ok(Some(a)) => a,
        Ok(None) => return (StatusCode::NOT_FOUND, "actor not found").into_response(),
        Err(e) => {
            error!(error = %e, "failed to fetch portable actor");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };

    register_gateway(&state, &actor.id, &host).await;

    crate::inbox::deliver_to_actor(&state.inbox, &actor, &body).await.into_response()
}

/// Handle GET /.well-known/apgateway/{did}/actor/outbox.
pub async fn outbox_handler(
    State(state): State<GatewayState>,
    Host(host): Host,
    Path(did): Path<String>,
    Query(_query): Query<CollectionQuery>,
) -> impl IntoResponse {
    let did_key = format!("did:key:{did}");

    match state.actor_repo.find_by_did_key(&did_key).await {
        Ok(Some(_)) => {}
        Ok(None) => return (StatusCode::NOT_FOUND, "actor not found").into_response(),
        Err(e) => {
            error!(error = %e, "failed to fetch portable actor");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    }

    let outbox_url = format!("{}/outbox", GatewayState::actor_url(&host, &did));
    let collection = crate::handler::collections::OrderedCollection {
        context: serde_json::json!(["https://www.w3.org/ns/activitystreams"]),
        kind: "OrderedCollection".to_string(),
        id: outbox_url.clone(),
        total_items: 0,
        first: format!("{outbox_url}?page=true"),
    };

    (StatusCode::OK, [("Content-Type", "application/activity+json; charset=utf-8")], Json(collection)).into_response()
}

/// Handle GET /.well-known/apgateway/{did}/actor/followers.
pub async fn followers_handler(
    State(state): State<GatewayState>,
    Host(host): Host,
    Path(did): Path<String>,
) -> impl IntoResponse {
    let did_key = format!("did:key:{did}");

    let actor = match state.actor_repo.find_by_did_key(&did_key).await {
        Ok(Some(a)) => a,
        Ok(None) => return (StatusCode::NOT_FOUND, "actor not found").into_response(),
        Err(e) => {
            error!(error = %e, "failed to fetch portable actor");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };

    let total = match state.follow_repo.count_followers(&actor.id).await {
        Ok(n) => n,
        Err(e) => {
            error!(error = %e, "failed to count followers");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };

    let followers_url = format!("{}/followers", GatewayState::actor_url(&host, &did));
    let collection = crate::handler::collections::OrderedCollection {
        context: serde_json::json!(["https://www.w3.org/ns/activitystreams"]),
        kind: "OrderedCollection".to_string(),
        id: followers_url.clone(),
        total_items: total,
        first: format!("{followers_url}?page=true"),
    };

    (StatusCode::OK, [("Content-Type", "application/activity+json; charset=utf-8")], Json(collection)).into_response()
}
