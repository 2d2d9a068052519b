//! `ActivityPub` Collection handlers (Outbox, Followers).

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use plaza_store::repositories::{ActorRepository, FollowRepository, NoteAttachmentRepository, NoteRepository, NoteTagRepository};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use url::Url;

use crate::activities::CreateActivity;
use crate::convert::{NoteToApNote, UrlConfig};

const PAGE_SIZE: u64 = 20;

/// State required for collection handlers.
#[derive(Clone)]
pub struct CollectionState {
    pub actor_repo: ActorRepository,
    pub note_repo: NoteRepository,
    pub attachment_repo: NoteAttachmentRepository,
    pub tag_repo: NoteTagRepository,
    pub follow_repo: FollowRepository,
    pub url_config: UrlConfig,
}

impl CollectionState {
    /// Create a new collection state.
    #[must_use]
    pub const fn new(
        actor_repo: ActorRepository,
        note_repo: NoteRepository,
        attachment_repo: NoteAttachmentRepository,
        tag_repo: NoteTagRepository,
        follow_repo: FollowRepository,
        base_url: Url,
    ) -> Self {
        Self { actor_repo, note_repo, attachment_repo, tag_repo, follow_repo, url_config: UrlConfig::new(base_url) }
    }
}

/// Query parameters shared by collection pages.
#[derive(Debug, Deserialize)]
pub struct CollectionQuery {
    pub page: Option<bool>,
    pub offset: Option<u64>,
}

/// `ActivityPub` `OrderedCollection`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedCollection {
    #[serde(rename = "@context")]
    pub context: serde_json::Value,
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub total_items: u64,
    pub first: String,
}

/// `ActivityPub` `OrderedCollectionPage`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedCollectionPage {
    #[serde(rename = "@context")]
    pub context: serde_json::Value,
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub part_of: String,
    pub ordered_items: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

fn activitystreams_context() -> serde_json::Value {
    serde_json::json!(["https://www.w3.org/ns/activitystreams"])
}

/// Handle GET /outbox/{name}.
pub async fn outbox_handler(
    State(state): State<CollectionState>,
    Path(name): Path<String>,
    Query(query): Query<CollectionQuery>,
) -> impl IntoResponse {
    info!(name = %name, "outbox request");

    let actor = match state.actor_repo.find_by_username_and_host(&name, None).await {
        Ok(Some(a)) => a,
        Ok(None) => return (StatusCode::NOT_FOUND, "actor not found").into_response(),
        Err(e) => {
            error!(error = %e, "failed to fetch actor");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };

    let outbox_url = state.url_config.outbox_url(&name).to_string();

    if query.page != Some(true) {
        let total = match state.note_repo.count_public_by_actor(&actor.id).await {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "failed to count notes");
                return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
            }
        };

        let collection = OrderedCollection {
            context: activitystreams_context(),
            kind: "OrderedCollection".to_string(),
            id: outbox_url.clone(),
            total_items: total,
            first: format!("{outbox_url}?page=true"),
        };

        return (StatusCode::OK, [("Content-Type", "application/activity+json; charset=utf-8")], Json(collection))
            .into_response();
    }

    let offset = query.offset.unwrap_or(0);
    let notes = match state.note_repo.find_public_by_actor(&actor.id, PAGE_SIZE, offset).await {
        Ok(n) => n,
        Err(e) => {
            error!(error = %e, "failed to list notes");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };

    let mut ordered_items = Vec::with_capacity(notes.len());
    for note in &notes {
        let tags = state.tag_repo.find_by_note_id(&note.id).await.unwrap_or_default();
        let attachments = state.attachment_repo.find_by_note_id(&note.id).await.unwrap_or_default();
        let ap_note = note.to_ap_note(&state.url_config, &name, &tags, &attachments);
        let activity = CreateActivity::new(
            state.url_config.base_url.join(&format!("/post/{}/activity", note.id)).expect("valid URL"),
            state.url_config.user_url(&name),
            ap_note,
            note.published_at.with_timezone(&chrono::Utc),
        );
        ordered_items.push(serde_json::to_value(activity).unwrap_or(serde_json::Value::Null));
    }

    let next =
        (notes.len() as u64 == PAGE_SIZE).then(|| format!("{outbox_url}?page=true&offset={}", offset + PAGE_SIZE));

    let page = OrderedCollectionPage {
        context: activitystreams_context(),
        kind: "OrderedCollectionPage".to_string(),
        id: format!("{outbox_url}?page=true&offset={offset}"),
        part_of: outbox_url,
        ordered_items,
        next,
    };

    (StatusCode::OK, [("Content-Type", "application/activity+json; charset=utf-8")], Json(page)).into_response()
}

/// Handle GET /followers/{name}.
pub async fn followers_handler(
    State(state): State<CollectionState>,
    Path(name): Path<String>,
    Query(query): Query<CollectionQuery>,
) -> impl IntoResponse {
    info!(name = %name, "followers request");

    let actor = match state.actor_repo.find_by_username_and_host(&name, None).await {
        Ok(Some(a)) => a,
        Ok(None) => return (StatusCode::NOT_FOUND, "actor not found").into_response(),
        Err(e) => {
            error!(error = %e, "failed to fetch actor");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };

    let followers_url = state.url_config.followers_url(&name).to_string();

    if query.page != Some(true) {
        let total = match state.follow_repo.count_followers(&actor.id).await {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "failed to count followers");
                return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
            }
        };

        let collection = OrderedCollection {
            context: activitystreams_context(),
            kind: "OrderedCollection".to_string(),
            id: followers_url.clone(),
            total_items: total,
            first: format!("{followers_url}?page=true"),
        };

        return (StatusCode::OK, [("Content-Type", "application/activity+json; charset=utf-8")], Json(collection))
            .into_response();
    }

    let follows = match state.follow_repo.find_followers(&actor.id, PAGE_SIZE, None).await {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, "failed to list followers");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };

    let follower_ids: Vec<String> = follows.iter().map(|f| f.follower_id.clone()).collect();
    let followers = match state.actor_repo.find_by_ids(&follower_ids).await {
        Ok(a) => a,
        Err(e) => {
            error!(error = %e, "failed to resolve followers");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };

    let ordered_items: Vec<serde_json::Value> = followers
        .iter()
        .filter_map(|a| a.uri.clone().or_else(|| Some(state.url_config.user_url(&a.preferred_username).to_string())))
        .map(serde_json::Value::String)
        .collect();

    let page = OrderedCollectionPage {
        context: activitystreams_context(),
        kind: "OrderedCollectionPage".to_string(),
        id: format!("{followers_url}?page=true"),
        part_of: followers_url,
        ordered_items,
        next: None,
    };

    (StatusCode::OK, [("Content-Type", "application/activity+json; charset=utf-8")], Json(page)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_has_no_extension_terms() {
        let ctx = activitystreams_context();
        assert_eq!(ctx, serde_json::json!(["https://www.w3.org/ns/activitystreams"]));
    }
}
