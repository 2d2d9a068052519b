//! `ActivityPub` note (Note/Question object) endpoint handler.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect},
};
use plaza_store::repositories::{ActorRepository, NoteAttachmentRepository, NoteRepository, NoteTagRepository};
use tracing::{error, info};
use url::Url;

use crate::convert::{NoteToApNote, UrlConfig};

/// State required for the note `ActivityPub` handler.
#[derive(Clone)]
pub struct NoteApState {
    pub note_repo: NoteRepository,
    pub actor_repo: ActorRepository,
    pub attachment_repo: NoteAttachmentRepository,
    pub tag_repo: NoteTagRepository,
    pub url_config: UrlConfig,
}

impl NoteApState {
    /// Create a new note AP state.
    #[must_use]
    pub const fn new(
        note_repo: NoteRepository,
        actor_repo: ActorRepository,
        attachment_repo: NoteAttachmentRepository,
        tag_repo: NoteTagRepository,
        base_url: Url,
    ) -> Self {
        Self { note_repo, actor_repo, attachment_repo, tag_repo, url_config: UrlConfig::new(base_url) }
    }
}

/// True if the request's `Accept` header prefers HTML over `ActivityPub` JSON.
fn prefers_html(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let html_pos = accept.find("text/html");
    let ap_pos = accept.find("application/activity+json").or_else(|| accept.find("application/ld+json"));

    match (html_pos, ap_pos) {
        (Some(h), Some(a)) => h < a,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Handle GET /post/{hash}.
///
/// Serves the note as an `ActivityPub` object, or redirects browsers to the
/// (out of scope) HTML renderer when the `Accept` header prefers it.
pub async fn note_handler(
    State(state): State<NoteApState>,
    Path(hash): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    info!(note_id = %hash, "ActivityPub note lookup");

    if prefers_html(&headers) {
        return Redirect::temporary(&format!("/web/post/{hash}")).into_response();
    }

    let note = match state.note_repo.find_by_id(&hash).await {
        Ok(Some(n)) => n,
        Ok(None) => return (StatusCode::NOT_FOUND, "note not found").into_response(),
        Err(e) => {
            error!(error = %e, "failed to fetch note");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };

    if note.deleted {
        return (StatusCode::GONE, "note was deleted").into_response();
    }

    if note.visibility != plaza_store::entities::note::Visibility::Public {
        return (StatusCode::NOT_FOUND, "note not found").into_response();
    }

    let author = match state.actor_repo.find_by_id(&note.actor_id).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            error!(actor_id = %note.actor_id, "note author missing");
            return (StatusCode::INTERNAL_SERVER_ERROR, "author missing").into_response();
        }
        Err(e) => {
            error!(error = %e, "failed to fetch author");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };

    let tags = state.tag_repo.find_by_note_id(&note.id).await.unwrap_or_default();
    let attachments = state.attachment_repo.find_by_note_id(&note.id).await.unwrap_or_default();

    let ap_note = note.to_ap_note(&state.url_config, &author.preferred_username, &tags, &attachments);

    (StatusCode::OK, [("Content-Type", "application/activity+json; charset=utf-8")], Json(ap_note)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_html_when_it_precedes_activity_json() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, "text/html,application/activity+json;q=0.9".parse().unwrap());
        assert!(prefers_html(&headers));
    }

    #[test]
    fn prefers_ap_when_only_activity_json_present() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, "application/activity+json".parse().unwrap());
        assert!(!prefers_html(&headers));
    }

    #[test]
    fn defaults_to_ap_with_no_accept_header() {
        assert!(!prefers_html(&HeaderMap::new()));
    }
}
