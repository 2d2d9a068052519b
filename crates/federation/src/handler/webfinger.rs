//! `WebFinger` handler for actor discovery.

#![allow(clippy::expect_used)] // URL joins with known-valid paths cannot fail

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use plaza_store::repositories::ActorRepository;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

/// `WebFinger` query parameters.
#[derive(Debug, Deserialize)]
pub struct WebfingerQuery {
    pub resource: String,
}

/// `WebFinger` response.
#[derive(Debug, Serialize)]
pub struct WebfingerResponse {
    pub subject: String,
    pub aliases: Vec<String>,
    pub links: Vec<WebfingerLink>,
}

/// `WebFinger` link.
#[derive(Debug, Serialize)]
pub struct WebfingerLink {
    pub rel: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// State required for `WebFinger` handler.
#[derive(Clone)]
pub struct WebfingerState {
    pub domain: String,
    pub base_url: Url,
    pub actor_repo: ActorRepository,
}

impl WebfingerState {
    /// Create a new `WebFinger` state.
    #[must_use]
    pub const fn new(domain: String, base_url: Url, actor_repo: ActorRepository) -> Self {
        Self { domain, base_url, actor_repo }
    }
}

/// Parse an `acct:username@domain` resource into its parts.
fn parse_resource(resource: &str) -> Option<(String, String)> {
    let resource = resource.strip_prefix("acct:")?;
    let (username, domain) = resource.split_once('@')?;
    Some((username.to_string(), domain.to_string()))
}

/// Handle `WebFinger` requests.
///
/// `WebFinger` is used to discover `ActivityPub` actors from their username.
/// Example: `/.well-known/webfinger?resource=acct:user@example.com`
pub async fn webfinger_handler(
    State(state): State<WebfingerState>,
    Query(query): Query<WebfingerQuery>,
) -> impl IntoResponse {
    info!(resource = %query.resource, "WebFinger lookup");

    let Some((username, domain)) = parse_resource(&query.resource) else {
        return (StatusCode::BAD_REQUEST, "invalid resource format").into_response();
    };

    if domain != state.domain {
        return (StatusCode::NOT_FOUND, "unknown domain").into_response();
    }

    let actor = match state.actor_repo.find_by_username_and_host(&username, None).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            info!(username = %username, "actor not found for WebFinger");
            return (StatusCode::NOT_FOUND, "actor not found").into_response();
        }
        Err(e) => {
            warn!(error = %e, "database error during WebFinger lookup");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };

    if actor.is_suspended {
        return (StatusCode::GONE, "actor is suspended").into_response();
    }

    let actor_url = state.base_url.join(&format!("/user/{username}")).expect("valid URL");

    let response = WebfingerResponse {
        subject: query.resource.clone(),
        aliases: vec![actor_url.to_string()],
        links: vec![WebfingerLink {
            rel: "self".to_string(),
            link_type: Some("application/activity+json".to_string()),
            href: Some(actor_url.to_string()),
            template: None,
        }],
    };

    (StatusCode::OK, [("Content-Type", "application/jrd+json")], Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_acct_resource() {
        let (username, domain) = parse_resource("acct:alice@example.com").unwrap();
        assert_eq!(username, "alice");
        assert_eq!(domain, "example.com");
    }

    #[test]
    fn rejects_non_acct_resource() {
        assert!(parse_resource("https://example.com/user/alice").is_none());
    }
}
