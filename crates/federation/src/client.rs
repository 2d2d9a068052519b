//! The Fetcher: outbound HTTP for activity delivery and remote-document
//! retrieval.
//!
//! Bounds concurrency per remote host (so one slow or malicious host can't
//! starve delivery to everyone else), caps response size, and surfaces a
//! distinguished [`ApClientError::Gone`] on HTTP 410 so callers (the
//! Resolver, the outbox worker) can react to permanent removal instead of
//! retrying forever.

#![allow(missing_docs)]

use crate::signature::{ActorSigningKey, HttpSignatureService, SignatureError};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, error, info, warn};
use url::Url;

/// Default number of concurrent requests allowed to a single remote host.
const DEFAULT_PER_HOST_CONCURRENCY: usize = 1;
/// Default number of in-flight requests allowed across all hosts.
const DEFAULT_GLOBAL_CONCURRENCY: usize = 64;

/// Error type for Fetcher operations.
#[derive(Debug, thiserror::Error)]
pub enum ApClientError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Signing failed: {0}")]
    SigningError(#[from] SignatureError),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Delivery failed: {status} - {body}")]
    DeliveryFailed { status: u16, body: String },
    #[error("Remote resource is permanently gone (410): {0}")]
    Gone(String),
    #[error("Response body exceeded the {0} byte limit")]
    ResponseTooLarge(usize),
}

/// Outbound HTTP client for `ActivityPub` delivery and document fetches.
#[derive(Clone)]
pub struct ApClient {
    client: Client,
    user_agent: String,
    max_response_bytes: usize,
    global_limit: Arc<Semaphore>,
    host_limits: Arc<Mutex<HashMap<String, Arc<Semaphore>>>>,
    per_host_concurrency: usize,
}

impl ApClient {
    /// Create a new Fetcher bound to this instance's public URL (used in
    /// the User-Agent header).
    #[must_use]
    pub fn new(instance_url: &str) -> Self {
        Self::with_limits(
            instance_url,
            DEFAULT_PER_HOST_CONCURRENCY,
            DEFAULT_GLOBAL_CONCURRENCY,
            10 * 1024 * 1024,
            3,
        )
    }

    /// Create a Fetcher with explicit concurrency, size and redirect bounds.
    #[must_use]
    pub fn with_limits(
        instance_url: &str,
        per_host_concurrency: usize,
        global_concurrency: usize,
        max_response_bytes: usize,
        max_redirects: usize,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(max_redirects))
            .build()
            .expect("failed to build HTTP client");

        let user_agent = format!("plaza/0.1.0 (+{instance_url})");

        Self {
            client,
            user_agent,
            max_response_bytes,
            global_limit: Arc::new(Semaphore::new(global_concurrency)),
            host_limits: Arc::new(Mutex::new(HashMap::new())),
            per_host_concurrency,
        }
    }

    async fn acquire_host_permit(&self, host: &str) -> tokio::sync::OwnedSemaphorePermit {
        let semaphore = {
            let mut limits = self.host_limits.lock().await;
            limits
                .entry(host.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.per_host_concurrency)))
                .clone()
        };
        semaphore
            .acquire_owned()
            .await
            .expect("host semaphore is never closed")
    }

    async fn read_bounded(&self, response: reqwest::Response) -> Result<Vec<u8>, ApClientError> {
        if let Some(len) = response.content_length()
            && len as usize > self.max_response_bytes
        {
            return Err(ApClientError::ResponseTooLarge(self.max_response_bytes));
        }
        let bytes = response.bytes().await?;
        if bytes.len() > self.max_response_bytes {
            return Err(ApClientError::ResponseTooLarge(self.max_response_bytes));
        }
        Ok(bytes.to_vec())
    }

    /// Deliver an activity to a remote inbox, signing it with the given
    /// actor key via the supplied signature service.
    pub async fn deliver(
        &self,
        inbox_url: &str,
        activity: &Value,
        signature_service: &HttpSignatureService,
        key: &ActorSigningKey,
    ) -> Result<(), ApClientError> {
        let url = Url::parse(inbox_url).map_err(|e| ApClientError::InvalidUrl(e.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| ApClientError::InvalidUrl("no host in inbox URL".to_string()))?
            .to_string();

        let body = serde_json::to_vec(activity).expect("activity JSON is always serializable");

        let mut extra_headers = HashMap::new();
        extra_headers.insert("content-type".to_string(), "application/activity+json".to_string());

        let headers = signature_service.sign_outbound(key, "POST", &url, Some(&body), &extra_headers)?;

        debug!(
            inbox = %inbox_url,
            activity_type = activity.get("type").and_then(|v| v.as_str()).unwrap_or("Unknown"),
            "delivering activity"
        );

        let _permit = self.acquire_host_permit(&host).await;
        let _global_permit = self.global_limit.acquire().await.expect("global semaphore is never closed");

        let response = self
            .client
            .post(inbox_url)
            .headers(headers)
            .header("User-Agent", &self.user_agent)
            .header("Content-Type", "application/activity+json")
            .header("Accept", "application/activity+json, application/ld+json")
            .body(body)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() || status.as_u16() == 202 {
            info!(inbox = %inbox_url, status = %status, "activity delivered");
            Ok(())
        } else if status.as_u16() == 410 {
            warn!(inbox = %inbox_url, "remote inbox is gone (410)");
            Err(ApClientError::Gone(inbox_url.to_string()))
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(inbox = %inbox_url, status = %status, body = %body, "activity delivery failed");
            Err(ApClientError::DeliveryFailed { status: status.as_u16(), body })
        }
    }

    /// Fetch a remote actor document by its id URL.
    pub async fn fetch_actor(&self, actor_url: &str) -> Result<Value, ApClientError> {
        self.fetch_json(
            actor_url,
            "application/activity+json, application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\"",
        )
        .await
    }

    /// Fetch a remote object (note, activity, collection page) by its id URL.
    pub async fn fetch_object(&self, object_url: &str) -> Result<Value, ApClientError> {
        self.fetch_json(object_url, "application/activity+json, application/ld+json").await
    }

    async fn fetch_json(&self, url: &str, accept: &str) -> Result<Value, ApClientError> {
        debug!(url = %url, "fetching remote document");

        let parsed = Url::parse(url).map_err(|e| ApClientError::InvalidUrl(e.to_string()))?;
        let host = parsed.host_str().unwrap_or_default().to_string();

        let _permit = self.acquire_host_permit(&host).await;
        let _global_permit = self.global_limit.acquire().await.expect("global semaphore is never closed");

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 410 {
            return Err(ApClientError::Gone(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApClientError::DeliveryFailed { status: status.as_u16(), body });
        }

        let bytes = self.read_bounded(response).await?;
        serde_json::from_slice(&bytes).map_err(|e| ApClientError::DeliveryFailed {
            status: status.as_u16(),
            body: format!("invalid JSON: {e}"),
        })
    }

    /// Perform a `WebFinger` lookup for an `acct:` handle on a remote host.
    pub async fn webfinger(&self, acct: &str, domain: &str) -> Result<Value, ApClientError> {
        let url = format!("https://{domain}/.well-known/webfinger?resource=acct:{acct}");
        debug!(acct = %acct, domain = %domain, "performing webfinger lookup");

        let _permit = self.acquire_host_permit(domain).await;
        let _global_permit = self.global_limit.acquire().await.expect("global semaphore is never closed");

        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/jrd+json, application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let bytes = self.read_bounded(response).await?;
            serde_json::from_slice(&bytes).map_err(|e| ApClientError::DeliveryFailed {
                status: status.as_u16(),
                body: format!("invalid JSON: {e}"),
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApClientError::DeliveryFailed { status: status.as_u16(), body })
        }
    }
}

impl Default for ApClient {
    fn default() -> Self {
        Self::new("https://localhost")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation_sets_user_agent() {
        let client = ApClient::new("https://example.com");
        assert!(client.user_agent.contains("plaza"));
    }

    #[tokio::test]
    async fn host_permits_are_reused_per_host() {
        let client = ApClient::new("https://example.com");
        let _p1 = client.acquire_host_permit("remote.example").await;
        let limits = client.host_limits.lock().await;
        assert!(limits.contains_key("remote.example"));
    }
}
