//! HTTP Signature verification middleware for Authorized Fetch.
//!
//! Verifies the RFC 9421 or legacy draft-cavage signature on an inbound
//! request and attaches the signing actor's id to the request so handlers
//! downstream (the inbox dispatch pipeline) can check it against the
//! activity's claimed `actor`. Unlike the teacher's permissive version,
//! failure to verify always rejects the request — there is no "log and
//! continue" path.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use plaza_store::entities::actor_key::KeyAlgorithm;
use plaza_store::repositories::ActorKeyRepository;
use tower::Layer;
use tracing::{debug, warn};

use crate::resolver::Resolver;
use crate::signature::{HttpSignatureService, detect_scheme};

/// State required for signature verification.
#[derive(Clone)]
pub struct SignatureVerificationState {
    pub resolver: Resolver,
    pub actor_key_repo: ActorKeyRepository,
    pub signature_service: HttpSignatureService,
    pub require_signatures: bool,
}

impl SignatureVerificationState {
    /// Create a new signature verification state.
    #[must_use]
    pub const fn new(
        resolver: Resolver,
        actor_key_repo: ActorKeyRepository,
        signature_service: HttpSignatureService,
        require_signatures: bool,
    ) -> Self {
        Self { resolver, actor_key_repo, signature_service, require_signatures }
    }
}

/// Marker type indicating the outcome of signature verification.
///
/// Extracted in handlers via `Extension<SignatureVerified>`.
#[derive(Clone, Debug)]
pub struct SignatureVerified {
    /// The local id of the actor that signed this request, if verified.
    pub actor_id: Option<String>,
}

/// Layer for adding signature verification to routes.
#[derive(Clone)]
pub struct SignatureVerificationLayer {
    state: Arc<SignatureVerificationState>,
}

impl SignatureVerificationLayer {
    #[must_use]
    pub fn new(state: SignatureVerificationState) -> Self {
        Self { state: Arc::new(state) }
    }
}

impl<S> Layer<S> for SignatureVerificationLayer {
    type Service = SignatureVerificationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SignatureVerificationService { inner, state: self.state.clone() }
    }
}

/// Service that verifies HTTP signatures on requests.
#[derive(Clone)]
pub struct SignatureVerificationService<S> {
    inner: S,
    state: Arc<SignatureVerificationState>,
}

impl<S> tower::Service<Request<Body>> for SignatureVerificationService<S>
where
    S: tower::Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        tower::Service::poll_ready(&mut self.inner, cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = self.state.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !state.require_signatures {
                let mut req = req;
                req.extensions_mut().insert(SignatureVerified { actor_id: None });
                return tower::Service::call(&mut inner, req).await;
            }

            let headers_map = build_headers_map(&req);

            if detect_scheme(&headers_map).is_none() {
                warn!("missing signature headers on request requiring authorized fetch");
                return Ok((StatusCode::UNAUTHORIZED, "HTTP signature required").into_response());
            }

            let Some(key_id) = extract_key_id(&headers_map) else {
                warn!("could not extract keyId from signature headers");
                return Ok((StatusCode::UNAUTHORIZED, "invalid signature header").into_response());
            };
            let actor_url = key_id.split('#').next().unwrap_or(&key_id).to_string();

            let actor = match state.resolver.resolve(&actor_url).await {
                Ok(a) => a,
                Err(e) => {
                    warn!(error = %e, actor = %actor_url, "failed to resolve signing actor");
                    return Ok((StatusCode::UNAUTHORIZED, "could not resolve signing actor").into_response());
                }
            };

            let keys = match state.actor_key_repo.find_by_actor_id(&actor.id).await {
                Ok(k) => k,
                Err(e) => {
                    warn!(error = %e, "failed to load signing actor's keys");
                    return Ok((StatusCode::UNAUTHORIZED, "could not load actor keys").into_response());
                }
            };
            let rsa_key =
                keys.iter().find(|k| k.algorithm == KeyAlgorithm::Rsa).map(|k| k.public_key.as_str());
            let ed25519_key =
                keys.iter().find(|k| k.algorithm == KeyAlgorithm::Ed25519).map(|k| k.public_key.as_str());

            let method = req.method().as_str().to_string();
            let authority = req
                .headers()
                .get("host")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let path = req
                .uri()
                .path_and_query()
                .map_or_else(|| req.uri().path().to_string(), |pq| pq.to_string());

            let (parts, body) = req.into_parts();
            let body_bytes = match to_bytes(body, usize::MAX).await {
                Ok(bytes) => bytes,
                Err(_) => {
                    return Ok((StatusCode::BAD_REQUEST, "failed to read request body").into_response());
                }
            };

            let verified = state.signature_service.verify_inbound(
                rsa_key,
                ed25519_key,
                &method,
                &authority,
                &path,
                &headers_map,
                &body_bytes,
            );

            match verified {
                Ok(true) => {
                    debug!(actor = %actor.id, "signature verified");
                    let mut req = Request::from_parts(parts, Body::from(body_bytes));
                    req.extensions_mut().insert(SignatureVerified { actor_id: Some(actor.id.clone()) });
                    tower::Service::call(&mut inner, req).await
                }
                Ok(false) => {
                    warn!(actor = %actor.id, "signature verification failed");
                    Ok((StatusCode::UNAUTHORIZED, "signature verification failed").into_response())
                }
                Err(e) => {
                    warn!(error = %e, "signature verification error");
                    Ok((StatusCode::UNAUTHORIZED, "signature verification error").into_response())
                }
            }
        })
    }
}

/// Extract the `keyId`/`keyid` parameter from whichever signature header is present.
fn extract_key_id(headers: &HashMap<String, String>) -> Option<String> {
    if let Some(input) = headers.get("signature-input") {
        return extract_param(input, "keyid");
    }
    if let Some(sig) = headers.get("signature") {
        return extract_param(sig, "keyId");
    }
    None
}

/// Pull a `name="value"` parameter out of a structured-field-ish header value.
fn extract_param(value: &str, name: &str) -> Option<String> {
    let lower = value.to_ascii_lowercase();
    let needle = format!("{}=\"", name.to_ascii_lowercase());
    let start = lower.find(&needle)? + needle.len();
    let rest = &value[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// Collect all request headers, lowercased, for signature verification.
fn build_headers_map(req: &Request<Body>) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            headers.insert(name.as_str().to_ascii_lowercase(), v.to_string());
        }
    }
    headers
}

/// Check if a user requires authorized fetch based on their profile settings.
#[must_use]
pub const fn user_requires_authorized_fetch(secure_fetch_only: bool) -> bool {
    secure_fetch_only
}

/// Check if an instance requires authorized fetch.
#[must_use]
pub const fn instance_requires_authorized_fetch(require_authorized_fetch: bool) -> bool {
    require_authorized_fetch
}
