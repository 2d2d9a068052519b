//! HTTP request signing and verification for `ActivityPub` delivery.
//!
//! Two signature families coexist on the wire: the legacy draft-cavage
//! scheme (RSA-SHA256, still what most of the fediverse speaks) and RFC
//! 9421 HTTP Message Signatures (Ed25519, what newer and portable actors
//! use). [`HttpSignatureService`] is the single entry point callers use;
//! it picks a signer by date threshold on the way out and dispatches by
//! header shape on the way in.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signer as _, SigningKey, Verifier as _, VerifyingKey};
use pkcs8::DecodePublicKey;
use reqwest::header::{HeaderMap, HeaderValue};
use rsa::{
    pkcs1v15::{SigningKey as RsaSigningKey, VerifyingKey as RsaVerifyingKey},
    RsaPrivateKey, RsaPublicKey,
};
use sha2::{Digest, Sha256};
use signature::{SignatureEncoding, Signer as _, Verifier as _};
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

/// Errors from signing or verifying an HTTP request.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Signing failed: {0}")]
    SigningFailed(String),
    #[error("Verification failed: {0}")]
    VerificationFailed(String),
    #[error("Missing header: {0}")]
    MissingHeader(String),
    #[error("Invalid signature header")]
    InvalidSignatureHeader,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Signature expired: clock skew too large")]
    ExpiredSignature,
    #[error("Invalid date header format")]
    InvalidDateFormat,
    #[error("No recognized signature header present")]
    NoSignaturePresent,
    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Signs an outgoing request, returning the headers to attach.
pub trait Signer {
    /// Compute signature headers for a request.
    fn sign_request(
        &self,
        method: &str,
        url: &Url,
        body: Option<&[u8]>,
        extra_headers: &HashMap<String, String>,
    ) -> Result<HeaderMap, SignatureError>;
}

/// Verifies an inbound request's signature against a known public key.
/// Each implementation owns the key material and extracts whichever
/// headers its scheme uses from the raw header map.
pub trait Verifier {
    /// Check a signature against the request context. Returns `Ok(false)`
    /// only when cryptographic verification ran and failed; malformed or
    /// missing headers are a hard `Err`.
    fn verify(
        &self,
        method: &str,
        authority: &str,
        path: &str,
        headers: &HashMap<String, String>,
        body: &[u8],
    ) -> Result<bool, SignatureError>;
}

/// Parsed signature header components, algorithm-agnostic.
#[derive(Debug, Clone)]
pub struct SignatureComponents {
    pub key_id: String,
    pub algorithm: String,
    pub headers: Vec<String>,
    pub signature: String,
}

/// Calculate the legacy `Digest` header value (`SHA-256=<base64>`).
#[must_use]
pub fn calculate_digest(body: &[u8]) -> String {
    let hash = Sha256::digest(body);
    format!("SHA-256={}", BASE64.encode(hash))
}

/// Calculate the RFC 9421 `Content-Digest` header value.
#[must_use]
pub fn calculate_content_digest(body: &[u8]) -> String {
    let hash = Sha256::digest(body);
    format!("sha-256=:{}:", BASE64.encode(hash))
}

/// Verify that a digest header matches the body.
#[must_use]
pub fn verify_digest(body: &[u8], digest_header: &str) -> bool {
    calculate_digest(body) == digest_header
}

/// Which signature scheme an inbound request presents.
#[must_use]
pub fn detect_scheme(headers: &HashMap<String, String>) -> Option<&'static str> {
    if headers.contains_key("signature-input") {
        Some("rfc9421")
    } else if headers.contains_key("signature") {
        Some("legacy")
    } else {
        None
    }
}

/// Legacy draft-cavage (RSA-SHA256) signer.
///
/// Signed fields are pinned to `(request-target) host date digest` when a
/// body is present, `(request-target) host date` otherwise.
pub struct LegacySigner {
    private_key: RsaPrivateKey,
    key_id: String,
}

impl LegacySigner {
    /// Build a signer from a PEM-encoded RSA private key and its key id URL.
    pub fn new(private_key_pem: &str, key_id: String) -> Result<Self, SignatureError> {
        let private_key = plaza_common::parse_private_key(private_key_pem)
            .map_err(|e| SignatureError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { private_key, key_id })
    }
}

impl Signer for LegacySigner {
    fn sign_request(
        &self,
        method: &str,
        url: &Url,
        body: Option<&[u8]>,
        extra_headers: &HashMap<String, String>,
    ) -> Result<HeaderMap, SignatureError> {
        let mut headers = HeaderMap::new();

        let host = url
            .host_str()
            .ok_or_else(|| SignatureError::InvalidUrl("no host in URL".to_string()))?;
        let path = url.path();
        let query = url.query().map_or(String::new(), |q| format!("?{q}"));
        let request_target = format!("{} {path}{query}", method.to_lowercase());
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let digest = body.map(calculate_digest);

        let mut signed_headers = vec!["(request-target)", "host", "date"];
        if digest.is_some() {
            signed_headers.push("digest");
        }
        for key in extra_headers.keys() {
            if !signed_headers.contains(&key.as_str()) {
                signed_headers.push(key.as_str());
            }
        }

        let signing_string = build_signing_string(&signed_headers, |h| match h {
            "(request-target)" => Some(request_target.clone()),
            "host" => Some(host.to_string()),
            "date" => Some(date.clone()),
            "digest" => digest.clone(),
            other => extra_headers.get(other).cloned(),
        });

        debug!(signing_string = %signing_string, "legacy signing string");

        let signing_key = RsaSigningKey::<Sha256>::new(self.private_key.clone());
        let signature_bytes = signing_key
            .try_sign(signing_string.as_bytes())
            .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
        let signature = BASE64.encode(signature_bytes.to_bytes());

        let signature_header = format!(
            "keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{signature}\"",
            self.key_id,
            signed_headers.join(" "),
        );

        headers.insert("Host", header_value(host)?);
        headers.insert("Date", header_value(&date)?);
        if let Some(ref d) = digest {
            headers.insert("Digest", header_value(d)?);
        }
        headers.insert("Signature", header_value(&signature_header)?);
        for (key, value) in extra_headers {
            if let (Ok(v), Ok(name)) = (
                HeaderValue::from_str(value),
                reqwest::header::HeaderName::from_bytes(key.as_bytes()),
            ) {
                headers.insert(name, v);
            }
        }

        Ok(headers)
    }
}

/// Legacy draft-cavage (RSA-SHA256) verifier.
pub struct LegacyVerifier {
    public_key_pem: String,
}

impl LegacyVerifier {
    /// Build a verifier from the actor's PEM-encoded RSA public key.
    #[must_use]
    pub const fn new(public_key_pem: String) -> Self {
        Self { public_key_pem }
    }

    /// Parse a `Signature:` header into its components.
    pub fn parse_signature_header(header: &str) -> Result<SignatureComponents, SignatureError> {
        let mut key_id = None;
        let mut algorithm = None;
        let mut headers_list = None;
        let mut signature = None;

        for part in header.split(',') {
            let part = part.trim();
            if let Some((key, value)) = part.split_once('=') {
                let value = value.trim_matches('"');
                match key {
                    "keyId" => key_id = Some(value.to_string()),
                    "algorithm" => algorithm = Some(value.to_string()),
                    "headers" => headers_list = Some(value.to_string()),
                    "signature" => signature = Some(value.to_string()),
                    _ => {}
                }
            }
        }

        Ok(SignatureComponents {
            key_id: key_id.ok_or(SignatureError::InvalidSignatureHeader)?,
            algorithm: algorithm.unwrap_or_else(|| "rsa-sha256".to_string()),
            headers: headers_list
                .unwrap_or_else(|| "date".to_string())
                .split(' ')
                .map(String::from)
                .collect(),
            signature: signature.ok_or(SignatureError::InvalidSignatureHeader)?,
        })
    }
}

impl Verifier for LegacyVerifier {
    fn verify(
        &self,
        method: &str,
        _authority: &str,
        path: &str,
        headers: &HashMap<String, String>,
        _body: &[u8],
    ) -> Result<bool, SignatureError> {
        let header = headers
            .get("signature")
            .ok_or(SignatureError::MissingHeader("signature".into()))?;
        let components = Self::parse_signature_header(header)?;

        let public_key = RsaPublicKey::from_public_key_pem(&self.public_key_pem)
            .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?;

        let signing_string = build_signing_string(
            &components.headers.iter().map(String::as_str).collect::<Vec<_>>(),
            |h| match h {
                "(request-target)" => Some(format!("{} {path}", method.to_lowercase())),
                other => headers.get(other).cloned(),
            },
        );

        debug!(signing_string = %signing_string, "legacy verifying string");

        let signature_bytes = BASE64
            .decode(&components.signature)
            .map_err(|e| SignatureError::VerificationFailed(e.to_string()))?;

        let verifying_key = RsaVerifyingKey::<Sha256>::new(public_key);
        let signature = rsa::pkcs1v15::Signature::try_from(signature_bytes.as_slice())
            .map_err(|e| SignatureError::VerificationFailed(e.to_string()))?;

        match verifying_key.verify(signing_string.as_bytes(), &signature) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(error = %e, "legacy signature verification failed");
                Ok(false)
            }
        }
    }
}

/// RFC 9421 (Ed25519) signer.
pub struct Rfc9421Signer {
    signing_key: SigningKey,
    key_id: String,
}

impl Rfc9421Signer {
    /// Build a signer from a PKCS#8 PEM-encoded Ed25519 private key.
    pub fn new(private_key_pem: &str, key_id: String) -> Result<Self, SignatureError> {
        let signing_key = plaza_common::parse_ed25519_private_key(private_key_pem)
            .map_err(|e| SignatureError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { signing_key, key_id })
    }
}

impl Signer for Rfc9421Signer {
    fn sign_request(
        &self,
        method: &str,
        url: &Url,
        body: Option<&[u8]>,
        _extra_headers: &HashMap<String, String>,
    ) -> Result<HeaderMap, SignatureError> {
        let mut headers = HeaderMap::new();

        let authority = url
            .host_str()
            .ok_or_else(|| SignatureError::InvalidUrl("no host in URL".to_string()))?;
        let path = url.path();
        let content_digest = body.map(calculate_content_digest);
        let created = Utc::now().timestamp();
        let expires = created + 300;

        let mut components = vec!["\"@method\"", "\"@authority\"", "\"@path\""];
        if content_digest.is_some() {
            components.push("\"content-digest\"");
        }

        let signature_params = format!(
            "({});created={created};expires={expires};keyid=\"{}\";alg=\"ed25519\"",
            components.join(" "),
            self.key_id,
        );

        let mut signing_lines = vec![
            format!("\"@method\": {}", method.to_uppercase()),
            format!("\"@authority\": {authority}"),
            format!("\"@path\": {path}"),
        ];
        if let Some(ref digest) = content_digest {
            signing_lines.push(format!("\"content-digest\": {digest}"));
        }
        signing_lines.push(format!("\"@signature-params\": {signature_params}"));
        let signing_string = signing_lines.join("\n");

        debug!(signing_string = %signing_string, "rfc9421 signing string");

        let signature_bytes = self.signing_key.sign(signing_string.as_bytes());
        let signature = BASE64.encode(signature_bytes.to_bytes());

        headers.insert(
            "Signature-Input",
            header_value(&format!("sig1={signature_params}"))?,
        );
        headers.insert("Signature", header_value(&format!("sig1=:{signature}:"))?);
        if let Some(digest) = content_digest {
            headers.insert("Content-Digest", header_value(&digest)?);
        }

        Ok(headers)
    }
}

/// RFC 9421 (Ed25519) verifier.
pub struct Rfc9421Verifier {
    public_key_multibase: String,
}

impl Rfc9421Verifier {
    /// Build a verifier from the actor's multibase-encoded Ed25519 public key.
    #[must_use]
    pub const fn new(public_key_multibase: String) -> Self {
        Self { public_key_multibase }
    }
}

impl Verifier for Rfc9421Verifier {
    fn verify(
        &self,
        method: &str,
        authority: &str,
        path: &str,
        headers: &HashMap<String, String>,
        _body: &[u8],
    ) -> Result<bool, SignatureError> {
        let signature_input = headers
            .get("signature-input")
            .ok_or(SignatureError::MissingHeader("signature-input".into()))?;
        let signature_header = headers
            .get("signature")
            .ok_or(SignatureError::MissingHeader("signature".into()))?;
        let content_digest = headers.get("content-digest").map(String::as_str);

        let verifying_key = plaza_common::decode_ed25519_multibase(&self.public_key_multibase)
            .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?;

        let (_, params) = signature_input
            .split_once('=')
            .ok_or(SignatureError::InvalidSignatureHeader)?;

        let mut signing_lines = vec![
            format!("\"@method\": {}", method.to_uppercase()),
            format!("\"@authority\": {authority}"),
            format!("\"@path\": {path}"),
        ];
        if let Some(digest) = content_digest {
            signing_lines.push(format!("\"content-digest\": {digest}"));
        }
        signing_lines.push(format!("\"@signature-params\": {params}"));
        let signing_string = signing_lines.join("\n");

        let encoded_signature = signature_header
            .split_once(':')
            .and_then(|(_, rest)| rest.strip_suffix(':'))
            .ok_or(SignatureError::InvalidSignatureHeader)?;
        let signature_bytes = BASE64
            .decode(encoded_signature)
            .map_err(|e| SignatureError::VerificationFailed(e.to_string()))?;
        let signature_array: [u8; 64] = signature_bytes
            .as_slice()
            .try_into()
            .map_err(|_| SignatureError::VerificationFailed("bad signature length".into()))?;
        let signature = ed25519_dalek::Signature::from_bytes(&signature_array);

        match verifying_key.verify(signing_string.as_bytes(), &signature) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(error = %e, "rfc9421 signature verification failed");
                Ok(false)
            }
        }
    }
}

/// Signs and verifies data-integrity proofs (`proof` objects) embedded in
/// portable-actor activity payloads, as distinct from transport-level
/// request signatures.
pub struct IntegrityProofSigner {
    signing_key: SigningKey,
    verification_method: String,
}

impl IntegrityProofSigner {
    /// Build a proof signer from an Ed25519 private key and its
    /// verification method URI (typically a `did:key` fragment).
    pub fn new(private_key_pem: &str, verification_method: String) -> Result<Self, SignatureError> {
        let signing_key = plaza_common::parse_ed25519_private_key(private_key_pem)
            .map_err(|e| SignatureError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { signing_key, verification_method })
    }

    /// Produce a `proof` JSON object signing the given canonicalized
    /// activity body (the activity with any existing `proof` field
    /// stripped before canonicalization).
    pub fn sign(&self, canonical_body: &[u8]) -> serde_json::Value {
        let signature_bytes = self.signing_key.sign(canonical_body);
        let proof_value = bs58::encode(signature_bytes.to_bytes()).into_string();

        serde_json::json!({
            "type": "DataIntegrityProof",
            "cryptosuite": "eddsa-jcs-2022",
            "created": Utc::now().to_rfc3339(),
            "verificationMethod": self.verification_method,
            "proofPurpose": "assertionMethod",
            "proofValue": proof_value,
        })
    }
}

/// Verifies data-integrity proofs on inbound portable-actor activities.
pub struct IntegrityProofVerifier;

impl IntegrityProofVerifier {
    /// Verify a `proof` object against the canonicalized body it signs,
    /// given the signer's multibase-encoded Ed25519 public key.
    pub fn verify(
        public_key_multibase: &str,
        canonical_body: &[u8],
        proof_value: &str,
    ) -> Result<bool, SignatureError> {
        let verifying_key = plaza_common::decode_ed25519_multibase(public_key_multibase)
            .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?;

        let signature_bytes = bs58::decode(proof_value)
            .into_vec()
            .map_err(|e| SignatureError::VerificationFailed(e.to_string()))?;
        let signature_array: [u8; 64] = signature_bytes
            .as_slice()
            .try_into()
            .map_err(|_| SignatureError::VerificationFailed("bad proof length".into()))?;
        let signature = ed25519_dalek::Signature::from_bytes(&signature_array);

        match verifying_key.verify(canonical_body, &signature) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(error = %e, "integrity proof verification failed");
                Ok(false)
            }
        }
    }
}

/// The key material needed to sign as a given local actor.
pub enum ActorSigningKey {
    Rsa { private_key_pem: String, key_id: String },
    Ed25519 { private_key_pem: String, key_id: String },
}

/// Dispatches between signature families by configured date thresholds
/// (outbound) or by which headers are present (inbound).
#[derive(Clone)]
pub struct HttpSignatureService {
    rfc9421_threshold: Option<DateTime<Utc>>,
    ed25519_threshold: Option<DateTime<Utc>>,
    disable_integrity_proofs: bool,
}

impl HttpSignatureService {
    /// Build a dispatcher from the configured threshold knobs.
    #[must_use]
    pub const fn new(
        rfc9421_threshold: Option<DateTime<Utc>>,
        ed25519_threshold: Option<DateTime<Utc>>,
        disable_integrity_proofs: bool,
    ) -> Self {
        Self {
            rfc9421_threshold,
            ed25519_threshold,
            disable_integrity_proofs,
        }
    }

    /// Whether this instance should prefer RFC 9421 for outbound requests.
    #[must_use]
    pub fn prefers_rfc9421(&self) -> bool {
        self.rfc9421_threshold.is_some_and(|t| Utc::now() >= t)
    }

    /// Whether integrity-proof verification is disabled for this instance.
    #[must_use]
    pub const fn integrity_proofs_disabled(&self) -> bool {
        self.disable_integrity_proofs
    }

    /// Whether newly created local actors should get an Ed25519 key
    /// instead of (or in addition to) an RSA one.
    #[must_use]
    pub fn issues_ed25519_keys(&self) -> bool {
        self.ed25519_threshold.is_some_and(|t| Utc::now() >= t)
    }

    /// Sign an outgoing request, picking a signer by key material and
    /// threshold: an Ed25519 key is used once the RFC 9421 threshold has
    /// passed, otherwise the RSA key signs with the legacy scheme.
    pub fn sign_outbound(
        &self,
        key: &ActorSigningKey,
        method: &str,
        url: &Url,
        body: Option<&[u8]>,
        extra_headers: &HashMap<String, String>,
    ) -> Result<HeaderMap, SignatureError> {
        match key {
            ActorSigningKey::Ed25519 { private_key_pem, key_id } if self.prefers_rfc9421() => {
                Rfc9421Signer::new(private_key_pem, key_id.clone())?
                    .sign_request(method, url, body, extra_headers)
            }
            ActorSigningKey::Rsa { private_key_pem, key_id } => {
                LegacySigner::new(private_key_pem, key_id.clone())?
                    .sign_request(method, url, body, extra_headers)
            }
            ActorSigningKey::Ed25519 { .. } => Err(SignatureError::UnsupportedAlgorithm(
                "Ed25519 key present but RFC 9421 threshold not reached and no RSA key available".into(),
            )),
        }
    }

    /// Verify an inbound request, dispatching on header shape: presence of
    /// `Signature-Input` means RFC 9421, otherwise the legacy `Signature`
    /// header is assumed. Returns `Err` (never a silent `Ok(false)`
    /// treated as a pass) on any verification failure.
    pub fn verify_inbound(
        &self,
        rsa_public_key_pem: Option<&str>,
        ed25519_public_key_multibase: Option<&str>,
        method: &str,
        authority: &str,
        path: &str,
        headers: &HashMap<String, String>,
        body: &[u8],
    ) -> Result<bool, SignatureError> {
        match detect_scheme(headers) {
            Some("rfc9421") => {
                let key = ed25519_public_key_multibase
                    .ok_or_else(|| SignatureError::InvalidPublicKey("no Ed25519 key on record".into()))?;
                Rfc9421Verifier::new(key.to_string()).verify(method, authority, path, headers, body)
            }
            Some("legacy") => {
                let key = rsa_public_key_pem
                    .ok_or_else(|| SignatureError::InvalidPublicKey("no RSA key on record".into()))?;
                LegacyVerifier::new(key.to_string()).verify(method, authority, path, headers, body)
            }
            _ => Err(SignatureError::NoSignaturePresent),
        }
    }
}

fn build_signing_string(headers: &[&str], resolve: impl Fn(&str) -> Option<String>) -> String {
    headers
        .iter()
        .map(|h| format!("{h}: {}", resolve(h).unwrap_or_default()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn header_value(value: &str) -> Result<HeaderValue, SignatureError> {
    HeaderValue::from_str(value)
        .map_err(|_| SignatureError::SigningFailed(format!("invalid header value: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_test_rsa_keypair() -> (String, String) {
        let keypair = plaza_common::generate_rsa_keypair().unwrap();
        (keypair.private_key_pem, keypair.public_key_pem)
    }

    #[test]
    fn legacy_sign_and_verify_round_trip() {
        let (private_pem, public_pem) = generate_test_rsa_keypair();
        let signer = LegacySigner::new(&private_pem, "https://example.com/users/test#main-key".to_string()).unwrap();

        let url = Url::parse("https://remote.example/inbox").unwrap();
        let body = b"{\"type\":\"Create\"}";
        let headers = signer.sign_request("POST", &url, Some(body), &HashMap::new()).unwrap();

        let mut verify_headers = HashMap::new();
        verify_headers.insert(
            "signature".to_string(),
            headers.get("Signature").unwrap().to_str().unwrap().to_string(),
        );
        verify_headers.insert("host".to_string(), "remote.example".to_string());
        verify_headers.insert("date".to_string(), headers.get("Date").unwrap().to_str().unwrap().to_string());
        verify_headers.insert("digest".to_string(), headers.get("Digest").unwrap().to_str().unwrap().to_string());

        let verifier = LegacyVerifier::new(public_pem);
        let result = verifier.verify("POST", "remote.example", "/inbox", &verify_headers, body).unwrap();
        assert!(result);
    }

    #[test]
    fn legacy_parse_signature_header() {
        let header = r#"keyId="https://example.com/users/test#main-key",algorithm="rsa-sha256",headers="(request-target) host date digest",signature="abc123==""#;
        let components = LegacyVerifier::parse_signature_header(header).unwrap();
        assert_eq!(components.key_id, "https://example.com/users/test#main-key");
        assert_eq!(components.headers, vec!["(request-target)", "host", "date", "digest"]);
        assert_eq!(components.signature, "abc123==");
    }

    #[test]
    fn rfc9421_sign_and_verify_round_trip() {
        let keypair = plaza_common::generate_ed25519_keypair().unwrap();
        let signer = Rfc9421Signer::new(&keypair.private_key_pem, "https://example.com/users/test#main-key".to_string()).unwrap();

        let url = Url::parse("https://remote.example/inbox").unwrap();
        let body = b"{\"type\":\"Create\"}";
        let headers = signer.sign_request("POST", &url, Some(body), &HashMap::new()).unwrap();

        let mut verify_headers = HashMap::new();
        verify_headers.insert(
            "signature-input".to_string(),
            headers.get("Signature-Input").unwrap().to_str().unwrap().to_string(),
        );
        verify_headers.insert(
            "signature".to_string(),
            headers.get("Signature").unwrap().to_str().unwrap().to_string(),
        );
        verify_headers.insert(
            "content-digest".to_string(),
            headers.get("Content-Digest").unwrap().to_str().unwrap().to_string(),
        );

        let verifier = Rfc9421Verifier::new(keypair.public_key_multibase);
        let result = verifier.verify("POST", "remote.example", "/inbox", &verify_headers, body).unwrap();
        assert!(result);
    }

    #[test]
    fn integrity_proof_round_trip() {
        let keypair = plaza_common::generate_ed25519_keypair().unwrap();
        let signer = IntegrityProofSigner::new(&keypair.private_key_pem, "did:key:z6Mk#key".to_string()).unwrap();
        let body = b"{\"type\":\"Create\",\"id\":\"https://example.com/activities/1\"}";

        let proof = signer.sign(body);
        let proof_value = proof["proofValue"].as_str().unwrap();

        let result = IntegrityProofVerifier::verify(&keypair.public_key_multibase, body, proof_value).unwrap();
        assert!(result);
    }

    #[test]
    fn calculate_digest_has_prefix() {
        let digest = calculate_digest(b"hello world");
        assert!(digest.starts_with("SHA-256="));
    }

    #[test]
    fn verify_digest_rejects_tampered_body() {
        let digest = calculate_digest(b"hello world");
        assert!(verify_digest(b"hello world", &digest));
        assert!(!verify_digest(b"wrong body", &digest));
    }

    #[test]
    fn detect_scheme_prefers_rfc9421() {
        let mut headers = HashMap::new();
        headers.insert("signature-input".to_string(), "sig1=()".to_string());
        headers.insert("signature".to_string(), "sig1=:abc:".to_string());
        assert_eq!(detect_scheme(&headers), Some("rfc9421"));
    }

    #[test]
    fn service_dispatches_legacy_when_no_threshold_set() {
        let service = HttpSignatureService::new(None, None, false);
        assert!(!service.prefers_rfc9421());
        assert!(!service.issues_ed25519_keys());

        let (private_pem, _) = generate_test_rsa_keypair();
        let key = ActorSigningKey::Rsa {
            private_key_pem: private_pem,
            key_id: "https://example.com/users/test#main-key".to_string(),
        };
        let url = Url::parse("https://remote.example/inbox").unwrap();
        let headers = service
            .sign_outbound(&key, "POST", &url, Some(b"{}"), &HashMap::new())
            .unwrap();
        assert!(headers.contains_key("Signature"));
        assert!(!headers.contains_key("Signature-Input"));
    }

    #[test]
    fn service_rejects_request_with_no_signature_headers() {
        let service = HttpSignatureService::new(None, None, false);
        let result = service.verify_inbound(None, None, "POST", "remote.example", "/inbox", &HashMap::new(), b"{}");
        assert!(matches!(result, Err(SignatureError::NoSignaturePresent)));
    }
}
