//! `ActivityPub` Person actor.

use activitypub_federation::kinds::actor::PersonType;
use serde::{Deserialize, Serialize};
use url::Url;

/// `ActivityPub` Person actor.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApPerson {
    #[serde(rename = "type")]
    pub kind: PersonType,
    pub id: Url,
    pub preferred_username: String,
    pub inbox: Url,
    pub outbox: Url,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_inbox: Option<Url>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<ApImage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<ApPublicKey>,

    /// Ed25519 verification methods for RFC 9421 and data-integrity
    /// signature verification, and for portable `did:key` derivation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_method: Option<Vec<ApVerificationMethod>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<Url>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub following: Option<Url>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub manually_approves_followers: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discoverable: Option<bool>,

    /// URI of the account this actor has moved to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moved_to: Option<Url>,

    /// Alternative account URIs, used to verify a `Move`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub also_known_as: Option<Vec<Url>>,
}

/// `ActivityPub` Image object.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApImage {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// `ActivityPub` RSA public key, for draft-cavage legacy HTTP Signatures.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApPublicKey {
    pub id: String,
    pub owner: Url,
    pub public_key_pem: String,
}

/// `ActivityPub` Ed25519 verification method, multibase-encoded, for
/// RFC 9421 and `eddsa-jcs-2022` data-integrity verification.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApVerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub controller: Url,
    pub public_key_multibase: String,
}

impl ApPerson {
    /// Create a new Person actor.
    #[must_use]
    pub const fn new(id: Url, username: String, inbox: Url, outbox: Url) -> Self {
        Self {
            kind: PersonType::Person,
            id,
            preferred_username: username,
            inbox,
            outbox,
            shared_inbox: None,
            name: None,
            summary: None,
            icon: None,
            public_key: None,
            assertion_method: None,
            followers: None,
            following: None,
            manually_approves_followers: None,
            discoverable: None,
            moved_to: None,
            also_known_as: None,
        }
    }

    /// Check if this actor has moved to another account.
    #[must_use]
    pub const fn is_moved(&self) -> bool {
        self.moved_to.is_some()
    }
}
