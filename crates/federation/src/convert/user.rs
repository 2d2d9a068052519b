//! Actor <-> `ApPerson` conversion.

use plaza_store::entities::actor;
use url::Url;

use crate::actors::{ApImage, ApPerson, ApPublicKey, ApVerificationMethod};

/// Configuration for generating actor URLs.
#[derive(Clone)]
pub struct UrlConfig {
    pub base_url: Url,
}

impl UrlConfig {
    /// Create a new URL config.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    /// Generate actor URL.
    #[must_use]
    pub fn user_url(&self, name: &str) -> Url {
        self.base_url.join(&format!("/user/{name}")).expect("valid URL")
    }

    /// Generate inbox URL.
    #[must_use]
    pub fn inbox_url(&self, name: &str) -> Url {
        self.base_url.join(&format!("/inbox/{name}")).expect("valid URL")
    }

    /// Generate outbox URL.
    #[must_use]
    pub fn outbox_url(&self, name: &str) -> Url {
        self.base_url.join(&format!("/outbox/{name}")).expect("valid URL")
    }

    /// Generate shared inbox URL.
    #[must_use]
    pub fn shared_inbox_url(&self) -> Url {
        self.base_url.join("/inbox/nobody").expect("valid URL")
    }

    /// Generate followers URL.
    #[must_use]
    pub fn followers_url(&self, name: &str) -> Url {
        self.base_url.join(&format!("/followers/{name}")).expect("valid URL")
    }

    /// Generate public key URL (legacy draft-cavage signatures).
    #[must_use]
    pub fn public_key_url(&self, name: &str) -> String {
        format!("{}#main-key", self.user_url(name))
    }

    /// Generate the Ed25519 verification method URL (RFC 9421 / portable ids).
    #[must_use]
    pub fn ed25519_key_url(&self, name: &str) -> String {
        format!("{}#ed25519-key", self.user_url(name))
    }
}

/// Extension trait for converting a local actor row into an `ApPerson`.
pub trait UserToApPerson {
    /// Convert to `ApPerson`. `public_key_pem` is the RSA key for legacy
    /// signatures; `ed25519_multibase` is the portable key for RFC 9421 and
    /// `did:key` derivation. Either or both may be present.
    fn to_ap_person(
        &self,
        config: &UrlConfig,
        public_key_pem: Option<&str>,
        ed25519_multibase: Option<&str>,
    ) -> ApPerson;
}

impl UserToApPerson for actor::Model {
    fn to_ap_person(
        &self,
        config: &UrlConfig,
        public_key_pem: Option<&str>,
        ed25519_multibase: Option<&str>,
    ) -> ApPerson {
        let id = self
            .uri
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .unwrap_or_else(|| config.user_url(&self.preferred_username));

        let inbox = self
            .inbox
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .unwrap_or_else(|| config.inbox_url(&self.preferred_username));

        let outbox = self
            .outbox
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .unwrap_or_else(|| config.outbox_url(&self.preferred_username));

        let shared_inbox = self
            .shared_inbox
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .or_else(|| Some(config.shared_inbox_url()));

        let icon = None::<ApImage>;

        let public_key = public_key_pem.map(|pem| ApPublicKey {
            id: config.public_key_url(&self.preferred_username),
            owner: id.clone(),
            public_key_pem: pem.to_string(),
        });

        let assertion_method = ed25519_multibase.map(|multibase| {
            vec![ApVerificationMethod {
                id: config.ed25519_key_url(&self.preferred_username),
                kind: "Multikey".to_string(),
                controller: id.clone(),
                public_key_multibase: multibase.to_string(),
            }]
        });

        let also_known_as: Vec<Url> = serde_json::from_value(self.also_known_as.clone())
            .unwrap_or_default();

        ApPerson {
            kind: activitypub_federation::kinds::actor::PersonType::Person,
            id,
            preferred_username: self.preferred_username.clone(),
            inbox,
            outbox,
            shared_inbox,
            name: self.name.clone(),
            summary: self.summary.clone(),
            icon,
            public_key,
            assertion_method,
            followers: self
                .followers_url
                .as_deref()
                .and_then(|u| Url::parse(u).ok())
                .or_else(|| Some(config.followers_url(&self.preferred_username))),
            following: None,
            manually_approves_followers: Some(self.manually_approves_followers),
            discoverable: Some(true),
            moved_to: self.moved_to.as_deref().and_then(|u| Url::parse(u).ok()),
            also_known_as: if also_known_as.is_empty() { None } else { Some(also_known_as) },
        }
    }
}

/// Extension trait for `ApPerson`.
pub trait ApPersonExt {
    /// Check if this is a local actor.
    fn is_local(&self, local_domain: &str) -> bool;

    /// Extract the preferred username from the actor id.
    fn extract_username(&self) -> Option<String>;

    /// Extract the host from the actor id.
    fn extract_host(&self) -> Option<String>;
}

impl ApPersonExt for ApPerson {
    fn is_local(&self, local_domain: &str) -> bool {
        self.id.host_str() == Some(local_domain)
    }

    fn extract_username(&self) -> Option<String> {
        Some(self.preferred_username.clone())
    }

    fn extract_host(&self) -> Option<String> {
        self.id.host_str().map(std::string::ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_actor() -> actor::Model {
        actor::Model {
            id: "a1".to_string(),
            kind: plaza_store::entities::actor::ActorKind::Person,
            preferred_username: "alice".to_string(),
            username_lower: "alice".to_string(),
            host: None,
            name: Some("Alice".to_string()),
            summary: Some("hello".to_string()),
            inbox: None,
            outbox: None,
            followers_url: None,
            shared_inbox: None,
            manually_approves_followers: false,
            also_known_as: serde_json::json!([]),
            moved_to: None,
            did_key: None,
            uri: None,
            followers_count: 0,
            following_count: 0,
            notes_count: 0,
            is_suspended: false,
            last_fetched_at: None,
            created_at: chrono::Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn builds_person_with_local_urls() {
        let config = UrlConfig::new(Url::parse("https://example.com").unwrap());
        let person = test_actor().to_ap_person(&config, None, None);
        assert_eq!(person.id.as_str(), "https://example.com/user/alice");
        assert_eq!(person.preferred_username, "alice");
        assert!(person.public_key.is_none());
        assert!(person.assertion_method.is_none());
    }

    #[test]
    fn carries_ed25519_assertion_method() {
        let config = UrlConfig::new(Url::parse("https://example.com").unwrap());
        let person = test_actor().to_ap_person(&config, None, Some("z6Mkabc"));
        let methods = person.assertion_method.expect("assertion method present");
        assert_eq!(methods[0].public_key_multibase, "z6Mkabc");
    }
}
