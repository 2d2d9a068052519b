//! Outbound activity planning: builds the `ActivityPub` envelope for a
//! local action and resolves which inboxes it is delivered to.
//!
//! This module only plans deliveries; enqueueing the result onto the
//! outbox and actually sending it over HTTP is `plaza-queue`'s job.

use std::collections::HashSet;

use chrono::Utc;
use plaza_common::AppResult;
use plaza_store::entities::{actor, note};
use plaza_store::repositories::{ActorRepository, FollowRepository};
use serde_json::Value;
use url::Url;

use crate::activities::{
    AcceptActivity, AnnounceActivity, CreateActivity, DeleteActivity, FollowActivity,
    MoveActivity, RejectActivity, UndoActivity,
};
use crate::convert::UrlConfig;
use crate::objects::ApNote;

const PUBLIC_URI: &str = "https://www.w3.org/ns/activitystreams#Public";

/// Plans outbound `ActivityPub` deliveries against stored actors and notes.
#[derive(Clone)]
pub struct DeliveryService {
    actor_repo: ActorRepository,
    follow_repo: FollowRepository,
    url_config: UrlConfig,
}

impl DeliveryService {
    /// Create a new delivery service.
    #[must_use]
    pub const fn new(actor_repo: ActorRepository, follow_repo: FollowRepository, base_url: Url) -> Self {
        Self { actor_repo, follow_repo, url_config: UrlConfig::new(base_url) }
    }

    fn actor_uri(&self, author: &actor::Model) -> Url {
        author
            .uri
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .unwrap_or_else(|| self.url_config.user_url(&author.preferred_username))
    }

    fn activity_url(&self, kind: &str, id: &str) -> Url {
        self.url_config.base_url.join(&format!("/activities/{kind}/{id}")).expect("valid URL")
    }

    /// Build a Create activity wrapping an already-converted note object.
    #[must_use]
    pub fn build_create_activity(&self, note_model: &note::Model, author: &actor::Model, object: ApNote) -> Value {
        let id = self.activity_url("create", &note_model.id);
        let published = note_model.published_at.with_timezone(&Utc);
        let mut activity = CreateActivity::new(id, self.actor_uri(author), object.clone(), published);
        activity.to = object.to;
        activity.cc = object.cc;
        serde_json::to_value(activity).expect("activity always serializes")
    }

    /// Build a Delete activity tombstoning a note.
    #[must_use]
    pub fn build_delete_activity(&self, note_model: &note::Model, author: &actor::Model) -> Value {
        let id = self.activity_url("delete", &note_model.id);
        let object = self.note_uri(note_model);
        let mut activity = DeleteActivity::new(id, self.actor_uri(author), object);
        activity.to = Some(vec![PUBLIC_URI.parse().expect("valid URL")]);
        serde_json::to_value(activity).expect("activity always serializes")
    }

    /// Build a Follow activity.
    #[must_use]
    pub fn build_follow_activity(&self, follow_id: &str, follower: &actor::Model, followee: &actor::Model) -> Value {
        let id = self.activity_url("follow", follow_id);
        let activity = FollowActivity::new(id, self.actor_uri(follower), self.actor_uri(followee));
        serde_json::to_value(activity).expect("activity always serializes")
    }

    /// Build an Undo wrapping the original Follow, for unfollowing.
    #[must_use]
    pub fn build_unfollow_activity(&self, unfollow_id: &str, follower: &actor::Model, original_follow_uri: &str) -> Value {
        let id = self.activity_url("undo", unfollow_id);
        let object = Url::parse(original_follow_uri).unwrap_or_else(|_| self.actor_uri(follower));
        let activity = UndoActivity::new(id, self.actor_uri(follower), object);
        serde_json::to_value(activity).expect("activity always serializes")
    }

    /// Build an Accept for an inbound Follow.
    #[must_use]
    pub fn build_accept_activity(&self, accept_id: &str, accepter: &actor::Model, follow_activity_uri: &str) -> Value {
        let id = self.activity_url("accept", accept_id);
        let object = Url::parse(follow_activity_uri).unwrap_or_else(|_| self.actor_uri(accepter));
        let activity = AcceptActivity::new(id, self.actor_uri(accepter), object);
        serde_json::to_value(activity).expect("activity always serializes")
    }

    /// Build a Reject for an inbound Follow.
    #[must_use]
    pub fn build_reject_activity(&self, reject_id: &str, rejecter: &actor::Model, follow_activity_uri: &str) -> Value {
        let id = self.activity_url("reject", reject_id);
        let object = Url::parse(follow_activity_uri).unwrap_or_else(|_| self.actor_uri(rejecter));
        let activity = RejectActivity::new(id, self.actor_uri(rejecter), object);
        serde_json::to_value(activity).expect("activity always serializes")
    }

    /// Build an Announce (share) of a note.
    #[must_use]
    pub fn build_announce_activity(&self, note_model: &note::Model, sharer: &actor::Model) -> Value {
        let id = self.activity_url("announce", &note_model.id);
        let object = self.note_uri(note_model);
        let activity = AnnounceActivity::new(id, self.actor_uri(sharer), object, Utc::now()).public();
        serde_json::to_value(activity).expect("activity always serializes")
    }

    /// Build a Move announcing that an actor relocated to `target`.
    #[must_use]
    pub fn build_move_activity(&self, mover: &actor::Model, target: &Url) -> Value {
        let id = self.activity_url("move", &mover.id);
        let activity = MoveActivity::new(id, self.actor_uri(mover), target.clone());
        serde_json::to_value(activity).expect("activity always serializes")
    }

    fn note_uri(&self, note_model: &note::Model) -> Url {
        note_model
            .uri
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .unwrap_or_else(|| self.url_config.base_url.join(&format!("/post/{}", note_model.id)).expect("valid URL"))
    }

    /// Inboxes of `actor`'s accepted followers, shared inboxes preferred.
    pub async fn get_follower_inboxes(&self, actor: &actor::Model) -> AppResult<Vec<String>> {
        let follower_ids = self.follow_repo.all_follower_ids(&actor.id).await?;
        let followers = self.actor_repo.find_by_ids(&follower_ids).await?;
        Ok(dedup_inboxes(followers.iter().filter_map(inbox_of)))
    }

    /// Concrete delivery inboxes for a note, resolved from its stored raw
    /// `to`/`cc` audience: actor uris, the public uri, or the author's
    /// followers collection.
    pub async fn get_delivery_inboxes(&self, note_model: &note::Model, author: &actor::Model) -> AppResult<Vec<String>> {
        let followers_url = self.url_config.followers_url(&author.preferred_username).to_string();

        let mut direct_uris = Vec::new();
        let mut needs_followers = false;
        for entry in audience_entries(note_model) {
            if entry == PUBLIC_URI {
                continue;
            }
            if entry == followers_url {
                needs_followers = true;
            } else {
                direct_uris.push(entry);
            }
        }

        let mut inboxes = if needs_followers { self.get_follower_inboxes(author).await? } else { Vec::new() };

        for uri in direct_uris {
            if let Some(recipient) = self.actor_repo.find_by_uri(&uri).await?
                && let Some(inbox) = inbox_of(&recipient)
            {
                inboxes.push(inbox);
            }
        }

        Ok(dedup_inboxes(inboxes))
    }
}

fn inbox_of(a: &actor::Model) -> Option<String> {
    a.shared_inbox.clone().or_else(|| a.inbox.clone())
}

fn dedup_inboxes(inboxes: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    inboxes.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

fn audience_entries(note_model: &note::Model) -> Vec<String> {
    let mut entries: Vec<String> = serde_json::from_value(note_model.to.clone()).unwrap_or_default();
    let cc: Vec<String> = serde_json::from_value(note_model.cc.clone()).unwrap_or_default();
    entries.extend(cc);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use plaza_store::entities::actor::ActorKind;
    use std::sync::Arc;

    fn test_actor(id: &str, username: &str) -> actor::Model {
        actor::Model {
            id: id.to_string(),
            kind: ActorKind::Person,
            preferred_username: username.to_string(),
            username_lower: username.to_lowercase(),
            host: None,
            name: None,
            summary: None,
            inbox: Some(format!("https://example.com/inbox/{username}")),
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

    fn test_note(id: &str, actor_id: &str, to: Value, cc: Value) -> note::Model {
        note::Model {
            id: id.to_string(),
            actor_id: actor_id.to_string(),
            uri: None,
            content: Some("hi".to_string()),
            visibility: note::Visibility::Public,
            to,
            cc,
            in_reply_to_id: None,
            reply_root_id: None,
            quote_id: None,
            group_id: None,
            published_at: chrono::Utc::now().into(),
            edited_at: None,
            deleted: false,
            created_at: chrono::Utc::now().into(),
        }
    }

    fn test_service() -> DeliveryService {
        use sea_orm::{DatabaseBackend, MockDatabase};

        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        DeliveryService::new(ActorRepository::new(db.clone()), FollowRepository::new(db), Url::parse("https://example.com").unwrap())
    }

    #[test]
    fn build_delete_activity_addresses_public() {
        let service = test_service();
        let author = test_actor("a1", "alice");
        let note_model = test_note("n1", "a1", serde_json::json!([PUBLIC_URI]), serde_json::json!([]));
        let activity = service.build_delete_activity(&note_model, &author);
        assert_eq!(activity["type"], "Delete");
        assert_eq!(activity["to"][0], PUBLIC_URI);
    }

    #[test]
    fn build_follow_activity_targets_followee() {
        let service = test_service();
        let follower = test_actor("a1", "alice");
        let followee = test_actor("a2", "bob");
        let activity = service.build_follow_activity("f1", &follower, &followee);
        assert_eq!(activity["type"], "Follow");
        assert_eq!(activity["object"], "https://example.com/user/bob");
    }

    #[test]
    fn audience_entries_merges_to_and_cc() {
        let note_model = test_note(
            "n1",
            "a1",
            serde_json::json!(["https://example.com/followers/alice"]),
            serde_json::json!(["https://remote.example/user/bob"]),
        );
        let entries = audience_entries(&note_model);
        assert_eq!(entries.len(), 2);
        assert!(entries.contains(&"https://remote.example/user/bob".to_string()));
    }
}
