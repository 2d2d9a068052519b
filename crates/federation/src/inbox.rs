//! Inbox dispatch pipeline: parse, dedupe, authority-check, and route an
//! incoming activity to its processor.
//!
//! Signature verification itself happens one layer up, in
//! [`crate::middleware::signature_verification`] — by the time an activity
//! reaches [`process_body`], the request is already known to be signed by
//! `verified_actor` (or verification was not required for this route).

use axum::http::StatusCode;
use plaza_common::{AppError, AppResult};
use plaza_store::entities::actor_key::KeyAlgorithm;
use plaza_store::repositories::{
    ActorKeyRepository, ActorRepository, FollowRepository, NoteAttachmentRepository,
    NoteRepository, NoteTagRepository, PollRepository, PollVoteRepository, ShareRepository,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use url::Url;

use crate::client::ApClient;
use crate::processor::{
    AcceptActivityInfo, AcceptProcessor, AnnounceProcessor, CreateProcessor, DeleteProcessor,
    FollowProcessor, MoveProcessor, ParsedUndoActivity, RejectProcessor, UndoProcessor,
    UpdateProcessor, VoteProcessor,
};
use crate::resolver::Resolver;
use crate::security::ActivitySecurityChecker;
use crate::signature::{ActorSigningKey, HttpSignatureService};
use crate::{
    AcceptActivity, AnnounceActivity, CreateActivity, DeleteActivity, FollowActivity,
    FollowProcessResult, MoveActivity, RejectActivity, UndoActivity, UpdateActivity, VoteActivity,
};

/// Any activity type the inbox pipeline dispatches on.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum InboxActivity {
    Create(CreateActivity),
    Delete(DeleteActivity),
    Follow(FollowActivity),
    Accept(AcceptActivity),
    Reject(RejectActivity),
    Undo(UndoActivity),
    Update(UpdateActivity),
    Announce(AnnounceActivity),
    Move(MoveActivity),
    Vote(VoteActivity),
    Unknown(Value),
}

impl InboxActivity {
    /// The activity's `type` field, for logging.
    #[must_use]
    pub const fn activity_type(&self) -> &str {
        match self {
            Self::Create(_) => "Create",
            Self::Delete(_) => "Delete",
            Self::Follow(_) => "Follow",
            Self::Accept(_) => "Accept",
            Self::Reject(_) => "Reject",
            Self::Undo(_) => "Undo",
            Self::Update(_) => "Update",
            Self::Announce(_) => "Announce",
            Self::Move(_) => "Move",
            Self::Vote(_) => "Vote",
            Self::Unknown(_) => "Unknown",
        }
    }

    /// The `actor` field, if the shape carries one.
    #[must_use]
    pub const fn actor(&self) -> Option<&Url> {
        match self {
            Self::Create(a) => Some(&a.actor),
            Self::Delete(a) => Some(&a.actor),
            Self::Follow(a) => Some(&a.actor),
            Self::Accept(a) => Some(&a.actor),
            Self::Reject(a) => Some(&a.actor),
            Self::Undo(a) => Some(&a.actor),
            Self::Update(a) => Some(&a.actor),
            Self::Announce(a) => Some(&a.actor),
            Self::Move(a) => Some(&a.actor),
            Self::Vote(a) => Some(&a.actor),
            Self::Unknown(_) => None,
        }
    }

    /// The activity's own `id`, used for replay-window deduplication.
    #[must_use]
    pub const fn id(&self) -> Option<&Url> {
        match self {
            Self::Create(a) => Some(&a.id),
            Self::Delete(a) => Some(&a.id),
            Self::Follow(a) => Some(&a.id),
            Self::Accept(a) => Some(&a.id),
            Self::Reject(a) => Some(&a.id),
            Self::Undo(a) => Some(&a.id),
            Self::Update(a) => Some(&a.id),
            Self::Announce(a) => Some(&a.id),
            Self::Move(a) => Some(&a.id),
            Self::Vote(a) => Some(&a.id),
            Self::Unknown(_) => None,
        }
    }
}

/// Everything the inbox pipeline needs to dispatch an activity.
#[derive(Clone)]
pub struct InboxState {
    pub actor_repo: ActorRepository,
    pub actor_key_repo: ActorKeyRepository,
    pub follow_repo: FollowRepository,
    pub note_repo: NoteRepository,
    pub attachment_repo: NoteAttachmentRepository,
    pub tag_repo: NoteTagRepository,
    pub poll_repo: PollRepository,
    pub poll_vote_repo: PollVoteRepository,
    pub share_repo: ShareRepository,
    pub resolver: Resolver,
    pub ap_client: ApClient,
    pub security: ActivitySecurityChecker,
    pub signature_service: HttpSignatureService,
    pub base_url: Url,
}

impl InboxState {
    /// Build a new inbox state.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        actor_repo: ActorRepository,
        actor_key_repo: ActorKeyRepository,
        follow_repo: FollowRepository,
        note_repo: NoteRepository,
        attachment_repo: NoteAttachmentRepository,
        tag_repo: NoteTagRepository,
        poll_repo: PollRepository,
        poll_vote_repo: PollVoteRepository,
        share_repo: ShareRepository,
        resolver: Resolver,
        ap_client: ApClient,
        security: ActivitySecurityChecker,
        signature_service: HttpSignatureService,
        base_url: Url,
    ) -> Self {
        Self {
            actor_repo,
            actor_key_repo,
            follow_repo,
            note_repo,
            attachment_repo,
            tag_repo,
            poll_repo,
            poll_vote_repo,
            share_repo,
            resolver,
            ap_client,
            security,
            signature_service,
            base_url,
        }
    }
}

/// Parse, dedupe, authority-check and dispatch a raw inbox body.
///
/// `verified_actor` is the actor id the signature middleware attached to the
/// request (`None` when signatures aren't required on this route). When
/// present, it must match the activity's own claimed `actor` — a signed
/// request speaking for someone else is rejected outright.
pub async fn process_body(state: &InboxState, verified_actor: Option<&str>, body: &[u8]) -> StatusCode {
    let activity: InboxActivity = match serde_json::from_slice(body) {
        Ok(a) => a,
        Err(e) => {
            warn!(error = %e, "failed to parse inbox activity");
            return StatusCode::BAD_REQUEST;
        }
    };

    info!(activity_type = activity.activity_type(), actor = ?activity.actor(), "received activity");

    if let (Some(verified), Some(claimed)) = (verified_actor, activity.actor())
        && verified != claimed.as_str()
    {
        warn!(verified, claimed = %claimed, "signing actor does not match activity actor, rejecting");
        return StatusCode::FORBIDDEN;
    }

    if let Some(id) = activity.id()
        && let Err(e) = state.security.replay_protection().check_and_record_activity(id.as_str()).await
    {
        info!(activity_id = %id, error = %e, "duplicate activity, ignoring");
        return StatusCode::ACCEPTED;
    }

    match dispatch(state, &activity).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(e) => {
            error!(error = %e, "failed to process activity");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Entry point for portable (`did:key`) gateway inboxes: the `did` path
/// segment has already been resolved to `actor`, so this just runs the same
/// pipeline without a per-route signature binding.
pub async fn deliver_to_actor(
    state: &InboxState,
    actor: &plaza_store::entities::actor::Model,
    body: &[u8],
) -> StatusCode {
    info!(actor_id = %actor.id, "delivering to portable actor gateway inbox");
    process_body(state, None, body).await
}

async fn dispatch(state: &InboxState, activity: &InboxActivity) -> AppResult<()> {
    match activity {
        InboxActivity::Create(create) => {
            let processor = CreateProcessor::new(
                state.note_repo.clone(),
                state.attachment_repo.clone(),
                state.tag_repo.clone(),
                state.poll_repo.clone(),
                state.resolver.clone(),
            );
            processor.process(create).await?;
        }
        InboxActivity::Delete(delete) => {
            let processor = DeleteProcessor::new(state.actor_repo.clone(), state.note_repo.clone());
            processor.process(delete).await?;
        }
        InboxActivity::Follow(follow) => {
            let processor = FollowProcessor::with_base_url(
                state.actor_repo.clone(),
                state.follow_repo.clone(),
                state.resolver.clone(),
                state.base_url.clone(),
            );
            if let FollowProcessResult::Accepted { accept_activity: Some(info), .. } = processor.process(follow).await? {
                deliver_accept(state, &info).await;
            }
        }
        InboxActivity::Accept(accept) => {
            let processor = AcceptProcessor::new(state.actor_repo.clone(), state.follow_repo.clone());
            processor.process(accept).await?;
        }
        InboxActivity::Reject(reject) => {
            let processor = RejectProcessor::new(state.follow_repo.clone());
            processor.process(reject).await?;
        }
        InboxActivity::Undo(undo) => {
            let parsed = parse_undo_activity(state, undo).await?;
            let processor = UndoProcessor::new(
                state.actor_repo.clone(),
                state.follow_repo.clone(),
                state.share_repo.clone(),
                state.note_repo.clone(),
            );
            processor.process(&parsed).await?;
        }
        InboxActivity::Update(update) => {
            let processor = UpdateProcessor::new(state.actor_repo.clone());
            processor.process(update).await?;
        }
        InboxActivity::Announce(announce) => {
            let processor =
                AnnounceProcessor::new(state.note_repo.clone(), state.share_repo.clone(), state.resolver.clone());
            processor.process(announce).await?;
        }
        InboxActivity::Move(move_activity) => {
            let processor =
                MoveProcessor::new(state.actor_repo.clone(), state.follow_repo.clone(), state.ap_client.clone());
            processor.process(move_activity).await?;
        }
        InboxActivity::Vote(vote) => {
            let processor = VoteProcessor::new(
                state.note_repo.clone(),
                state.poll_repo.clone(),
                state.poll_vote_repo.clone(),
                state.resolver.clone(),
            );
            processor.process(vote).await?;
        }
        InboxActivity::Unknown(value) => {
            warn!(activity_type = ?value.get("type"), "received unknown activity type");
        }
    }

    Ok(())
}

/// Look up the delivery-signing key for a local actor: an Ed25519 key is
/// preferred when one is on record, falling back to RSA.
async fn local_signing_key(state: &InboxState, actor_id: &str) -> Option<ActorSigningKey> {
    let keys = state.actor_key_repo.find_by_actor_id(actor_id).await.ok()?;

    let ed25519 = keys
        .iter()
        .find(|k| k.algorithm == KeyAlgorithm::Ed25519 && k.private_key.is_some());
    if let Some(k) = ed25519 {
        return Some(ActorSigningKey::Ed25519 {
            private_key_pem: k.private_key.clone()?,
            key_id: k.key_id.clone(),
        });
    }

    let rsa = keys.iter().find(|k| k.algorithm == KeyAlgorithm::Rsa && k.private_key.is_some())?;
    Some(ActorSigningKey::Rsa { private_key_pem: rsa.private_key.clone()?, key_id: rsa.key_id.clone() })
}

/// Deliver the Accept activity a successful Follow produced, best-effort:
/// failures are logged, not propagated, since the Follow itself already
/// succeeded locally.
async fn deliver_accept(state: &InboxState, info: &AcceptActivityInfo) {
    let Some(key) = local_signing_key(state, &info.accepter_id).await else {
        warn!(accepter = %info.accepter_id, "no signing key on record, cannot deliver Accept");
        return;
    };

    if let Err(e) = state.ap_client.deliver(&info.inbox_url, &info.activity, &state.signature_service, &key).await {
        warn!(error = %e, inbox = %info.inbox_url, "failed to deliver Accept activity");
    }
}

/// Resolve an Undo's target activity by fetching it, to learn what's
/// actually being undone (Follow vs Announce) and its inner object.
async fn parse_undo_activity(state: &InboxState, undo: &UndoActivity) -> AppResult<ParsedUndoActivity> {
    let activity_json = state
        .ap_client
        .fetch_object(undo.object.as_str())
        .await
        .map_err(|e| AppError::Federation(format!("failed to fetch undo object: {e}")))?;

    let object_type = activity_json.get("type").and_then(|t| t.as_str()).unwrap_or("Unknown").to_string();

    let object_object = activity_json.get("object").and_then(|o| {
        if let Some(s) = o.as_str() {
            Url::parse(s).ok()
        } else if let Some(obj) = o.as_object() {
            obj.get("id").and_then(|id| id.as_str()).and_then(|s| Url::parse(s).ok())
        } else {
            None
        }
    });

    Ok(ParsedUndoActivity {
        id: undo.id.clone(),
        actor: undo.actor.clone(),
        object_type,
        object_id: undo.object.clone(),
        object_object,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_activity_has_no_actor_or_id() {
        let activity = InboxActivity::Unknown(serde_json::json!({"type": "SomeFutureType"}));
        assert!(activity.actor().is_none());
        assert!(activity.id().is_none());
        assert_eq!(activity.activity_type(), "Unknown");
    }

    #[test]
    fn parses_untagged_follow_activity() {
        let json = serde_json::json!({
            "type": "Follow",
            "id": "https://example.com/activities/1",
            "actor": "https://example.com/user/alice",
            "object": "https://remote.example/user/bob",
        });
        let activity: InboxActivity = serde_json::from_value(json).unwrap();
        assert_eq!(activity.activity_type(), "Follow");
        assert_eq!(activity.actor().unwrap().as_str(), "https://example.com/user/alice");
    }
}
