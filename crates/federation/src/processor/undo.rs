//! Undo activity processor.

use plaza_common::{AppError, AppResult};
use plaza_store::repositories::{ActorRepository, FollowRepository, NoteRepository, ShareRepository};
use tracing::info;
use url::Url;

/// Parsed Undo activity with resolved inner activity details.
#[derive(Debug, Clone)]
pub struct ParsedUndoActivity {
    pub id: Url,
    pub actor: Url,
    /// The type of activity being undone (Follow, Announce).
    pub object_type: String,
    /// The id of the activity being undone.
    pub object_id: Url,
    /// For Undo Follow: the followee URL. For Undo Announce: the note URL.
    pub object_object: Option<Url>,
}

/// Result of processing an Undo activity.
#[derive(Debug)]
pub enum UndoResult {
    /// Follow was undone.
    Unfollowed,
    /// Announce was undone.
    Unshared,
    /// Unknown object type, ignored.
    Ignored,
}

/// Processor for Undo activities.
#[derive(Clone)]
pub struct UndoProcessor {
    actor_repo: ActorRepository,
    follow_repo: FollowRepository,
    share_repo: ShareRepository,
    note_repo: NoteRepository,
}

impl UndoProcessor {
    /// Create a new undo processor.
    #[must_use]
    pub const fn new(
        actor_repo: ActorRepository,
        follow_repo: FollowRepository,
        share_repo: ShareRepository,
        note_repo: NoteRepository,
    ) -> Self {
        Self { actor_repo, follow_repo, share_repo, note_repo }
    }

    /// Process an incoming Undo activity.
    pub async fn process(&self, activity: &ParsedUndoActivity) -> AppResult<UndoResult> {
        info!(actor = %activity.actor, object_type = %activity.object_type, "processing Undo activity");

        match activity.object_type.as_str() {
            "Follow" => self.undo_follow(activity).await,
            "Announce" => self.undo_announce(activity).await,
            _ => {
                info!(object_type = %activity.object_type, "unknown Undo object type, ignoring");
                Ok(UndoResult::Ignored)
            }
        }
    }

    async fn undo_follow(&self, activity: &ParsedUndoActivity) -> AppResult<UndoResult> {
        let follower = self
            .actor_repo
            .find_by_uri(activity.actor.as_str())
            .await?
            .ok_or_else(|| AppError::ActorNotFound(activity.actor.to_string()))?;

        let followee_url = activity
            .object_object
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("Undo Follow missing object.object".to_string()))?;

        let followee = self
            .actor_repo
            .find_by_uri(followee_url.as_str())
            .await?
            .ok_or_else(|| AppError::ActorNotFound(followee_url.to_string()))?;

        if !self.follow_repo.is_following(&follower.id, &followee.id).await? {
            info!("follow relationship doesn't exist, nothing to undo");
            return Ok(UndoResult::Unfollowed);
        }

        self.follow_repo.delete_by_pair(&follower.id, &followee.id).await?;
        self.actor_repo.decrement_following_count(&follower.id).await?;
        self.actor_repo.decrement_followers_count(&followee.id).await?;

        info!(follower = %follower.id, followee = %followee.id, "unfollowed");

        Ok(UndoResult::Unfollowed)
    }

    async fn undo_announce(&self, activity: &ParsedUndoActivity) -> AppResult<UndoResult> {
        let actor = self
            .actor_repo
            .find_by_uri(activity.actor.as_str())
            .await?
            .ok_or_else(|| AppError::ActorNotFound(activity.actor.to_string()))?;

        let note_url = activity
            .object_object
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("Undo Announce missing note reference".to_string()))?;

        let note = self
            .note_repo
            .find_by_uri(note_url.as_str())
            .await?
            .ok_or_else(|| AppError::NoteNotFound(note_url.to_string()))?;

        self.share_repo.delete_by_pair(&actor.id, &note.id).await?;

        info!(actor = %actor.id, note = %note.id, "share removed");

        Ok(UndoResult::Unshared)
    }
}
