//! Accept activity processor.

use plaza_common::{AppError, AppResult};
use plaza_store::entities::follow;
use plaza_store::repositories::{ActorRepository, FollowRepository};
use tracing::info;

use crate::activities::AcceptActivity;

/// Processor for Accept activities (follow acceptance).
#[derive(Clone)]
pub struct AcceptProcessor {
    actor_repo: ActorRepository,
    follow_repo: FollowRepository,
}

impl AcceptProcessor {
    /// Create a new accept processor.
    #[must_use]
    pub const fn new(actor_repo: ActorRepository, follow_repo: FollowRepository) -> Self {
        Self { actor_repo, follow_repo }
    }

    /// Process an incoming Accept activity.
    ///
    /// The actor is the remote actor who accepted our Follow; the object is
    /// the id of the Follow activity we originally sent.
    pub async fn process(&self, activity: &AcceptActivity) -> AppResult<follow::Model> {
        info!(actor = %activity.actor, object = %activity.object, "processing Accept activity");

        let followee = self
            .actor_repo
            .find_by_uri(activity.actor.as_str())
            .await?
            .ok_or_else(|| AppError::ActorNotFound(activity.actor.to_string()))?;

        let pending = self
            .follow_repo
            .find_by_activity_uri(activity.object.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no Follow request for {}", activity.object)))?;

        if pending.is_accepted() {
            info!(follow_id = %pending.id, "Accept for already-accepted follow, ignoring");
            return Ok(pending);
        }

        let accepted = self.follow_repo.accept(&pending.id).await?;

        self.actor_repo.increment_following_count(&accepted.follower_id).await?;
        self.actor_repo.increment_followers_count(&followee.id).await?;

        info!(follower = %accepted.follower_id, followee = %followee.id, "follow accepted");

        Ok(accepted)
    }
}
