//! Reject activity processor.

use plaza_common::AppResult;
use plaza_store::repositories::FollowRepository;
use tracing::info;

use crate::activities::RejectActivity;

/// Processor for Reject activities (follow rejection).
#[derive(Clone)]
pub struct RejectProcessor {
    follow_repo: FollowRepository,
}

impl RejectProcessor {
    /// Create a new reject processor.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository) -> Self {
        Self { follow_repo }
    }

    /// Process an incoming Reject activity.
    ///
    /// The actor is the remote actor who rejected our Follow; the object is
    /// the id of the Follow activity we originally sent.
    pub async fn process(&self, activity: &RejectActivity) -> AppResult<()> {
        info!(actor = %activity.actor, object = %activity.object, "processing Reject activity");

        if let Some(pending) = self.follow_repo.find_by_activity_uri(activity.object.as_str()).await? {
            self.follow_repo.reject(&pending.id).await?;
            info!(follow_id = %pending.id, "follow request rejected");
        } else {
            info!(object = %activity.object, "no pending follow request for this Reject");
        }

        Ok(())
    }
}
