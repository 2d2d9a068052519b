//! Move activity processor for account migration.

use plaza_common::{AppError, AppResult};
use plaza_store::repositories::{ActorRepository, FollowRepository};
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::client::ApClient;

/// Processor for Move activities (account migration).
#[derive(Clone)]
pub struct MoveProcessor {
    actor_repo: ActorRepository,
    follow_repo: FollowRepository,
    ap_client: ApClient,
}

/// Result of processing a Move activity.
#[derive(Debug)]
pub enum MoveProcessResult {
    /// Move was processed successfully.
    Success {
        /// The actor who moved.
        source_actor_id: String,
        /// The URI of the new account.
        target_uri: String,
        /// Number of local followers who will be re-pointed.
        followers_notified: usize,
    },
    /// Move was ignored (source actor unknown locally).
    Ignored { reason: String },
    /// Move validation failed.
    Failed { reason: String },
}

impl MoveProcessor {
    /// Create a new move processor.
    #[must_use]
    pub const fn new(
        actor_repo: ActorRepository,
        follow_repo: FollowRepository,
        ap_client: ApClient,
    ) -> Self {
        Self { actor_repo, follow_repo, ap_client }
    }

    /// Process an incoming Move activity from a remote actor.
    ///
    /// 1. Look up the source actor locally; ignore if we don't know it.
    /// 2. Refuse to move a local account on inbound Move (we are the source
    ///    of truth for our own accounts).
    /// 3. Fetch the target actor and confirm it lists the source in
    ///    `alsoKnownAs`, per FEP-7628.
    /// 4. Record `moved_to` on the source actor.
    pub async fn process(&self, activity: &crate::MoveActivity) -> AppResult<MoveProcessResult> {
        info!(source = %activity.actor, target = %activity.target, "processing Move activity");

        let source_actor = match self.actor_repo.find_by_uri(activity.actor.as_str()).await? {
            Some(actor) => actor,
            None => {
                return Ok(MoveProcessResult::Ignored {
                    reason: "source account not known locally".to_string(),
                });
            }
        };

        if source_actor.is_local() {
            return Ok(MoveProcessResult::Failed {
                reason: "cannot process an inbound Move for a local account".to_string(),
            });
        }

        if let Err(e) = self.verify_move(&activity.actor, &activity.target).await {
            warn!(source = %activity.actor, target = %activity.target, error = %e, "Move validation failed");
            return Ok(MoveProcessResult::Failed { reason: format!("Move validation failed: {e}") });
        }

        self.actor_repo.set_moved_to(&source_actor.id, activity.target.as_str()).await?;

        let follower_count = self.follow_repo.count_followers(&source_actor.id).await?;

        info!(
            source = %source_actor.id,
            target = %activity.target,
            followers = follower_count,
            "Move recorded"
        );

        Ok(MoveProcessResult::Success {
            source_actor_id: source_actor.id,
            target_uri: activity.target.to_string(),
            followers_notified: usize::try_from(follower_count).unwrap_or(usize::MAX),
        })
    }

    /// Per FEP-7628: the target account must list the source account in its
    /// `alsoKnownAs`.
    async fn verify_move(&self, source: &Url, target: &Url) -> AppResult<()> {
        let target_actor = self
            .ap_client
            .fetch_actor(target.as_str())
            .await
            .map_err(|e| AppError::Federation(format!("fetching target actor: {e}")))?;

        let also_known_as = target_actor.get("alsoKnownAs");
        let source_str = source.as_str();

        let is_valid = match also_known_as {
            Some(Value::Array(arr)) => arr.iter().any(|v| v.as_str() == Some(source_str)),
            Some(Value::String(s)) => s == source_str,
            _ => false,
        };

        if !is_valid {
            return Err(AppError::Validation(
                "target account does not list source in alsoKnownAs".to_string(),
            ));
        }

        Ok(())
    }
}
