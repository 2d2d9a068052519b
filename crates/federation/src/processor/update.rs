//! Update activity processor.

use plaza_common::{AppError, AppResult};
use plaza_store::entities::actor;
use plaza_store::repositories::ActorRepository;
use sea_orm::Set;
use tracing::info;

use crate::activities::{UpdateActivity, UpdateObject};
use crate::actors::ApPerson;

/// Result of processing an Update activity.
#[derive(Debug)]
pub enum UpdateResult {
    /// Actor profile was updated.
    ActorUpdated,
    /// Unknown object type.
    Ignored,
}

/// Processor for Update activities.
#[derive(Clone)]
pub struct UpdateProcessor {
    actor_repo: ActorRepository,
}

impl UpdateProcessor {
    /// Create a new update processor.
    #[must_use]
    pub const fn new(actor_repo: ActorRepository) -> Self {
        Self { actor_repo }
    }

    /// Process an incoming Update activity.
    pub async fn process(&self, activity: &UpdateActivity) -> AppResult<UpdateResult> {
        info!(actor = %activity.actor, "processing Update activity");

        match &activity.object {
            UpdateObject::Person(person) => self.update_actor_from_person(activity, person).await,
            UpdateObject::ObjectUrl(_url) => {
                info!("Update with URL reference, ignoring");
                Ok(UpdateResult::Ignored)
            }
        }
    }

    async fn update_actor_from_person(
        &self,
        activity: &UpdateActivity,
        person: &ApPerson,
    ) -> AppResult<UpdateResult> {
        let existing = self
            .actor_repo
            .find_by_uri(activity.actor.as_str())
            .await?
            .ok_or_else(|| AppError::ActorNotFound(activity.actor.to_string()))?;

        let mut model: actor::ActiveModel = existing.into();

        if let Some(ref name) = person.name {
            model.name = Set(Some(name.clone()));
        }

        if let Some(ref summary) = person.summary {
            model.summary = Set(Some(summary.clone()));
        }

        if let Some(manually_approves) = person.manually_approves_followers {
            model.manually_approves_followers = Set(manually_approves);
        }

        if let Some(ref also_known_as) = person.also_known_as {
            model.also_known_as = Set(serde_json::to_value(also_known_as).unwrap_or_else(|_| serde_json::json!([])));
        }

        model.last_fetched_at = Set(Some(chrono::Utc::now().into()));
        model.updated_at = Set(Some(chrono::Utc::now().into()));

        self.actor_repo.update(model).await?;

        info!(actor = %activity.actor, "actor profile updated");

        Ok(UpdateResult::ActorUpdated)
    }
}
