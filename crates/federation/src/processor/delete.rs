//! Delete activity processor.

use plaza_common::{AppError, AppResult};
use plaza_store::repositories::{ActorRepository, NoteRepository};
use tracing::info;

use crate::activities::DeleteActivity;

/// Result of processing a Delete activity.
#[derive(Debug)]
pub enum DeleteResult {
    /// Note was tombstoned.
    NoteDeleted,
    /// Actor was suspended (account deletion).
    ActorDeleted,
    /// Object not found, nothing to delete.
    NotFound,
}

/// Processor for Delete activities.
#[derive(Clone)]
pub struct DeleteProcessor {
    actor_repo: ActorRepository,
    note_repo: NoteRepository,
}

impl DeleteProcessor {
    /// Create a new delete processor.
    #[must_use]
    pub const fn new(actor_repo: ActorRepository, note_repo: NoteRepository) -> Self {
        Self { actor_repo, note_repo }
    }

    /// Process an incoming Delete activity.
    pub async fn process(&self, activity: &DeleteActivity) -> AppResult<DeleteResult> {
        info!(actor = %activity.actor, object = %activity.object, "processing Delete activity");

        let actor = self.actor_repo.find_by_uri(activity.actor.as_str()).await?;

        if let Some(note) = self.note_repo.find_by_uri(activity.object.as_str()).await? {
            if let Some(ref actor) = actor
                && note.actor_id != actor.id
            {
                return Err(AppError::Forbidden("actor does not own this note".to_string()));
            }

            self.note_repo.mark_deleted(&note.id).await?;
            info!(note_id = %note.id, "note tombstoned");
            return Ok(DeleteResult::NoteDeleted);
        }

        if activity.actor == activity.object
            && let Some(actor) = actor
        {
            self.actor_repo.mark_as_suspended(&actor.id).await?;
            info!(actor_id = %actor.id, "remote actor suspended on self-delete");
            return Ok(DeleteResult::ActorDeleted);
        }

        info!(object = %activity.object, "Delete target not found");

        Ok(DeleteResult::NotFound)
    }
}
