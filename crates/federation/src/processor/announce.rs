//! Announce activity processor (shares/boosts).

use plaza_common::{AppError, AppResult, IdGenerator};
use plaza_store::entities::share;
use plaza_store::repositories::{NoteRepository, ShareRepository};
use sea_orm::Set;
use tracing::info;

use crate::activities::AnnounceActivity;
use crate::resolver::Resolver;

/// Processor for Announce activities (shares/boosts).
#[derive(Clone)]
pub struct AnnounceProcessor {
    note_repo: NoteRepository,
    share_repo: ShareRepository,
    resolver: Resolver,
    id_gen: IdGenerator,
}

impl AnnounceProcessor {
    /// Create a new announce processor.
    #[must_use]
    pub fn new(note_repo: NoteRepository, share_repo: ShareRepository, resolver: Resolver) -> Self {
        Self { note_repo, share_repo, resolver, id_gen: IdGenerator::new() }
    }

    /// Process an incoming Announce activity.
    pub async fn process(&self, activity: &AnnounceActivity) -> AppResult<share::Model> {
        info!(actor = %activity.actor, object = %activity.object, "processing Announce activity");

        if let Some(existing) = self.share_repo.find_by_uri(activity.id.as_str()).await? {
            info!(share_id = %existing.id, "Announce already recorded");
            return Ok(existing);
        }

        let note = self
            .note_repo
            .find_by_uri(activity.object.as_str())
            .await?
            .ok_or_else(|| AppError::NoteNotFound(activity.object.to_string()))?;

        let actor = self
            .resolver
            .resolve(activity.actor.as_str())
            .await
            .map_err(|e| AppError::Federation(format!("resolving announcing actor {}: {e}", activity.actor)))?;

        if let Some(existing) = self.share_repo.find_by_pair(&actor.id, &note.id).await? {
            return Ok(existing);
        }

        let model = share::ActiveModel {
            id: Set(self.id_gen.generate()),
            actor_id: Set(actor.id.clone()),
            note_id: Set(note.id.clone()),
            uri: Set(Some(activity.id.to_string())),
            created_at: Set(chrono::Utc::now().into()),
        };

        let share = self.share_repo.create(model).await?;

        info!(share_id = %share.id, actor = %actor.id, note = %note.id, "recorded share");

        Ok(share)
    }
}
