//! Vote activity processor: casts a ballot against a poll note.

use plaza_common::{AppError, AppResult, IdGenerator};
use plaza_store::entities::poll_vote;
use plaza_store::repositories::{NoteRepository, PollRepository, PollVoteRepository};
use sea_orm::Set;
use tracing::info;

use crate::resolver::Resolver;
use crate::VoteActivity;

/// Processor for Vote activities.
#[derive(Clone)]
pub struct VoteProcessor {
    note_repo: NoteRepository,
    poll_repo: PollRepository,
    poll_vote_repo: PollVoteRepository,
    resolver: Resolver,
    id_gen: IdGenerator,
}

/// Result of processing a Vote activity.
#[derive(Debug)]
pub enum VoteProcessResult {
    /// The vote was recorded and the tally updated.
    Recorded { note_id: String, choice: usize },
    /// The voter had already voted; ignored for idempotency.
    AlreadyVoted { note_id: String },
    /// The poll has closed; the vote was rejected.
    PollClosed { note_id: String },
}

impl VoteProcessor {
    /// Create a new vote processor.
    #[must_use]
    pub fn new(
        note_repo: NoteRepository,
        poll_repo: PollRepository,
        poll_vote_repo: PollVoteRepository,
        resolver: Resolver,
    ) -> Self {
        Self { note_repo, poll_repo, poll_vote_repo, resolver, id_gen: IdGenerator::new() }
    }

    /// Process an incoming Vote activity.
    pub async fn process(&self, activity: &VoteActivity) -> AppResult<VoteProcessResult> {
        let note_id = self.resolve_note_id(activity.in_reply_to.as_str()).await?;
        let poll = self
            .poll_repo
            .find_by_note_id(&note_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("poll for note {note_id}")))?;

        if poll.is_expired(chrono::Utc::now()) {
            return Ok(VoteProcessResult::PollClosed { note_id });
        }

        let voter = self.resolver.resolve(activity.actor.as_str()).await.map_err(|e| {
            AppError::Federation(format!("resolving vote actor {}: {e}", activity.actor))
        })?;

        if self.poll_vote_repo.has_voted(&note_id, &voter.id).await? {
            info!(note_id, actor_id = %voter.id, "duplicate vote ignored");
            return Ok(VoteProcessResult::AlreadyVoted { note_id });
        }

        let options: Vec<String> = serde_json::from_value(poll.options.clone()).unwrap_or_default();
        let choice = options
            .iter()
            .position(|opt| opt == &activity.name)
            .ok_or_else(|| AppError::Validation(format!("unknown poll option: {}", activity.name)))?;

        let vote = poll_vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            note_id: Set(note_id.clone()),
            actor_id: Set(voter.id),
            choice: Set(i32::try_from(choice).unwrap_or(0)),
            uri: Set(Some(activity.id.to_string())),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.poll_vote_repo.create(vote).await?;
        self.poll_repo.record_vote(&note_id, choice).await?;

        Ok(VoteProcessResult::Recorded { note_id, choice })
    }

    async fn resolve_note_id(&self, reference: &str) -> AppResult<String> {
        if let Some(note) = self.note_repo.find_by_uri(reference).await? {
            return Ok(note.id);
        }
        Err(AppError::NotFound(format!("poll note {reference}")))
    }
}
