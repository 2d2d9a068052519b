//! Outbox delivery worker.
//!
//! Pops a queued `outbox_item` row, signs it with the sending actor's key
//! and sends it via [`ApClient::deliver`]. Outcomes are recorded back onto
//! the row rather than relied on for apalis-level retry, since the
//! scheduler re-enqueues items that are still due.

use apalis::prelude::*;
use plaza_federation::client::{ApClient, ApClientError};
use plaza_federation::signature::{ActorSigningKey, HttpSignatureService};
use plaza_store::entities::actor_key::KeyAlgorithm;
use plaza_store::repositories::{ActorKeyRepository, OutboxItemRepository};
use tracing::{error, info, warn};

use crate::jobs::DeliverJob;
use crate::retry::RetryConfig;

/// Context for the deliver worker.
#[derive(Clone)]
pub struct DeliverContext {
    pub outbox_repo: OutboxItemRepository,
    pub actor_key_repo: ActorKeyRepository,
    pub ap_client: ApClient,
    pub signature_service: HttpSignatureService,
    pub retry: RetryConfig,
}

impl DeliverContext {
    #[must_use]
    pub const fn new(
        outbox_repo: OutboxItemRepository,
        actor_key_repo: ActorKeyRepository,
        ap_client: ApClient,
        signature_service: HttpSignatureService,
        retry: RetryConfig,
    ) -> Self {
        Self { outbox_repo, actor_key_repo, ap_client, signature_service, retry }
    }

    async fn signing_key(&self, actor_id: &str) -> Result<ActorSigningKey, Box<dyn std::error::Error + Send + Sync>> {
        let ed25519 = self.actor_key_repo.find_by_actor_and_algorithm(actor_id, KeyAlgorithm::Ed25519).await?;
        let rsa = self.actor_key_repo.find_by_actor_and_algorithm(actor_id, KeyAlgorithm::Rsa).await?;

        match (self.signature_service.prefers_rfc9421(), ed25519, rsa) {
            (true, Some(key), _) => {
                let private_key_pem =
                    key.private_key.ok_or("actor has no private key for its Ed25519 key")?;
                Ok(ActorSigningKey::Ed25519 { private_key_pem, key_id: key.key_id })
            }
            (_, _, Some(key)) => {
                let private_key_pem = key.private_key.ok_or("actor has no private key for its RSA key")?;
                Ok(ActorSigningKey::Rsa { private_key_pem, key_id: key.key_id })
            }
            (_, Some(key), None) => {
                let private_key_pem =
                    key.private_key.ok_or("actor has no private key for its Ed25519 key")?;
                Ok(ActorSigningKey::Ed25519 { private_key_pem, key_id: key.key_id })
            }
            (_, None, None) => Err("actor has no signing key on record".into()),
        }
    }
}

/// Worker function for delivering a queued outbox item.
///
/// # Errors
/// Returns an error only when the outbox item itself cannot be read back;
/// delivery failures are recorded on the row and swallowed so apalis does
/// not duplicate the scheduler's own retry.
pub async fn deliver_worker(job: DeliverJob, ctx: Data<DeliverContext>) -> Result<(), Error> {
    let Some(item) = ctx
        .outbox_repo
        .find_by_id(&job.outbox_item_id)
        .await
        .map_err(|e| Error::Failed(std::sync::Arc::new(Box::new(e))))?
    else {
        warn!(id = %job.outbox_item_id, "outbox item vanished before delivery");
        return Ok(());
    };

    if item.is_terminal() {
        return Ok(());
    }

    match deliver_item(&item, &ctx).await {
        Ok(()) => {
            info!(inbox = %item.inbox_url, "activity delivered");
            if let Err(e) = ctx.outbox_repo.mark_delivered(&item.id).await {
                error!(error = %e, "failed to mark outbox item delivered");
            }
        }
        Err(e) => {
            warn!(inbox = %item.inbox_url, error = %e, "activity delivery failed");
            let attempt = u32::try_from(item.attempts).unwrap_or(u32::MAX);
            let next_attempt_at =
                ctx.retry.should_retry(attempt).then(|| chrono::Utc::now() + ctx.retry.delay_for_attempt(attempt));
            if let Err(e) = ctx.outbox_repo.record_failure(&item.id, &e.to_string(), next_attempt_at).await {
                error!(error = %e, "failed to record outbox delivery failure");
            }
        }
    }

    Ok(())
}

async fn deliver_item(
    item: &plaza_store::entities::outbox_item::Model,
    ctx: &DeliverContext,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let key = ctx.signing_key(&item.actor_id).await?;
    let activity: serde_json::Value = item.activity.clone();

    match ctx.ap_client.deliver(&item.inbox_url, &activity, &ctx.signature_service, &key).await {
        Ok(()) => Ok(()),
        Err(ApClientError::Gone(_)) => Ok(()),
        Err(e) => Err(Box::new(e)),
    }
}
