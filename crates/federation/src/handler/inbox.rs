//! Inbox endpoints: `/inbox/{user}` and the shared inbox `/inbox/nobody`.
//!
//! Both routes sit behind [`crate::middleware::SignatureVerificationLayer`];
//! by the time a request reaches these handlers, `SignatureVerified` carries
//! whichever local actor id signed the request (or `None` if verification
//! wasn't required). The actual parsing/dedupe/dispatch work lives in
//! [`crate::inbox`].

use axum::{
    Extension,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};

use crate::inbox::InboxState;
use crate::middleware::SignatureVerified;

/// Handle POST /inbox/{user}.
pub async fn user_inbox_handler(
    State(state): State<InboxState>,
    Path(_user): Path<String>,
    Extension(verified): Extension<SignatureVerified>,
    body: Bytes,
) -> StatusCode {
    crate::inbox::process_body(&state, verified.actor_id.as_deref(), &body).await
}

/// Handle POST /inbox/nobody, the shared inbox.
pub async fn shared_inbox_handler(
    State(state): State<InboxState>,
    Extension(verified): Extension<SignatureVerified>,
    body: Bytes,
) -> StatusCode {
    crate::inbox::process_body(&state, verified.actor_id.as_deref(), &body).await
}
