//! ActivityPub federation.
//!
//! This crate implements the ActivityPub protocol for federated social networking:
//!
//! - **Activities**: Create, Delete, Follow, Announce, Update, Undo, Move, Vote
//! - **Actors**: Person actor implementation, portable `did:key` identities
//! - **Objects**: Note, Question (poll) objects
//! - **Resolver**: turns an actor reference into a local row, single-flight fetch
//! - **Handlers**: WebFinger, NodeInfo, inbox/outbox endpoints
//! - **Security**: HTTP signatures (legacy + RFC 9421), replay protection, rate limiting
//! - **Delivery**: Activity delivery with retry and dead letter queue

pub mod activities;
pub mod actors;
pub mod cache;
pub mod client;
pub mod convert;
pub mod delivery;
pub mod handler;
pub mod inbox;
pub mod middleware;
pub mod objects;
pub mod processor;
pub mod resolver;
pub mod security;
pub mod signature;

pub use activities::*;
pub use actors::*;
pub use cache::{CacheError, CachedRemoteActor, RemoteActorCache};
pub use client::{ApClient, ApClientError};
pub use convert::*;
pub use delivery::DeliveryService;
pub use handler::*;
pub use inbox::{InboxActivity, InboxState};
pub use objects::*;
pub use processor::{
    AcceptActivityInfo, AcceptProcessor, AnnounceProcessor, CreateProcessor, DeleteProcessor,
    DeleteResult, FollowProcessResult, FollowProcessor, MoveProcessResult, MoveProcessor,
    ParsedUndoActivity, RejectProcessor, UndoProcessor, UndoResult, UpdateProcessor, UpdateResult,
    VoteProcessor,
};
pub use resolver::{ResolveError, Resolver};
pub use security::{
    ActivitySecurityChecker, FederationRateLimiter, RateLimitError, RateLimitStatus, ReplayError,
    ReplayProtection, SecurityCheckResult, SecurityError,
};
pub use signature::{
    ActorSigningKey, HttpSignatureService, IntegrityProofSigner, IntegrityProofVerifier,
    LegacySigner, LegacyVerifier, Rfc9421Signer, Rfc9421Verifier, SignatureComponents,
    SignatureError, Signer, Verifier,
};
