//! Repository layer: one struct per entity, each a thin wrapper around a
//! shared `DatabaseConnection`.

pub mod actor;
pub mod actor_key;
pub mod follow;
pub mod instance_setting;
pub mod invitation_code;
pub mod note;
pub mod note_attachment;
pub mod note_tag;
pub mod outbox_item;
pub mod poll;
pub mod poll_vote;
pub mod portable_gateway;
pub mod share;

pub use actor::ActorRepository;
pub use actor_key::ActorKeyRepository;
pub use follow::FollowRepository;
pub use instance_setting::InstanceSettingRepository;
pub use invitation_code::InvitationCodeRepository;
pub use note::NoteRepository;
pub use note_attachment::NoteAttachmentRepository;
pub use note_tag::NoteTagRepository;
pub use outbox_item::OutboxItemRepository;
pub use poll::PollRepository;
pub use poll_vote::PollVoteRepository;
pub use portable_gateway::PortableGatewayRepository;
pub use share::ShareRepository;
