//! Common utilities and shared types for plaza.

pub mod config;
pub mod crypto;
pub mod error;
pub mod id;

pub use config::{Config, FederationConfig, RegistrationConfig, ThrottleConfig};
pub use crypto::{
    decode_ed25519_multibase, ed25519_did_key, encode_ed25519_multibase, generate_ed25519_keypair,
    generate_rsa_keypair, parse_ed25519_private_key, parse_private_key, parse_public_key,
    Ed25519Keypair, RsaKeypair,
};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
