//! Cryptographic utilities for `ActivityPub` signatures.
//!
//! Covers key generation for both signature families an actor may carry:
//! legacy RSA-SHA256 (draft-cavage) and Ed25519 (RFC 9421 / data-integrity
//! proofs). See `plaza_federation::signature` for the signer/verifier
//! implementations that consume these keys.

use ed25519_dalek::{
    pkcs8::{DecodePrivateKey as Ed25519DecodePrivateKey, EncodePrivateKey as Ed25519EncodePrivateKey},
    SigningKey, VerifyingKey,
};
use rsa::{
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding},
    RsaPrivateKey, RsaPublicKey,
};

use crate::{AppError, AppResult};

/// RSA key pair for `ActivityPub` HTTP Signatures.
#[derive(Debug, Clone)]
pub struct RsaKeypair {
    /// Public key in PEM format.
    pub public_key_pem: String,
    /// Private key in PEM format.
    pub private_key_pem: String,
}

/// Ed25519 key pair for RFC 9421 signatures and data-integrity proofs.
#[derive(Debug, Clone)]
pub struct Ed25519Keypair {
    /// Public key, multibase-encoded (`z`-prefixed base58btc) per
    /// did:key convention.
    pub public_key_multibase: String,
    /// Private key in PKCS#8 PEM format.
    pub private_key_pem: String,
}

/// Default RSA key size (2048 bits).
const RSA_KEY_SIZE: usize = 2048;

/// Multicodec prefix for an Ed25519 public key (0xed01, varint-encoded).
const ED25519_MULTICODEC_PREFIX: [u8; 2] = [0xed, 0x01];

/// Generate a new RSA key pair.
///
/// # Errors
/// Returns an error if key generation fails.
pub fn generate_rsa_keypair() -> AppResult<RsaKeypair> {
    let mut rng = rand::thread_rng();

    let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_SIZE)
        .map_err(|e| AppError::Internal(format!("Failed to generate RSA key: {e}")))?;

    let public_key = RsaPublicKey::from(&private_key);

    let private_key_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| AppError::Internal(format!("Failed to encode private key: {e}")))?
        .to_string();

    let public_key_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| AppError::Internal(format!("Failed to encode public key: {e}")))?;

    Ok(RsaKeypair {
        public_key_pem,
        private_key_pem,
    })
}

/// Parse an RSA private key from PEM format.
pub fn parse_private_key(pem: &str) -> AppResult<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .map_err(|e| AppError::Internal(format!("Failed to parse private key: {e}")))
}

/// Parse an RSA public key from PEM format.
pub fn parse_public_key(pem: &str) -> AppResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .map_err(|e| AppError::Internal(format!("Failed to parse public key: {e}")))
}

/// Generate a new Ed25519 key pair, suitable both for signing and for
/// deriving a `did:key` identifier.
///
/// # Errors
/// Returns an error if PKCS#8 encoding fails.
pub fn generate_ed25519_keypair() -> AppResult<Ed25519Keypair> {
    let mut rng = rand::rngs::OsRng;
    let signing_key = SigningKey::generate(&mut rng);

    let private_key_pem = signing_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| AppError::Internal(format!("Failed to encode Ed25519 private key: {e}")))?
        .to_string();

    let public_key_multibase = encode_ed25519_multibase(&signing_key.verifying_key());

    Ok(Ed25519Keypair {
        public_key_multibase,
        private_key_pem,
    })
}

/// Parse an Ed25519 private key from PKCS#8 PEM format.
pub fn parse_ed25519_private_key(pem: &str) -> AppResult<SigningKey> {
    SigningKey::from_pkcs8_pem(pem)
        .map_err(|e| AppError::Internal(format!("Failed to parse Ed25519 private key: {e}")))
}

/// Multibase-encode an Ed25519 public key the way a `did:key` does: a
/// multicodec prefix followed by the raw 32 bytes, base58btc with the `z`
/// multibase prefix.
#[must_use]
pub fn encode_ed25519_multibase(key: &VerifyingKey) -> String {
    let mut buf = Vec::with_capacity(ED25519_MULTICODEC_PREFIX.len() + 32);
    buf.extend_from_slice(&ED25519_MULTICODEC_PREFIX);
    buf.extend_from_slice(key.as_bytes());
    multibase::encode(multibase::Base::Base58Btc, buf)
}

/// Decode a multibase-encoded Ed25519 public key back into raw key bytes.
///
/// # Errors
/// Returns an error if the multibase encoding is invalid, the multicodec
/// prefix doesn't match Ed25519, or the key bytes are malformed.
pub fn decode_ed25519_multibase(encoded: &str) -> AppResult<VerifyingKey> {
    let (_, bytes) = multibase::decode(encoded)
        .map_err(|e| AppError::Internal(format!("Invalid multibase key: {e}")))?;

    let key_bytes = bytes
        .strip_prefix(ED25519_MULTICODEC_PREFIX.as_slice())
        .ok_or_else(|| AppError::Internal("unexpected multicodec prefix for Ed25519 key".into()))?;

    let array: [u8; 32] = key_bytes
        .try_into()
        .map_err(|_| AppError::Internal("Ed25519 public key must be 32 bytes".into()))?;

    VerifyingKey::from_bytes(&array)
        .map_err(|e| AppError::Internal(format!("Invalid Ed25519 public key: {e}")))
}

/// Derive the `did:key:z...` identifier for an Ed25519 verifying key.
#[must_use]
pub fn ed25519_did_key(key: &VerifyingKey) -> String {
    format!("did:key:{}", encode_ed25519_multibase(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_keypair() {
        let keypair = generate_rsa_keypair().unwrap();

        assert!(keypair.public_key_pem.contains("BEGIN PUBLIC KEY"));
        assert!(keypair.public_key_pem.contains("END PUBLIC KEY"));
        assert!(keypair.private_key_pem.contains("BEGIN PRIVATE KEY"));
        assert!(keypair.private_key_pem.contains("END PRIVATE KEY"));
    }

    #[test]
    fn test_parse_generated_keys() {
        let keypair = generate_rsa_keypair().unwrap();

        // Should be able to parse the generated keys
        let _private = parse_private_key(&keypair.private_key_pem).unwrap();
        let _public = parse_public_key(&keypair.public_key_pem).unwrap();
    }

    #[test]
    fn test_generate_ed25519_keypair() {
        let keypair = generate_ed25519_keypair().unwrap();

        assert!(keypair.public_key_multibase.starts_with('z'));
        assert!(keypair.private_key_pem.contains("BEGIN PRIVATE KEY"));
    }

    #[test]
    fn test_ed25519_multibase_round_trip() {
        let keypair = generate_ed25519_keypair().unwrap();
        let signing_key = parse_ed25519_private_key(&keypair.private_key_pem).unwrap();

        let encoded = encode_ed25519_multibase(&signing_key.verifying_key());
        assert_eq!(encoded, keypair.public_key_multibase);

        let decoded = decode_ed25519_multibase(&encoded).unwrap();
        assert_eq!(decoded, signing_key.verifying_key());
    }

    #[test]
    fn test_ed25519_did_key_format() {
        let keypair = generate_ed25519_keypair().unwrap();
        let signing_key = parse_ed25519_private_key(&keypair.private_key_pem).unwrap();

        let did = ed25519_did_key(&signing_key.verifying_key());
        assert!(did.starts_with("did:key:z"));
    }
}
