//! Ed25519 keypairs for signing transaction envelopes.
//!
//! A [`Keypair`] wraps the signing key and exposes the student address
//! derived from its public half. Seeds can be supplied directly, loaded
//! from hex, or generated fresh from the OS entropy source.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use study_core::model::StudentAddress;
use thiserror::Error;
use zeroize::Zeroizing;

/// Length of an ed25519 seed in bytes.
pub const SEED_LEN: usize = 32;

/// Errors produced while constructing keys or signing digests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SignerError {
    #[error("seed must be {SEED_LEN} bytes, got {len}")]
    InvalidSeedLength { len: usize },
    #[error("seed is not valid hex")]
    InvalidSeedEncoding,
    #[error("signing failed: {0}")]
    Signing(String),
}

/// An ed25519 keypair owned by the client process.
///
/// The secret half is zeroized on drop and never printed; `Debug` shows
/// only the derived address.
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    /// Generates a new keypair from the OS entropy source.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Builds a keypair from a raw 32-byte seed.
    #[must_use]
    pub fn from_seed(seed: [u8; SEED_LEN]) -> Self {
        Self {
            signing: SigningKey::from_bytes(&seed),
        }
    }

    /// Builds a keypair from a hex-encoded 32-byte seed.
    pub fn from_seed_hex(seed_hex: &str) -> Result<Self, SignerError> {
        let raw = Zeroizing::new(
            hex::decode(seed_hex.trim()).map_err(|_| SignerError::InvalidSeedEncoding)?,
        );
        let seed: [u8; SEED_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| SignerError::InvalidSeedLength { len: raw.len() })?;
        Ok(Self::from_seed(seed))
    }

    /// The address derived from the public half of this keypair.
    #[must_use]
    pub fn address(&self) -> StudentAddress {
        StudentAddress::from_public_key(self.signing.verifying_key().as_bytes())
    }

    /// The raw public key bytes.
    #[must_use]
    pub fn public_key(&self) -> [u8; 32] {
        self.signing.verifying_key().to_bytes()
    }

    /// Signs a 32-byte digest, returning the signature base64-encoded.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<String, SignerError> {
        let signature = self
            .signing
            .try_sign(digest)
            .map_err(|e| SignerError::Signing(e.to_string()))?;
        Ok(BASE64.encode(signature.to_bytes()))
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Keypair").field(&self.address()).finish()
    }
}

/// Verifies a base64 signature over `digest` against an address.
///
/// The address is the hex encoding of the verifying key, so no separate
/// public key needs to travel with a signed envelope.
pub fn verify_digest(
    address: &StudentAddress,
    digest: &[u8; 32],
    signature_b64: &str,
) -> bool {
    let Ok(key_bytes) = hex::decode(address.as_str()) else {
        return false;
    };
    let Ok(key_array) = <[u8; 32]>::try_from(key_bytes.as_slice()) else {
        return false;
    };
    let Ok(verifying) = VerifyingKey::from_bytes(&key_array) else {
        return false;
    };
    let Ok(sig_bytes) = BASE64.decode(signature_b64) else {
        return false;
    };
    let Ok(sig_array) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
        return false;
    };
    let signature = ed25519_dalek::Signature::from_bytes(&sig_array);
    verifying.verify_strict(digest, &signature).is_ok()
}
