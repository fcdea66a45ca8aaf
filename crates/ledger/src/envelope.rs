//! Transaction envelopes and their signing digest.
//!
//! An envelope binds one contract invocation to a source account, a
//! sequence number, a fee, and an expiry deadline. Its digest is the
//! SHA-256 of the network passphrase followed by the envelope's canonical
//! JSON encoding, so a signature is only valid on the network it was
//! produced for. The digest doubles as the transaction hash used to poll
//! for status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use study_core::model::StudentAddress;
use thiserror::Error;

use crate::contract::{ContractId, EntryPoint};
use crate::signer::{Keypair, SignerError, verify_digest};
use crate::value::WireValue;

//
// ─── TRANSACTION HASH ──────────────────────────────────────────────────────────
//

/// Hex length of a transaction hash.
pub const TX_HASH_LEN: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TxHashError {
    #[error("transaction hash must be {TX_HASH_LEN} hex chars, got {len}")]
    InvalidLength { len: usize },
    #[error("transaction hash is not valid hex")]
    InvalidEncoding,
}

/// Identifies a submitted transaction: the hex-encoded envelope digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    #[must_use]
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    /// Parses a hash from its hex form, as returned by an endpoint.
    pub fn parse(raw: &str) -> Result<Self, TxHashError> {
        let trimmed = raw.trim();
        if trimmed.len() != TX_HASH_LEN {
            return Err(TxHashError::InvalidLength { len: trimmed.len() });
        }
        if !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TxHashError::InvalidEncoding);
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── UNSIGNED ENVELOPE ─────────────────────────────────────────────────────────
//

/// A built but not yet signed contract invocation.
///
/// Field order is part of the digest: the canonical encoding serializes
/// fields exactly as declared here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    source: StudentAddress,
    sequence: u64,
    fee: u32,
    #[serde(with = "chrono::serde::ts_seconds")]
    valid_until: DateTime<Utc>,
    contract: ContractId,
    entry_point: EntryPoint,
    args: Vec<WireValue>,
}

impl TransactionEnvelope {
    pub(crate) fn new(
        source: StudentAddress,
        sequence: u64,
        fee: u32,
        valid_until: DateTime<Utc>,
        contract: ContractId,
        entry_point: EntryPoint,
        args: Vec<WireValue>,
    ) -> Self {
        Self {
            source,
            sequence,
            fee,
            valid_until,
            contract,
            entry_point,
            args,
        }
    }

    #[must_use]
    pub fn source(&self) -> &StudentAddress {
        &self.source
    }

    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[must_use]
    pub fn fee(&self) -> u32 {
        self.fee
    }

    /// Deadline after which the ledger must not apply this envelope.
    #[must_use]
    pub fn valid_until(&self) -> DateTime<Utc> {
        self.valid_until
    }

    #[must_use]
    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    #[must_use]
    pub fn entry_point(&self) -> EntryPoint {
        self.entry_point
    }

    #[must_use]
    pub fn args(&self) -> &[WireValue] {
        &self.args
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }

    /// Computes the signing digest for this envelope on the given network.
    #[must_use]
    pub fn digest(&self, network_passphrase: &str) -> [u8; 32] {
        let encoded = serde_json::to_vec(self).expect("envelope should serialize");
        let mut hasher = Sha256::new();
        hasher.update(network_passphrase.as_bytes());
        hasher.update(b"\n");
        hasher.update(&encoded);
        hasher.finalize().into()
    }

    /// Signs the envelope for the given network, consuming it.
    pub fn sign(
        self,
        keypair: &Keypair,
        network_passphrase: &str,
    ) -> Result<SignedEnvelope, SignerError> {
        let digest = self.digest(network_passphrase);
        let signature = keypair.sign_digest(&digest)?;
        Ok(SignedEnvelope {
            hash: TxHash::from_digest(&digest),
            envelope: self,
            signature,
        })
    }
}

//
// ─── SIGNED ENVELOPE ───────────────────────────────────────────────────────────
//

/// An envelope plus the source account's signature over its digest.
///
/// Only obtainable through [`TransactionEnvelope::sign`], so anything
/// holding one knows the signing step has happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    envelope: TransactionEnvelope,
    signature: String,
    hash: TxHash,
}

impl SignedEnvelope {
    #[must_use]
    pub fn envelope(&self) -> &TransactionEnvelope {
        &self.envelope
    }

    /// Base64-encoded ed25519 signature over the envelope digest.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    #[must_use]
    pub fn hash(&self) -> &TxHash {
        &self.hash
    }

    /// Checks the signature and hash against the envelope contents.
    ///
    /// The source address is the verifying key, so this needs nothing
    /// beyond the envelope itself and the network passphrase.
    #[must_use]
    pub fn verify(&self, network_passphrase: &str) -> bool {
        let digest = self.envelope.digest(network_passphrase);
        if TxHash::from_digest(&digest) != self.hash {
            return false;
        }
        verify_digest(self.envelope.source(), &digest, &self.signature)
    }
}
