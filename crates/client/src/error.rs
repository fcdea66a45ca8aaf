//! Error types shared across the client services.

use ledger::{ArgsError, ContractIdError, DecodeError, GatewayError, SignerError, TxHash};
use study_core::model::StudentAddress;
use thiserror::Error;

/// Problems detected while assembling or validating a [`crate::LedgerConfig`],
/// including the connect-time handshake with the endpoint.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },

    #[error(transparent)]
    Contract(#[from] ContractIdError),

    #[error("network passphrase cannot be empty")]
    EmptyPassphrase,

    #[error("fee must be positive")]
    ZeroFee,

    #[error("expiry window must be between 1 and 3600 seconds")]
    BadExpiryWindow,

    #[error("poll interval cannot be zero")]
    ZeroPollInterval,

    #[error("submission deadline must be at least one poll interval")]
    ShortDeadline,

    #[error("http timeout cannot be zero")]
    ZeroHttpTimeout,

    #[error("endpoint handshake failed: {0}")]
    Handshake(String),

    /// The endpoint answers, but for a different network than the config
    /// names. Signing against the wrong passphrase would produce envelopes
    /// that ledger rejects one by one, so this is caught at connect time.
    #[error("endpoint serves network {got:?}, expected {expected:?}")]
    PassphraseMismatch { expected: String, got: String },
}

/// Every way a client operation can fail.
///
/// Only [`ClientError::Network`] and [`ClientError::Timeout`] are worth
/// retrying as-is; the rest describe inputs or contract state that a retry
/// would hit again.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Rejected locally, before anything left the process.
    #[error(transparent)]
    InvalidArgument(#[from] ArgsError),

    /// The draft names one student but a different keypair would sign it.
    #[error("draft student {draft} does not match signing key {signer}")]
    SignerMismatch {
        draft: StudentAddress,
        signer: StudentAddress,
    },

    #[error(transparent)]
    Signing(#[from] SignerError),

    /// Could not reach the endpoint. Transient; safe to retry.
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint refused or garbled an exchange. Retrying the same call
    /// will not help.
    #[error("endpoint error: {0}")]
    Endpoint(String),

    /// A ledger result decoded into something the domain model rejects.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// No terminal status before the submission deadline, or the envelope
    /// expired on the ledger. Resubmitting the same draft is safe because
    /// the session id deduplicates on the contract side.
    #[error("timed out waiting for transaction {hash}")]
    Timeout { hash: TxHash },

    /// The contract executed and refused the operation.
    #[error("contract error {code}: {message}")]
    Contract { code: u32, message: String },

    /// No session exists under the requested id.
    #[error("session not found")]
    NotFound,
}

impl ClientError {
    /// Whether repeating the same call unchanged has a chance of succeeding.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout { .. })
    }
}

impl From<GatewayError> for ClientError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Transport(message) => Self::Network(message),
            other => Self::Endpoint(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_maps_to_retryable_network() {
        let err = ClientError::from(GatewayError::Transport("connection refused".into()));
        assert!(matches!(err, ClientError::Network(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn endpoint_refusals_are_not_retryable() {
        let err = ClientError::from(GatewayError::BadSignature);
        assert!(matches!(err, ClientError::Endpoint(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn timeout_is_retryable() {
        let hash = TxHash::parse(&"a".repeat(64)).unwrap();
        assert!(ClientError::Timeout { hash }.is_retryable());
        assert!(
            !ClientError::Contract {
                code: 3,
                message: "unauthorized".into()
            }
            .is_retryable()
        );
    }
}
