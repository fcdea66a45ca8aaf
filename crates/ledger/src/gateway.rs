//! Endpoint contract for talking to the ledger.
//!
//! A [`LedgerGateway`] covers the four things the client needs from an
//! endpoint: network identification, account sequence numbers, envelope
//! submission with status polling, and read-only contract calls. The
//! in-memory implementation lives in [`crate::memory`], the HTTP one in
//! [`crate::http`].

use async_trait::async_trait;
use study_core::model::StudentAddress;
use thiserror::Error;

use crate::contract::{ArgsError, ContractId, EntryPoint, check_args};
use crate::envelope::{SignedEnvelope, TxHash};
use crate::value::WireValue;

/// Errors surfaced by ledger endpoints.
///
/// `Transport` is the only variant worth retrying; everything else means
/// the request itself was unacceptable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("endpoint returned malformed data: {0}")]
    Malformed(String),

    #[error("account {0} is unknown to the ledger")]
    UnknownAccount(String),

    #[error("sequence {got} rejected, account is at {current}")]
    BadSequence { current: u64, got: u64 },

    #[error("envelope signature rejected")]
    BadSignature,

    #[error("endpoint rejected {method}: {message} (code {code})")]
    Rejected {
        method: &'static str,
        code: i64,
        message: String,
    },
}

/// Identity of the network an endpoint serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub passphrase: String,
    pub protocol_version: u32,
}

/// Acknowledgement that an envelope entered the pending queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitAck {
    pub hash: TxHash,
}

/// Where a submitted transaction currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionStatus {
    /// Accepted but not yet applied; poll again.
    Pending,
    /// The endpoint does not know this hash.
    NotFound,
    /// Applied; carries the entry point's return value.
    Success { result: WireValue, applied_at: u64 },
    /// Included but rejected by the contract.
    Failed { code: u32, message: String },
    /// The expiry deadline passed before inclusion.
    Expired,
}

impl TransactionStatus {
    /// Whether polling can stop at this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::NotFound)
    }
}

/// A read-only invocation, checked against the entry-point table at
/// construction so endpoints never see malformed reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadCall {
    entry_point: EntryPoint,
    args: Vec<WireValue>,
}

impl ReadCall {
    /// Builds a checked read call.
    ///
    /// # Errors
    ///
    /// Returns `ArgsError` if the entry point changes state or `args` do
    /// not match its declared shape.
    pub fn new(entry_point: EntryPoint, args: Vec<WireValue>) -> Result<Self, ArgsError> {
        if !entry_point.is_read_only() {
            return Err(ArgsError::NotReadOnly {
                entry: entry_point.name(),
            });
        }
        check_args(entry_point, &args)?;
        Ok(Self { entry_point, args })
    }

    #[must_use]
    pub fn entry_point(&self) -> EntryPoint {
        self.entry_point
    }

    #[must_use]
    pub fn args(&self) -> &[WireValue] {
        &self.args
    }
}

/// Result of a read-only call.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// The call produced a value.
    Value(WireValue),
    /// The call completed with nothing to return, an absent optional.
    Void,
    /// The contract refused the call with a diagnostic code.
    Failure { code: u32, message: String },
}

/// Endpoint operations the client builds on.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Identify the network behind this endpoint.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the endpoint cannot be reached or answers
    /// with something unusable.
    async fn network_info(&self) -> Result<NetworkInfo, GatewayError>;

    /// Current sequence number of an account. The account's next envelope
    /// must carry this value plus one.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::UnknownAccount` if the ledger has never seen
    /// the account, or other endpoint errors.
    async fn account_sequence(&self, account: &StudentAddress) -> Result<u64, GatewayError>;

    /// Queue a signed envelope for inclusion.
    ///
    /// Acceptance only means the envelope entered the pending queue; the
    /// outcome arrives through [`LedgerGateway::transaction_status`].
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::BadSequence` or `BadSignature` if the ledger
    /// refuses the envelope at the door, or other endpoint errors.
    async fn submit(&self, envelope: &SignedEnvelope) -> Result<SubmitAck, GatewayError>;

    /// Status of a previously submitted transaction.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` for endpoint failures. An unknown hash is a
    /// status, not an error.
    async fn transaction_status(&self, hash: &TxHash) -> Result<TransactionStatus, GatewayError>;

    /// Execute a read-only entry point against current ledger state.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` for endpoint failures. Contract-level refusal
    /// is reported through [`ReadOutcome::Failure`].
    async fn read(&self, contract: &ContractId, call: &ReadCall)
    -> Result<ReadOutcome, GatewayError>;
}
