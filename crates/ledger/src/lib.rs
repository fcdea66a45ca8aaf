#![forbid(unsafe_code)]

//! Ledger plumbing for the learning-session contract: keypairs and
//! signatures, wire values, transaction envelopes, and the gateways that
//! carry them to a network.

pub mod builder;
pub mod contract;
pub mod envelope;
pub mod gateway;
pub mod http;
pub mod mapping;
pub mod memory;
pub mod signer;
pub mod value;

pub use builder::TransactionBuilder;
pub use contract::{ArgsError, ContractId, ContractIdError, EntryPoint, diagnostic};
pub use envelope::{SignedEnvelope, TransactionEnvelope, TxHash, TxHashError};
pub use gateway::{
    GatewayError, LedgerGateway, NetworkInfo, ReadCall, ReadOutcome, SubmitAck, TransactionStatus,
};
pub use http::HttpGateway;
pub use mapping::DecodeError;
pub use memory::InMemoryLedger;
pub use signer::{Keypair, SignerError};
pub use value::{ValueKind, WireValue};
