#![forbid(unsafe_code)]

//! Client SDK for the learning-session ledger.
//!
//! The entry point is [`SessionClient`]: construct a [`LedgerConfig`],
//! connect, then record sessions with a [`Keypair`] and query them back.
//! Submission is a sign, submit, poll workflow that only reports success
//! once the ledger confirms the transaction; queries are read-only calls
//! that need no key material.

pub mod config;
pub mod error;
pub mod query;
pub mod sequence;
pub mod session_client;
pub mod submission;

pub use config::LedgerConfig;
pub use error::{ClientError, ConfigError};
pub use query::QueryService;
pub use sequence::SequenceAllocator;
pub use session_client::SessionClient;
pub use submission::SubmissionService;

pub use ledger::Keypair;
pub use study_core::Clock;
