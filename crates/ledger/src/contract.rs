//! The contract's call surface: entry points, argument shapes, and the
//! diagnostic codes it reports on failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::{ValueKind, WireValue};

//
// ─── CONTRACT ID ───────────────────────────────────────────────────────────────
//

/// Maximum length of a contract identifier.
pub const MAX_CONTRACT_ID_LEN: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContractIdError {
    #[error("contract id cannot be empty")]
    Empty,
    #[error("contract id must start with 'C'")]
    BadPrefix,
    #[error("contract id is too long: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },
    #[error("contract id contains invalid character {ch:?}")]
    InvalidChar { ch: char },
}

/// Identifier of a deployed contract instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(String);

impl ContractId {
    /// Validates and wraps a contract id.
    ///
    /// Ids start with `C` followed by alphanumeric characters, as issued
    /// by the ledger at deployment time.
    pub fn new(raw: impl Into<String>) -> Result<Self, ContractIdError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ContractIdError::Empty);
        }
        if !trimmed.starts_with('C') {
            return Err(ContractIdError::BadPrefix);
        }
        if trimmed.len() > MAX_CONTRACT_ID_LEN {
            return Err(ContractIdError::TooLong {
                len: trimmed.len(),
                max: MAX_CONTRACT_ID_LEN,
            });
        }
        if let Some(ch) = trimmed.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(ContractIdError::InvalidChar { ch });
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── DIAGNOSTIC CODES ──────────────────────────────────────────────────────────
//

/// Numeric codes the contract reports when a call fails.
pub mod diagnostic {
    /// The target contract is not deployed or not initialized.
    pub const NO_SUCH_CONTRACT: u32 = 2;
    /// The envelope signer is not allowed to write the record.
    pub const UNAUTHORIZED: u32 = 3;
    /// The submitted session data failed the contract's own validation.
    pub const INVALID_SESSION_DATA: u32 = 4;
    /// No session exists under the requested id.
    pub const SESSION_NOT_FOUND: u32 = 10;
    /// A session with the same id is already recorded.
    pub const SESSION_ALREADY_EXISTS: u32 = 15;
    /// The student has no recorded sessions to aggregate.
    pub const INSUFFICIENT_DATA: u32 = 17;
}

//
// ─── ENTRY POINTS ──────────────────────────────────────────────────────────────
//

/// Entry points exposed by the learning-session contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPoint {
    /// Append one session record. State-changing.
    RecordSession,
    /// Fetch a single record by session id. Read-only.
    GetSession,
    /// Aggregate a student's progress for one course. Read-only.
    GetProgress,
    /// List a student's session ids for one course. Read-only.
    ListSessions,
}

impl EntryPoint {
    /// The symbol name used on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RecordSession => "record_session",
            Self::GetSession => "get_session",
            Self::GetProgress => "get_progress",
            Self::ListSessions => "list_sessions",
        }
    }

    /// Argument kinds this entry point accepts, in order.
    #[must_use]
    pub fn params(&self) -> &'static [ValueKind] {
        match self {
            Self::RecordSession => &[
                ValueKind::Bytes,   // session id
                ValueKind::Address, // student
                ValueKind::Symbol,  // course id
                ValueKind::Map,     // payload
                ValueKind::U64,     // recorded_at, unix seconds
            ],
            Self::GetSession => &[ValueKind::Bytes],
            Self::GetProgress => &[ValueKind::Address, ValueKind::Symbol],
            Self::ListSessions => &[ValueKind::Address, ValueKind::Symbol],
        }
    }

    /// Whether the entry point can be served from a read node without
    /// submitting a transaction.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        !matches!(self, Self::RecordSession)
    }
}

impl std::fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

//
// ─── ARGUMENT CHECKING ─────────────────────────────────────────────────────────
//

/// Mismatch between supplied arguments and an entry point's shape.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ArgsError {
    #[error("{entry} takes {expected} arguments, got {got}")]
    WrongArity {
        entry: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{entry} argument {index} must be {expected}, got {got}")]
    WrongKind {
        entry: &'static str,
        index: usize,
        expected: ValueKind,
        got: ValueKind,
    },
    #[error("{entry} changes state and cannot be called read-only")]
    NotReadOnly { entry: &'static str },
    #[error("{entry} is read-only and cannot be submitted as a transaction")]
    ReadOnly { entry: &'static str },
}

/// Checks `args` against the entry point's declared parameter kinds.
pub fn check_args(entry: EntryPoint, args: &[WireValue]) -> Result<(), ArgsError> {
    let params = entry.params();
    if args.len() != params.len() {
        return Err(ArgsError::WrongArity {
            entry: entry.name(),
            expected: params.len(),
            got: args.len(),
        });
    }
    for (index, (arg, expected)) in args.iter().zip(params).enumerate() {
        if arg.kind() != *expected {
            return Err(ArgsError::WrongKind {
                entry: entry.name(),
                index,
                expected: *expected,
                got: arg.kind(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_short_and_long_contract_ids() {
        assert!(ContractId::new("C123").is_ok());
        assert!(ContractId::new(format!("C{}", "A".repeat(55))).is_ok());
    }

    #[test]
    fn rejects_malformed_contract_ids() {
        assert_eq!(ContractId::new("  "), Err(ContractIdError::Empty));
        assert_eq!(ContractId::new("X123"), Err(ContractIdError::BadPrefix));
        assert_eq!(
            ContractId::new("C12-3"),
            Err(ContractIdError::InvalidChar { ch: '-' })
        );
        assert!(matches!(
            ContractId::new(format!("C{}", "A".repeat(MAX_CONTRACT_ID_LEN))),
            Err(ContractIdError::TooLong { .. })
        ));
    }

    #[test]
    fn record_session_shape_is_checked() {
        let args = vec![
            WireValue::Bytes(vec![0; 16]),
            WireValue::Address("a".into()),
            WireValue::Symbol("rust-101".into()),
            WireValue::Map(vec![]),
            WireValue::U64(1),
        ];
        assert!(check_args(EntryPoint::RecordSession, &args).is_ok());

        let err = check_args(EntryPoint::RecordSession, &args[..4].to_vec()).unwrap_err();
        assert_eq!(
            err,
            ArgsError::WrongArity {
                entry: "record_session",
                expected: 5,
                got: 4
            }
        );
    }

    #[test]
    fn kind_mismatch_names_the_argument() {
        let args = vec![WireValue::Text("not-bytes".into())];
        let err = check_args(EntryPoint::GetSession, &args).unwrap_err();
        assert_eq!(
            err,
            ArgsError::WrongKind {
                entry: "get_session",
                index: 0,
                expected: ValueKind::Bytes,
                got: ValueKind::Text
            }
        );
    }

    #[test]
    fn only_record_session_mutates() {
        assert!(!EntryPoint::RecordSession.is_read_only());
        assert!(EntryPoint::GetSession.is_read_only());
        assert!(EntryPoint::GetProgress.is_read_only());
        assert!(EntryPoint::ListSessions.is_read_only());
    }
}
