//! Builds unsigned transaction envelopes for the contract's entry points.
//!
//! The builder owns the per-network constants that every envelope shares:
//! target contract, fee, and how long an envelope stays valid after it is
//! built. Sequence numbers come from the caller, which allocates them per
//! source account.

use chrono::Duration;
use study_core::Clock;
use study_core::model::{SessionRecord, StudentAddress};

use crate::contract::{ArgsError, ContractId, EntryPoint, check_args};
use crate::envelope::TransactionEnvelope;
use crate::mapping::record_to_args;
use crate::value::WireValue;

/// Constructs envelopes bound to one contract on one network.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    contract: ContractId,
    fee: u32,
    expiry_window: Duration,
    clock: Clock,
}

impl TransactionBuilder {
    #[must_use]
    pub fn new(contract: ContractId, fee: u32, expiry_window: Duration, clock: Clock) -> Self {
        Self {
            contract,
            fee,
            expiry_window,
            clock,
        }
    }

    #[must_use]
    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    /// Builds the envelope that records one session.
    ///
    /// The record's own student account is the envelope source, so the
    /// student's keypair must sign it.
    pub fn record_session(
        &self,
        record: &SessionRecord,
        sequence: u64,
    ) -> Result<TransactionEnvelope, ArgsError> {
        self.invoke(
            record.student().clone(),
            sequence,
            EntryPoint::RecordSession,
            record_to_args(record),
        )
    }

    /// Builds an envelope for any state-changing entry point.
    ///
    /// # Errors
    ///
    /// Returns `ArgsError` if the entry point is read-only or `args` do not
    /// match its declared shape.
    pub fn invoke(
        &self,
        source: StudentAddress,
        sequence: u64,
        entry_point: EntryPoint,
        args: Vec<WireValue>,
    ) -> Result<TransactionEnvelope, ArgsError> {
        if entry_point.is_read_only() {
            return Err(ArgsError::ReadOnly {
                entry: entry_point.name(),
            });
        }
        check_args(entry_point, &args)?;
        let valid_until = self.clock.now() + self.expiry_window;
        Ok(TransactionEnvelope::new(
            source,
            sequence,
            self.fee,
            valid_until,
            self.contract.clone(),
            entry_point,
            args,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{CourseId, PayloadValue, SessionId, SessionPayload};
    use study_core::{fixed_clock, fixed_now};

    fn builder() -> TransactionBuilder {
        TransactionBuilder::new(
            ContractId::new("C123").unwrap(),
            100,
            Duration::seconds(30),
            fixed_clock(),
        )
    }

    fn sample_record() -> SessionRecord {
        let payload =
            SessionPayload::from_entries([("duration_s", PayloadValue::from(300))]).unwrap();
        SessionRecord::new(
            SessionId::generate(),
            StudentAddress::from_public_key(&[0x33; 32]),
            CourseId::new("rust-101").unwrap(),
            payload,
            fixed_now(),
        )
    }

    #[test]
    fn record_session_envelope_carries_shared_constants() {
        let record = sample_record();
        let envelope = builder().record_session(&record, 42).unwrap();

        assert_eq!(envelope.source(), record.student());
        assert_eq!(envelope.sequence(), 42);
        assert_eq!(envelope.fee(), 100);
        assert_eq!(envelope.contract().as_str(), "C123");
        assert_eq!(envelope.entry_point(), EntryPoint::RecordSession);
        assert_eq!(envelope.valid_until(), fixed_now() + Duration::seconds(30));
    }

    #[test]
    fn read_only_entry_points_cannot_become_transactions() {
        let err = builder()
            .invoke(
                StudentAddress::from_public_key(&[0x44; 32]),
                1,
                EntryPoint::GetProgress,
                vec![],
            )
            .unwrap_err();
        assert_eq!(err, ArgsError::ReadOnly { entry: "get_progress" });
    }

    #[test]
    fn malformed_args_are_rejected_before_signing() {
        let err = builder()
            .invoke(
                StudentAddress::from_public_key(&[0x55; 32]),
                1,
                EntryPoint::RecordSession,
                vec![WireValue::Bool(true)],
            )
            .unwrap_err();
        assert!(matches!(err, ArgsError::WrongArity { got: 1, .. }));
    }

    #[test]
    fn identical_inputs_build_identical_envelopes() {
        let record = sample_record();
        let b = builder();
        assert_eq!(
            b.record_session(&record, 7).unwrap(),
            b.record_session(&record, 7).unwrap()
        );
    }
}
