//! The sign, submit, poll workflow for recording sessions.

use std::sync::Arc;
use std::time::Duration;

use ledger::mapping::record_from_wire;
use ledger::{
    EntryPoint, GatewayError, Keypair, LedgerGateway, ReadCall, ReadOutcome, SubmitAck,
    TransactionBuilder, TransactionStatus, TxHash, WireValue, diagnostic,
};
use rand::Rng as _;
use rand::rng;
use study_core::Clock;
use study_core::model::{SessionDraft, SessionRecord};
use tokio::time::{Instant, sleep};

use crate::error::ClientError;
use crate::sequence::SequenceAllocator;

/// Drives one session draft from signed envelope to ledger-confirmed record.
///
/// A submission is only reported successful once the ledger returns a
/// terminal `Success` for the transaction hash; an acknowledged envelope
/// that never leaves the pending queue before the deadline is a timeout.
/// A duplicate-id refusal is resolved by fetching the record already on the
/// ledger, so retrying a draft that actually landed in an earlier attempt
/// returns the original record instead of an error.
pub struct SubmissionService {
    gateway: Arc<dyn LedgerGateway>,
    sequences: Arc<SequenceAllocator>,
    builder: TransactionBuilder,
    network_passphrase: String,
    poll_interval: Duration,
    submit_deadline: Duration,
    clock: Clock,
}

impl SubmissionService {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        sequences: Arc<SequenceAllocator>,
        builder: TransactionBuilder,
        network_passphrase: impl Into<String>,
        poll_interval: Duration,
        submit_deadline: Duration,
        clock: Clock,
    ) -> Self {
        Self {
            gateway,
            sequences,
            builder,
            network_passphrase: network_passphrase.into(),
            poll_interval,
            submit_deadline,
            clock,
        }
    }

    /// Record one session and return the record the ledger confirmed.
    ///
    /// The draft's student must match the signing keypair; the envelope is
    /// signed with `keypair` and its source account is the student address.
    /// Dropping the returned future between polls stops the polling without
    /// voiding the transaction already on the ledger.
    ///
    /// # Errors
    ///
    /// [`ClientError::Timeout`] when no terminal status arrives before the
    /// submission deadline or the envelope expires; retrying with the same
    /// draft is safe because the session id deduplicates. Contract refusals
    /// surface as [`ClientError::Contract`] with the diagnostic code.
    pub async fn record_session(
        &self,
        draft: &SessionDraft,
        keypair: &Keypair,
    ) -> Result<SessionRecord, ClientError> {
        let signer = keypair.address();
        if draft.student != signer {
            return Err(ClientError::SignerMismatch {
                draft: draft.student.clone(),
                signer,
            });
        }

        let record = SessionRecord::new(
            draft.id,
            draft.student.clone(),
            draft.course_id.clone(),
            draft.payload.clone(),
            self.clock.now(),
        );

        let ack = self.sign_and_submit(&record, keypair).await?;
        tracing::debug!(hash = %ack.hash, session = %record.id(), "envelope accepted");
        self.poll_until_terminal(&record, ack.hash).await
    }

    /// Build, sign and submit, re-reserving the sequence once if the ledger
    /// rejects the number we picked.
    async fn sign_and_submit(
        &self,
        record: &SessionRecord,
        keypair: &Keypair,
    ) -> Result<SubmitAck, ClientError> {
        let mut refreshed = false;
        loop {
            let sequence = self.sequences.next(record.student()).await?;
            let signed = self
                .builder
                .record_session(record, sequence)?
                .sign(keypair, &self.network_passphrase)?;
            match self.gateway.submit(&signed).await {
                Ok(ack) => return Ok(ack),
                Err(GatewayError::BadSequence { current, got }) if !refreshed => {
                    tracing::warn!(current, got, "sequence rejected, re-reserving");
                    self.sequences.refresh(record.student()).await;
                    refreshed = true;
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    async fn poll_until_terminal(
        &self,
        record: &SessionRecord,
        hash: TxHash,
    ) -> Result<SessionRecord, ClientError> {
        let deadline = Instant::now() + self.submit_deadline;
        loop {
            match self.gateway.transaction_status(&hash).await {
                Ok(TransactionStatus::Success { result, .. }) => {
                    tracing::debug!(hash = %hash, "transaction applied");
                    return Ok(record_from_wire(&result)?);
                }
                Ok(TransactionStatus::Failed { code, message }) => {
                    if code == diagnostic::SESSION_ALREADY_EXISTS {
                        return self.fetch_existing(record, code, message).await;
                    }
                    return Err(ClientError::Contract { code, message });
                }
                Ok(TransactionStatus::Expired) => {
                    return Err(ClientError::Timeout { hash });
                }
                Ok(TransactionStatus::Pending | TransactionStatus::NotFound) => {}
                // transport noise while polling counts against the deadline
                // instead of failing a transaction that may still apply
                Err(GatewayError::Transport(message)) => {
                    tracing::warn!(hash = %hash, %message, "status poll failed");
                }
                Err(other) => return Err(other.into()),
            }
            if Instant::now() >= deadline {
                return Err(ClientError::Timeout { hash });
            }
            sleep(jittered(self.poll_interval)).await;
        }
    }

    /// The session id is already on the ledger, meaning an earlier attempt
    /// landed. Fetch that record; the caller gets the same result a clean
    /// first submission would have produced.
    async fn fetch_existing(
        &self,
        record: &SessionRecord,
        code: u32,
        message: String,
    ) -> Result<SessionRecord, ClientError> {
        tracing::debug!(session = %record.id(), "duplicate id, fetching existing record");
        let call = ReadCall::new(
            EntryPoint::GetSession,
            vec![WireValue::session_id(&record.id())],
        )?;
        match self.gateway.read(self.builder.contract(), &call).await? {
            ReadOutcome::Value(value) => Ok(record_from_wire(&value)?),
            _ => Err(ClientError::Contract { code, message }),
        }
    }
}

/// Base interval plus up to a quarter of it, so a fleet of clients polling
/// the same endpoint does not fall into lockstep.
fn jittered(interval: Duration) -> Duration {
    let cap = (interval / 4).as_millis() as u64;
    if cap == 0 {
        return interval;
    }
    interval + Duration::from_millis(rng().random_range(0..=cap))
}
