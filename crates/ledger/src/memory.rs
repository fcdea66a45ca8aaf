//! In-memory ledger for tests and prototyping.
//!
//! Implements [`LedgerGateway`] against process-local state while keeping
//! the behaviors the client has to cope with on a real network: signature
//! and sequence checks at the door, a pending phase before application,
//! expiry deadlines, and the contract's own diagnostic codes.
//!
//! Every address exists implicitly with sequence 0, so tests never need a
//! funding step. Envelopes apply lazily on the first status poll; see
//! [`InMemoryLedger::hold_for_polls`] for keeping them pending longer.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Duration;
use study_core::Clock;
use study_core::model::{CourseId, SessionId, StudentAddress};

use crate::contract::{ContractId, EntryPoint, diagnostic};
use crate::envelope::{SignedEnvelope, TransactionEnvelope, TxHash};
use crate::gateway::{
    GatewayError, LedgerGateway, NetworkInfo, ReadCall, ReadOutcome, SubmitAck,
    TransactionStatus,
};
use crate::value::WireValue;

/// Protocol version reported by the in-memory network.
pub const MEMORY_PROTOCOL_VERSION: u32 = 1;

/// Payload key the contract reads as the module a session belongs to.
pub const MODULE_KEY: &str = "module";
/// Payload key the contract reads as the module-completion flag.
pub const COMPLETED_KEY: &str = "completed";
/// Payload key the contract sums into time spent.
pub const DURATION_KEY: &str = "duration_s";

struct TxEntry {
    envelope: SignedEnvelope,
    status: TransactionStatus,
    polls_remaining: u32,
}

struct Inner {
    clock: Clock,
    hold_for_polls: u32,
    accounts: HashMap<StudentAddress, u64>,
    transactions: HashMap<TxHash, TxEntry>,
    sessions: BTreeMap<SessionId, WireValue>,
    by_student_course: BTreeMap<(StudentAddress, CourseId), Vec<SessionId>>,
}

/// A whole ledger in one mutex.
///
/// Cloning yields another handle to the same state, so a test can keep one
/// handle for clock control while the client owns another as its gateway.
#[derive(Clone)]
pub struct InMemoryLedger {
    passphrase: String,
    contract: ContractId,
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new(passphrase: impl Into<String>, contract: ContractId) -> Self {
        Self::with_clock(passphrase, contract, Clock::default_clock())
    }

    #[must_use]
    pub fn with_clock(passphrase: impl Into<String>, contract: ContractId, clock: Clock) -> Self {
        Self {
            passphrase: passphrase.into(),
            contract,
            inner: Arc::new(Mutex::new(Inner {
                clock,
                hold_for_polls: 0,
                accounts: HashMap::new(),
                transactions: HashMap::new(),
                sessions: BTreeMap::new(),
                by_student_course: BTreeMap::new(),
            })),
        }
    }

    #[must_use]
    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    #[must_use]
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// Keep each submitted envelope pending for `polls` status calls before
    /// applying it, to exercise the client's polling loop.
    pub fn hold_for_polls(&self, polls: u32) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.hold_for_polls = polls;
        }
    }

    /// Advance a fixed clock, e.g. past an envelope's expiry deadline.
    pub fn advance_clock(&self, delta: Duration) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.clock.advance(delta);
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, GatewayError> {
        self.inner
            .lock()
            .map_err(|e| GatewayError::Transport(e.to_string()))
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn network_info(&self) -> Result<NetworkInfo, GatewayError> {
        Ok(NetworkInfo {
            passphrase: self.passphrase.clone(),
            protocol_version: MEMORY_PROTOCOL_VERSION,
        })
    }

    async fn account_sequence(&self, account: &StudentAddress) -> Result<u64, GatewayError> {
        let mut inner = self.lock()?;
        Ok(*inner.accounts.entry(account.clone()).or_insert(0))
    }

    async fn submit(&self, envelope: &SignedEnvelope) -> Result<SubmitAck, GatewayError> {
        let mut inner = self.lock()?;
        if !envelope.verify(&self.passphrase) {
            return Err(GatewayError::BadSignature);
        }

        let hash = envelope.hash().clone();
        if inner.transactions.contains_key(&hash) {
            // resubmission of the same envelope is harmless
            return Ok(SubmitAck { hash });
        }

        let source = envelope.envelope().source().clone();
        let current = *inner.accounts.entry(source.clone()).or_insert(0);
        let got = envelope.envelope().sequence();
        if got <= current {
            return Err(GatewayError::BadSequence { current, got });
        }
        let clash = inner.transactions.values().any(|entry| {
            entry.status == TransactionStatus::Pending
                && entry.envelope.envelope().source() == &source
                && entry.envelope.envelope().sequence() == got
        });
        if clash {
            return Err(GatewayError::BadSequence { current, got });
        }

        let polls_remaining = inner.hold_for_polls;
        inner.transactions.insert(
            hash.clone(),
            TxEntry {
                envelope: envelope.clone(),
                status: TransactionStatus::Pending,
                polls_remaining,
            },
        );
        Ok(SubmitAck { hash })
    }

    async fn transaction_status(&self, hash: &TxHash) -> Result<TransactionStatus, GatewayError> {
        let mut inner = self.lock()?;
        Ok(inner.poll(hash, &self.contract))
    }

    async fn read(
        &self,
        contract: &ContractId,
        call: &ReadCall,
    ) -> Result<ReadOutcome, GatewayError> {
        let inner = self.lock()?;
        if contract != &self.contract {
            return Ok(ReadOutcome::Failure {
                code: diagnostic::NO_SUCH_CONTRACT,
                message: format!("no contract at {contract}"),
            });
        }
        Ok(inner.eval_read(call.entry_point(), call.args()))
    }
}

impl Inner {
    fn poll(&mut self, hash: &TxHash, contract: &ContractId) -> TransactionStatus {
        let now = self.clock.now();
        let now_unix = self.clock.now_unix();

        let Some(entry) = self.transactions.get_mut(hash) else {
            return TransactionStatus::NotFound;
        };
        if entry.status.is_terminal() {
            return entry.status.clone();
        }
        if entry.envelope.envelope().is_expired_at(now) {
            // expired envelopes never apply and never consume a sequence
            entry.status = TransactionStatus::Expired;
            return TransactionStatus::Expired;
        }
        if entry.polls_remaining > 0 {
            entry.polls_remaining -= 1;
            return TransactionStatus::Pending;
        }

        let envelope = entry.envelope.envelope().clone();
        let status = self.apply(&envelope, contract, now_unix);
        if let Some(entry) = self.transactions.get_mut(hash) {
            entry.status = status.clone();
        }
        status
    }

    fn apply(
        &mut self,
        envelope: &TransactionEnvelope,
        contract: &ContractId,
        now_unix: u64,
    ) -> TransactionStatus {
        let source = envelope.source().clone();
        let consumed = envelope.sequence();

        if envelope.contract() != contract {
            self.consume_sequence(&source, consumed);
            return TransactionStatus::Failed {
                code: diagnostic::NO_SUCH_CONTRACT,
                message: format!("no contract at {}", envelope.contract()),
            };
        }
        if envelope.entry_point() != EntryPoint::RecordSession {
            self.consume_sequence(&source, consumed);
            return TransactionStatus::Failed {
                code: diagnostic::INVALID_SESSION_DATA,
                message: format!("{} is read-only", envelope.entry_point()),
            };
        }

        let outcome = self.record_session(&source, envelope.args());
        self.consume_sequence(&source, consumed);
        match outcome {
            Ok(result) => TransactionStatus::Success {
                result,
                applied_at: now_unix,
            },
            Err((code, message)) => TransactionStatus::Failed { code, message },
        }
    }

    fn consume_sequence(&mut self, source: &StudentAddress, sequence: u64) {
        let current = self.accounts.entry(source.clone()).or_insert(0);
        *current = (*current).max(sequence);
    }

    fn record_session(
        &mut self,
        source: &StudentAddress,
        args: &[WireValue],
    ) -> Result<WireValue, (u32, String)> {
        let invalid = |message: &str| (diagnostic::INVALID_SESSION_DATA, message.to_string());

        let [id_arg, student_arg, course_arg, payload_arg, recorded_at_arg] = args else {
            return Err(invalid("record_session takes 5 arguments"));
        };
        let WireValue::Bytes(id_bytes) = id_arg else {
            return Err(invalid("session id must be bytes"));
        };
        let id = SessionId::from_bytes(id_bytes)
            .map_err(|_| invalid("session id must be 16 bytes"))?;
        let WireValue::Address(student_raw) = student_arg else {
            return Err(invalid("student must be an address"));
        };
        let student = StudentAddress::new(student_raw.clone())
            .map_err(|e| invalid(&e.to_string()))?;
        let WireValue::Symbol(course_raw) = course_arg else {
            return Err(invalid("course id must be a symbol"));
        };
        let course = CourseId::new(course_raw.clone()).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(payload_arg, WireValue::Map(_)) {
            return Err(invalid("payload must be a map"));
        }
        let WireValue::U64(recorded_at) = recorded_at_arg else {
            return Err(invalid("recorded_at must be u64"));
        };

        if &student != source {
            return Err((
                diagnostic::UNAUTHORIZED,
                "record not signed by its student".to_string(),
            ));
        }
        if self.sessions.contains_key(&id) {
            return Err((
                diagnostic::SESSION_ALREADY_EXISTS,
                format!("session {id} already recorded"),
            ));
        }

        let stored = WireValue::Map(vec![
            ("id".into(), id_arg.clone()),
            ("student".into(), student_arg.clone()),
            ("course_id".into(), course_arg.clone()),
            ("payload".into(), payload_arg.clone()),
            ("recorded_at".into(), WireValue::U64(*recorded_at)),
        ]);
        self.sessions.insert(id, stored.clone());
        self.by_student_course
            .entry((student, course))
            .or_default()
            .push(id);
        Ok(stored)
    }

    fn eval_read(&self, entry_point: EntryPoint, args: &[WireValue]) -> ReadOutcome {
        match entry_point {
            EntryPoint::GetSession => self.get_session(args),
            EntryPoint::GetProgress => self.get_progress(args),
            EntryPoint::ListSessions => self.list_sessions(args),
            EntryPoint::RecordSession => ReadOutcome::Failure {
                code: diagnostic::INVALID_SESSION_DATA,
                message: "record_session changes state".to_string(),
            },
        }
    }

    fn get_session(&self, args: &[WireValue]) -> ReadOutcome {
        let Some(WireValue::Bytes(id_bytes)) = args.first() else {
            return malformed_args("get_session");
        };
        let Ok(id) = SessionId::from_bytes(id_bytes) else {
            return malformed_args("get_session");
        };
        match self.sessions.get(&id) {
            Some(stored) => ReadOutcome::Value(stored.clone()),
            None => ReadOutcome::Void,
        }
    }

    fn list_sessions(&self, args: &[WireValue]) -> ReadOutcome {
        let Some((student, course)) = student_course_args(args) else {
            return malformed_args("list_sessions");
        };
        let ids = self
            .by_student_course
            .get(&(student, course))
            .map(Vec::as_slice)
            .unwrap_or_default();
        ReadOutcome::Value(WireValue::List(
            ids.iter()
                .map(|id| WireValue::Bytes(id.as_bytes().to_vec()))
                .collect(),
        ))
    }

    /// Aggregates a student's sessions the way the deployed contract does.
    ///
    /// A module counts as completed for the student once any of their
    /// sessions carries that module name with a true completion flag. The
    /// module total is estimated from every module name seen in the course,
    /// across all students, so the completion ratio reflects how much of
    /// the known course the student has finished.
    fn get_progress(&self, args: &[WireValue]) -> ReadOutcome {
        let Some((student, course)) = student_course_args(args) else {
            return malformed_args("get_progress");
        };

        let ids = self
            .by_student_course
            .get(&(student.clone(), course.clone()))
            .map(Vec::as_slice)
            .unwrap_or_default();
        if ids.is_empty() {
            return ReadOutcome::Failure {
                code: diagnostic::INSUFFICIENT_DATA,
                message: format!("no sessions for {student} in {course}"),
            };
        }

        let mut completed: Vec<&str> = Vec::new();
        let mut time_spent_s: u64 = 0;
        for id in ids {
            let Some(stored) = self.sessions.get(id) else {
                continue;
            };
            let Some(payload) = stored.get("payload") else {
                continue;
            };
            if let Some(WireValue::I64(secs)) = payload.get(DURATION_KEY) {
                time_spent_s = time_spent_s.saturating_add(u64::try_from(*secs).unwrap_or(0));
            }
            let done = matches!(payload.get(COMPLETED_KEY), Some(WireValue::Bool(true)));
            if done {
                if let Some(WireValue::Text(module)) = payload.get(MODULE_KEY) {
                    if !completed.contains(&module.as_str()) {
                        completed.push(module);
                    }
                }
            }
        }

        let mut total: Vec<&str> = Vec::new();
        let course_symbol = WireValue::Symbol(course.as_str().to_owned());
        for stored in self.sessions.values() {
            if stored.get("course_id") != Some(&course_symbol) {
                continue;
            }
            if let Some(WireValue::Text(module)) =
                stored.get("payload").and_then(|p| p.get(MODULE_KEY))
            {
                if !total.contains(&module.as_str()) {
                    total.push(module);
                }
            }
        }

        let count = |v: &[&str]| u64::try_from(v.len()).unwrap_or(u64::MAX);
        ReadOutcome::Value(WireValue::Map(vec![
            (
                "student".into(),
                WireValue::Address(student.as_str().to_owned()),
            ),
            ("course_id".into(), course_symbol),
            ("completed_modules".into(), WireValue::U64(count(&completed))),
            ("total_modules".into(), WireValue::U64(count(&total))),
            (
                "sessions_recorded".into(),
                WireValue::U64(u64::try_from(ids.len()).unwrap_or(u64::MAX)),
            ),
            ("time_spent_s".into(), WireValue::U64(time_spent_s)),
        ]))
    }
}

fn student_course_args(args: &[WireValue]) -> Option<(StudentAddress, CourseId)> {
    let [WireValue::Address(student_raw), WireValue::Symbol(course_raw)] = args else {
        return None;
    };
    let student = StudentAddress::new(student_raw.clone()).ok()?;
    let course = CourseId::new(course_raw.clone()).ok()?;
    Some((student, course))
}

fn malformed_args(entry: &str) -> ReadOutcome {
    ReadOutcome::Failure {
        code: diagnostic::INVALID_SESSION_DATA,
        message: format!("malformed arguments for {entry}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransactionBuilder;
    use crate::signer::Keypair;
    use study_core::fixed_clock;
    use study_core::model::{PayloadValue, SessionPayload, SessionRecord};

    const PASSPHRASE: &str = "Study Ledger ; memory test";

    fn contract() -> ContractId {
        ContractId::new("C123").unwrap()
    }

    fn ledger() -> InMemoryLedger {
        InMemoryLedger::with_clock(PASSPHRASE, contract(), fixed_clock())
    }

    fn builder() -> TransactionBuilder {
        TransactionBuilder::new(contract(), 100, Duration::seconds(30), fixed_clock())
    }

    fn record_for(keypair: &Keypair, course: &str, entries: &[(&str, PayloadValue)]) -> SessionRecord {
        let payload =
            SessionPayload::from_entries(entries.iter().cloned()).unwrap();
        SessionRecord::new(
            SessionId::generate(),
            keypair.address(),
            CourseId::new(course).unwrap(),
            payload,
            study_core::fixed_now(),
        )
    }

    async fn submit_and_apply(
        ledger: &InMemoryLedger,
        keypair: &Keypair,
        record: &SessionRecord,
        sequence: u64,
    ) -> TransactionStatus {
        let envelope = builder().record_session(record, sequence).unwrap();
        let signed = envelope.sign(keypair, PASSPHRASE).unwrap();
        let ack = ledger.submit(&signed).await.unwrap();
        ledger.transaction_status(&ack.hash).await.unwrap()
    }

    #[tokio::test]
    async fn network_info_reports_passphrase() {
        let info = ledger().network_info().await.unwrap();
        assert_eq!(info.passphrase, PASSPHRASE);
        assert_eq!(info.protocol_version, MEMORY_PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn unknown_accounts_start_at_sequence_zero() {
        let seq = ledger()
            .account_sequence(&Keypair::generate().address())
            .await
            .unwrap();
        assert_eq!(seq, 0);
    }

    #[tokio::test]
    async fn recorded_session_is_readable() {
        let ledger = ledger();
        let keypair = Keypair::generate();
        let record = record_for(&keypair, "rust-101", &[("duration_s", PayloadValue::from(300))]);

        let status = submit_and_apply(&ledger, &keypair, &record, 1).await;
        let TransactionStatus::Success { result, .. } = status else {
            panic!("expected success, got {status:?}");
        };
        assert_eq!(
            result.get("id"),
            Some(&WireValue::Bytes(record.id().as_bytes().to_vec()))
        );

        let call = ReadCall::new(
            EntryPoint::GetSession,
            vec![WireValue::session_id(&record.id())],
        )
        .unwrap();
        let outcome = ledger.read(&contract(), &call).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Value(result));
    }

    #[tokio::test]
    async fn missing_session_reads_void() {
        let call = ReadCall::new(
            EntryPoint::GetSession,
            vec![WireValue::session_id(&SessionId::generate())],
        )
        .unwrap();
        let outcome = ledger().read(&contract(), &call).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Void);
    }

    #[tokio::test]
    async fn duplicate_session_id_fails_with_already_exists() {
        let ledger = ledger();
        let keypair = Keypair::generate();
        let record = record_for(&keypair, "rust-101", &[]);

        let first = submit_and_apply(&ledger, &keypair, &record, 1).await;
        assert!(matches!(first, TransactionStatus::Success { .. }));

        let second = submit_and_apply(&ledger, &keypair, &record, 2).await;
        assert!(matches!(
            second,
            TransactionStatus::Failed {
                code: diagnostic::SESSION_ALREADY_EXISTS,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn stale_sequence_is_rejected_at_submission() {
        let ledger = ledger();
        let keypair = Keypair::generate();
        let first = record_for(&keypair, "rust-101", &[]);
        let status = submit_and_apply(&ledger, &keypair, &first, 1).await;
        assert!(matches!(status, TransactionStatus::Success { .. }));

        let second = record_for(&keypair, "rust-101", &[]);
        let envelope = builder().record_session(&second, 1).unwrap();
        let signed = envelope.sign(&keypair, PASSPHRASE).unwrap();
        let err = ledger.submit(&signed).await.unwrap_err();
        assert_eq!(err, GatewayError::BadSequence { current: 1, got: 1 });
    }

    #[tokio::test]
    async fn pipelined_sequences_are_accepted_together() {
        let ledger = ledger();
        let keypair = Keypair::generate();
        let first = record_for(&keypair, "rust-101", &[]);
        let second = record_for(&keypair, "rust-101", &[]);

        let signed_1 = builder()
            .record_session(&first, 1)
            .unwrap()
            .sign(&keypair, PASSPHRASE)
            .unwrap();
        let signed_2 = builder()
            .record_session(&second, 2)
            .unwrap()
            .sign(&keypair, PASSPHRASE)
            .unwrap();

        let ack_1 = ledger.submit(&signed_1).await.unwrap();
        let ack_2 = ledger.submit(&signed_2).await.unwrap();
        assert!(
            ledger
                .transaction_status(&ack_1.hash)
                .await
                .unwrap()
                .is_terminal()
        );
        assert!(
            ledger
                .transaction_status(&ack_2.hash)
                .await
                .unwrap()
                .is_terminal()
        );
    }

    #[tokio::test]
    async fn tampered_signature_is_rejected() {
        let ledger = ledger();
        let keypair = Keypair::generate();
        let other = Keypair::generate();
        let record = record_for(&keypair, "rust-101", &[]);
        // signed by the wrong key
        let signed = builder()
            .record_session(&record, 1)
            .unwrap()
            .sign(&other, PASSPHRASE)
            .unwrap();
        assert_eq!(
            ledger.submit(&signed).await.unwrap_err(),
            GatewayError::BadSignature
        );
    }

    #[tokio::test]
    async fn expired_envelope_never_applies_and_frees_its_sequence() {
        let ledger = ledger();
        let keypair = Keypair::generate();
        let record = record_for(&keypair, "rust-101", &[]);
        let signed = builder()
            .record_session(&record, 1)
            .unwrap()
            .sign(&keypair, PASSPHRASE)
            .unwrap();
        let ack = ledger.submit(&signed).await.unwrap();

        ledger.advance_clock(Duration::seconds(31));
        assert_eq!(
            ledger.transaction_status(&ack.hash).await.unwrap(),
            TransactionStatus::Expired
        );

        // the sequence was not consumed, so a fresh envelope can reuse it
        assert_eq!(ledger.account_sequence(&keypair.address()).await.unwrap(), 0);
        let call = ReadCall::new(
            EntryPoint::GetSession,
            vec![WireValue::session_id(&record.id())],
        )
        .unwrap();
        assert_eq!(
            ledger.read(&contract(), &call).await.unwrap(),
            ReadOutcome::Void
        );
    }

    #[tokio::test]
    async fn held_envelopes_stay_pending_for_configured_polls() {
        let ledger = ledger();
        ledger.hold_for_polls(2);
        let keypair = Keypair::generate();
        let record = record_for(&keypair, "rust-101", &[]);
        let signed = builder()
            .record_session(&record, 1)
            .unwrap()
            .sign(&keypair, PASSPHRASE)
            .unwrap();
        let ack = ledger.submit(&signed).await.unwrap();

        assert_eq!(
            ledger.transaction_status(&ack.hash).await.unwrap(),
            TransactionStatus::Pending
        );
        assert_eq!(
            ledger.transaction_status(&ack.hash).await.unwrap(),
            TransactionStatus::Pending
        );
        assert!(
            ledger
                .transaction_status(&ack.hash)
                .await
                .unwrap()
                .is_terminal()
        );
    }

    #[tokio::test]
    async fn unknown_hash_polls_as_not_found() {
        let status = ledger()
            .transaction_status(&TxHash::from_digest(&[9u8; 32]))
            .await
            .unwrap();
        assert_eq!(status, TransactionStatus::NotFound);
    }

    #[tokio::test]
    async fn record_signed_by_non_student_is_unauthorized() {
        let ledger = ledger();
        let student = Keypair::generate();
        let submitter = Keypair::generate();
        // record names the student but the submitter signs and sources it
        let record = SessionRecord::new(
            SessionId::generate(),
            student.address(),
            CourseId::new("rust-101").unwrap(),
            SessionPayload::new(),
            study_core::fixed_now(),
        );
        let envelope = builder()
            .invoke(
                submitter.address(),
                1,
                EntryPoint::RecordSession,
                crate::mapping::record_to_args(&record),
            )
            .unwrap();
        let signed = envelope.sign(&submitter, PASSPHRASE).unwrap();
        let ack = ledger.submit(&signed).await.unwrap();
        assert!(matches!(
            ledger.transaction_status(&ack.hash).await.unwrap(),
            TransactionStatus::Failed {
                code: diagnostic::UNAUTHORIZED,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn wrong_contract_fails_after_inclusion() {
        let ledger = ledger();
        let keypair = Keypair::generate();
        let record = record_for(&keypair, "rust-101", &[]);
        let other_contract = TransactionBuilder::new(
            ContractId::new("C999").unwrap(),
            100,
            Duration::seconds(30),
            fixed_clock(),
        );
        let signed = other_contract
            .record_session(&record, 1)
            .unwrap()
            .sign(&keypair, PASSPHRASE)
            .unwrap();
        let ack = ledger.submit(&signed).await.unwrap();
        assert!(matches!(
            ledger.transaction_status(&ack.hash).await.unwrap(),
            TransactionStatus::Failed {
                code: diagnostic::NO_SUCH_CONTRACT,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn progress_aggregates_modules_and_time() {
        let ledger = ledger();
        let keypair = Keypair::generate();
        let sessions = [
            record_for(
                &keypair,
                "rust-101",
                &[
                    ("module", PayloadValue::from("intro")),
                    ("completed", PayloadValue::from(true)),
                    ("duration_s", PayloadValue::from(300)),
                ],
            ),
            record_for(
                &keypair,
                "rust-101",
                &[
                    ("module", PayloadValue::from("ownership")),
                    ("completed", PayloadValue::from(false)),
                    ("duration_s", PayloadValue::from(600)),
                ],
            ),
            record_for(
                &keypair,
                "rust-101",
                &[
                    ("module", PayloadValue::from("intro")),
                    ("completed", PayloadValue::from(true)),
                    ("duration_s", PayloadValue::from(120)),
                ],
            ),
        ];
        for (i, record) in sessions.iter().enumerate() {
            let status = submit_and_apply(&ledger, &keypair, record, (i + 1) as u64).await;
            assert!(matches!(status, TransactionStatus::Success { .. }));
        }

        let call = ReadCall::new(
            EntryPoint::GetProgress,
            vec![
                WireValue::address(&keypair.address()),
                WireValue::Symbol("rust-101".into()),
            ],
        )
        .unwrap();
        let ReadOutcome::Value(progress) = ledger.read(&contract(), &call).await.unwrap() else {
            panic!("expected progress value");
        };
        assert_eq!(progress.get("completed_modules"), Some(&WireValue::U64(1)));
        assert_eq!(progress.get("total_modules"), Some(&WireValue::U64(2)));
        assert_eq!(progress.get("sessions_recorded"), Some(&WireValue::U64(3)));
        assert_eq!(progress.get("time_spent_s"), Some(&WireValue::U64(1020)));
    }

    #[tokio::test]
    async fn progress_without_sessions_reports_insufficient_data() {
        let call = ReadCall::new(
            EntryPoint::GetProgress,
            vec![
                WireValue::address(&Keypair::generate().address()),
                WireValue::Symbol("rust-101".into()),
            ],
        )
        .unwrap();
        let outcome = ledger().read(&contract(), &call).await.unwrap();
        assert!(matches!(
            outcome,
            ReadOutcome::Failure {
                code: diagnostic::INSUFFICIENT_DATA,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn listing_without_sessions_is_empty_not_an_error() {
        let call = ReadCall::new(
            EntryPoint::ListSessions,
            vec![
                WireValue::address(&Keypair::generate().address()),
                WireValue::Symbol("rust-101".into()),
            ],
        )
        .unwrap();
        let outcome = ledger().read(&contract(), &call).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Value(WireValue::List(vec![])));
    }

    #[tokio::test]
    async fn listed_ids_preserve_recording_order() {
        let ledger = ledger();
        let keypair = Keypair::generate();
        let first = record_for(&keypair, "rust-101", &[]);
        let second = record_for(&keypair, "rust-101", &[]);
        submit_and_apply(&ledger, &keypair, &first, 1).await;
        submit_and_apply(&ledger, &keypair, &second, 2).await;

        let call = ReadCall::new(
            EntryPoint::ListSessions,
            vec![
                WireValue::address(&keypair.address()),
                WireValue::Symbol("rust-101".into()),
            ],
        )
        .unwrap();
        let outcome = ledger.read(&contract(), &call).await.unwrap();
        assert_eq!(
            outcome,
            ReadOutcome::Value(WireValue::List(vec![
                WireValue::session_id(&first.id()),
                WireValue::session_id(&second.id()),
            ]))
        );
    }
}
