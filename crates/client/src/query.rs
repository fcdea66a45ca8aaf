//! Read-side operations against the contract.

use std::sync::Arc;

use ledger::mapping::{progress_from_wire, record_from_wire, session_ids_from_wire};
use ledger::{ContractId, EntryPoint, LedgerGateway, ReadCall, ReadOutcome, WireValue, diagnostic};
use study_core::model::{CourseId, ProgressSummary, SessionId, SessionRecord, StudentAddress};

use crate::error::ClientError;

/// Read-only queries. None of them need a keypair; anyone may ask.
pub struct QueryService {
    gateway: Arc<dyn LedgerGateway>,
    contract: ContractId,
}

impl QueryService {
    #[must_use]
    pub fn new(gateway: Arc<dyn LedgerGateway>, contract: ContractId) -> Self {
        Self { gateway, contract }
    }

    /// Fetch a single session record by id.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotFound`] when no session exists under `id`.
    pub async fn get_session(&self, id: SessionId) -> Result<SessionRecord, ClientError> {
        let call = ReadCall::new(EntryPoint::GetSession, vec![WireValue::session_id(&id)])?;
        match self.gateway.read(&self.contract, &call).await? {
            ReadOutcome::Value(value) => Ok(record_from_wire(&value)?),
            ReadOutcome::Void => Err(ClientError::NotFound),
            ReadOutcome::Failure { code, message } => Err(contract_failure(code, message)),
        }
    }

    /// Aggregate one student's progress in one course.
    ///
    /// A pair with no recorded sessions yields the zero-valued summary; the
    /// contract's insufficient-data refusal never surfaces as an error.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` when the call fails or the result does not
    /// decode into a [`ProgressSummary`].
    pub async fn get_student_progress(
        &self,
        student: &StudentAddress,
        course_id: &CourseId,
    ) -> Result<ProgressSummary, ClientError> {
        let call = ReadCall::new(
            EntryPoint::GetProgress,
            vec![WireValue::address(student), WireValue::course(course_id)],
        )?;
        match self.gateway.read(&self.contract, &call).await? {
            ReadOutcome::Value(value) => Ok(progress_from_wire(&value)?),
            ReadOutcome::Void => Ok(ProgressSummary::empty(student.clone(), course_id.clone())),
            ReadOutcome::Failure { code, .. } if code == diagnostic::INSUFFICIENT_DATA => {
                Ok(ProgressSummary::empty(student.clone(), course_id.clone()))
            }
            ReadOutcome::Failure { code, message } => Err(contract_failure(code, message)),
        }
    }

    /// List a student's session ids in one course, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` when the call fails; an unknown student or
    /// course is an empty list, not an error.
    pub async fn list_student_sessions(
        &self,
        student: &StudentAddress,
        course_id: &CourseId,
    ) -> Result<Vec<SessionId>, ClientError> {
        let call = ReadCall::new(
            EntryPoint::ListSessions,
            vec![WireValue::address(student), WireValue::course(course_id)],
        )?;
        match self.gateway.read(&self.contract, &call).await? {
            ReadOutcome::Value(value) => Ok(session_ids_from_wire(&value)?),
            ReadOutcome::Void => Ok(Vec::new()),
            ReadOutcome::Failure { code, message } => Err(contract_failure(code, message)),
        }
    }
}

fn contract_failure(code: u32, message: String) -> ClientError {
    if code == diagnostic::SESSION_NOT_FOUND {
        ClientError::NotFound
    } else {
        ClientError::Contract { code, message }
    }
}
