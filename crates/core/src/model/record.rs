use chrono::{DateTime, Utc};

use crate::model::ids::{CourseId, SessionId, StudentAddress};
use crate::model::payload::SessionPayload;

//
// ─── SESSION DRAFT ─────────────────────────────────────────────────────────────
//

/// A session waiting to be recorded on the ledger.
///
/// The id is assigned when the draft is created and stays with the draft for
/// its whole life: resubmitting the same draft after a timeout reuses the id,
/// which is what lets the contract collapse double-submissions into one
/// logical record.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDraft {
    pub id: SessionId,
    pub student: StudentAddress,
    pub course_id: CourseId,
    pub payload: SessionPayload,
}

impl SessionDraft {
    /// Create a draft with a freshly generated session id.
    #[must_use]
    pub fn new(student: StudentAddress, course_id: CourseId, payload: SessionPayload) -> Self {
        Self {
            id: SessionId::generate(),
            student,
            course_id,
            payload,
        }
    }

    /// Create a draft with an explicit id, e.g. when resuming a submission
    /// that was interrupted before reaching a terminal state.
    #[must_use]
    pub fn with_id(
        id: SessionId,
        student: StudentAddress,
        course_id: CourseId,
        payload: SessionPayload,
    ) -> Self {
        Self {
            id,
            student,
            course_id,
            payload,
        }
    }
}

//
// ─── SESSION RECORD ────────────────────────────────────────────────────────────
//

/// A session as confirmed by the ledger. Immutable once returned; later
/// activity is expressed as new records, never as mutations of this one.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    id: SessionId,
    student: StudentAddress,
    course_id: CourseId,
    payload: SessionPayload,
    recorded_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Rehydrate a record from ledger-confirmed parts.
    #[must_use]
    pub fn new(
        id: SessionId,
        student: StudentAddress,
        course_id: CourseId,
        payload: SessionPayload,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            student,
            course_id,
            payload,
            recorded_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn student(&self) -> &StudentAddress {
        &self.student
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn payload(&self) -> &SessionPayload {
        &self.payload
    }

    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::payload::PayloadValue;
    use crate::time::fixed_now;

    fn sample_address() -> StudentAddress {
        StudentAddress::from_public_key(&[7u8; 32])
    }

    #[test]
    fn draft_ids_are_unique_per_draft() {
        let payload = SessionPayload::new();
        let a = SessionDraft::new(
            sample_address(),
            CourseId::new("rust-101").unwrap(),
            payload.clone(),
        );
        let b = SessionDraft::new(sample_address(), CourseId::new("rust-101").unwrap(), payload);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn with_id_preserves_the_given_id() {
        let id = SessionId::generate();
        let draft = SessionDraft::with_id(
            id,
            sample_address(),
            CourseId::new("rust-101").unwrap(),
            SessionPayload::new(),
        );
        assert_eq!(draft.id, id);
    }

    #[test]
    fn record_exposes_its_parts() {
        let id = SessionId::generate();
        let payload =
            SessionPayload::from_entries([("duration_s", PayloadValue::from(300))]).unwrap();
        let record = SessionRecord::new(
            id,
            sample_address(),
            CourseId::new("rust-101").unwrap(),
            payload.clone(),
            fixed_now(),
        );
        assert_eq!(record.id(), id);
        assert_eq!(record.payload(), &payload);
        assert_eq!(record.recorded_at(), fixed_now());
    }
}
