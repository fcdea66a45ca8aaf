//! Conversions between domain types and the contract's wire encoding.
//!
//! The encoding side is infallible because it starts from validated domain
//! types. The decoding side checks shape and kinds field by field, since a
//! result map comes from outside the process.

use chrono::DateTime;
use study_core::model::{
    CourseId, IdError, PayloadError, PayloadValue, ProgressError, ProgressSummary, SessionId,
    SessionPayload, SessionRecord, StudentAddress,
};
use thiserror::Error;

use crate::value::{ValueKind, WireValue};

/// A wire value that does not decode to the domain type it claims to be.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("result must be {expected}, got {got}")]
    TopKind { expected: ValueKind, got: ValueKind },

    #[error("result is missing field {field:?}")]
    MissingField { field: &'static str },

    #[error("field {field:?} must be {expected}, got {got}")]
    FieldKind {
        field: &'static str,
        expected: ValueKind,
        got: ValueKind,
    },

    #[error("field {field:?} value {value} is out of range")]
    OutOfRange { field: &'static str, value: u64 },

    #[error("payload entry {key:?} has unsupported kind {kind}")]
    UnsupportedPayloadValue { key: String, kind: ValueKind },

    #[error(transparent)]
    Id(#[from] IdError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Progress(#[from] ProgressError),
}

//
// ─── ENCODING ──────────────────────────────────────────────────────────────────
//

/// Positional arguments for a `record_session` call.
#[must_use]
pub fn record_to_args(record: &SessionRecord) -> Vec<WireValue> {
    let recorded_at = record.recorded_at().timestamp().max(0) as u64;
    vec![
        WireValue::session_id(&record.id()),
        WireValue::address(record.student()),
        WireValue::course(record.course_id()),
        WireValue::payload(record.payload()),
        WireValue::U64(recorded_at),
    ]
}

/// Encodes a record as the named map the contract returns from reads.
#[must_use]
pub fn record_to_wire(record: &SessionRecord) -> WireValue {
    let recorded_at = record.recorded_at().timestamp().max(0) as u64;
    WireValue::Map(vec![
        ("id".into(), WireValue::session_id(&record.id())),
        ("student".into(), WireValue::address(record.student())),
        ("course_id".into(), WireValue::course(record.course_id())),
        ("payload".into(), WireValue::payload(record.payload())),
        ("recorded_at".into(), WireValue::U64(recorded_at)),
    ])
}

/// Encodes a progress summary as the map returned by `get_progress`.
///
/// The completion ratio is not encoded; readers derive it from the counts.
#[must_use]
pub fn progress_to_wire(progress: &ProgressSummary) -> WireValue {
    WireValue::Map(vec![
        ("student".into(), WireValue::address(progress.student())),
        ("course_id".into(), WireValue::course(progress.course_id())),
        (
            "completed_modules".into(),
            WireValue::U64(u64::from(progress.completed_modules())),
        ),
        (
            "total_modules".into(),
            WireValue::U64(u64::from(progress.total_modules())),
        ),
        (
            "sessions_recorded".into(),
            WireValue::U64(u64::from(progress.sessions_recorded())),
        ),
        (
            "time_spent_s".into(),
            WireValue::U64(progress.time_spent_s()),
        ),
    ])
}

/// Encodes a list of session ids as returned by `list_sessions`.
#[must_use]
pub fn session_ids_to_wire(ids: &[SessionId]) -> WireValue {
    WireValue::List(ids.iter().map(WireValue::session_id).collect())
}

//
// ─── DECODING ──────────────────────────────────────────────────────────────────
//

/// Decodes the map returned by `get_session` into a record.
pub fn record_from_wire(value: &WireValue) -> Result<SessionRecord, DecodeError> {
    expect_map(value)?;
    let id = SessionId::from_bytes(field_bytes(value, "id")?)?;
    let student = StudentAddress::new(field_address(value, "student")?)?;
    let course_id = CourseId::new(field_symbol(value, "course_id")?)?;
    let payload = payload_from_wire(field(value, "payload")?)?;
    let recorded_at_s = field_u64(value, "recorded_at")?;
    let recorded_at = i64::try_from(recorded_at_s)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or(DecodeError::OutOfRange {
            field: "recorded_at",
            value: recorded_at_s,
        })?;
    Ok(SessionRecord::new(id, student, course_id, payload, recorded_at))
}

/// Decodes the map returned by `get_progress`.
pub fn progress_from_wire(value: &WireValue) -> Result<ProgressSummary, DecodeError> {
    expect_map(value)?;
    let student = StudentAddress::new(field_address(value, "student")?)?;
    let course_id = CourseId::new(field_symbol(value, "course_id")?)?;
    let completed = field_u32(value, "completed_modules")?;
    let total = field_u32(value, "total_modules")?;
    let sessions = field_u32(value, "sessions_recorded")?;
    let time_spent_s = field_u64(value, "time_spent_s")?;
    Ok(ProgressSummary::from_counts(
        student,
        course_id,
        completed,
        total,
        sessions,
        time_spent_s,
    )?)
}

/// Decodes the id list returned by `list_sessions`.
pub fn session_ids_from_wire(value: &WireValue) -> Result<Vec<SessionId>, DecodeError> {
    let WireValue::List(items) = value else {
        return Err(DecodeError::TopKind {
            expected: ValueKind::List,
            got: value.kind(),
        });
    };
    items
        .iter()
        .map(|item| match item {
            WireValue::Bytes(bytes) => Ok(SessionId::from_bytes(bytes)?),
            other => Err(DecodeError::TopKind {
                expected: ValueKind::Bytes,
                got: other.kind(),
            }),
        })
        .collect()
}

/// Decodes a wire map back into a session payload.
pub fn payload_from_wire(value: &WireValue) -> Result<SessionPayload, DecodeError> {
    let WireValue::Map(entries) = value else {
        return Err(DecodeError::TopKind {
            expected: ValueKind::Map,
            got: value.kind(),
        });
    };
    let mut payload = SessionPayload::new();
    for (key, entry) in entries {
        let scalar = match entry {
            WireValue::Bool(b) => PayloadValue::Bool(*b),
            WireValue::I64(i) => PayloadValue::Int(*i),
            WireValue::F64(f) => PayloadValue::Float(*f),
            WireValue::Text(s) => PayloadValue::Text(s.clone()),
            other => {
                return Err(DecodeError::UnsupportedPayloadValue {
                    key: key.clone(),
                    kind: other.kind(),
                });
            }
        };
        payload.insert(key.clone(), scalar)?;
    }
    Ok(payload)
}

//
// ─── FIELD HELPERS ─────────────────────────────────────────────────────────────
//

fn expect_map(value: &WireValue) -> Result<(), DecodeError> {
    match value {
        WireValue::Map(_) => Ok(()),
        other => Err(DecodeError::TopKind {
            expected: ValueKind::Map,
            got: other.kind(),
        }),
    }
}

fn field<'a>(value: &'a WireValue, name: &'static str) -> Result<&'a WireValue, DecodeError> {
    value
        .get(name)
        .ok_or(DecodeError::MissingField { field: name })
}

fn field_bytes<'a>(value: &'a WireValue, name: &'static str) -> Result<&'a [u8], DecodeError> {
    match field(value, name)? {
        WireValue::Bytes(bytes) => Ok(bytes),
        other => Err(DecodeError::FieldKind {
            field: name,
            expected: ValueKind::Bytes,
            got: other.kind(),
        }),
    }
}

fn field_address<'a>(value: &'a WireValue, name: &'static str) -> Result<&'a str, DecodeError> {
    match field(value, name)? {
        WireValue::Address(addr) => Ok(addr),
        other => Err(DecodeError::FieldKind {
            field: name,
            expected: ValueKind::Address,
            got: other.kind(),
        }),
    }
}

fn field_symbol<'a>(value: &'a WireValue, name: &'static str) -> Result<&'a str, DecodeError> {
    match field(value, name)? {
        WireValue::Symbol(sym) => Ok(sym),
        other => Err(DecodeError::FieldKind {
            field: name,
            expected: ValueKind::Symbol,
            got: other.kind(),
        }),
    }
}

fn field_u64(value: &WireValue, name: &'static str) -> Result<u64, DecodeError> {
    match field(value, name)? {
        WireValue::U64(n) => Ok(*n),
        other => Err(DecodeError::FieldKind {
            field: name,
            expected: ValueKind::U64,
            got: other.kind(),
        }),
    }
}

fn field_u32(value: &WireValue, name: &'static str) -> Result<u32, DecodeError> {
    let raw = field_u64(value, name)?;
    u32::try_from(raw).map_err(|_| DecodeError::OutOfRange {
        field: name,
        value: raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::fixed_now;
    use study_core::model::PayloadValue;

    fn sample_record() -> SessionRecord {
        let payload = SessionPayload::from_entries([
            ("duration_s", PayloadValue::from(300)),
            ("module", PayloadValue::from("intro")),
            ("completed", PayloadValue::from(true)),
        ])
        .unwrap();
        SessionRecord::new(
            SessionId::generate(),
            StudentAddress::from_public_key(&[0x11; 32]),
            CourseId::new("rust-101").unwrap(),
            payload,
            fixed_now(),
        )
    }

    #[test]
    fn record_survives_the_wire() {
        let record = sample_record();
        let decoded = record_from_wire(&record_to_wire(&record)).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn record_args_follow_entry_point_shape() {
        let record = sample_record();
        let args = record_to_args(&record);
        crate::contract::check_args(crate::contract::EntryPoint::RecordSession, &args).unwrap();
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let record = sample_record();
        let WireValue::Map(mut entries) = record_to_wire(&record) else {
            panic!("expected map");
        };
        entries.retain(|(k, _)| k != "student");
        let err = record_from_wire(&WireValue::Map(entries)).unwrap_err();
        assert_eq!(err, DecodeError::MissingField { field: "student" });
    }

    #[test]
    fn wrong_field_kind_is_rejected() {
        let record = sample_record();
        let WireValue::Map(mut entries) = record_to_wire(&record) else {
            panic!("expected map");
        };
        for entry in &mut entries {
            if entry.0 == "recorded_at" {
                entry.1 = WireValue::Text("tomorrow".into());
            }
        }
        let err = record_from_wire(&WireValue::Map(entries)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::FieldKind {
                field: "recorded_at",
                expected: ValueKind::U64,
                got: ValueKind::Text,
            }
        );
    }

    #[test]
    fn nested_payload_values_are_rejected() {
        let wire = WireValue::Map(vec![("nested".into(), WireValue::Map(vec![]))]);
        let err = payload_from_wire(&wire).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnsupportedPayloadValue {
                key: "nested".into(),
                kind: ValueKind::Map,
            }
        );
    }

    #[test]
    fn progress_roundtrip_keeps_counts() {
        let progress = ProgressSummary::from_counts(
            StudentAddress::from_public_key(&[0x22; 32]),
            CourseId::new("rust-101").unwrap(),
            3,
            4,
            9,
            2700,
        )
        .unwrap();
        let decoded = progress_from_wire(&progress_to_wire(&progress)).unwrap();
        assert_eq!(decoded, progress);
        assert!((decoded.completion_ratio() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn session_id_list_roundtrips() {
        let ids = vec![SessionId::generate(), SessionId::generate()];
        let decoded = session_ids_from_wire(&session_ids_to_wire(&ids)).unwrap();
        assert_eq!(decoded, ids);
    }
}
