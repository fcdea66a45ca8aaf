use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors produced while constructing or parsing identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdError {
    #[error("session id is not a valid uuid")]
    InvalidSessionId,

    #[error("course id cannot be empty")]
    EmptyCourseId,

    #[error("course id is too long: {len} chars (max {max})")]
    CourseIdTooLong { len: usize, max: usize },

    #[error("course id contains invalid character {ch:?}")]
    InvalidCourseIdChar { ch: char },

    #[error("student address must be {expected} hex chars, got {len}")]
    InvalidAddressLength { len: usize, expected: usize },

    #[error("student address contains non-hex characters")]
    InvalidAddressEncoding,
}

//
// ─── SESSION ID ────────────────────────────────────────────────────────────────
//

/// Unique identifier for a learning session.
///
/// Assigned client-side when a draft is created and reused across submission
/// retries, so a retried submission can never create a second logical record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Wraps an existing uuid.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generates a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying uuid.
    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }

    /// Returns the raw 16 id bytes as sent to the ledger.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Rebuilds an id from the raw bytes stored on the ledger.
    ///
    /// # Errors
    ///
    /// Returns `IdError` unless `bytes` is exactly 16 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdError> {
        let raw: [u8; 16] = bytes.try_into().map_err(|_| IdError::InvalidSessionId)?;
        Ok(Self(Uuid::from_bytes(raw)))
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(SessionId::new)
            .map_err(|_| IdError::InvalidSessionId)
    }
}

//
// ─── COURSE ID ─────────────────────────────────────────────────────────────────
//

/// Maximum course id length accepted by the contract's symbol encoding.
pub const MAX_COURSE_ID_LEN: usize = 32;

/// Validated course identifier (symbol charset, 1..=32 chars).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CourseId(String);

impl CourseId {
    /// Create a validated course id.
    ///
    /// # Errors
    ///
    /// Returns `IdError` if the id is empty after trimming, longer than
    /// [`MAX_COURSE_ID_LEN`], or contains characters outside `[A-Za-z0-9_-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdError::EmptyCourseId);
        }
        if trimmed.len() > MAX_COURSE_ID_LEN {
            return Err(IdError::CourseIdTooLong {
                len: trimmed.len(),
                max: MAX_COURSE_ID_LEN,
            });
        }
        if let Some(ch) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(IdError::InvalidCourseIdChar { ch });
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CourseId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CourseId::new(s)
    }
}

//
// ─── STUDENT ADDRESS ───────────────────────────────────────────────────────────
//

/// Hex length of an ed25519 public key.
pub const ADDRESS_HEX_LEN: usize = 64;

/// On-ledger account address of a student: the hex-encoded ed25519 public
/// key of the signing keypair. Normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentAddress(String);

impl StudentAddress {
    /// Create a validated address from its hex form.
    ///
    /// # Errors
    ///
    /// Returns `IdError` if the input is not exactly 64 hex characters.
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.len() != ADDRESS_HEX_LEN {
            return Err(IdError::InvalidAddressLength {
                len: trimmed.len(),
                expected: ADDRESS_HEX_LEN,
            });
        }
        if !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdError::InvalidAddressEncoding);
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Builds an address directly from raw public key bytes.
    #[must_use]
    pub fn from_public_key(bytes: &[u8; 32]) -> Self {
        let mut out = String::with_capacity(ADDRESS_HEX_LEN);
        for b in bytes {
            use fmt::Write;
            // 32 fixed bytes cannot fail to format
            let _ = write!(out, "{b:02x}");
        }
        Self(out)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StudentAddress {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StudentAddress::new(s)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_roundtrips_through_display() {
        let id = SessionId::generate();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn session_id_rejects_garbage() {
        assert_eq!(
            "not-a-uuid".parse::<SessionId>(),
            Err(IdError::InvalidSessionId)
        );
    }

    #[test]
    fn course_id_trims_and_validates() {
        let id = CourseId::new("  rust-101 ").unwrap();
        assert_eq!(id.as_str(), "rust-101");
    }

    #[test]
    fn course_id_rejects_empty_and_long() {
        assert_eq!(CourseId::new("  "), Err(IdError::EmptyCourseId));
        let long = "x".repeat(MAX_COURSE_ID_LEN + 1);
        assert!(matches!(
            CourseId::new(long),
            Err(IdError::CourseIdTooLong { .. })
        ));
    }

    #[test]
    fn course_id_rejects_symbol_charset_violations() {
        assert!(matches!(
            CourseId::new("rust 101"),
            Err(IdError::InvalidCourseIdChar { ch: ' ' })
        ));
    }

    #[test]
    fn address_normalizes_to_lowercase() {
        let upper = "AB".repeat(32);
        let addr = StudentAddress::new(upper).unwrap();
        assert_eq!(addr.as_str(), "ab".repeat(32));
    }

    #[test]
    fn address_rejects_bad_lengths_and_chars() {
        assert!(matches!(
            StudentAddress::new("abcd"),
            Err(IdError::InvalidAddressLength { len: 4, .. })
        ));
        let nonhex = "zz".repeat(32);
        assert_eq!(
            StudentAddress::new(nonhex),
            Err(IdError::InvalidAddressEncoding)
        );
    }

    #[test]
    fn session_id_roundtrips_through_bytes() {
        let id = SessionId::generate();
        assert_eq!(SessionId::from_bytes(id.as_bytes()), Ok(id));
        assert_eq!(
            SessionId::from_bytes(&[0u8; 15]),
            Err(IdError::InvalidSessionId)
        );
    }

    #[test]
    fn address_from_public_key_matches_hex() {
        let addr = StudentAddress::from_public_key(&[0xab; 32]);
        assert_eq!(addr.as_str(), "ab".repeat(32));
        assert_eq!(StudentAddress::new(addr.as_str()).unwrap(), addr);
    }
}
