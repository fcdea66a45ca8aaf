use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

//
// ─── LIMITS ────────────────────────────────────────────────────────────────────
//

/// Maximum number of entries a session payload may carry on the ledger.
pub const MAX_PAYLOAD_ENTRIES: usize = 32;

/// Maximum length of a payload key.
pub const MAX_PAYLOAD_KEY_LEN: usize = 64;

/// Maximum length of a text payload value.
pub const MAX_PAYLOAD_TEXT_LEN: usize = 1024;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PayloadError {
    #[error("payload key cannot be empty")]
    EmptyKey,

    #[error("payload key is too long: {len} chars (max {max})")]
    KeyTooLong { len: usize, max: usize },

    #[error("payload text value is too long: {len} chars (max {max})")]
    TextTooLong { len: usize, max: usize },

    #[error("too many payload entries: {len} (max {max})")]
    TooManyEntries { len: usize, max: usize },
}

//
// ─── PAYLOAD VALUE ─────────────────────────────────────────────────────────────
//

/// Scalar value carried in a session payload.
///
/// Variant order matters for untagged deserialization: whole JSON numbers
/// become `Int`, fractional ones fall through to `Float`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for PayloadValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PayloadValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for PayloadValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for PayloadValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

//
// ─── SESSION PAYLOAD ───────────────────────────────────────────────────────────
//

/// Ordered string→scalar map attached to a session record.
///
/// Backed by a `BTreeMap` so iteration order is stable and envelope digests
/// stay deterministic across builds of the same payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionPayload(BTreeMap<String, PayloadValue>);

impl SessionPayload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a payload from key/value pairs, validating each entry.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError` for empty or oversized keys, oversized text
    /// values, or too many entries.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, PayloadError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PayloadValue>,
    {
        let mut payload = Self::new();
        for (key, value) in entries {
            payload.insert(key, value)?;
        }
        Ok(payload)
    }

    /// Insert one entry, validating key and value limits.
    ///
    /// Re-inserting an existing key replaces its value.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError` if the key or value violates the limits.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PayloadValue>,
    ) -> Result<(), PayloadError> {
        let key = key.into();
        if key.is_empty() {
            return Err(PayloadError::EmptyKey);
        }
        if key.len() > MAX_PAYLOAD_KEY_LEN {
            return Err(PayloadError::KeyTooLong {
                len: key.len(),
                max: MAX_PAYLOAD_KEY_LEN,
            });
        }
        let value = value.into();
        if let PayloadValue::Text(text) = &value {
            if text.len() > MAX_PAYLOAD_TEXT_LEN {
                return Err(PayloadError::TextTooLong {
                    len: text.len(),
                    max: MAX_PAYLOAD_TEXT_LEN,
                });
            }
        }
        if !self.0.contains_key(&key) && self.0.len() >= MAX_PAYLOAD_ENTRIES {
            return Err(PayloadError::TooManyEntries {
                len: self.0.len() + 1,
                max: MAX_PAYLOAD_ENTRIES,
            });
        }
        self.0.insert(key, value);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.0.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PayloadValue)> {
        self.0.iter()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_entries_accepts_mixed_scalars() {
        let payload = SessionPayload::from_entries([
            ("duration_s", PayloadValue::from(300)),
            ("passed", PayloadValue::from(true)),
            ("accuracy", PayloadValue::from(0.92)),
            ("module", PayloadValue::from("intro")),
        ])
        .unwrap();

        assert_eq!(payload.len(), 4);
        assert_eq!(payload.get("duration_s"), Some(&PayloadValue::Int(300)));
        assert_eq!(payload.get("passed"), Some(&PayloadValue::Bool(true)));
    }

    #[test]
    fn insert_rejects_empty_and_long_keys() {
        let mut payload = SessionPayload::new();
        assert_eq!(payload.insert("", 1i64), Err(PayloadError::EmptyKey));

        let long_key = "k".repeat(MAX_PAYLOAD_KEY_LEN + 1);
        assert!(matches!(
            payload.insert(long_key, 1i64),
            Err(PayloadError::KeyTooLong { .. })
        ));
    }

    #[test]
    fn insert_rejects_oversized_text() {
        let mut payload = SessionPayload::new();
        let text = "x".repeat(MAX_PAYLOAD_TEXT_LEN + 1);
        assert!(matches!(
            payload.insert("notes", text),
            Err(PayloadError::TextTooLong { .. })
        ));
    }

    #[test]
    fn insert_caps_entry_count_but_allows_overwrites() {
        let mut payload = SessionPayload::new();
        for i in 0..MAX_PAYLOAD_ENTRIES {
            payload.insert(format!("k{i}"), i as i64).unwrap();
        }
        assert!(matches!(
            payload.insert("overflow", 1i64),
            Err(PayloadError::TooManyEntries { .. })
        ));
        // overwriting an existing key is not a new entry
        payload.insert("k0", 99i64).unwrap();
        assert_eq!(payload.get("k0"), Some(&PayloadValue::Int(99)));
    }

    #[test]
    fn untagged_serde_keeps_whole_numbers_integral() {
        let payload =
            SessionPayload::from_entries([("count", 3i64), ("ratio", 5i64)]).unwrap();
        let json = serde_json::to_string(&payload).unwrap();
        let back: SessionPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload, back);
        assert_eq!(back.get("count"), Some(&PayloadValue::Int(3)));
    }
}
