//! Wire values exchanged with the contract.
//!
//! Arguments and results travel as [`WireValue`] trees. The encoding is a
//! tagged JSON object so every node carries its kind explicitly, which
//! keeps the envelope digest unambiguous and lets the endpoint check
//! argument kinds without guessing.

use serde::{Deserialize, Serialize};
use study_core::model::{
    CourseId, PayloadValue, SessionId, SessionPayload, StudentAddress,
};

/// The kind of a wire value, used when checking call arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bytes,
    Address,
    Symbol,
    U64,
    I64,
    F64,
    Text,
    Bool,
    Map,
    List,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bytes => "bytes",
            Self::Address => "address",
            Self::Symbol => "symbol",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F64 => "f64",
            Self::Text => "text",
            Self::Bool => "bool",
            Self::Map => "map",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

/// A value in the contract's argument and result encoding.
///
/// Maps keep their entries in insertion order; conversions from domain
/// payloads insert in key order, so encoding the same payload always
/// yields the same bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum WireValue {
    /// Raw bytes, hex-encoded on the wire.
    #[serde(with = "hex_bytes")]
    Bytes(Vec<u8>),
    /// An account address.
    Address(String),
    /// A short identifier such as a course id or entry-point name.
    Symbol(String),
    U64(u64),
    I64(i64),
    F64(f64),
    Text(String),
    Bool(bool),
    Map(Vec<(String, WireValue)>),
    List(Vec<WireValue>),
}

impl WireValue {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Address(_) => ValueKind::Address,
            Self::Symbol(_) => ValueKind::Symbol,
            Self::U64(_) => ValueKind::U64,
            Self::I64(_) => ValueKind::I64,
            Self::F64(_) => ValueKind::F64,
            Self::Text(_) => ValueKind::Text,
            Self::Bool(_) => ValueKind::Bool,
            Self::Map(_) => ValueKind::Map,
            Self::List(_) => ValueKind::List,
        }
    }

    /// Looks up a key in a map value. Returns `None` for non-maps.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&WireValue> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    #[must_use]
    pub fn session_id(id: &SessionId) -> Self {
        Self::Bytes(id.as_bytes().to_vec())
    }

    #[must_use]
    pub fn address(address: &StudentAddress) -> Self {
        Self::Address(address.as_str().to_owned())
    }

    #[must_use]
    pub fn course(course_id: &CourseId) -> Self {
        Self::Symbol(course_id.as_str().to_owned())
    }

    /// Encodes a session payload as an ordered map.
    #[must_use]
    pub fn payload(payload: &SessionPayload) -> Self {
        let entries = payload
            .iter()
            .map(|(key, value)| (key.clone(), Self::from(value.clone())))
            .collect();
        Self::Map(entries)
    }
}

impl From<PayloadValue> for WireValue {
    fn from(value: PayloadValue) -> Self {
        match value {
            PayloadValue::Bool(b) => Self::Bool(b),
            PayloadValue::Int(i) => Self::I64(i),
            PayloadValue::Float(f) => Self::F64(f),
            PayloadValue::Text(s) => Self::Text(s),
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize as _, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(&encoded).map_err(de::Error::custom)
    }
}
