//! Join keys and the `Entity` abstraction used to read them.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Scalar value two records are joined on.
///
/// Keys compare by their canonical text, so the number `3`, the float `3.0`
/// and the string `"3"` are the same key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JoinKey {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
}

impl JoinKey {
    /// Convert a JSON scalar into a key. Arrays and objects are not keys.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(flag) => Some(Self::Bool(*flag)),
            Value::Number(number) => Some(Self::Number(number.clone())),
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(flag) => Value::Bool(*flag),
            Self::Number(number) => Value::Number(number.clone()),
            Self::Text(text) => Value::String(text.clone()),
        }
    }

    /// Text form used for equality and hashing.
    ///
    /// Integral floats render without a fraction and `-0.0` renders as `0`.
    pub fn canonical(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed("null"),
            Self::Bool(true) => Cow::Borrowed("true"),
            Self::Bool(false) => Cow::Borrowed("false"),
            Self::Number(number) => Cow::Owned(canonical_number(number)),
            Self::Text(text) => Cow::Borrowed(text),
        }
    }
}

fn canonical_number(number: &Number) -> String {
    match number.as_f64().filter(|_| number.is_f64()) {
        // f64 Display drops the fraction of integral values
        Some(float) => match float.to_string() {
            text if text == "-0" => "0".to_owned(),
            text => text,
        },
        None => number.to_string(),
    }
}

impl PartialEq for JoinKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for JoinKey {}

impl Hash for JoinKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for JoinKey {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for JoinKey {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for JoinKey {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<bool> for JoinKey {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for JoinKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for JoinKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A record the engine can join on.
///
/// Implemented for both primary entities and the secondary records returned
/// by a mapper endpoint. Returning `None` means the record has no usable
/// value for `attribute`.
pub trait Entity {
    fn join_key(&self, attribute: &str) -> Option<JoinKey>;
}

impl Entity for Value {
    fn join_key(&self, attribute: &str) -> Option<JoinKey> {
        self.get(attribute).and_then(JoinKey::from_value)
    }
}

impl Entity for Map<String, Value> {
    fn join_key(&self, attribute: &str) -> Option<JoinKey> {
        self.get(attribute).and_then(JoinKey::from_value)
    }
}
