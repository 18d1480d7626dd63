//! Typed table cells.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A single table cell.
///
/// Serialized untagged, so JSON `null`, booleans, numbers, strings, arrays and
/// objects map onto the matching variant. Whole JSON numbers become [`Value::Int`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Whether this cell is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Numeric addition. Two integers stay integral unless the sum overflows;
    /// any float operand widens the result to [`Value::Float`].
    ///
    /// Returns `None` when either operand is not a number.
    pub fn checked_add(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(
                a.checked_add(*b)
                    .map(Self::Int)
                    .unwrap_or(Self::Float(*a as f64 + *b as f64)),
            ),
            _ => Some(Self::Float(self.as_f64()? + other.as_f64()?)),
        }
    }

    /// The hashable key used to match this cell in joins and group-bys.
    ///
    /// `Null`, `NaN`, lists and objects never match anything. Integral floats
    /// match the equal integer.
    pub fn join_key(&self) -> Option<JoinKey> {
        match self {
            Self::Null | Self::List(_) | Self::Object(_) => None,
            Self::Bool(b) => Some(JoinKey::Bool(*b)),
            Self::Int(i) => Some(JoinKey::Int(*i)),
            Self::Str(s) => Some(JoinKey::Str(s.clone())),
            Self::Float(f) if f.is_nan() => None,
            Self::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Some(JoinKey::Int(*f as i64))
                } else {
                    Some(JoinKey::Float(f.to_bits()))
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            // Keep the fractional part so 1.0 does not read as the integer 1.
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::List(_) | Self::Object(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                write!(f, "{json}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

// ---------------------------------------------------------------------------
// JoinKey
// ---------------------------------------------------------------------------

/// Hashable projection of a [`Value`] used for equality matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinKey {
    Bool(bool),
    Int(i64),
    /// Non-integral float, compared by bit pattern.
    Float(u64),
    Str(String),
}
