//! Typed values held by the store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value held at one global path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StoreValue {
    Str(String),
    Int(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    Bool(bool),
}

impl StoreValue {
    /// Borrow the string payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoreValue::Str(s) => Some(s),
            _ => None,
        }
    }
}


/// Renders the value the way exports and diagnostics print it.
impl fmt::Display for StoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreValue::Str(s) => f.write_str(s),
            StoreValue::Int(n) => write!(f, "{n}"),
            StoreValue::Float(x) => write!(f, "{x}"),
            StoreValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            StoreValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for StoreValue {
    fn from(s: &str) -> Self {
        StoreValue::Str(s.to_string())
    }
}

impl From<String> for StoreValue {
    fn from(s: String) -> Self {
        StoreValue::Str(s)
    }
}

impl From<i64> for StoreValue {
    fn from(n: i64) -> Self {
        StoreValue::Int(n)
    }
}

impl From<i32> for StoreValue {
    fn from(n: i32) -> Self {
        StoreValue::Int(i64::from(n))
    }
}

impl From<f64> for StoreValue {
    fn from(x: f64) -> Self {
        StoreValue::Float(x)
    }
}

impl From<DateTime<Utc>> for StoreValue {
    fn from(ts: DateTime<Utc>) -> Self {
        StoreValue::Timestamp(ts)
    }
}

impl From<bool> for StoreValue {
    fn from(b: bool) -> Self {
        StoreValue::Bool(b)
    }
}


/// Typed extraction at the read boundary. A value of another variant reads
/// as absent; there is no coercion.
pub trait FromStoreValue: Sized {
    fn from_store_value(value: &StoreValue) -> Option<Self>;
}

impl FromStoreValue for StoreValue {
    fn from_store_value(value: &StoreValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromStoreValue for String {
    fn from_store_value(value: &StoreValue) -> Option<Self> {
        match value {
            StoreValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromStoreValue for i64 {
    fn from_store_value(value: &StoreValue) -> Option<Self> {
        match value {
            StoreValue::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromStoreValue for f64 {
    fn from_store_value(value: &StoreValue) -> Option<Self> {
        match value {
            StoreValue::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl FromStoreValue for DateTime<Utc> {
    fn from_store_value(value: &StoreValue) -> Option<Self> {
        match value {
            StoreValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl FromStoreValue for bool {
    fn from_store_value(value: &StoreValue) -> Option<Self> {
        match value {
            StoreValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_reads_do_not_coerce() {
        let v = StoreValue::from(5i64);
        assert_eq!(i64::from_store_value(&v), Some(5));
        assert_eq!(f64::from_store_value(&v), None);
        assert_eq!(String::from_store_value(&v), None);

        let s = StoreValue::from("OPEN");
        assert_eq!(String::from_store_value(&s).as_deref(), Some("OPEN"));
        assert_eq!(bool::from_store_value(&s), None);
    }

    #[test]
    fn display_for_export() {
        assert_eq!(StoreValue::from("Matjes").to_string(), "Matjes");
        assert_eq!(StoreValue::from(15).to_string(), "15");
        assert_eq!(StoreValue::from(true).to_string(), "true");
    }

    #[test]
    fn serde_is_tagged() {
        let json = serde_json::to_value(StoreValue::from(3)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "int", "value": 3}));
    }
}
