//! Scalar values exchanged with the driver and their SQL literal form.

use chrono::{DateTime, Utc};

/// A scalar value as stored in or returned from the database.
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl DbValue {
    /// Render this value as SQL literal text.
    ///
    /// This is the only place in the crate where a value becomes SQL text.
    /// Everything the builder interpolates that is not a validated identifier
    /// goes through here: strings are single-quoted with embedded quotes
    /// doubled, timestamps become quoted RFC 3339 strings.
    ///
    /// # Panics
    /// Panics on non-finite floats and on strings containing NUL bytes; both
    /// are programming errors on the caller's side, not runtime conditions.
    #[must_use]
    pub fn to_sql_literal(&self) -> String {
        match self {
            DbValue::Null => "NULL".to_owned(),
            DbValue::Integer(v) => v.to_string(),
            DbValue::Float(v) => {
                assert!(v.is_finite(), "non-finite float has no SQL literal form");
                v.to_string()
            }
            DbValue::Boolean(v) => (if *v { "TRUE" } else { "FALSE" }).to_owned(),
            DbValue::Text(s) => quote(s),
            DbValue::Timestamp(ts) => quote(&ts.to_rfc3339()),
        }
    }

    /// JSON-safe form handed to the registry collaborator. Timestamps are
    /// rendered as RFC 3339 strings; other variants pass through unchanged.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            DbValue::Null => Value::Null,
            DbValue::Integer(v) => Value::from(*v),
            DbValue::Float(v) => serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number),
            DbValue::Boolean(v) => Value::from(*v),
            DbValue::Text(s) => Value::from(s.as_str()),
            DbValue::Timestamp(ts) => Value::from(ts.to_rfc3339()),
        }
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            DbValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DbValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

fn quote(s: &str) -> String {
    assert!(!s.contains('\0'), "NUL byte in SQL string literal");
    format!("'{}'", s.replace('\'', "''"))
}

impl From<i64> for DbValue {
    fn from(v: i64) -> Self {
        DbValue::Integer(v)
    }
}

impl From<i32> for DbValue {
    fn from(v: i32) -> Self {
        DbValue::Integer(i64::from(v))
    }
}

impl From<f64> for DbValue {
    fn from(v: f64) -> Self {
        DbValue::Float(v)
    }
}

impl From<bool> for DbValue {
    fn from(v: bool) -> Self {
        DbValue::Boolean(v)
    }
}

impl From<&str> for DbValue {
    fn from(v: &str) -> Self {
        DbValue::Text(v.to_owned())
    }
}

impl From<String> for DbValue {
    fn from(v: String) -> Self {
        DbValue::Text(v)
    }
}

impl From<DateTime<Utc>> for DbValue {
    fn from(v: DateTime<Utc>) -> Self {
        DbValue::Timestamp(v)
    }
}
