//! Scalar field values and type-aware comparison

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// A scalar field value read from a record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// Convert a JSON value into a scalar field value
    ///
    /// Objects and arrays are not scalars and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(FieldValue::Null),
            Value::Bool(b) => Some(FieldValue::Boolean(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(FieldValue::Integer(i)),
                None => n.as_f64().map(FieldValue::Float),
            },
            Value::String(s) => Some(FieldValue::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value (integers and floats only)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Timestamp view of the value
    ///
    /// Strings are parsed as RFC 3339 or as a plain `YYYY-MM-DD` date.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::DateTime(dt) => Some(*dt),
            FieldValue::String(s) => parse_timestamp(s),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Text form used for exact matching and free-text search
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::String(s) => s.clone(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::DateTime(dt) => dt.to_rfc3339(),
            FieldValue::Null => String::new(),
        }
    }

    /// Compare two values the way a list column compares them
    ///
    /// Values are ranked by kind first: numbers, then dates (including date
    /// strings), then booleans, then text. Within a kind, numbers compare
    /// numerically, dates by timestamp, booleans with `false < true`, and
    /// text case-insensitively with the raw text as tiebreak. This is a total
    /// order over non-null values, so a column mixing kinds sorts safely.
    /// Returns `None` for null values.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        let (a, b) = (self.sort_class()?, other.sort_class()?);
        Some(match (a, b) {
            (SortClass::Number(a), SortClass::Number(b)) => a.total_cmp(&b),
            (SortClass::Date(a), SortClass::Date(b)) => a.cmp(&b),
            (SortClass::Boolean(a), SortClass::Boolean(b)) => a.cmp(&b),
            (SortClass::Text(a), SortClass::Text(b)) => compare_text(&a, &b),
            (a, b) => a.rank().cmp(&b.rank()),
        })
    }

    fn sort_class(&self) -> Option<SortClass> {
        if self.is_null() {
            return None;
        }
        if let Some(n) = self.as_f64() {
            return Some(SortClass::Number(n));
        }
        if let Some(ts) = self.as_timestamp() {
            return Some(SortClass::Date(ts));
        }
        Some(match self {
            FieldValue::Boolean(b) => SortClass::Boolean(*b),
            other => SortClass::Text(other.to_text()),
        })
    }
}

/// A value reduced to the kind it sorts as
enum SortClass {
    Number(f64),
    Date(DateTime<Utc>),
    Boolean(bool),
    Text(String),
}

impl SortClass {
    fn rank(&self) -> u8 {
        match self {
            SortClass::Number(_) => 0,
            SortClass::Date(_) => 1,
            SortClass::Boolean(_) => 2,
            SortClass::Text(_) => 3,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value)
    }
}

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
