use std::borrow::Cow;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::types::{DataType, TypeCategory};

/// A value bound into an insert statement or sampled from the database.
///
/// The `String` variant uses `Cow<'static, str>` so that values drawn from
/// static word lists can be held as `&'static str` borrows, while generated
/// text is stored as an owned `String`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Cow<'static, str>),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a configuration literal into a value.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(Cow::Owned(s.clone())),
            other => Value::Json(other.clone()),
        }
    }

    /// Reinterpret a user-supplied value for a column of type `data_type`.
    ///
    /// Configured values arrive as JSON literals, so `"42"` for an integer
    /// column or `1` for a text column are common. Values that cannot be
    /// converted are returned unchanged and left for the database to reject.
    pub fn coerce_for(self, data_type: &DataType) -> Value {
        match (data_type.category(), self) {
            (_, Value::Null) => Value::Null,
            (TypeCategory::Integer, Value::String(s)) => match s.trim().parse::<i64>() {
                Ok(i) => Value::Int(i),
                Err(_) => Value::String(s),
            },
            (TypeCategory::Integer, Value::Float(f)) if f.fract() == 0.0 => Value::Int(f as i64),
            (TypeCategory::Decimal, Value::Int(i)) => Value::Float(i as f64),
            (TypeCategory::Decimal, Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(f) => Value::Float(f),
                Err(_) => Value::String(s),
            },
            (TypeCategory::Boolean, Value::Int(i)) => Value::Bool(i != 0),
            (TypeCategory::Boolean, Value::String(s)) => {
                match s.trim().to_lowercase().as_str() {
                    "true" | "1" | "yes" => Value::Bool(true),
                    "false" | "0" | "no" => Value::Bool(false),
                    _ => Value::String(s),
                }
            }
            (TypeCategory::Text, Value::Int(i)) => Value::String(Cow::Owned(i.to_string())),
            (TypeCategory::Text, Value::Float(f)) => Value::String(Cow::Owned(f.to_string())),
            (TypeCategory::Text, Value::Bool(b)) => Value::String(Cow::Owned(b.to_string())),
            (TypeCategory::Date, Value::String(s)) => {
                match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
                    Ok(d) => Value::Date(d),
                    Err(_) => Value::String(s),
                }
            }
            (TypeCategory::Timestamp, Value::String(s)) => {
                match NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S")
                    .or_else(|_| NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M:%S"))
                {
                    Ok(ts) => Value::Timestamp(ts),
                    Err(_) => Value::String(s),
                }
            }
            (TypeCategory::Time, Value::String(s)) => {
                match NaiveTime::parse_from_str(s.trim(), "%H:%M:%S") {
                    Ok(t) => Value::Time(t),
                    Err(_) => Value::String(s),
                }
            }
            (TypeCategory::Uuid, Value::String(s)) => match Uuid::parse_str(s.trim()) {
                Ok(u) => Value::Uuid(u),
                Err(_) => Value::String(s),
            },
            (TypeCategory::Json, Value::String(s)) => {
                match serde_json::from_str::<serde_json::Value>(&s) {
                    Ok(j) => Value::Json(j),
                    Err(_) => Value::Json(serde_json::Value::String(s.into_owned())),
                }
            }
            (_, other) => other,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{}", s),
            Value::Timestamp(ts) => write!(f, "{}", ts),
            Value::Date(d) => write!(f, "{}", d),
            Value::Time(t) => write!(f, "{}", t),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Json(j) => write!(f, "{}", j),
        }
    }
}
