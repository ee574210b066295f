use crate::column_type::{compare_arrays, ColumnType};
use chrono::{DateTime, SecondsFormat};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Typed cell value
///
/// Equality, hashing and ordering follow the `ColumnType` comparators, so
/// values can key both hash and ordered indices.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value
    Null,
    /// BOOLEAN
    Boolean(bool),
    /// DATE (milliseconds since the Unix epoch, UTC)
    Date(i64),
    /// DOUBLE
    Double(f64),
    /// FLOAT
    Float(f32),
    /// INTEGER
    Integer(i64),
    /// STRING
    String(String),
    /// Any of the *_ARRAY types
    Array(Vec<Value>),
}

/// A row - column name to value
pub type Row = HashMap<String, Value>;

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Date(ms) => Some(*ms),
            _ => None,
        }
    }

    /// Numeric view of INTEGER, DOUBLE and FLOAT values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            Value::Float(f) => Some(*f as f64),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// JSON form used in data files and API results (dates as epoch millis)
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Date(ms) => serde_json::Value::from(*ms),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Double(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Float(f) => serde_json::Number::from_f64(*f as f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }

    /// Variant rank, orders values of different types against each other
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Date(_) => 2,
            Value::Double(_) => 3,
            Value::Float(_) => 4,
            Value::Integer(_) => 5,
            Value::String(_) => 6,
            Value::Array(_) => 7,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Boolean(_), Value::Boolean(_)) => ColumnType::Boolean.compare(self, other),
            (Value::Date(_), Value::Date(_)) => ColumnType::Date.compare(self, other),
            (Value::Double(_), Value::Double(_)) => ColumnType::Double.compare(self, other),
            (Value::Float(_), Value::Float(_)) => ColumnType::Float.compare(self, other),
            (Value::Integer(_), Value::Integer(_)) => ColumnType::Integer.compare(self, other),
            (Value::String(_), Value::String(_)) => ColumnType::String.compare(self, other),
            (Value::Array(a), Value::Array(b)) => compare_arrays(a, b, |x, y| x.cmp(y)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Date(ms) => ms.hash(state),
            // total_cmp equality is bitwise equality
            Value::Double(d) => d.to_bits().hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Integer(i) => i.hash(state),
            Value::String(s) => s.hash(state),
            Value::Array(items) => {
                items.len().hash(state);
                for item in items {
                    item.hash(state);
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(ms) => match DateTime::from_timestamp_millis(*ms) {
                Some(date) => write!(f, "{}", date.to_rfc3339_opts(SecondsFormat::Millis, true)),
                None => write!(f, "{}", ms),
            },
            Value::Double(d) => write!(f, "{}", d),
            Value::Float(v) => write!(f, "{}", v),
            Value::Integer(i) => write!(f, "{}", i),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_null_sorts_first() {
        assert!(Value::Null < Value::Boolean(false));
        assert!(Value::Null < Value::Integer(i64::MIN));
        assert_eq!(Value::Null, Value::Null);
    }

    #[test]
    fn test_equal_values_hash_equal() {
        let mut set = HashSet::new();
        set.insert(Value::Double(1.5));
        set.insert(Value::Double(1.5));
        set.insert(Value::string("Mazda"));
        set.insert(Value::string("Mazda"));
        set.insert(Value::Array(vec![Value::Integer(1), Value::Integer(2)]));
        set.insert(Value::Array(vec![Value::Integer(1), Value::Integer(2)]));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_case_variants_are_distinct() {
        assert_ne!(Value::string("mazda"), Value::string("Mazda"));
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Value::Integer(7).to_json(), serde_json::json!(7));
        assert_eq!(Value::Boolean(true).to_json(), serde_json::json!(true));
        assert_eq!(
            Value::Array(vec![Value::string("a"), Value::Null]).to_json(),
            serde_json::json!(["a", null])
        );
    }

    #[test]
    fn test_display_date() {
        assert_eq!(Value::Date(0).to_string(), "1970-01-01T00:00:00.000Z");
    }
}
