//! Cell value representation shared by source, local and live tables

use std::cmp::Ordering;

/// A single cell in a table
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null/missing value
    #[default]
    Null,
    /// Text value (also used for numeric text that failed coercion)
    String(String),
    /// Whole number
    Int(i64),
    /// Floating point (rates, money)
    Float(f64),
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null or a string that is empty after trimming.
    ///
    /// Live tabs report untouched cells as empty strings while the on-disk
    /// backups read them back as nulls, so both count as missing.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Float(f) => f.is_nan(),
            Value::Int(_) => false,
        }
    }

    /// Try to get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value. Text never counts as a number here; the
    /// loader has already converted everything that parses.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if f.is_finite() => Some(*f),
            _ => None,
        }
    }

    /// True when the value equals the given text exactly
    pub fn is_text(&self, expected: &str) -> bool {
        self.as_str() == Some(expected)
    }

    /// Parse a raw cell string into a Value
    pub fn parse_cell(s: &str) -> Value {
        let s = s.trim();

        if s.is_empty() {
            return Value::Null;
        }

        if let Ok(i) = s.parse::<i64>() {
            return Value::Int(i);
        }

        if let Ok(f) = s.parse::<f64>() {
            if f.is_finite() {
                return Value::Float(f);
            }
        }

        Value::String(s.to_string())
    }

    /// Parse from a JSON value returned by the document service
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::String(b.to_string()),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Null
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                // Nested structures never appear in a tab
                Value::String(json.to_string())
            }
        }
    }

    /// JSON form sent to the document service. Non-finite floats become null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
        }
    }

    /// Ordering used for table sorts: numbers before text, numbers compared
    /// numerically. Nulls are placed by the caller.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::String(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
        }
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

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Option<f64>> for Value {
    fn from(f: Option<f64>) -> Self {
        f.map(Value::Float).unwrap_or(Value::Null)
    }
}
