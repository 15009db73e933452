//! Composite row identifiers for the summary and award tables

use super::value::Value;

/// One normalized component of a composite key.
///
/// Whole numbers and numeric text compare as integers so that a student id
/// read back from the live document as `"1001"` matches the local `1001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPart {
    Int(i64),
    Text(String),
}

impl KeyPart {
    /// Normalize a cell into a key part. Blank cells have no key part.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Int(i) => Some(KeyPart::Int(*i)),
            Value::Float(f) => {
                if !f.is_finite() {
                    None
                } else if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    Some(KeyPart::Int(*f as i64))
                } else {
                    Some(KeyPart::Text(f.to_string()))
                }
            }
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else if let Ok(i) = trimmed.parse::<i64>() {
                    Some(KeyPart::Int(i))
                } else {
                    Some(KeyPart::Text(trimmed.to_string()))
                }
            }
        }
    }

    /// Cell representation used when sending a key back to the document
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            KeyPart::Int(i) => serde_json::Value::from(*i),
            KeyPart::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            KeyPart::Int(i) => Value::Int(*i),
            KeyPart::Text(s) => Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for KeyPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyPart::Int(i) => write!(f, "{}", i),
            KeyPart::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for KeyPart {
    fn from(i: i64) -> Self {
        KeyPart::Int(i)
    }
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::Text(s.to_string())
    }
}

/// Identity of an award row: (student, institution, home/away flag)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AwardKey {
    pub student: KeyPart,
    pub institution: KeyPart,
    pub location: KeyPart,
}

impl AwardKey {
    pub fn new(
        student: impl Into<KeyPart>,
        institution: impl Into<KeyPart>,
        location: impl Into<KeyPart>,
    ) -> Self {
        Self {
            student: student.into(),
            institution: institution.into(),
            location: location.into(),
        }
    }

    /// Build a key from three cells; `None` if any part is blank
    pub fn from_values(student: &Value, institution: &Value, location: &Value) -> Option<Self> {
        Some(Self {
            student: KeyPart::from_value(student)?,
            institution: KeyPart::from_value(institution)?,
            location: KeyPart::from_value(location)?,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(vec![
            self.student.to_json(),
            self.institution.to_json(),
            self.location.to_json(),
        ])
    }
}

impl std::fmt::Display for AwardKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.student, self.institution, self.location)
    }
}

/// An award row's identity plus its monitored status label.
///
/// Blank statuses compare equal to each other whether they arrived as null
/// or as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusRow {
    pub key: AwardKey,
    pub status: String,
}

impl StatusRow {
    pub fn new(key: AwardKey, status: &Value) -> Self {
        Self {
            key,
            status: status.to_string().trim().to_string(),
        }
    }

    /// `[student, institution, location, status]`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(vec![
            self.key.student.to_json(),
            self.key.institution.to_json(),
            self.key.location.to_json(),
            serde_json::Value::String(self.status.clone()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_text_matches_int() {
        assert_eq!(KeyPart::from_value(&Value::from("1001")), Some(KeyPart::Int(1001)));
        assert_eq!(KeyPart::from_value(&Value::Float(5001.0)), Some(KeyPart::Int(5001)));
        assert_eq!(KeyPart::from_value(&Value::Int(5001)), Some(KeyPart::Int(5001)));
    }

    #[test]
    fn test_blank_parts_are_missing() {
        assert_eq!(KeyPart::from_value(&Value::Null), None);
        assert_eq!(KeyPart::from_value(&Value::from("  ")), None);
        assert!(AwardKey::from_values(&Value::Int(1001), &Value::from(""), &Value::from("Home")).is_none());
    }

    #[test]
    fn test_award_key_json() {
        let key = AwardKey::new(1001, 5001, "Home");
        assert_eq!(key.to_json(), serde_json::json!([1001, 5001, "Home"]));
        assert_eq!(key.to_string(), "(1001, 5001, Home)");
    }
}
