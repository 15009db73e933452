//! Best-effort column coercions applied after reading a source file.
//!
//! A value that cannot be converted keeps its original form; downstream rules
//! treat anything non-numeric as missing.

use crate::table::{Table, Value};

/// Whole numbers stay whole, integral floats become integers
pub fn safe_int(value: Value) -> Value {
    match value {
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Value::Int(f as i64),
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(i) => Value::Int(i),
            Err(_) => Value::String(s),
        },
        other => other,
    }
}

pub fn safe_float(value: Value) -> Value {
    match value {
        Value::Int(i) => Value::Float(i as f64),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Value::Float(f),
            _ => Value::String(s),
        },
        other => other,
    }
}

/// Percentages arrive as `"45%"` or `45`; both become `0.45`. `N/A` is null.
pub fn percent(value: Value) -> Value {
    match value {
        Value::Int(i) => Value::Float(i as f64 / 100.0),
        Value::Float(f) => Value::Float(f / 100.0),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed == "N/A" {
                return Value::Null;
            }
            match trimmed.trim_end_matches('%').trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Value::Float(f / 100.0),
                _ => Value::String(s),
            }
        }
        Value::Null => Value::Null,
    }
}

/// Apply a coercion to one column in place; absent columns are ignored
pub fn coerce_column(table: &mut Table, column: &str, coerce: fn(Value) -> Value) {
    if !table.has_column(column) {
        return;
    }
    let values = table.column(column).into_iter().map(coerce).collect();
    table.set_column(column, values);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_int_keeps_unparseable_text() {
        assert_eq!(safe_int(Value::from("1001")), Value::Int(1001));
        assert_eq!(safe_int(Value::Float(5001.0)), Value::Int(5001));
        assert_eq!(safe_int(Value::from("pending")), Value::from("pending"));
        assert_eq!(safe_int(Value::Float(2.5)), Value::Float(2.5));
    }

    #[test]
    fn test_safe_float() {
        assert_eq!(safe_float(Value::Int(3)), Value::Float(3.0));
        assert_eq!(safe_float(Value::from("3.2")), Value::Float(3.2));
        assert_eq!(safe_float(Value::from("n/a")), Value::from("n/a"));
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(Value::from("45%")), Value::Float(0.45));
        assert_eq!(percent(Value::Int(80)), Value::Float(0.8));
        assert_eq!(percent(Value::from("N/A")), Value::Null);
        assert_eq!(percent(Value::Null), Value::Null);
        assert_eq!(percent(Value::from("unknown")), Value::from("unknown"));
    }

    #[test]
    fn test_coerce_column() {
        let mut table = Table::from_rows(["SID"], vec![vec![Value::Float(1001.0)]]);
        coerce_column(&mut table, "SID", safe_int);
        coerce_column(&mut table, "Missing", safe_int);
        assert_eq!(table.rows()[0], vec![Value::Int(1001)]);
    }
}
