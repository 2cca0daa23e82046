//! FILENAME: core/fact-model/src/value.rs
//! PURPOSE: The scalar value stored in every fact cell.
//! CONTEXT: Values are used as grouping keys (Hash/Eq) and as sorted filter
//! domains (Ord), so floats get the same treatment the pivot cache gives
//! them: NaN equals NaN and -0.0 equals 0.0.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single scalar from a fact row.
///
/// Serialized untagged: `null`, a JSON number or a JSON string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl FactValue {
    pub fn text(s: impl Into<String>) -> Self {
        FactValue::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FactValue::Empty)
    }

    /// Numeric view of the value. Text is not parsed here; coercion of
    /// measure columns happens once, during schema normalisation.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FactValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Display label used for headers and filter dropdowns.
    pub fn label(&self) -> String {
        match self {
            FactValue::Number(n) => format_number(*n),
            FactValue::Text(s) => s.clone(),
            FactValue::Empty => "(blank)".to_string(),
        }
    }

    /// Converts a raw JSON scalar. Nested arrays/objects are not facts.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FactValue::Empty,
            serde_json::Value::Bool(b) => FactValue::Text(b.to_string()),
            serde_json::Value::Number(n) => n.as_f64().map_or(FactValue::Empty, FactValue::Number),
            serde_json::Value::String(s) => FactValue::Text(s.clone()),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => FactValue::Empty,
        }
    }

    /// Converts a raw JSON scalar, parsing numeric strings. Used for
    /// measure fields, which some endpoints send as strings.
    pub fn number_from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map_or(FactValue::Empty, FactValue::Number),
            serde_json::Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_or(FactValue::Empty, FactValue::Number),
            _ => FactValue::Empty,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FactValue::Number(_) => 0,
            FactValue::Text(_) => 1,
            FactValue::Empty => 2,
        }
    }
}

/// Formats a number without a trailing ".0" for integral values.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl PartialEq for FactValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FactValue::Number(a), FactValue::Number(b)) => {
                (a.is_nan() && b.is_nan()) || a == b
            }
            (FactValue::Text(a), FactValue::Text(b)) => a == b,
            (FactValue::Empty, FactValue::Empty) => true,
            _ => false,
        }
    }
}

impl Eq for FactValue {}

impl Hash for FactValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            FactValue::Number(n) => {
                if n.is_nan() {
                    u64::MAX.hash(state);
                } else if *n == 0.0 {
                    // -0.0 and 0.0 compare equal
                    0u64.hash(state);
                } else {
                    n.to_bits().hash(state);
                }
            }
            FactValue::Text(s) => s.hash(state),
            FactValue::Empty => {}
        }
    }
}

impl Ord for FactValue {
    /// Numbers first (ascending), then text, then blanks last.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FactValue::Number(a), FactValue::Number(b)) => match (a.is_nan(), b.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            },
            (FactValue::Text(a), FactValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for FactValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<f64> for FactValue {
    fn from(value: f64) -> Self {
        FactValue::Number(value)
    }
}

impl From<i64> for FactValue {
    fn from(value: i64) -> Self {
        FactValue::Number(value as f64)
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::Text(value.to_string())
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        FactValue::Text(value)
    }
}

impl<T: Into<FactValue>> From<Option<T>> for FactValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FactValue::Empty, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ordering_puts_blanks_last() {
        let mut values = vec![
            FactValue::Empty,
            FactValue::text("beta"),
            FactValue::Number(3.0),
            FactValue::text("alpha"),
            FactValue::Number(-1.0),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                FactValue::Number(-1.0),
                FactValue::Number(3.0),
                FactValue::text("alpha"),
                FactValue::text("beta"),
                FactValue::Empty,
            ]
        );
    }

    #[test]
    fn test_nan_and_signed_zero_hash_consistently() {
        let mut set = HashSet::new();
        set.insert(FactValue::Number(f64::NAN));
        set.insert(FactValue::Number(f64::NAN));
        set.insert(FactValue::Number(0.0));
        set.insert(FactValue::Number(-0.0));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_labels() {
        assert_eq!(FactValue::Number(42.0).label(), "42");
        assert_eq!(FactValue::Number(1.5).label(), "1.5");
        assert_eq!(FactValue::text("Ana").label(), "Ana");
        assert_eq!(FactValue::Empty.label(), "(blank)");
    }

    #[test]
    fn test_json_conversion() {
        assert_eq!(FactValue::from_json(&serde_json::json!(null)), FactValue::Empty);
        assert_eq!(FactValue::from_json(&serde_json::json!(7)), FactValue::Number(7.0));
        assert_eq!(FactValue::from_json(&serde_json::json!("x")), FactValue::text("x"));
        assert_eq!(FactValue::from_json(&serde_json::json!(true)), FactValue::text("true"));
        assert_eq!(
            FactValue::number_from_json(&serde_json::json!(" 12.5 ")),
            FactValue::Number(12.5)
        );
        assert_eq!(
            FactValue::number_from_json(&serde_json::json!("n/a")),
            FactValue::Empty
        );
    }

    #[test]
    fn test_untagged_serde() {
        let values: Vec<FactValue> = serde_json::from_str(r#"[1.5, "a", null]"#).unwrap();
        assert_eq!(
            values,
            vec![FactValue::Number(1.5), FactValue::text("a"), FactValue::Empty]
        );
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"[1.5,"a",null]"#);
    }
}
