//! Dynamic field values used for identifiers, bindings and records.
//!
//! # Responsibility
//! - Carry typed column values between repositories, plans and sessions.
//! - Define the comparison rules shared by every session implementation.
//!
//! # Invariants
//! - Ordering follows SQLite storage-class order: NULL < numeric < TEXT.
//! - Integer and real values compare numerically with each other.

use rusqlite::types::Value;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// One column value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Text form used when a pattern is matched against a non-text value.
    ///
    /// Reals keep a fractional part (`4500.0`), the way SQLite renders them.
    pub fn to_match_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Integer(value) => Some(value.to_string()),
            Self::Real(value) => Some(format!("{value:?}")),
            Self::Text(value) => Some(value.clone()),
        }
    }

    /// Equality with SQL `=` semantics for non-null operands.
    ///
    /// Null only matches null, which mirrors the `IS NULL` rendering used by
    /// the SQLite session for null equality conditions.
    pub fn matches(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Null, _) | (_, Self::Null) => false,
            _ => self.compare(other) == Ordering::Equal,
        }
    }

    /// Total order across storage classes.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Null, _) => Ordering::Less,
            (_, Self::Null) => Ordering::Greater,
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (Self::Text(_), _) => Ordering::Greater,
            (_, Self::Text(_)) => Ordering::Less,
            (Self::Integer(left), Self::Integer(right)) => left.cmp(right),
            (left, right) => {
                let left = left.as_real().unwrap_or_default();
                let right = right.as_real().unwrap_or_default();
                left.total_cmp(&right)
            }
        }
    }

    fn as_real(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Real(value) => Some(*value),
            _ => None,
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value:?}"),
            Self::Text(value) => write!(f, "'{value}'"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<&FieldValue> for Value {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::Integer(value) => Value::Integer(*value),
            FieldValue::Real(value) => Value::Real(*value),
            FieldValue::Text(value) => Value::Text(value.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FieldValue;
    use std::cmp::Ordering;

    #[test]
    fn integer_and_real_compare_numerically() {
        assert!(FieldValue::Integer(4500).matches(&FieldValue::Real(4500.0)));
        assert_eq!(
            FieldValue::Integer(4000).compare(&FieldValue::Real(4500.5)),
            Ordering::Less
        );
    }

    #[test]
    fn null_sorts_first_and_only_matches_null() {
        assert_eq!(
            FieldValue::Null.compare(&FieldValue::Integer(-10)),
            Ordering::Less
        );
        assert!(FieldValue::Null.matches(&FieldValue::Null));
        assert!(!FieldValue::Null.matches(&FieldValue::from("")));
    }

    #[test]
    fn text_sorts_after_numbers() {
        assert_eq!(
            FieldValue::from("1").compare(&FieldValue::Integer(2)),
            Ordering::Greater
        );
    }

    #[test]
    fn option_conversion_maps_none_to_null() {
        assert_eq!(FieldValue::from(None::<i64>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some("Kara")), FieldValue::from("Kara"));
    }

    #[test]
    fn reals_render_with_fraction_for_pattern_matching() {
        assert_eq!(
            FieldValue::Real(4500.0).to_match_text().as_deref(),
            Some("4500.0")
        );
        assert_eq!(FieldValue::Null.to_match_text(), None);
    }
}
