//! Dynamic cell values carried by component records and element tables.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single record: field name to value, in insertion order.
pub type Row = IndexMap<String, Value>;

/// A dynamically typed cell value.
///
/// Source collections mix scalars, per-period lists and nested parameter
/// dictionaries in the same column, so records are kept dynamic until they
/// are written. `Null` and `Float(NaN)` are both treated as missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent or missing value.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value; also used for references to sequence columns.
    Str(String),
    /// Ordered list, typically one entry per period.
    List(Vec<Value>),
    /// Nested parameter set.
    Map(IndexMap<String, Value>),
}

impl Value {
    /// True for `Null` and for `Float(NaN)`.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// True if the value is a list.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// True if the value is a nested map.
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Numeric view of `Int` and non-NaN `Float` values.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    /// Borrow the text of a `Str` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Borrow the entries of a `List` value.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Build a list of floats.
    #[must_use]
    pub fn floats(values: &[f64]) -> Self {
        Self::List(values.iter().copied().map(Self::Float).collect())
    }

    /// Text used when the value appears as a key part, e.g. in a component name.
    ///
    /// Missing values yield `None`.
    #[must_use]
    pub fn key_part(&self) -> Option<String> {
        if self.is_missing() {
            return None;
        }
        Some(match self {
            Self::Str(s) => s.clone(),
            other => other.to_cell(),
        })
    }

    /// Render the value as a single CSV cell.
    ///
    /// Lists and maps are written as JSON, missing values as the empty string
    /// and whole floats keep a trailing `.0` so the column stays numeric.
    #[must_use]
    pub fn to_cell(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format_float(*f),
            Self::Str(s) => s.clone(),
            Self::List(_) | Self::Map(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    /// Short type label used for schema inference.
    #[must_use]
    pub const fn type_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "number",
            Self::Str(_) => "string",
            Self::List(_) => "array",
            Self::Map(_) => "object",
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        return String::new();
    }
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cell())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Self::floats(&v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_counts_as_missing() {
        assert!(Value::Float(f64::NAN).is_missing());
        assert!(Value::Null.is_missing());
        assert!(!Value::Float(0.0).is_missing());
        assert_eq!(Value::Float(f64::NAN).as_f64(), None);
    }

    #[test]
    fn cells_keep_numeric_shape() {
        assert_eq!(Value::Float(100.0).to_cell(), "100.0");
        assert_eq!(Value::Float(0.25).to_cell(), "0.25");
        assert_eq!(Value::Int(3).to_cell(), "3");
        assert_eq!(Value::Null.to_cell(), "");
        assert_eq!(Value::floats(&[1.0, 0.5]).to_cell(), "[1.0,0.5]");
    }

    #[test]
    fn untagged_json_roundtrip() {
        let json = r#"{"a": 1, "b": 2.5, "c": "x", "d": [1.0, null], "e": {"max": 0.5}, "f": null}"#;
        let row: Row = serde_json::from_str(json).unwrap();
        assert_eq!(row["a"], Value::Int(1));
        assert_eq!(row["b"], Value::Float(2.5));
        assert_eq!(row["c"], Value::from("x"));
        assert_eq!(row["d"], Value::List(vec![Value::Float(1.0), Value::Null]));
        assert!(row["e"].is_map());
        assert!(row["f"].is_missing());
    }
}
