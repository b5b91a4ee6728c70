//! Column keys, cell contents, and raw filter values

use std::collections::HashMap;
use std::hash::BuildHasher;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a grid column.
///
/// Two keys are equal only if they were minted for the same column; the key
/// carries no name or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnKey(Uuid);

impl ColumnKey {
    /// Mint a key for a newly created column
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ColumnKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content of a single grid cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// NULL value
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Decimal/Numeric (stored as string for precision)
    Decimal(String),
    Text(String),
    /// Binary data
    Bytes(Vec<u8>),
}

impl CellValue {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Try to get as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean view of the cell, as a checkbox column would display it
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(v) => Some(*v),
            CellValue::Int(0) => Some(false),
            CellValue::Int(1) => Some(true),
            CellValue::Text(s) => parse_bool(s),
            _ => None,
        }
    }

    /// Try to get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Float(v) => Some(*v),
            CellValue::Decimal(s) | CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Bool(v) => write!(f, "{}", v),
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Decimal(v) => write!(f, "{}", v),
            CellValue::Text(v) => write!(f, "{}", v),
            CellValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// Raw input typed into a column's filter control.
///
/// Only content filter factories interpret it; the coordinator just stores it
/// and compares it for changes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    /// No filtering on this column
    #[default]
    Empty,
    Text(String),
    /// Checkbox state
    Bool(bool),
    /// Inclusive bounds, for BETWEEN-style filters
    Range { from: String, to: String },
}

impl FilterValue {
    /// True for `Empty` and whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            FilterValue::Empty => true,
            FilterValue::Text(text) => text.trim().is_empty(),
            FilterValue::Bool(_) | FilterValue::Range { .. } => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

/// A row the filters can look into, one cell per column
pub trait FilterRow {
    /// Cell content for `column`, or `None` when the row has no such cell
    fn cell(&self, column: &ColumnKey) -> Option<&CellValue>;
}

impl<S: BuildHasher> FilterRow for HashMap<ColumnKey, CellValue, S> {
    fn cell(&self, column: &ColumnKey) -> Option<&CellValue> {
        self.get(column)
    }
}

impl<S: BuildHasher> FilterRow for IndexMap<ColumnKey, CellValue, S> {
    fn cell(&self, column: &ColumnKey) -> Option<&CellValue> {
        self.get(column)
    }
}

impl<R: FilterRow + ?Sized> FilterRow for &R {
    fn cell(&self, column: &ColumnKey) -> Option<&CellValue> {
        (**self).cell(column)
    }
}

/// Parse the spellings a checkbox filter accepts
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if ["true", "yes", "1"].iter().any(|s| text.eq_ignore_ascii_case(s)) {
        Some(true)
    } else if ["false", "no", "0"].iter().any(|s| text.eq_ignore_ascii_case(s)) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_keys_compare_by_identity() {
        let a = ColumnKey::new();
        let b = ColumnKey::new();
        assert_ne!(a, b);
        assert_eq!(a, ColumnKey::from_uuid(*a.as_uuid()));
    }

    #[test]
    fn blank_filter_values() {
        assert!(FilterValue::Empty.is_blank());
        assert!(FilterValue::from("   ").is_blank());
        assert!(!FilterValue::from(" a ").is_blank());
        assert!(!FilterValue::Bool(false).is_blank());
    }

    #[test]
    fn cell_boolean_view() {
        assert_eq!(CellValue::from("Yes").as_bool(), Some(true));
        assert_eq!(CellValue::Int(0).as_bool(), Some(false));
        assert_eq!(CellValue::Int(7).as_bool(), None);
        assert_eq!(CellValue::Null.as_bool(), None);
    }

    #[test]
    fn cell_display_matches_grid_text() {
        assert_eq!(CellValue::Null.to_string(), "NULL");
        assert_eq!(CellValue::Bytes(vec![1, 2, 3]).to_string(), "<3 bytes>");
        assert_eq!(CellValue::from(Some(12_i64)).to_string(), "12");
        assert_eq!(CellValue::from(None::<String>), CellValue::Null);
    }

    #[test]
    fn filter_value_serializes_with_kind_tag() {
        let value = FilterValue::Range {
            from: "1".into(),
            to: "5".into(),
        };
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"kind":"range","value":{"from":"1","to":"5"}}"#);
        let back: FilterValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
