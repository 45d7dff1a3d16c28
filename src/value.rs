/// Datadeck Cell Values
///
/// A CellValue is the dynamic scalar stored in one cell of a dataset row.
/// Every value arrives from JSON (numbers are doubles), so a single Number
/// variant carries all numerics.

use serde_json::Value as JsonValue;

/// Scalar cell value: number, text, boolean, or missing.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric coercion: numbers pass through, text is parsed, and only
    /// finite results count. Booleans are categorical, not numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) if v.is_finite() => Some(*v),
            CellValue::Text(s) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Some(v),
                _ => None,
            },
            _ => None,
        }
    }

    /// Canonical display form: `42` (no trailing `.0`), `42.5`, `true`,
    /// and the empty string for Null. Grouping keys and the search
    /// predicate both compare this form.
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Number(v) => v.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Null => String::new(),
        }
    }

    /// Convert a JSON value into a cell value. Arrays and objects are not
    /// cell scalars and collapse to Null.
    pub fn from_json(value: &JsonValue) -> CellValue {
        match value {
            JsonValue::Null => CellValue::Null,
            JsonValue::Bool(b) => CellValue::Bool(*b),
            JsonValue::Number(n) => match n.as_f64() {
                Some(f) => CellValue::Number(f),
                None => CellValue::Null,
            },
            JsonValue::String(s) => CellValue::Text(s.clone()),
            JsonValue::Array(_) | JsonValue::Object(_) => CellValue::Null,
        }
    }

    /// Convert a cell value to JSON. Non-finite numbers have no JSON
    /// representation and become null.
    pub fn to_json(&self) -> JsonValue {
        match self {
            CellValue::Number(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            CellValue::Text(s) => JsonValue::String(s.clone()),
            CellValue::Bool(b) => JsonValue::Bool(*b),
            CellValue::Null => JsonValue::Null,
        }
    }
}
