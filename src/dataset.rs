/// Datadeck Dataset Store
///
/// Owns the in-memory row/column table and the derived per-column
/// statistics. A dataset is replaced wholesale by `load` (never mutated
/// row-by-row); each load bumps a generation counter that downstream
/// consumers use to invalidate caches.

use crate::value::CellValue;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// One dataset row: column name to scalar value. Absent keys read as Null.
pub type Row = HashMap<String, CellValue>;

/// Inferred column kind. A column is numeric when more than half of its
/// non-missing values coerce to a finite number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Number,
    Text,
}

/// Derived statistics for one column, recomputed in full on every load.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStat {
    pub name: String,
    pub kind: ColumnKind,
    /// Count of null, empty, or absent values.
    pub missing: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// The in-memory dataset: ordered rows, ordered headers, and the derived
/// column statistics. Zero rows / zero headers is a valid empty state.
#[derive(Debug, Default)]
pub struct DatasetStore {
    rows: Vec<Row>,
    headers: Vec<String>,
    total_row_count: Option<u64>,
    stats: Vec<ColumnStat>,
    generation: u64,
}

impl DatasetStore {
    pub fn new() -> Self {
        DatasetStore::default()
    }

    /// Replace the entire dataset atomically and recompute all column
    /// statistics. `total_row_count` is the upstream source's row count,
    /// which may exceed the rows actually shipped.
    pub fn load(&mut self, rows: Vec<Row>, headers: Vec<String>, total_row_count: Option<u64>) {
        self.stats = compute_stats(&rows, &headers);
        self.rows = rows;
        self.headers = headers;
        self.total_row_count = total_row_count;
        self.generation += 1;
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn total_row_count(&self) -> Option<u64> {
        self.total_row_count
    }

    pub fn column_stats(&self) -> &[ColumnStat] {
        &self.stats
    }

    /// Look up the statistics for one column by name.
    pub fn stat(&self, column: &str) -> Option<&ColumnStat> {
        self.stats.iter().find(|s| s.name == column)
    }

    /// Generation counter, bumped on every load. Consumers cache derived
    /// results keyed on this value.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Export the dataset to CSV text in header order. Null values become
    /// empty fields; fields containing commas, quotes, or newlines are
    /// quoted with doubled inner quotes.
    ///
    /// # Example
    ///
    /// ```
    /// use datadeck::{CellValue, DatasetStore};
    /// use std::collections::HashMap;
    ///
    /// let mut row = HashMap::new();
    /// row.insert("city".to_string(), CellValue::Text("Spring, IL".to_string()));
    /// row.insert("pop".to_string(), CellValue::Number(9.0));
    ///
    /// let mut store = DatasetStore::new();
    /// store.load(vec![row], vec!["city".to_string(), "pop".to_string()], None);
    ///
    /// assert_eq!(store.to_csv(), "city,pop\n\"Spring, IL\",9\n");
    /// ```
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(
            &self
                .headers
                .iter()
                .map(|h| escape_csv_field(h))
                .collect::<Vec<_>>()
                .join(","),
        );
        out.push('\n');

        for row in &self.rows {
            let fields: Vec<String> = self
                .headers
                .iter()
                .map(|h| {
                    let text = row
                        .get(h)
                        .map(|v| v.to_display_string())
                        .unwrap_or_default();
                    escape_csv_field(&text)
                })
                .collect();
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }

    /// Snapshot one row as a JSON object in header order, for previews and
    /// the rendering layer.
    pub fn row_to_json(&self, index: usize) -> Option<JsonValue> {
        let row = self.rows.get(index)?;
        let obj: serde_json::Map<String, JsonValue> = self
            .headers
            .iter()
            .map(|h| {
                let value = row.get(h).map(|v| v.to_json()).unwrap_or(JsonValue::Null);
                (h.clone(), value)
            })
            .collect();
        Some(JsonValue::Object(obj))
    }
}

/// Convert an array of parsed JSON objects (the shape the upload glue
/// delivers) into dataset rows. Non-object elements produce empty rows.
pub fn rows_from_json(values: &[JsonValue]) -> Vec<Row> {
    values
        .iter()
        .map(|value| match value.as_object() {
            Some(obj) => obj
                .iter()
                .map(|(k, v)| (k.clone(), CellValue::from_json(v)))
                .collect(),
            None => Row::new(),
        })
        .collect()
}

/// A value is missing when it is absent, Null, or empty text.
fn is_missing(value: Option<&CellValue>) -> bool {
    match value {
        None => true,
        Some(CellValue::Null) => true,
        Some(CellValue::Text(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn compute_stats(rows: &[Row], headers: &[String]) -> Vec<ColumnStat> {
    headers
        .iter()
        .map(|header| {
            let mut missing = 0usize;
            let mut present = 0usize;
            let mut numeric: Vec<f64> = Vec::new();

            for row in rows {
                let value = row.get(header);
                if is_missing(value) {
                    missing += 1;
                    continue;
                }
                present += 1;
                if let Some(n) = value.and_then(|v| v.as_number()) {
                    numeric.push(n);
                }
            }

            let kind = if numeric.len() * 2 > present {
                ColumnKind::Number
            } else {
                ColumnKind::Text
            };

            let (mean, min, max) = if kind == ColumnKind::Number && !numeric.is_empty() {
                let sum: f64 = numeric.iter().sum();
                let min = numeric.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = numeric.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                (Some(sum / numeric.len() as f64), Some(min), Some(max))
            } else {
                (None, None, None)
            };

            ColumnStat {
                name: header.clone(),
                kind,
                missing,
                mean,
                min,
                max,
            }
        })
        .collect()
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, CellValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn sample_store() -> DatasetStore {
        let rows = vec![
            row(&[
                ("region", CellValue::Text("east".to_string())),
                ("sales", CellValue::Number(10.0)),
            ]),
            row(&[
                ("region", CellValue::Text("west".to_string())),
                ("sales", CellValue::Number(5.0)),
            ]),
            row(&[
                ("region", CellValue::Text("east".to_string())),
                ("sales", CellValue::Number(7.0)),
            ]),
        ];
        let mut store = DatasetStore::new();
        store.load(
            rows,
            vec!["region".to_string(), "sales".to_string()],
            Some(3),
        );
        store
    }

    #[test]
    fn test_empty_store_is_valid() {
        let store = DatasetStore::new();
        assert!(store.is_empty());
        assert!(store.headers().is_empty());
        assert!(store.column_stats().is_empty());
        assert_eq!(store.generation(), 0);
        assert_eq!(store.to_csv(), "\n");
    }

    #[test]
    fn test_load_replaces_and_bumps_generation() {
        let mut store = sample_store();
        assert_eq!(store.generation(), 1);
        assert_eq!(store.len(), 3);

        store.load(Vec::new(), Vec::new(), None);
        assert_eq!(store.generation(), 2);
        assert!(store.is_empty());
        assert!(store.column_stats().is_empty());
    }

    #[test]
    fn test_numeric_column_stats() {
        let store = sample_store();
        let stat = store.stat("sales").unwrap();
        assert_eq!(stat.kind, ColumnKind::Number);
        assert_eq!(stat.missing, 0);
        assert_eq!(stat.mean, Some(22.0 / 3.0));
        assert_eq!(stat.min, Some(5.0));
        assert_eq!(stat.max, Some(10.0));
    }

    #[test]
    fn test_text_column_has_no_numeric_stats() {
        let store = sample_store();
        let stat = store.stat("region").unwrap();
        assert_eq!(stat.kind, ColumnKind::Text);
        assert_eq!(stat.mean, None);
        assert_eq!(stat.min, None);
        assert_eq!(stat.max, None);
    }

    #[test]
    fn test_kind_inference_majority_rule() {
        // Two numeric-coercible values out of three non-missing: numeric.
        let rows = vec![
            row(&[("mixed", CellValue::Text("1".to_string()))]),
            row(&[("mixed", CellValue::Number(2.0))]),
            row(&[("mixed", CellValue::Text("n/a".to_string()))]),
        ];
        let mut store = DatasetStore::new();
        store.load(rows, vec!["mixed".to_string()], None);
        assert_eq!(store.stat("mixed").unwrap().kind, ColumnKind::Number);

        // Exactly half numeric: not a majority, stays text.
        let rows = vec![
            row(&[("mixed", CellValue::Number(1.0))]),
            row(&[("mixed", CellValue::Text("x".to_string()))]),
        ];
        let mut store = DatasetStore::new();
        store.load(rows, vec!["mixed".to_string()], None);
        assert_eq!(store.stat("mixed").unwrap().kind, ColumnKind::Text);
    }

    #[test]
    fn test_missing_counts_null_empty_and_absent() {
        let rows = vec![
            row(&[("a", CellValue::Null)]),
            row(&[("a", CellValue::Text("".to_string()))]),
            row(&[]),
            row(&[("a", CellValue::Number(4.0))]),
        ];
        let mut store = DatasetStore::new();
        store.load(rows, vec!["a".to_string()], None);
        let stat = store.stat("a").unwrap();
        assert_eq!(stat.missing, 3);
        assert_eq!(stat.kind, ColumnKind::Number);
        assert_eq!(stat.mean, Some(4.0));
    }

    #[test]
    fn test_csv_quotes_and_null_fields() {
        let rows = vec![
            row(&[
                ("name", CellValue::Text("says \"hi\"".to_string())),
                ("note", CellValue::Null),
            ]),
            row(&[("name", CellValue::Text("a,b".to_string()))]),
        ];
        let mut store = DatasetStore::new();
        store.load(rows, vec!["name".to_string(), "note".to_string()], None);
        assert_eq!(store.to_csv(), "name,note\n\"says \"\"hi\"\"\",\n\"a,b\",\n");
    }

    #[test]
    fn test_rows_from_json() {
        let values = vec![
            serde_json::json!({"id": 1, "name": "Alice", "active": true}),
            serde_json::json!(42),
        ];
        let rows = rows_from_json(&values);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id"), Some(&CellValue::Number(1.0)));
        assert_eq!(
            rows[0].get("name"),
            Some(&CellValue::Text("Alice".to_string()))
        );
        assert_eq!(rows[0].get("active"), Some(&CellValue::Bool(true)));
        assert!(rows[1].is_empty());
    }

    #[test]
    fn test_row_to_json_uses_header_order() {
        let store = sample_store();
        let json = store.row_to_json(0).unwrap();
        assert_eq!(json["region"], "east");
        assert_eq!(json["sales"], 10.0);
        assert!(store.row_to_json(99).is_none());
    }
}
