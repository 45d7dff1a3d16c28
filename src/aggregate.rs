/// Datadeck Aggregation Engine
///
/// The single canonical group/reduce/sort routine that turns raw rows into
/// chart-ready series. Both the ad-hoc chart view and every dashboard
/// widget call `aggregate`; there is no second copy of this logic.
///
/// The engine never fails on dirty data: values that do not coerce to a
/// finite number are dropped from the reduction, and empty reductions
/// yield zero rather than NaN or an error.

use crate::dataset::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Reduction applied to each group's measure values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFn {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl AggFn {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggFn::Sum => "sum",
            AggFn::Avg => "avg",
            AggFn::Count => "count",
            AggFn::Min => "min",
            AggFn::Max => "max",
        }
    }

    pub fn parse(s: &str) -> Option<AggFn> {
        match s {
            "sum" => Some(AggFn::Sum),
            "avg" => Some(AggFn::Avg),
            "count" => Some(AggFn::Count),
            "min" => Some(AggFn::Min),
            "max" => Some(AggFn::Max),
            _ => None,
        }
    }
}

/// Output ordering, applied on the first measure's aggregated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// First-seen group order.
    None,
    Asc,
    Desc,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::None => "none",
            SortMode::Asc => "asc",
            SortMode::Desc => "desc",
        }
    }

    pub fn parse(s: &str) -> Option<SortMode> {
        match s {
            "none" => Some(SortMode::None),
            "asc" => Some(SortMode::Asc),
            "desc" => Some(SortMode::Desc),
            _ => None,
        }
    }
}

/// One output row: the group's dimension label and one aggregated value per
/// measure key, in measure order.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub label: String,
    pub values: Vec<f64>,
}

/// The aggregation result: measure keys plus one row per distinct dimension
/// value, each row carrying one value per measure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregatedSeries {
    pub measures: Vec<String>,
    pub rows: Vec<SeriesRow>,
}

impl AggregatedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    /// The aggregated value for (group label, measure key), if both exist.
    pub fn value(&self, label: &str, measure: &str) -> Option<f64> {
        let measure_idx = self.measures.iter().position(|m| m == measure)?;
        let row = self.rows.iter().find(|r| r.label == label)?;
        row.values.get(measure_idx).copied()
    }

    /// Chart-ready JSON rows shaped `{ "name": label, "<measure>": value }`.
    pub fn to_json_rows(&self) -> Vec<JsonValue> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                obj.insert("name".to_string(), JsonValue::String(row.label.clone()));
                for (measure, value) in self.measures.iter().zip(&row.values) {
                    let json = serde_json::Number::from_f64(*value)
                        .map(JsonValue::Number)
                        .unwrap_or(JsonValue::Null);
                    obj.insert(measure.clone(), json);
                }
                JsonValue::Object(obj)
            })
            .collect()
    }
}

/// Group `rows` by the canonical display form of `dimension`, reduce each
/// measure per group with `agg`, and order the output.
///
/// - An empty `dimension` yields an empty series (the chart renders an
///   empty-state placeholder, not an error).
/// - Groups appear in first-seen order unless `sort` says otherwise; the
///   sort is stable and keyed on the first measure only.
/// - For a fixed input the output is byte-identical, regardless of how
///   duplicate dimension values are scattered through the input.
///
/// # Example
///
/// ```
/// use datadeck::{aggregate, AggFn, CellValue, Row, SortMode};
///
/// let rows: Vec<Row> = vec![
///     [("region".to_string(), CellValue::Text("east".to_string())),
///      ("sales".to_string(), CellValue::Number(10.0))].into_iter().collect(),
///     [("region".to_string(), CellValue::Text("west".to_string())),
///      ("sales".to_string(), CellValue::Number(5.0))].into_iter().collect(),
///     [("region".to_string(), CellValue::Text("east".to_string())),
///      ("sales".to_string(), CellValue::Number(7.0))].into_iter().collect(),
/// ];
///
/// let series = aggregate(&rows, "region", &["sales".to_string()], AggFn::Sum, SortMode::None);
/// assert_eq!(series.labels(), vec!["east", "west"]);
/// assert_eq!(series.value("east", "sales"), Some(17.0));
/// ```
pub fn aggregate<'a, I>(
    rows: I,
    dimension: &str,
    measures: &[String],
    agg: AggFn,
    sort: SortMode,
) -> AggregatedSeries
where
    I: IntoIterator<Item = &'a Row>,
{
    if dimension.is_empty() {
        return AggregatedSeries {
            measures: measures.to_vec(),
            rows: Vec::new(),
        };
    }

    // Groups in first-seen order; each group collects the coercible values
    // per measure.
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Vec<f64>>)> = Vec::new();

    for row in rows {
        let label = row
            .get(dimension)
            .map(|v| v.to_display_string())
            .unwrap_or_default();

        let idx = match group_index.get(&label) {
            Some(&idx) => idx,
            None => {
                group_index.insert(label.clone(), groups.len());
                groups.push((label, vec![Vec::new(); measures.len()]));
                groups.len() - 1
            }
        };

        for (mi, measure) in measures.iter().enumerate() {
            if let Some(n) = row.get(measure).and_then(|v| v.as_number()) {
                groups[idx].1[mi].push(n);
            }
        }
    }

    let mut out_rows: Vec<SeriesRow> = groups
        .into_iter()
        .map(|(label, collected)| SeriesRow {
            label,
            values: collected.iter().map(|vs| reduce(agg, vs)).collect(),
        })
        .collect();

    if sort != SortMode::None && !measures.is_empty() {
        // Vec::sort_by is stable: ties keep their first-seen order.
        out_rows.sort_by(|a, b| {
            let cmp = a.values[0].total_cmp(&b.values[0]);
            match sort {
                SortMode::Desc => cmp.reverse(),
                _ => cmp,
            }
        });
    }

    AggregatedSeries {
        measures: measures.to_vec(),
        rows: out_rows,
    }
}

fn reduce(agg: AggFn, values: &[f64]) -> f64 {
    match agg {
        AggFn::Sum => values.iter().sum(),
        AggFn::Avg => {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        }
        AggFn::Count => values.len() as f64,
        AggFn::Min => {
            if values.is_empty() {
                0.0
            } else {
                values.iter().cloned().fold(f64::INFINITY, f64::min)
            }
        }
        AggFn::Max => {
            if values.is_empty() {
                0.0
            } else {
                values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CellValue;

    fn row(pairs: &[(&str, CellValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn sales_rows() -> Vec<Row> {
        vec![
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
        ]
    }

    fn measures(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sum_first_seen_order() {
        let series = aggregate(
            &sales_rows(),
            "region",
            &measures(&["sales"]),
            AggFn::Sum,
            SortMode::None,
        );
        assert_eq!(series.labels(), vec!["east", "west"]);
        assert_eq!(series.value("east", "sales"), Some(17.0));
        assert_eq!(series.value("west", "sales"), Some(5.0));
    }

    #[test]
    fn test_count_counts_parsed_values_only() {
        let series = aggregate(
            &sales_rows(),
            "region",
            &measures(&["sales"]),
            AggFn::Count,
            SortMode::None,
        );
        assert_eq!(series.value("east", "sales"), Some(2.0));
        assert_eq!(series.value("west", "sales"), Some(1.0));
    }

    #[test]
    fn test_asc_sort_on_first_measure() {
        let series = aggregate(
            &sales_rows(),
            "region",
            &measures(&["sales"]),
            AggFn::Sum,
            SortMode::Asc,
        );
        assert_eq!(series.labels(), vec!["west", "east"]);
    }

    #[test]
    fn test_empty_dimension_is_empty_series() {
        let series = aggregate(
            &sales_rows(),
            "",
            &measures(&["sales"]),
            AggFn::Sum,
            SortMode::None,
        );
        assert!(series.is_empty());
        assert_eq!(series.measures, measures(&["sales"]));
    }

    #[test]
    fn test_group_count_equals_distinct_dimension_values() {
        let rows = vec![
            row(&[("k", CellValue::Number(1.0))]),
            row(&[("k", CellValue::Text("1".to_string()))]),
            row(&[("k", CellValue::Bool(true))]),
            row(&[("k", CellValue::Null)]),
            row(&[]),
            row(&[("k", CellValue::Number(2.0))]),
        ];
        let series = aggregate(&rows, "k", &measures(&[]), AggFn::Sum, SortMode::None);
        // "1" (number and text share a stringified key), "true", "" (null
        // and absent share the empty label), "2".
        assert_eq!(series.labels(), vec!["1", "true", "", "2"]);
    }

    #[test]
    fn test_nonnumeric_measures_drop_silently() {
        let rows = vec![
            row(&[
                ("k", CellValue::Text("a".to_string())),
                ("m", CellValue::Text("12".to_string())),
            ]),
            row(&[
                ("k", CellValue::Text("a".to_string())),
                ("m", CellValue::Text("oops".to_string())),
            ]),
            row(&[("k", CellValue::Text("a".to_string())), ("m", CellValue::Null)]),
        ];
        let series = aggregate(&rows, "k", &measures(&["m"]), AggFn::Sum, SortMode::None);
        assert_eq!(series.value("a", "m"), Some(12.0));

        let series = aggregate(&rows, "k", &measures(&["m"]), AggFn::Count, SortMode::None);
        assert_eq!(series.value("a", "m"), Some(1.0));
    }

    #[test]
    fn test_avg_of_all_missing_is_zero_not_nan() {
        let rows = vec![
            row(&[("k", CellValue::Text("a".to_string())), ("m", CellValue::Null)]),
            row(&[
                ("k", CellValue::Text("a".to_string())),
                ("m", CellValue::Text("n/a".to_string())),
            ]),
        ];
        for agg in [AggFn::Avg, AggFn::Sum, AggFn::Min, AggFn::Max] {
            let series = aggregate(&rows, "k", &measures(&["m"]), agg, SortMode::None);
            assert_eq!(series.value("a", "m"), Some(0.0), "{:?}", agg);
        }
    }

    #[test]
    fn test_min_max_extrema() {
        let series = aggregate(
            &sales_rows(),
            "region",
            &measures(&["sales"]),
            AggFn::Min,
            SortMode::None,
        );
        assert_eq!(series.value("east", "sales"), Some(7.0));

        let series = aggregate(
            &sales_rows(),
            "region",
            &measures(&["sales"]),
            AggFn::Max,
            SortMode::None,
        );
        assert_eq!(series.value("east", "sales"), Some(10.0));
    }

    #[test]
    fn test_desc_sort_is_non_increasing_and_stable() {
        let rows = vec![
            row(&[("k", CellValue::Text("b".to_string())), ("m", CellValue::Number(3.0))]),
            row(&[("k", CellValue::Text("a".to_string())), ("m", CellValue::Number(5.0))]),
            row(&[("k", CellValue::Text("c".to_string())), ("m", CellValue::Number(3.0))]),
            row(&[("k", CellValue::Text("d".to_string())), ("m", CellValue::Number(9.0))]),
        ];
        let series = aggregate(&rows, "k", &measures(&["m"]), AggFn::Sum, SortMode::Desc);
        let values: Vec<f64> = series.rows.iter().map(|r| r.values[0]).collect();
        for pair in values.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        // "b" and "c" tie at 3; "b" was seen first and must stay first.
        assert_eq!(series.labels(), vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn test_output_insensitive_to_row_order_when_sorted() {
        let mut rows = sales_rows();
        let sorted_a = aggregate(
            &rows,
            "region",
            &measures(&["sales"]),
            AggFn::Sum,
            SortMode::Asc,
        );
        rows.reverse();
        let sorted_b = aggregate(
            &rows,
            "region",
            &measures(&["sales"]),
            AggFn::Sum,
            SortMode::Asc,
        );
        assert_eq!(sorted_a, sorted_b);
    }

    #[test]
    fn test_multiple_measures_are_independent() {
        let rows = vec![
            row(&[
                ("k", CellValue::Text("a".to_string())),
                ("m1", CellValue::Number(1.0)),
                ("m2", CellValue::Number(10.0)),
            ]),
            row(&[
                ("k", CellValue::Text("a".to_string())),
                ("m1", CellValue::Number(2.0)),
                ("m2", CellValue::Text("bad".to_string())),
            ]),
        ];
        let series = aggregate(
            &rows,
            "k",
            &measures(&["m1", "m2"]),
            AggFn::Sum,
            SortMode::None,
        );
        assert_eq!(series.value("a", "m1"), Some(3.0));
        assert_eq!(series.value("a", "m2"), Some(10.0));
    }

    #[test]
    fn test_json_rows_shape() {
        let series = aggregate(
            &sales_rows(),
            "region",
            &measures(&["sales"]),
            AggFn::Sum,
            SortMode::None,
        );
        let json = series.to_json_rows();
        assert_eq!(json[0]["name"], "east");
        assert_eq!(json[0]["sales"], 17.0);
        assert_eq!(json[1]["name"], "west");
        assert_eq!(json[1]["sales"], 5.0);
    }

    #[test]
    fn test_wire_spellings() {
        assert_eq!(AggFn::parse("avg"), Some(AggFn::Avg));
        assert_eq!(AggFn::Avg.as_str(), "avg");
        assert_eq!(AggFn::parse("median"), None);
        assert_eq!(SortMode::parse("desc"), Some(SortMode::Desc));
        assert_eq!(SortMode::None.as_str(), "none");
    }
}
