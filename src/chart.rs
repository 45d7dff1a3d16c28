/// Datadeck Chart Configuration
///
/// A ChartConfig is the value object edited in the visualization view and
/// copied into a dashboard widget when committed. Its `series` method is
/// the one entry point from configuration to chart-ready data: it applies
/// the widget-scoped column filters and then the canonical aggregation
/// routine.

use crate::aggregate::{aggregate, AggFn, AggregatedSeries, SortMode};
use crate::dataset::Row;
use crate::filter::{row_passes_column_filters, toggle_filter_value, ColumnFilters};
use serde::{Deserialize, Serialize};

pub const DEFAULT_THEME: &str = "default";

/// Chart rendering kind. Drawing is the rendering layer's concern; the core
/// only carries the choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Area,
    Pie,
    Doughnut,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Area => "area",
            ChartKind::Pie => "pie",
            ChartKind::Doughnut => "doughnut",
        }
    }

    pub fn parse(s: &str) -> Option<ChartKind> {
        match s {
            "bar" => Some(ChartKind::Bar),
            "line" => Some(ChartKind::Line),
            "area" => Some(ChartKind::Area),
            "pie" => Some(ChartKind::Pie),
            "doughnut" => Some(ChartKind::Doughnut),
            _ => None,
        }
    }
}

/// Full configuration of one chart: kind, dimension (x axis), measures
/// (y axes), aggregation, sort, theme, display flags, and the
/// widget-scoped column filters.
///
/// The column filters pre-filter this chart's input only. They are applied
/// independently of the table view's global FilterSet, never intersected
/// with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub kind: ChartKind,
    /// Grouping column; empty until the user picks one.
    pub dimension: String,
    /// Y-axis columns, ordered, no duplicates.
    pub measures: Vec<String>,
    pub agg: AggFn,
    pub sort: SortMode,
    pub theme: String,
    pub stacked: bool,
    pub smoothed: bool,
    pub legend: bool,
    pub grid: bool,
    #[serde(default)]
    pub column_filters: ColumnFilters,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig::new()
    }
}

impl ChartConfig {
    /// An unconfigured chart: bar kind, no dimension, no measures, sum,
    /// unsorted, default theme, legend and grid on.
    pub fn new() -> Self {
        ChartConfig {
            kind: ChartKind::Bar,
            dimension: String::new(),
            measures: Vec::new(),
            agg: AggFn::Sum,
            sort: SortMode::None,
            theme: DEFAULT_THEME.to_string(),
            stacked: false,
            smoothed: false,
            legend: true,
            grid: true,
            column_filters: ColumnFilters::new(),
        }
    }

    /// Append a measure key. Duplicates are rejected; returns whether the
    /// measure was added.
    pub fn add_measure(&mut self, measure: &str) -> bool {
        if self.measures.iter().any(|m| m == measure) {
            return false;
        }
        self.measures.push(measure.to_string());
        true
    }

    pub fn remove_measure(&mut self, measure: &str) -> bool {
        let before = self.measures.len();
        self.measures.retain(|m| m != measure);
        self.measures.len() != before
    }

    /// Toggle a value in this chart's own column filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &str) {
        toggle_filter_value(&mut self.column_filters, column, value);
    }

    pub fn clear_filters(&mut self) {
        self.column_filters.clear();
    }

    /// A chart renders once it has a dimension and at least one measure.
    pub fn is_configured(&self) -> bool {
        !self.dimension.is_empty() && !self.measures.is_empty()
    }

    /// Produce this chart's series from the raw dataset rows: apply the
    /// widget-scoped column filters, then the canonical aggregation.
    pub fn series(&self, rows: &[Row]) -> AggregatedSeries {
        aggregate(
            rows.iter()
                .filter(|row| row_passes_column_filters(row, &self.column_filters)),
            &self.dimension,
            &self.measures,
            self.agg,
            self.sort,
        )
    }
}
