/// Datadeck - Interactive Tabular Data Explorer
///
/// An in-memory tabular data explorer: a dataset store with derived column
/// statistics, a filter engine feeding a paginated table, a pure
/// aggregation engine that turns rows into chart-ready series, and a
/// dashboard layout engine for draggable, resizable, z-ordered chart
/// widgets. Network glue for dataset streaming and assistant chat is
/// feature-gated behind `server`.

pub mod value;
pub mod dataset;
pub mod filter;
pub mod aggregate;
pub mod chart;
pub mod dashboard;
pub mod session;

pub use value::CellValue;
pub use dataset::{rows_from_json, ColumnKind, ColumnStat, DatasetStore, Row};
pub use filter::{
    distinct_values, row_passes_column_filters, toggle_filter_value, ColumnFilters, FilterSet,
    DEFAULT_PAGE_SIZE,
};
pub use aggregate::{aggregate, AggFn, AggregatedSeries, SeriesRow, SortMode};
pub use chart::{ChartConfig, ChartKind, DEFAULT_THEME};
pub use dashboard::{
    CanvasFrame, Dashboard, DashboardItem, Interaction, AUTO_LAYOUT_COLUMNS, AUTO_LAYOUT_MARGIN,
    DEFAULT_WIDGET_HEIGHT, DEFAULT_WIDGET_WIDTH, GRID_SIZE, MIN_WIDGET_EDGE, NUDGE_OFFSET,
};
pub use session::{ChatMessage, ChatRole, ExplorerSession, Notice};

// WebSocket server modules - only when server feature is enabled
#[cfg(feature = "server")]
pub mod messages;
#[cfg(feature = "server")]
pub mod websocket;
#[cfg(feature = "server")]
pub mod server;
