/// Datadeck Filter Engine
///
/// Free-text search plus per-column accepted-value sets, composed with
/// logical AND, feeding both the paginated table view and (via the
/// widget-scoped variant) the aggregation engine. Filters are session
/// state: they never persist across dataset loads.

use crate::dataset::Row;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Column filter map: column name to the set of accepted display values.
/// An empty or absent set means "no restriction": a column only filters
/// once at least one concrete value is selected.
pub type ColumnFilters = HashMap<String, HashSet<String>>;

/// Toggle `value` in a column's accepted set: add if absent, remove if
/// present. A set emptied by removal drops back to "no restriction".
pub fn toggle_filter_value(filters: &mut ColumnFilters, column: &str, value: &str) {
    let set = filters.entry(column.to_string()).or_default();
    if !set.remove(value) {
        set.insert(value.to_string());
    }
    if set.is_empty() {
        filters.remove(column);
    }
}

/// True when the row passes every active column predicate. A row with a
/// missing value for a filtered column never passes that column.
pub fn row_passes_column_filters(row: &Row, filters: &ColumnFilters) -> bool {
    filters.iter().all(|(column, accepted)| {
        if accepted.is_empty() {
            return true;
        }
        match row.get(column) {
            None => false,
            Some(value) if value.is_null() => false,
            Some(value) => accepted.contains(&value.to_display_string()),
        }
    })
}

/// Distinct display values of a column in first-seen row order, for the
/// filter panel's value list.
pub fn distinct_values(rows: &[Row], column: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in rows {
        if let Some(value) = row.get(column) {
            if value.is_null() {
                continue;
            }
            let text = value.to_display_string();
            if seen.insert(text.clone()) {
                out.push(text);
            }
        }
    }
    out
}

/// Search text and column filter state for the data table, plus the table's
/// 1-based pagination.
#[derive(Debug, Clone)]
pub struct FilterSet {
    search: String,
    columns: ColumnFilters,
    page: usize,
    page_size: usize,
}

impl Default for FilterSet {
    fn default() -> Self {
        FilterSet::new()
    }
}

impl FilterSet {
    pub fn new() -> Self {
        FilterSet::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        FilterSet {
            search: String::new(),
            columns: ColumnFilters::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Set the free-text search. A row passes when the text is empty or any
    /// cell's display form, lower-cased, contains the lower-cased text.
    pub fn set_search(&mut self, text: &str) {
        self.search = text.to_string();
        self.page = 1;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn toggle_value(&mut self, column: &str, value: &str) {
        toggle_filter_value(&mut self.columns, column, value);
        self.page = 1;
    }

    /// Remove the column's accepted set entirely (no restriction).
    pub fn clear_column(&mut self, column: &str) {
        self.columns.remove(column);
        self.page = 1;
    }

    /// Empty the whole filter set and reset pagination to page 1.
    pub fn clear_all(&mut self) {
        self.search.clear();
        self.columns.clear();
        self.page = 1;
    }

    pub fn is_value_active(&self, column: &str, value: &str) -> bool {
        self.columns
            .get(column)
            .map(|set| set.contains(value))
            .unwrap_or(false)
    }

    /// Accepted values for a column, sorted for stable display.
    pub fn active_values(&self, column: &str) -> Vec<String> {
        let mut values: Vec<String> = self
            .columns
            .get(column)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        values.sort();
        values
    }

    pub fn is_filtering(&self) -> bool {
        !self.search.is_empty() || !self.columns.is_empty()
    }

    /// True when the row passes the search predicate AND every active
    /// column predicate.
    pub fn matches(&self, row: &Row) -> bool {
        self.matches_search(row) && row_passes_column_filters(row, &self.columns)
    }

    fn matches_search(&self, row: &Row) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        row.values()
            .any(|v| v.to_display_string().to_lowercase().contains(&needle))
    }

    /// Every passing row, in original order.
    pub fn visible_rows<'a>(&self, rows: &'a [Row]) -> Vec<&'a Row> {
        rows.iter().filter(|row| self.matches(row)).collect()
    }

    // ========================================================================
    // Pagination
    // ========================================================================

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self, visible_count: usize) -> usize {
        if visible_count == 0 {
            1
        } else {
            visible_count.div_ceil(self.page_size)
        }
    }

    /// Move to a page, clamped to the valid range for `visible_count` rows.
    pub fn set_page(&mut self, page: usize, visible_count: usize) {
        self.page = page.clamp(1, self.page_count(visible_count));
    }

    /// The slice of `visible` belonging to the current page.
    pub fn page_rows<'a, 'r>(&self, visible: &'a [&'r Row]) -> &'a [&'r Row] {
        let start = (self.page - 1).saturating_mul(self.page_size);
        if start >= visible.len() {
            return &[];
        }
        let end = (start + self.page_size).min(visible.len());
        &visible[start..end]
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

    fn sample_rows() -> Vec<Row> {
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
                ("region", CellValue::Text("East".to_string())),
                ("sales", CellValue::Number(7.0)),
            ]),
            row(&[("sales", CellValue::Number(2.0))]),
        ]
    }

    #[test]
    fn test_empty_filter_passes_everything() {
        let rows = sample_rows();
        let filters = FilterSet::new();
        assert_eq!(filters.visible_rows(&rows).len(), rows.len());
        assert!(!filters.is_filtering());
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let rows = sample_rows();
        let mut filters = FilterSet::new();
        filters.set_search("EAS");
        // Matches "east" and "East".
        assert_eq!(filters.visible_rows(&rows).len(), 2);
    }

    #[test]
    fn test_search_matches_numbers_via_display_form() {
        let rows = sample_rows();
        let mut filters = FilterSet::new();
        filters.set_search("10");
        assert_eq!(filters.visible_rows(&rows).len(), 1);
    }

    #[test]
    fn test_toggle_twice_restores_original_state() {
        let rows = sample_rows();
        let mut filters = FilterSet::new();
        let before = filters.visible_rows(&rows).len();

        filters.toggle_value("region", "east");
        assert!(filters.is_value_active("region", "east"));
        assert_eq!(filters.visible_rows(&rows).len(), 1);

        filters.toggle_value("region", "east");
        assert!(!filters.is_value_active("region", "east"));
        assert!(!filters.is_filtering());
        assert_eq!(filters.visible_rows(&rows).len(), before);
    }

    #[test]
    fn test_missing_value_never_passes_a_filtered_column() {
        let rows = sample_rows();
        let mut filters = FilterSet::new();
        filters.toggle_value("region", "east");
        filters.toggle_value("region", "west");
        // The fourth row has no region at all.
        assert_eq!(filters.visible_rows(&rows).len(), 2);
    }

    #[test]
    fn test_clear_column_removes_all_restriction() {
        let rows = sample_rows();
        let mut filters = FilterSet::new();
        filters.toggle_value("region", "east");
        filters.toggle_value("region", "west");
        filters.clear_column("region");
        assert_eq!(filters.visible_rows(&rows).len(), rows.len());
    }

    #[test]
    fn test_combined_filters_are_a_subset_of_each_alone() {
        let rows = sample_rows();

        let mut search_only = FilterSet::new();
        search_only.set_search("east");

        let mut column_only = FilterSet::new();
        column_only.toggle_value("region", "east");

        let mut combined = FilterSet::new();
        combined.set_search("east");
        combined.toggle_value("region", "east");

        let search_hits: Vec<*const Row> = search_only
            .visible_rows(&rows)
            .into_iter()
            .map(|r| r as *const Row)
            .collect();
        let column_hits: Vec<*const Row> = column_only
            .visible_rows(&rows)
            .into_iter()
            .map(|r| r as *const Row)
            .collect();

        for r in combined.visible_rows(&rows) {
            let ptr = r as *const Row;
            assert!(search_hits.contains(&ptr));
            assert!(column_hits.contains(&ptr));
        }
    }

    #[test]
    fn test_clear_all_resets_page() {
        let rows = sample_rows();
        let mut filters = FilterSet::with_page_size(2);
        filters.set_page(2, rows.len());
        assert_eq!(filters.page(), 2);

        filters.clear_all();
        assert_eq!(filters.page(), 1);
        assert!(!filters.is_filtering());
    }

    #[test]
    fn test_pagination_slicing_and_clamping() {
        let rows = sample_rows();
        let mut filters = FilterSet::with_page_size(3);
        let visible = filters.visible_rows(&rows);

        assert_eq!(filters.page_count(visible.len()), 2);
        assert_eq!(filters.page_rows(&visible).len(), 3);

        filters.set_page(2, visible.len());
        assert_eq!(filters.page_rows(&visible).len(), 1);

        filters.set_page(99, visible.len());
        assert_eq!(filters.page(), 2);

        filters.set_page(0, visible.len());
        assert_eq!(filters.page(), 1);
    }

    #[test]
    fn test_page_count_of_empty_view_is_one() {
        let filters = FilterSet::new();
        assert_eq!(filters.page_count(0), 1);
        let empty: Vec<&Row> = Vec::new();
        assert!(filters.page_rows(&empty).is_empty());
    }

    #[test]
    fn test_distinct_values_first_seen_order() {
        let rows = sample_rows();
        assert_eq!(distinct_values(&rows, "region"), vec!["east", "west", "East"]);
        assert_eq!(distinct_values(&rows, "sales"), vec!["10", "5", "7", "2"]);
        assert!(distinct_values(&rows, "nope").is_empty());
    }

    #[test]
    fn test_standalone_column_filters_helper() {
        let rows = sample_rows();
        let mut filters = ColumnFilters::new();
        toggle_filter_value(&mut filters, "region", "west");
        let passing: Vec<&Row> = rows
            .iter()
            .filter(|r| row_passes_column_filters(r, &filters))
            .collect();
        assert_eq!(passing.len(), 1);

        toggle_filter_value(&mut filters, "region", "west");
        assert!(filters.is_empty());
    }
}
