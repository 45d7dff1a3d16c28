/// Datadeck Explorer Session
///
/// Ties the dataset store, filter engine, aggregation engine, and
/// dashboard together for one user session, and owns the seams to the
/// excluded networking layer: load sequencing, the chat transcript and
/// outbox, and transient error notices.

use crate::aggregate::AggregatedSeries;
use crate::chart::ChartConfig;
use crate::dashboard::Dashboard;
use crate::dataset::{ColumnStat, DatasetStore, Row};
use crate::filter::FilterSet;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

/// One line of the assistant conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// A transient, auto-dismissing user-facing notification.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub text: String,
}

/// Memoized series for one widget, valid for one (dataset generation,
/// exact config) pair.
#[derive(Debug, Clone)]
struct SeriesMemo {
    generation: u64,
    config: ChartConfig,
    series: AggregatedSeries,
}

/// All state for one exploration session.
#[derive(Debug, Default)]
pub struct ExplorerSession {
    store: DatasetStore,
    filters: FilterSet,
    dashboard: Dashboard,
    transcript: Vec<ChatMessage>,
    outbox: VecDeque<String>,
    notices: Vec<Notice>,
    last_issued_load: u64,
    series_memo: HashMap<u64, SeriesMemo>,
}

impl ExplorerSession {
    pub fn new() -> Self {
        ExplorerSession::default()
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterSet {
        &mut self.filters
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn dashboard_mut(&mut self) -> &mut Dashboard {
        &mut self.dashboard
    }

    // ========================================================================
    // Dataset loads
    // ========================================================================

    /// Issue a new user-initiated load request and get its sequence
    /// number. The most recently issued sequence is the only one whose
    /// response will apply: concurrent uploads resolve to "latest wins".
    pub fn begin_load(&mut self) -> u64 {
        self.last_issued_load += 1;
        self.last_issued_load
    }

    /// Apply the response to load request `seq`. A response to a
    /// superseded request is discarded and leaves all state untouched.
    /// Returns whether the dataset was replaced.
    pub fn apply_load(
        &mut self,
        seq: u64,
        rows: Vec<Row>,
        headers: Vec<String>,
        total_row_count: Option<u64>,
    ) -> bool {
        if seq != self.last_issued_load {
            return false;
        }
        self.replace_dataset(rows, headers, total_row_count);
        true
    }

    /// Apply a server-pushed `dataUpdate`. Pushes have no issuing request
    /// to be stale against; they always apply.
    pub fn apply_update(
        &mut self,
        rows: Vec<Row>,
        headers: Vec<String>,
        total_row_count: Option<u64>,
    ) {
        self.replace_dataset(rows, headers, total_row_count);
    }

    fn replace_dataset(
        &mut self,
        rows: Vec<Row>,
        headers: Vec<String>,
        total_row_count: Option<u64>,
    ) {
        self.store.load(rows, headers, total_row_count);
        // Filters may reference columns that no longer exist; they never
        // survive a dataset change.
        let page_size = self.filters.page_size();
        self.filters = FilterSet::with_page_size(page_size);
        self.series_memo.clear();
    }

    // ========================================================================
    // Chat and notices
    // ========================================================================

    /// Send a chat line to the assistant: recorded in the transcript and
    /// queued for the transport layer. This is the explicit capability any
    /// view uses; there is no ambient global send hook.
    pub fn send_chat(&mut self, text: &str) {
        self.transcript.push(ChatMessage {
            role: ChatRole::User,
            text: text.to_string(),
        });
        self.outbox.push_back(text.to_string());
    }

    /// Queued outbound chat lines, drained by the transport layer.
    pub fn drain_outbox(&mut self) -> Vec<String> {
        self.outbox.drain(..).collect()
    }

    /// An assistant chat line arrived.
    pub fn receive_chat(&mut self, text: &str) {
        self.transcript.push(ChatMessage {
            role: ChatRole::Assistant,
            text: text.to_string(),
        });
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// A failure was reported by the networking layer. Surfaced as a
    /// transient notice; dataset, filters, and dashboard stay untouched.
    pub fn push_error(&mut self, text: &str) {
        self.notices.push(Notice {
            text: text.to_string(),
        });
    }

    /// Drain pending notices for display.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ========================================================================
    // Table and chart reads
    // ========================================================================

    pub fn column_stats(&self) -> &[ColumnStat] {
        self.store.column_stats()
    }

    /// Rows passing the global filters, in original order.
    pub fn visible_rows(&self) -> Vec<&Row> {
        self.filters.visible_rows(self.store.rows())
    }

    /// The current table page of the filtered rows.
    pub fn page_rows(&self) -> Vec<&Row> {
        let visible = self.visible_rows();
        self.filters.page_rows(&visible).to_vec()
    }

    /// Series for the ad-hoc chart view. Uncached; the view re-renders on
    /// every config edit anyway.
    pub fn adhoc_series(&self, config: &ChartConfig) -> AggregatedSeries {
        config.series(self.store.rows())
    }

    /// Series for a dashboard widget, memoized on the exact (dataset
    /// generation, config) pair. Any dataset load or config edit
    /// recomputes.
    pub fn widget_series(&mut self, id: u64) -> Option<AggregatedSeries> {
        let config = self.dashboard.item(id)?.config.clone();
        let generation = self.store.generation();

        if let Some(memo) = self.series_memo.get(&id) {
            if memo.generation == generation && memo.config == config {
                return Some(memo.series.clone());
            }
        }

        let series = config.series(self.store.rows());
        self.series_memo.insert(
            id,
            SeriesMemo {
                generation,
                config,
                series: series.clone(),
            },
        );
        Some(series)
    }

    /// Remove a widget and its memoized series.
    pub fn remove_widget(&mut self, id: u64) -> bool {
        self.series_memo.remove(&id);
        self.dashboard.remove_item(id)
    }
}
