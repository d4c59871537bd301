//! GridEngine - the single owner of all grid state
//!
//! Architecture:
//! raw dataset (loaded once)
//!     → DataViewPipeline (filtered, sorted view of row indices)
//!         → windowing (slice of the view for the current scroll offset)
//!             → rendering surface
//!
//! Selection and editing sit beside the pipeline. Every command runs to
//! completion before the next one; the only deferred work is the filter
//! debounce and the scroll frame tick, both fired from [`GridEngine::tick`].

use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::data::data_view::{DataViewPipeline, FilterState, SortState};
use crate::data::dataset_loader::DatasetSource;
use crate::data::record::{Field, Record, Status};
use crate::error::Result;
use crate::state::edit_state::{EditCursor, EditOutcome, EditState, EditStateMachine};
use crate::state::pinned_columns::PinnedColumns;
use crate::state::selection::SelectionTracker;
use crate::state::toggle_set::ToggleSet;
use crate::ui::scroll_throttle::{ScrollThrottler, DEFAULT_FRAME_INTERVAL_MS};
use crate::ui::windowing::{ViewportMetrics, VisibleRange};
use crate::utils::debouncer::{InputCoalescer, DEFAULT_DEBOUNCE_MS};

/// Engine-facing settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineOptions {
    pub metrics: ViewportMetrics,
    pub debounce_ms: u64,
    pub frame_interval_ms: u64,
    /// Rebuild the view right after an edit commit instead of on the next
    /// filter/sort/load
    pub refresh_view_on_edit: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            metrics: ViewportMetrics::default(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            refresh_view_on_edit: false,
        }
    }
}

/// Row counts for the "Showing X of Y" line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub visible: usize,
    pub total: usize,
}

/// The slice of the view the rendering surface should draw
#[derive(Debug, Clone)]
pub struct VisibleWindow<'a> {
    pub start: usize,
    pub end: usize,
    pub rows: Vec<&'a Record>,
}

/// What a call to [`GridEngine::tick`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// A debounced filter commit rebuilt the view
    pub filter_committed: bool,
    /// A scroll frame tick moved the window
    pub scrolled: bool,
}

impl TickReport {
    pub fn changed(&self) -> bool {
        self.filter_committed || self.scrolled
    }
}

pub struct GridEngine {
    options: EngineOptions,
    pipeline: DataViewPipeline,
    selection: SelectionTracker,
    edit: EditStateMachine,
    pinned: PinnedColumns,

    /// Raw filter text as typed, ahead of the debounced commit
    filter_input: String,
    filter_coalescer: InputCoalescer<String>,
    scroll_throttler: ScrollThrottler,

    /// Last applied (clamped) scroll offset
    scroll_offset: f64,
    visible_range: VisibleRange,
}

impl Default for GridEngine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl GridEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            pipeline: DataViewPipeline::new(),
            selection: SelectionTracker::new(),
            edit: EditStateMachine::new(),
            pinned: PinnedColumns::new(),
            filter_input: String::new(),
            filter_coalescer: InputCoalescer::new(options.debounce_ms),
            scroll_throttler: ScrollThrottler::new(options.frame_interval_ms),
            scroll_offset: 0.0,
            visible_range: VisibleRange::EMPTY,
        }
    }

    /// Engine over records that are already in memory
    pub fn with_records(options: EngineOptions, records: Vec<Record>) -> Self {
        let mut engine = Self::new(options);
        engine.load_records(records);
        engine
    }

    // ---------------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------------

    /// One-shot bulk load. On failure the engine is left with an empty
    /// dataset and view and the failure is handed back; nothing is retried.
    pub fn load(&mut self, source: &dyn DatasetSource) -> Result<usize> {
        match source.load() {
            Ok(records) => Ok(self.load_records(records)),
            Err(e) => {
                error!(target: "engine", "Dataset load from {} failed: {}", source.describe(), e);
                self.pipeline.clear();
                self.selection.clear();
                self.after_rebuild();
                Err(e)
            }
        }
    }

    /// Replace the dataset. Returns the new view length.
    ///
    /// Selected ids belong to the previous dataset and are dropped.
    pub fn load_records(&mut self, records: Vec<Record>) -> usize {
        let total = records.len();
        self.selection.clear();
        self.pipeline.load(records);
        self.after_rebuild();
        info!(target: "engine", "Loaded {} records, {} visible", total, self.pipeline.visible_count());
        self.pipeline.visible_count()
    }

    // ---------------------------------------------------------------------
    // Commands
    // ---------------------------------------------------------------------

    /// Raw keystroke-level filter text. Nothing is recomputed until the
    /// input has been quiet for the debounce window.
    pub fn set_filter_text(&mut self, raw: impl Into<String>, now: Instant) {
        let raw = raw.into();
        self.filter_input.clone_from(&raw);
        self.filter_coalescer.input(raw, now);
    }

    /// Commit pending filter text immediately (e.g. Enter in the input).
    /// Returns true if the view was rebuilt.
    pub fn commit_filter_text(&mut self) -> bool {
        match self.filter_coalescer.flush() {
            Some(text) => self.apply_merchant_filter(text),
            None => false,
        }
    }

    /// Discrete status filter; applied at once. `None` clears it.
    pub fn set_status_filter(&mut self, status: Option<Status>) -> bool {
        let filter = FilterState {
            status,
            ..self.pipeline.filter().clone()
        };
        self.apply_filter(filter)
    }

    /// Header click: sort by `field`, flipping direction if it is already
    /// the sort column
    pub fn set_sort_key(&mut self, field: Field) -> SortState {
        let sort = self.pipeline.sort().toggled(field);
        self.apply_sort(sort);
        sort
    }

    /// Back to load order
    pub fn clear_sort(&mut self) -> bool {
        self.apply_sort(SortState::default())
    }

    /// Record a scroll position. The window moves on the next frame tick,
    /// using whatever offset is latest by then.
    pub fn set_scroll_offset(&mut self, offset: f64, now: Instant) {
        self.scroll_throttler.push(offset, now);
    }

    /// Change viewport geometry (e.g. terminal resize); re-windows at once
    pub fn set_viewport_metrics(&mut self, metrics: ViewportMetrics) {
        if metrics != self.options.metrics {
            self.options.metrics = metrics;
            self.refresh_window();
        }
    }

    pub fn begin_edit(&mut self, view_position: usize, field: Field) -> Result<EditCursor> {
        self.edit.begin(&self.pipeline, view_position, field)
    }

    /// Commit the pending edit. See [`EditStateMachine::commit`].
    pub fn commit_edit(&mut self, value: &str) -> Result<EditOutcome> {
        let outcome = self.edit.commit(&mut self.pipeline, value)?;
        if let EditOutcome::Committed { id, field } = outcome {
            info!(target: "edit", "Committed {}={:?} on record {}", field, value, id);
            if self.options.refresh_view_on_edit {
                self.pipeline.recompute();
                self.after_rebuild();
            }
        }
        Ok(outcome)
    }

    pub fn cancel_edit(&mut self) -> EditOutcome {
        self.edit.cancel()
    }

    pub fn click_row(&mut self, id: u64, modifier_held: bool) -> &ToggleSet<u64> {
        self.selection.click(id, modifier_held)
    }

    pub fn toggle_pin(&mut self, column: Field) -> &ToggleSet<Field> {
        self.pinned.toggle(column)
    }

    /// Fire any timers that are due. Call from the host's event loop.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        if let Some(text) = self.filter_coalescer.poll(now) {
            report.filter_committed = self.apply_merchant_filter(text);
        }

        if let Some(offset) = self.scroll_throttler.poll(now) {
            report.scrolled = self.apply_scroll(offset);
        }

        report
    }

    /// Host-driven frame tick: apply the latest scroll offset immediately
    pub fn on_frame(&mut self) -> bool {
        match self.scroll_throttler.on_frame() {
            Some(offset) => self.apply_scroll(offset),
            None => false,
        }
    }

    /// Revoke pending timers without acting on them (view teardown)
    pub fn cancel_pending(&mut self) {
        let filter = self.filter_coalescer.cancel();
        let scroll = self.scroll_throttler.cancel();
        if filter || scroll {
            debug!(target: "engine",
                "Cancelled pending timers (filter={}, scroll={})", filter, scroll
            );
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn visible_window(&self) -> VisibleWindow<'_> {
        let range = self.visible_range;
        VisibleWindow {
            start: range.start,
            end: range.end,
            rows: self.pipeline.view_slice(range.as_range()),
        }
    }

    pub fn visible_range(&self) -> VisibleRange {
        self.visible_range
    }

    pub fn selection(&self) -> &ToggleSet<u64> {
        self.selection.selection()
    }

    pub fn is_selected(&self, id: u64) -> bool {
        self.selection.is_selected(id)
    }

    pub fn editing_cursor(&self) -> EditState {
        self.edit.state()
    }

    pub fn pinned_columns(&self) -> &ToggleSet<Field> {
        self.pinned.columns()
    }

    /// Columns in render order, pinned ones first
    pub fn column_order(&self) -> Vec<Field> {
        self.pinned.display_order()
    }

    pub fn counts(&self) -> Counts {
        Counts {
            visible: self.pipeline.visible_count(),
            total: self.pipeline.total_count(),
        }
    }

    pub fn filter(&self) -> &FilterState {
        self.pipeline.filter()
    }

    /// Filter text as typed, possibly not committed yet
    pub fn filter_input(&self) -> &str {
        &self.filter_input
    }

    pub fn is_filter_pending(&self) -> bool {
        self.filter_coalescer.is_pending()
    }

    pub fn sort(&self) -> &SortState {
        self.pipeline.sort()
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    pub fn metrics(&self) -> &ViewportMetrics {
        &self.options.metrics
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Extent of the full scroll content
    pub fn content_extent(&self) -> f64 {
        self.options
            .metrics
            .content_extent(self.pipeline.visible_count())
    }

    /// First fully scrolled-to row (ignores overscan)
    pub fn top_row(&self) -> usize {
        let row_extent = self.options.metrics.row_extent;
        if row_extent > 0.0 {
            (self.scroll_offset / row_extent).floor() as usize
        } else {
            0
        }
    }

    pub fn view_record(&self, view_position: usize) -> Option<&Record> {
        self.pipeline.view_record(view_position)
    }

    pub fn record_by_id(&self, id: u64) -> Option<&Record> {
        self.pipeline.record_by_id(id)
    }

    pub fn pipeline(&self) -> &DataViewPipeline {
        &self.pipeline
    }

    /// How long the host may sleep before a timer needs [`GridEngine::tick`]
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        match (
            self.filter_coalescer.time_remaining(now),
            self.scroll_throttler.time_remaining(now),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn apply_merchant_filter(&mut self, text: String) -> bool {
        let filter = FilterState {
            merchant_substring: text,
            ..self.pipeline.filter().clone()
        };
        self.apply_filter(filter)
    }

    fn apply_filter(&mut self, filter: FilterState) -> bool {
        if self.pipeline.set_filter(filter) {
            self.after_rebuild();
            true
        } else {
            false
        }
    }

    fn apply_sort(&mut self, sort: SortState) -> bool {
        if self.pipeline.set_sort(sort) {
            self.after_rebuild();
            true
        } else {
            false
        }
    }

    fn apply_scroll(&mut self, offset: f64) -> bool {
        self.scroll_offset = offset;
        self.refresh_window()
    }

    /// The view was replaced: drop position-keyed edit state and re-window
    /// against the new length before anything else can read it.
    fn after_rebuild(&mut self) {
        self.edit.invalidate(self.pipeline.view().generation());
        self.refresh_window();
    }

    /// Recompute the visible range from the current offset and view length.
    /// Returns true if the range moved.
    fn refresh_window(&mut self) -> bool {
        let data_length = self.pipeline.visible_count();
        let metrics = self.options.metrics;

        self.scroll_offset = metrics.clamp_offset(self.scroll_offset, data_length);
        let range = metrics.range_for(self.scroll_offset, data_length);
        debug_assert!(range.fits(data_length));

        let changed = range != self.visible_range;
        if changed {
            debug!(target: "windowing",
                "Window {:?} -> {:?} (offset {}, {} rows)",
                self.visible_range, range, self.scroll_offset, data_length
            );
        }
        self.visible_range = range;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset_loader::{InMemorySource, JsonFileSource};
    use chrono::{TimeZone, Utc};

    fn record(id: u64, merchant: &str, amount: f64, status: Status) -> Record {
        Record {
            id,
            date: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            merchant: merchant.to_string(),
            category: "Travel".to_string(),
            amount,
            status,
            description: format!("Transaction {} description", id),
        }
    }

    fn many(n: u64) -> Vec<Record> {
        let merchants = ["TechCorp", "FinBank", "RetailHub", "GlobalMart", "CloudNine"];
        (1..=n)
            .map(|id| {
                record(
                    id,
                    merchants[(id % 5) as usize],
                    (id % 97) as f64,
                    Status::ALL[(id % 3) as usize],
                )
            })
            .collect()
    }

    #[test]
    fn test_initial_window_after_load() {
        let engine = GridEngine::with_records(EngineOptions::default(), many(1000));
        assert_eq!(engine.visible_range(), VisibleRange { start: 0, end: 25 });
        assert_eq!(engine.visible_window().rows.len(), 25);
        assert_eq!(engine.counts(), Counts { visible: 1000, total: 1000 });
    }

    #[test]
    fn test_scroll_is_applied_on_frame_tick() {
        let mut engine = GridEngine::with_records(EngineOptions::default(), many(1000));
        let t0 = Instant::now();

        engine.set_scroll_offset(4_000.0, t0);
        engine.set_scroll_offset(8_000.0, t0 + Duration::from_millis(4));
        assert_eq!(engine.visible_range().start, 0);

        let report = engine.tick(t0 + Duration::from_millis(16));
        assert!(report.scrolled);
        assert_eq!(engine.visible_range(), VisibleRange { start: 190, end: 225 });
    }

    #[test]
    fn test_filter_shrink_rewindows_without_scroll_event() {
        let mut engine = GridEngine::with_records(EngineOptions::default(), many(1000));
        let t0 = Instant::now();
        engine.set_scroll_offset(8_400.0, t0);
        engine.on_frame();
        assert_eq!(engine.visible_range(), VisibleRange { start: 200, end: 235 });

        // "TechCorp" is every 5th record; narrow further with a status
        engine.set_filter_text("TECH", t0);
        engine.tick(t0 + Duration::from_millis(300));
        assert_eq!(engine.counts().visible, 200);
        assert!(engine.visible_range().fits(200));

        engine.set_status_filter(Some(Status::Pending));
        let visible = engine.counts().visible;
        assert!(visible < 200);
        assert!(engine.visible_range().fits(visible));
        assert_eq!(engine.visible_window().rows.len(), engine.visible_range().len());
    }

    #[test]
    fn test_filter_waits_for_quiet_period() {
        let mut engine = GridEngine::with_records(EngineOptions::default(), many(50));
        let t0 = Instant::now();

        engine.set_filter_text("c", t0);
        engine.set_filter_text("cl", t0 + Duration::from_millis(100));
        engine.set_filter_text("clo", t0 + Duration::from_millis(200));
        assert_eq!(engine.filter_input(), "clo");
        assert!(engine.is_filter_pending());

        assert!(!engine.tick(t0 + Duration::from_millis(400)).filter_committed);
        assert_eq!(engine.counts().visible, 50);

        assert!(engine.tick(t0 + Duration::from_millis(500)).filter_committed);
        assert_eq!(engine.filter().merchant_substring, "clo");
        assert_eq!(engine.counts().visible, 10);
    }

    #[test]
    fn test_cancel_pending_drops_filter_and_scroll() {
        let mut engine = GridEngine::with_records(EngineOptions::default(), many(500));
        let t0 = Instant::now();

        engine.set_filter_text("Fin", t0);
        engine.set_scroll_offset(2_000.0, t0);
        engine.cancel_pending();

        let report = engine.tick(t0 + Duration::from_secs(5));
        assert!(!report.changed());
        assert_eq!(engine.counts().visible, 500);
        assert_eq!(engine.scroll_offset(), 0.0);
    }

    #[test]
    fn test_status_filter_and_sort() {
        let mut engine = GridEngine::with_records(
            EngineOptions::default(),
            vec![
                record(1, "A", 30.0, Status::Completed),
                record(2, "B", 10.0, Status::Pending),
                record(3, "C", 20.0, Status::Completed),
                record(4, "D", 40.0, Status::Failed),
                record(5, "E", 5.0, Status::Pending),
            ],
        );

        engine.set_status_filter(Some(Status::Pending));
        let ids: Vec<u64> = engine.visible_window().rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 5]);

        engine.set_sort_key(Field::Amount);
        let ids: Vec<u64> = engine.visible_window().rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 2]);

        engine.set_status_filter(None);
        let sort = engine.set_sort_key(Field::Amount);
        assert_eq!(sort.direction, crate::data::data_view::SortDirection::Descending);
        let ids: Vec<u64> = engine.visible_window().rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 1, 3, 2, 5]);

        assert!(engine.clear_sort());
        let ids: Vec<u64> = engine.visible_window().rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_edit_commit_is_visible_in_view_and_raw() {
        let mut engine = GridEngine::with_records(EngineOptions::default(), many(20));
        engine.set_sort_key(Field::Amount);

        engine.begin_edit(3, Field::Merchant).unwrap();
        let id = engine.view_record(3).unwrap().id;
        let outcome = engine.commit_edit("Edited Merchant").unwrap();

        assert_eq!(outcome, EditOutcome::Committed { id, field: Field::Merchant });
        assert_eq!(engine.view_record(3).unwrap().merchant, "Edited Merchant");
        assert_eq!(engine.record_by_id(id).unwrap().merchant, "Edited Merchant");
        assert_eq!(engine.editing_cursor(), EditState::Idle);
    }

    #[test]
    fn test_edit_survives_later_recompute() {
        let mut engine = GridEngine::with_records(EngineOptions::default(), many(20));
        engine.begin_edit(0, Field::Merchant).unwrap();
        engine.commit_edit("Zeta").unwrap();

        engine.set_sort_key(Field::Merchant);
        engine.set_sort_key(Field::Merchant);
        assert_eq!(engine.view_record(0).unwrap().merchant, "Zeta");
    }

    #[test]
    fn test_rebuild_while_editing_forces_idle() {
        let mut engine = GridEngine::with_records(EngineOptions::default(), many(20));
        engine.begin_edit(2, Field::Merchant).unwrap();
        let original = engine.view_record(2).unwrap().clone();

        engine.set_sort_key(Field::Amount);
        assert_eq!(engine.editing_cursor(), EditState::Idle);
        assert_eq!(engine.commit_edit("Lost").unwrap(), EditOutcome::Stale);
        assert_eq!(engine.record_by_id(original.id).unwrap(), &original);
    }

    #[test]
    fn test_refresh_view_on_edit_rebuilds() {
        let options = EngineOptions {
            refresh_view_on_edit: true,
            ..Default::default()
        };
        let mut engine = GridEngine::with_records(
            options,
            vec![
                record(1, "TechCorp", 1.0, Status::Completed),
                record(2, "TechCorp", 2.0, Status::Completed),
            ],
        );
        engine.set_filter_text("tech", Instant::now());
        engine.commit_filter_text();
        assert_eq!(engine.counts().visible, 2);

        engine.begin_edit(0, Field::Merchant).unwrap();
        engine.commit_edit("FinBank").unwrap();
        assert_eq!(engine.counts().visible, 1);
        assert_eq!(engine.view_record(0).unwrap().id, 2);
    }

    #[test]
    fn test_selection_survives_filtering() {
        let mut engine = GridEngine::with_records(EngineOptions::default(), many(30));
        engine.click_row(5, false);
        engine.click_row(6, true);

        engine.set_status_filter(Some(Status::Completed));
        assert!(engine.is_selected(5));
        assert!(engine.is_selected(6));

        engine.set_status_filter(None);
        assert_eq!(engine.selection().to_vec(), vec![5, 6]);
    }

    #[test]
    fn test_toggle_pin() {
        let mut engine = GridEngine::default();
        engine.toggle_pin(Field::Id);
        engine.toggle_pin(Field::Date);
        assert_eq!(engine.pinned_columns().to_vec(), vec![Field::Id, Field::Date]);
        assert_eq!(engine.column_order()[..2], [Field::Id, Field::Date]);
        engine.toggle_pin(Field::Id);
        assert_eq!(engine.pinned_columns().to_vec(), vec![Field::Date]);
    }

    #[test]
    fn test_load_failure_falls_back_to_empty() {
        let mut engine = GridEngine::with_records(EngineOptions::default(), many(10));
        engine.click_row(3, false);

        let result = engine.load(&JsonFileSource::new("/no/such/transactions.json"));
        assert!(result.is_err());
        assert_eq!(engine.counts(), Counts { visible: 0, total: 0 });
        assert_eq!(engine.visible_range(), VisibleRange::EMPTY);
        assert!(engine.visible_window().rows.is_empty());
        assert!(engine.selection().is_empty());
    }

    #[test]
    fn test_reload_clears_selection() {
        let mut engine = GridEngine::with_records(EngineOptions::default(), many(10));
        engine.click_row(3, false);
        engine.click_row(4, true);

        engine.load_records(many(5));
        assert!(engine.selection().is_empty());
        assert!(!engine.is_selected(3));
    }

    #[test]
    fn test_edit_with_duplicate_ids_writes_the_edited_row() {
        let mut engine = GridEngine::with_records(
            EngineOptions::default(),
            vec![
                record(1, "Alpha", 1.0, Status::Completed),
                record(1, "Beta", 2.0, Status::Completed),
            ],
        );

        engine.begin_edit(0, Field::Merchant).unwrap();
        let outcome = engine.commit_edit("Edited").unwrap();
        assert_eq!(outcome, EditOutcome::Committed { id: 1, field: Field::Merchant });

        let merchants: Vec<&str> = engine
            .visible_window()
            .rows
            .iter()
            .map(|r| r.merchant.as_str())
            .collect();
        assert_eq!(merchants, vec!["Edited", "Beta"]);
    }

    #[test]
    fn test_load_from_source() {
        let mut engine = GridEngine::default();
        let visible = engine.load(&InMemorySource::new(many(40))).unwrap();
        assert_eq!(visible, 40);
        assert_eq!(engine.visible_range(), VisibleRange { start: 0, end: 25 });
    }

    #[test]
    fn test_next_deadline_tracks_earliest_timer() {
        let mut engine = GridEngine::with_records(EngineOptions::default(), many(10));
        let t0 = Instant::now();
        assert_eq!(engine.next_deadline(t0), None);

        engine.set_filter_text("x", t0);
        assert_eq!(engine.next_deadline(t0), Some(Duration::from_millis(300)));

        engine.set_scroll_offset(10.0, t0);
        assert_eq!(engine.next_deadline(t0), Some(Duration::from_millis(16)));
    }

    #[test]
    fn test_viewport_resize_rewindows() {
        let mut engine = GridEngine::with_records(EngineOptions::default(), many(100));
        engine.set_viewport_metrics(ViewportMetrics::new(20.0, 1.0, 2).unwrap());
        assert_eq!(engine.visible_range(), VisibleRange { start: 0, end: 22 });
    }
}
