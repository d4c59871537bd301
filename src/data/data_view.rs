use std::collections::HashMap;
use std::ops::Range;
use std::time::Instant;
use tracing::debug;

use crate::data::record::{Field, Record, Status};
use crate::error::{GridError, Result};

/// Active row filters. Both parts are ANDed; an empty substring and no
/// status together form the identity filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Case-insensitive merchant substring (already debounced)
    pub merchant_substring: String,
    /// Exact status match
    pub status: Option<Status>,
}

impl FilterState {
    pub fn is_identity(&self) -> bool {
        self.merchant_substring.is_empty() && self.status.is_none()
    }

    /// Check a single record against the filter
    pub fn matches(&self, record: &Record) -> bool {
        RowMatcher::new(self).matches(record)
    }
}

/// Filter with the needle lowercased once instead of once per row
struct RowMatcher<'a> {
    needle: Option<String>,
    status: Option<&'a Status>,
}

impl<'a> RowMatcher<'a> {
    fn new(filter: &'a FilterState) -> Self {
        let needle = if filter.merchant_substring.is_empty() {
            None
        } else {
            Some(filter.merchant_substring.to_lowercase())
        };
        Self {
            needle,
            status: filter.status.as_ref(),
        }
    }

    fn matches(&self, record: &Record) -> bool {
        if let Some(ref needle) = self.needle {
            if !record.merchant.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != *status {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

/// Current sort column and direction; `key == None` keeps load order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub key: Option<Field>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn by(key: Field, direction: SortDirection) -> Self {
        Self {
            key: Some(key),
            direction,
        }
    }

    /// Header click semantics: the sorted column flips direction, any other
    /// column starts ascending.
    pub fn toggled(&self, key: Field) -> Self {
        match self.key {
            Some(current) if current == key => Self::by(key, self.direction.reversed()),
            _ => Self::by(key, SortDirection::Ascending),
        }
    }
}

/// An ordered selection of raw dataset rows.
///
/// The view stores positions into the raw dataset rather than copies of
/// records, so a write to a raw record is visible through every view that
/// references it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataView {
    rows: Vec<usize>,
    generation: u64,
}

impl DataView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw dataset index backing a view position
    pub fn raw_index(&self, view_position: usize) -> Option<usize> {
        self.rows.get(view_position).copied()
    }

    /// Raw indices in view order
    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    /// Bumped on every rebuild; lets holders of view positions detect staleness
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Derive the view's raw indices from the dataset, filter and sort.
///
/// Filtering keeps load order; sorting is stable, so rows with equal keys
/// stay in filtered order in both directions.
pub fn recompute_view(records: &[Record], filter: &FilterState, sort: &SortState) -> Vec<usize> {
    let mut rows: Vec<usize> = if filter.is_identity() {
        (0..records.len()).collect()
    } else {
        let matcher = RowMatcher::new(filter);
        records
            .iter()
            .enumerate()
            .filter(|(_, record)| matcher.matches(record))
            .map(|(idx, _)| idx)
            .collect()
    };

    if let Some(key) = sort.key {
        let descending = sort.direction == SortDirection::Descending;
        rows.sort_by(|&a, &b| {
            let cmp = records[a].compare_field(&records[b], key);
            if descending {
                cmp.reverse()
            } else {
                cmp
            }
        });
    }

    rows
}

/// Owns the raw dataset and the view derived from it.
///
/// All mutation goes through here: loads, filter and sort changes and cell
/// writes. Every change to filter, sort or dataset replaces the view
/// wholesale; it is never patched in place.
#[derive(Debug, Default)]
pub struct DataViewPipeline {
    records: Vec<Record>,
    id_index: HashMap<u64, usize>,
    filter: FilterState,
    sort: SortState,
    view: DataView,
}

impl DataViewPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pipeline over an already loaded dataset
    pub fn with_records(records: Vec<Record>) -> Self {
        let mut pipeline = Self::new();
        pipeline.load(records);
        pipeline
    }

    /// Replace the raw dataset and rebuild the view. Returns the view length.
    pub fn load(&mut self, records: Vec<Record>) -> usize {
        self.id_index = records
            .iter()
            .enumerate()
            .map(|(idx, record)| (record.id, idx))
            .collect();
        self.records = records;
        self.recompute()
    }

    /// Drop all data, keeping filter and sort settings
    pub fn clear(&mut self) -> usize {
        self.load(Vec::new())
    }

    /// Install a new filter. Rebuilds only when it actually changed.
    pub fn set_filter(&mut self, filter: FilterState) -> bool {
        if filter == self.filter {
            return false;
        }
        self.filter = filter;
        self.recompute();
        true
    }

    /// Install a new sort. Rebuilds only when it actually changed.
    pub fn set_sort(&mut self, sort: SortState) -> bool {
        if sort == self.sort {
            return false;
        }
        self.sort = sort;
        self.recompute();
        true
    }

    /// Rebuild the view from scratch and swap it in. Returns the new length.
    pub fn recompute(&mut self) -> usize {
        let started = Instant::now();
        let rows = recompute_view(&self.records, &self.filter, &self.sort);
        let generation = self.view.generation.wrapping_add(1);
        self.view = DataView { rows, generation };

        debug!(target: "data_view",
            "Recomputed view: {} of {} rows (filter={:?}, sort={:?}) in {:?}",
            self.view.len(), self.records.len(), self.filter, self.sort, started.elapsed()
        );
        self.view.len()
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn view(&self) -> &DataView {
        &self.view
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    pub fn visible_count(&self) -> usize {
        self.view.len()
    }

    pub fn record_by_id(&self, id: u64) -> Option<&Record> {
        self.id_index.get(&id).map(|&idx| &self.records[idx])
    }

    /// Record shown at a view position
    pub fn view_record(&self, view_position: usize) -> Option<&Record> {
        self.view
            .raw_index(view_position)
            .map(|idx| &self.records[idx])
    }

    /// Records for a slice of the view, clamped to the view's length
    pub fn view_slice(&self, range: Range<usize>) -> Vec<&Record> {
        let end = range.end.min(self.view.len());
        let start = range.start.min(end);
        self.view.rows[start..end]
            .iter()
            .map(|&idx| &self.records[idx])
            .collect()
    }

    /// Write a value into the record shown at `view_position`.
    ///
    /// The write goes to the raw row the view position references, so it is
    /// exactly what readers of the view see. The id is only reported back;
    /// it is never used to find the row. Returns the edited record's id.
    pub fn write_field(&mut self, view_position: usize, field: Field, value: &str) -> Result<u64> {
        let raw_idx = self
            .view
            .raw_index(view_position)
            .ok_or(GridError::EditTargetStale)?;
        let record = &mut self.records[raw_idx];
        let id = record.id;

        record.set_field(field, value)?;
        debug!(target: "data_view",
            "Wrote {}={:?} into record {} (view position {})",
            field, value, id, view_position
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: u64, merchant: &str, amount: f64, status: Status) -> Record {
        Record {
            id,
            date: Utc.with_ymd_and_hms(2024, 1, id as u32 % 28 + 1, 0, 0, 0).unwrap(),
            merchant: merchant.to_string(),
            category: "Food".to_string(),
            amount,
            status,
            description: format!("Transaction {} description", id),
        }
    }

    fn ids(pipeline: &DataViewPipeline) -> Vec<u64> {
        pipeline
            .view_slice(0..pipeline.visible_count())
            .iter()
            .map(|r| r.id)
            .collect()
    }

    fn statuses_fixture() -> DataViewPipeline {
        DataViewPipeline::with_records(vec![
            record(1, "TechCorp", 30.0, Status::Completed),
            record(2, "FinBank", 10.0, Status::Pending),
            record(3, "RetailHub", 20.0, Status::Completed),
            record(4, "GlobalMart", 50.0, Status::Failed),
            record(5, "CloudNine", 40.0, Status::Pending),
        ])
    }

    #[test]
    fn test_identity_view_is_load_order() {
        let pipeline = statuses_fixture();
        assert_eq!(ids(&pipeline), vec![1, 2, 3, 4, 5]);
        assert_eq!(pipeline.total_count(), 5);
    }

    #[test]
    fn test_status_filter_keeps_order() {
        let mut pipeline = statuses_fixture();
        pipeline.set_filter(FilterState {
            status: Some(Status::Pending),
            ..Default::default()
        });
        assert_eq!(ids(&pipeline), vec![2, 5]);
        assert_eq!(pipeline.view().row_indices(), &[1, 4]);
    }

    #[test]
    fn test_merchant_filter_is_case_insensitive_and_combines_with_status() {
        let mut pipeline = statuses_fixture();
        pipeline.set_filter(FilterState {
            merchant_substring: "O".to_string(),
            status: None,
        });
        // TechCorp, GlobalMart, CloudNine
        assert_eq!(ids(&pipeline), vec![1, 4, 5]);

        pipeline.set_filter(FilterState {
            merchant_substring: "o".to_string(),
            status: Some(Status::Pending),
        });
        assert_eq!(ids(&pipeline), vec![5]);
    }

    #[test]
    fn test_sort_toggle_semantics() {
        let sort = SortState::default();
        let asc = sort.toggled(Field::Amount);
        assert_eq!(asc, SortState::by(Field::Amount, SortDirection::Ascending));
        let desc = asc.toggled(Field::Amount);
        assert_eq!(desc.direction, SortDirection::Descending);
        let other = desc.toggled(Field::Merchant);
        assert_eq!(other, SortState::by(Field::Merchant, SortDirection::Ascending));
    }

    #[test]
    fn test_sort_amount_then_flip() {
        let mut pipeline = DataViewPipeline::with_records(vec![
            record(1, "A", 30.0, Status::Completed),
            record(2, "B", 10.0, Status::Completed),
            record(3, "C", 20.0, Status::Completed),
        ]);
        let amounts = |p: &DataViewPipeline| -> Vec<f64> {
            p.view_slice(0..3).iter().map(|r| r.amount).collect()
        };

        let sort = pipeline.sort().toggled(Field::Amount);
        pipeline.set_sort(sort);
        assert_eq!(amounts(&pipeline), vec![10.0, 20.0, 30.0]);

        let sort = pipeline.sort().toggled(Field::Amount);
        pipeline.set_sort(sort);
        assert_eq!(amounts(&pipeline), vec![30.0, 20.0, 10.0]);
    }

    #[test]
    fn test_sort_is_stable_in_both_directions() {
        let mut pipeline = DataViewPipeline::with_records(vec![
            record(1, "Same", 5.0, Status::Completed),
            record(2, "Same", 1.0, Status::Pending),
            record(3, "Same", 5.0, Status::Failed),
            record(4, "Same", 1.0, Status::Completed),
        ]);

        pipeline.set_sort(SortState::by(Field::Amount, SortDirection::Ascending));
        assert_eq!(ids(&pipeline), vec![2, 4, 1, 3]);

        pipeline.set_sort(SortState::by(Field::Amount, SortDirection::Descending));
        assert_eq!(ids(&pipeline), vec![1, 3, 2, 4]);

        pipeline.set_sort(SortState::by(Field::Merchant, SortDirection::Descending));
        assert_eq!(ids(&pipeline), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut pipeline = statuses_fixture();
        pipeline.set_sort(SortState::by(Field::Amount, SortDirection::Descending));
        let first = pipeline.view().row_indices().to_vec();
        pipeline.recompute();
        assert_eq!(pipeline.view().row_indices(), first.as_slice());
    }

    #[test]
    fn test_unchanged_settings_do_not_rebuild() {
        let mut pipeline = statuses_fixture();
        let generation = pipeline.view().generation();
        assert!(!pipeline.set_filter(FilterState::default()));
        assert!(!pipeline.set_sort(SortState::default()));
        assert_eq!(pipeline.view().generation(), generation);

        assert!(pipeline.set_sort(SortState::by(Field::Id, SortDirection::Ascending)));
        assert_eq!(pipeline.view().generation(), generation + 1);
    }

    #[test]
    fn test_write_field_is_visible_through_view_and_raw() {
        let mut pipeline = statuses_fixture();
        pipeline.set_sort(SortState::by(Field::Amount, SortDirection::Descending));
        // Descending amount: 4 (50), 5 (40), 1 (30), 3 (20), 2 (10)
        let id = pipeline.write_field(1, Field::Merchant, "Renamed").unwrap();
        assert_eq!(id, 5);
        assert_eq!(pipeline.view_record(1).unwrap().merchant, "Renamed");
        assert_eq!(pipeline.record_by_id(5).unwrap().merchant, "Renamed");
        assert_eq!(pipeline.records()[4].merchant, "Renamed");
    }

    #[test]
    fn test_write_field_with_duplicate_ids_hits_the_viewed_row() {
        let mut pipeline = DataViewPipeline::with_records(vec![
            record(1, "Alpha", 10.0, Status::Completed),
            record(1, "Beta", 20.0, Status::Completed),
        ]);

        let id = pipeline.write_field(0, Field::Merchant, "Edited").unwrap();
        assert_eq!(id, 1);
        assert_eq!(pipeline.view_record(0).unwrap().merchant, "Edited");
        assert_eq!(pipeline.view_record(1).unwrap().merchant, "Beta");
    }

    #[test]
    fn test_write_field_out_of_range_is_stale() {
        let mut pipeline = statuses_fixture();
        assert!(matches!(
            pipeline.write_field(99, Field::Merchant, "x"),
            Err(GridError::EditTargetStale)
        ));
    }

    #[test]
    fn test_view_slice_clamps() {
        let pipeline = statuses_fixture();
        assert_eq!(pipeline.view_slice(3..100).len(), 2);
        assert!(pipeline.view_slice(10..20).is_empty());
    }

    #[test]
    fn test_clear_empties_view() {
        let mut pipeline = statuses_fixture();
        assert_eq!(pipeline.clear(), 0);
        assert!(pipeline.view().is_empty());
        assert!(pipeline.record_by_id(1).is_none());
    }
}
