//! Maps a scroll position to the slice of the view that must be presented.
//!
//! Extents are unit-agnostic: pixels for a pixel surface, terminal rows for
//! the TUI. Nothing here holds state.

use std::ops::Range;
use tracing::{debug, warn};

use crate::error::{GridError, Result};

/// Half-open window `[start, end)` into the view.
///
/// Always satisfies `start <= end <= view length` for the length it was
/// computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

impl VisibleRange {
    pub const EMPTY: VisibleRange = VisibleRange { start: 0, end: 0 };

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && position < self.end
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether this range is still addressable in a view of `data_length` rows
    pub fn fits(&self, data_length: usize) -> bool {
        self.start <= self.end && self.end <= data_length
    }
}

/// Geometry of the scroll container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    /// Visible extent of the container (e.g. 600px)
    pub viewport_extent: f64,
    /// Extent of one row (e.g. 40px)
    pub row_extent: f64,
    /// Overscan rows on each side of the visible area
    pub buffer_rows: usize,
}

impl Default for ViewportMetrics {
    fn default() -> Self {
        Self {
            viewport_extent: 600.0,
            row_extent: 40.0,
            buffer_rows: 10,
        }
    }
}

impl ViewportMetrics {
    /// Validated constructor
    pub fn new(viewport_extent: f64, row_extent: f64, buffer_rows: usize) -> Result<Self> {
        if !row_extent.is_finite() || row_extent <= 0.0 {
            return Err(GridError::InvalidRange(format!(
                "row extent must be positive, got {}",
                row_extent
            )));
        }
        if !viewport_extent.is_finite() || viewport_extent < 0.0 {
            return Err(GridError::InvalidRange(format!(
                "viewport extent must be non-negative, got {}",
                viewport_extent
            )));
        }
        Ok(Self {
            viewport_extent,
            row_extent,
            buffer_rows,
        })
    }

    /// Window for a scroll offset over a view of `data_length` rows
    pub fn range_for(&self, scroll_offset: f64, data_length: usize) -> VisibleRange {
        compute_range(
            scroll_offset,
            self.viewport_extent,
            self.row_extent,
            self.buffer_rows,
            data_length,
        )
    }

    /// Extent of the full scroll content (the sizer)
    pub fn content_extent(&self, data_length: usize) -> f64 {
        data_length as f64 * self.row_extent
    }

    /// Scroll offset clamped the way a scroll container clamps it
    pub fn clamp_offset(&self, scroll_offset: f64, data_length: usize) -> f64 {
        clamp_scroll_offset(
            scroll_offset,
            self.viewport_extent,
            self.row_extent,
            data_length,
        )
    }

    /// Number of whole or partial rows the container shows at once
    pub fn rows_per_page(&self) -> usize {
        if self.row_extent > 0.0 {
            (self.viewport_extent / self.row_extent).ceil() as usize
        } else {
            0
        }
    }
}

/// Largest reachable scroll offset: `content - viewport`, never negative.
/// Non-finite or negative offsets collapse to zero.
pub fn clamp_scroll_offset(
    scroll_offset: f64,
    viewport_extent: f64,
    row_extent: f64,
    data_length: usize,
) -> f64 {
    let max_offset = (data_length as f64 * row_extent - viewport_extent).max(0.0);
    if scroll_offset.is_nan() || scroll_offset <= 0.0 {
        0.0
    } else {
        scroll_offset.min(max_offset)
    }
}

/// Compute the visible index range for a scroll position.
///
/// `start = max(0, floor(offset / row) - buffer)` and
/// `end = min(len, floor(offset / row) + ceil(viewport / row) + buffer)`,
/// with the offset first clamped into the scrollable content so that a
/// view that shrank under a stale offset still yields a live window.
/// Bad geometry is clamped and logged, never propagated.
pub fn compute_range(
    scroll_offset: f64,
    viewport_extent: f64,
    row_extent: f64,
    buffer_rows: usize,
    data_length: usize,
) -> VisibleRange {
    if data_length == 0 {
        return VisibleRange::EMPTY;
    }

    if !row_extent.is_finite() || row_extent <= 0.0 {
        warn!(target: "windowing", "Invalid row extent {}, using empty window", row_extent);
        return VisibleRange::EMPTY;
    }

    let viewport_extent = if viewport_extent.is_finite() && viewport_extent >= 0.0 {
        viewport_extent
    } else {
        warn!(target: "windowing", "Invalid viewport extent {}, treating as 0", viewport_extent);
        0.0
    };

    let offset = clamp_scroll_offset(scroll_offset, viewport_extent, row_extent, data_length);
    if offset != scroll_offset {
        debug!(target: "windowing",
            "Scroll offset {} clamped to {} for {} rows", scroll_offset, offset, data_length
        );
    }

    // f64 -> usize casts saturate, so huge extents cannot wrap
    let raw_start = (offset / row_extent).floor() as usize;
    let visible_count = (viewport_extent / row_extent).ceil() as usize;

    let end = raw_start
        .saturating_add(visible_count)
        .saturating_add(buffer_rows)
        .min(data_length);
    let start = raw_start.saturating_sub(buffer_rows).min(end);

    VisibleRange { start, end }
}
