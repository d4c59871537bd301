use tracing::debug;

use crate::data::record::Field;
use crate::state::toggle_set::ToggleSet;

/// Columns the rendering surface keeps fixed while scrolling horizontally.
/// Rendered in the order they were pinned.
#[derive(Debug, Clone, Default)]
pub struct PinnedColumns {
    pinned: ToggleSet<Field>,
}

impl PinnedColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin an unpinned column or unpin a pinned one
    pub fn toggle(&mut self, column: Field) -> &ToggleSet<Field> {
        let pinned = self.pinned.toggle(column);
        debug!(target: "columns", "Column {} pinned={}", column, pinned);
        &self.pinned
    }

    pub fn is_pinned(&self, column: Field) -> bool {
        self.pinned.contains(&column)
    }

    pub fn columns(&self) -> &ToggleSet<Field> {
        &self.pinned
    }

    /// Display order: pinned columns first, then the rest in natural order
    pub fn display_order(&self) -> Vec<Field> {
        let mut order = self.pinned.to_vec();
        order.extend(Field::ALL.into_iter().filter(|f| !self.pinned.contains(f)));
        order
    }

    pub fn clear(&mut self) {
        self.pinned.clear();
    }
}
