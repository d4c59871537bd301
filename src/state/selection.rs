use tracing::debug;

use crate::state::toggle_set::ToggleSet;

/// Selected rows, keyed by record id so the selection survives filtering
/// and sorting. A selected row that is filtered out stays selected.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    selected: ToggleSet<u64>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row click. Without the modifier the selection becomes `{id}`; with it
    /// `id` is toggled and every other member is left alone.
    pub fn click(&mut self, id: u64, modifier_held: bool) -> &ToggleSet<u64> {
        if modifier_held {
            let selected = self.selected.toggle(id);
            debug!(target: "selection",
                "Toggled {} -> {} ({} selected)", id, selected, self.selected.len()
            );
        } else {
            self.selected = ToggleSet::singleton(id);
            debug!(target: "selection", "Selected only {}", id);
        }
        &self.selected
    }

    pub fn is_selected(&self, id: u64) -> bool {
        self.selected.contains(&id)
    }

    pub fn selection(&self) -> &ToggleSet<u64> {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}
