use tracing::debug;

use crate::data::data_view::DataViewPipeline;
use crate::data::record::Field;
use crate::error::{GridError, Result};

/// The cell being edited, addressed by view position.
///
/// `view_generation` is the generation of the view the position refers to;
/// the cursor means nothing against any other view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditCursor {
    pub view_position: usize,
    pub field: Field,
    pub view_generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Editing(EditCursor),
}

/// What a commit or cancel actually did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Value written to record `id`
    Committed { id: u64, field: Field },
    /// Pending edit discarded, nothing written
    Cancelled,
    /// The cursor had been invalidated by a view rebuild; nothing written
    Stale,
}

/// Single, system-wide cell editor.
///
/// Idle -> Editing on begin; Editing -> Idle on commit, cancel, or when the
/// view is rebuilt underneath it. A rebuild never commits.
#[derive(Debug, Clone, Default)]
pub struct EditStateMachine {
    state: EditState,
    /// Edits dropped because the view was rebuilt mid-edit
    invalidated: u64,
}

impl EditStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn cursor(&self) -> Option<EditCursor> {
        match self.state {
            EditState::Idle => None,
            EditState::Editing(cursor) => Some(cursor),
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing(_))
    }

    /// Start editing `field` at `view_position` of `pipeline`'s current view.
    /// Any edit already in progress is discarded.
    pub fn begin(
        &mut self,
        pipeline: &DataViewPipeline,
        view_position: usize,
        field: Field,
    ) -> Result<EditCursor> {
        if !field.is_editable() {
            return Err(GridError::ReadOnlyField(field));
        }
        if view_position >= pipeline.visible_count() {
            return Err(GridError::EditTargetStale);
        }

        if let Some(previous) = self.cursor() {
            debug!(target: "edit", "Discarding edit at {:?} to begin a new one", previous);
        }

        let cursor = EditCursor {
            view_position,
            field,
            view_generation: pipeline.view().generation(),
        };
        self.state = EditState::Editing(cursor);
        debug!(target: "edit", "Begin edit {:?}", cursor);
        Ok(cursor)
    }

    /// Write `value` into the edited cell.
    ///
    /// The write lands once, in the raw record, which the view references,
    /// so view and dataset can never disagree. A stale cursor resolves to
    /// [`EditOutcome::Stale`] without writing. A value the field cannot hold
    /// is returned as an error and the editor stays open.
    pub fn commit(&mut self, pipeline: &mut DataViewPipeline, value: &str) -> Result<EditOutcome> {
        let cursor = match self.cursor() {
            Some(cursor) => cursor,
            None => {
                debug!(target: "edit", "Commit with no active edit ignored");
                return Ok(EditOutcome::Stale);
            }
        };

        if cursor.view_generation != pipeline.view().generation() {
            self.state = EditState::Idle;
            debug!(target: "edit", "Commit against rebuilt view ignored: {:?}", cursor);
            return Ok(EditOutcome::Stale);
        }

        match pipeline.write_field(cursor.view_position, cursor.field, value) {
            Ok(id) => {
                self.state = EditState::Idle;
                Ok(EditOutcome::Committed {
                    id,
                    field: cursor.field,
                })
            }
            Err(GridError::EditTargetStale) => {
                self.state = EditState::Idle;
                Ok(EditOutcome::Stale)
            }
            Err(e) => Err(e),
        }
    }

    /// Abandon the pending edit
    pub fn cancel(&mut self) -> EditOutcome {
        match std::mem::take(&mut self.state) {
            EditState::Editing(cursor) => {
                debug!(target: "edit", "Cancelled edit {:?}", cursor);
                EditOutcome::Cancelled
            }
            EditState::Idle => EditOutcome::Stale,
        }
    }

    /// Called after every view rebuild. An edit in progress refers to a
    /// position in the old view and is dropped. Returns true if one was.
    pub fn invalidate(&mut self, new_generation: u64) -> bool {
        match self.state {
            EditState::Editing(cursor) if cursor.view_generation != new_generation => {
                self.state = EditState::Idle;
                self.invalidated += 1;
                debug!(target: "edit", "View rebuilt while editing {:?}; edit dropped", cursor);
                true
            }
            _ => false,
        }
    }

    pub fn invalidated_count(&self) -> u64 {
        self.invalidated
    }
}
