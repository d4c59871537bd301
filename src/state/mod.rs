//! Interaction state that lives beside the data view: selection, the cell
//! editor and pinned columns

pub mod edit_state;
pub mod pinned_columns;
pub mod selection;
pub mod toggle_set;
