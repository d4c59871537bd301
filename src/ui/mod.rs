//! Viewport windowing and the rendering surfaces

pub mod grid_tui;
pub mod scroll_throttle;
pub mod table_print;
pub mod windowing;
