//! Timing helpers shared by the engine and the terminal front end

pub mod debouncer;
pub mod frame_rate;
