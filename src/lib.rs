pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod logging;
pub mod state;
pub mod ui;
pub mod utils;

pub use engine::{Counts, EngineOptions, GridEngine, TickReport, VisibleWindow};
pub use error::{GridError, Result};
