//! Data layer: records, bulk loading and the filtered/sorted view
//!
//! The raw dataset is owned by [`data_view::DataViewPipeline`]; everything
//! else reads it through the pipeline or asks it to mutate.

pub mod data_view;
pub mod dataset_loader;
pub mod record;
