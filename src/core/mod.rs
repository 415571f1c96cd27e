//! Core data types and I/O operations.

pub mod loaders;
pub mod writers;

pub use loaders::{load_time_series, parse_time_series, LoaderError, TimeSeries};
pub use writers::{write_aligned_trajectory, write_associations, WriteError};
