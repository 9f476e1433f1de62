//! Parallel min/mean/max aggregation of `name;value` measurement files.
//!
//! A single chunker reads the input into pooled batches, a fixed set of
//! workers fold them into private groupings, and a reducer merges those into
//! the combined grouping rendered by [`report::format_report`]. Measurements
//! stay fixed-point integers (scaled by 10) until the report is written.

pub mod chunker;
pub mod config;
pub mod error;
pub mod hash;
pub mod parse;
pub mod pipeline;
pub mod pool;
pub mod profile;
pub mod reduce;
pub mod report;
pub mod station;
pub mod worker;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{aggregate, aggregate_with_hasher, process_file, process_reader};
pub use station::{Station, StationMap, StationName};
