use std::io;

use crate::parse::MeasurementError;

/// Every way a run can fail. Any of these aborts the whole run; no partial
/// report is ever produced.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed reading input: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: missing ';' delimiter in {content:?}")]
    MissingDelimiter { line: u64, content: String },

    #[error("line {line}: invalid measurement {field:?}: {reason}")]
    InvalidMeasurement {
        line: u64,
        field: String,
        #[source]
        reason: MeasurementError,
    },

    #[error("line {line}: longer than the {limit} byte limit")]
    LineTooLong { line: u64, limit: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to build worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A worker or the reducer went away without publishing its result.
    #[error("pipeline task exited without publishing a result")]
    WorkerLost,
}

pub type Result<T> = std::result::Result<T, Error>;
