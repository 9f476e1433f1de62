use std::hash::BuildHasher;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::Receiver;
use tracing::debug;

use crate::error::{Error, Result};
use crate::parse::{parse_measurement, split_line};
use crate::pool::{Batch, PooledBatch};
use crate::station::StationMap;

const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Folds every line of `batch` into `stations`.
pub fn aggregate_batch<S: BuildHasher>(batch: &Batch, stations: &mut StationMap<S>) -> Result<()> {
    for (offset, line) in batch.lines().enumerate() {
        let line_number = batch.first_line() + offset as u64;
        let (name, raw_value) = split_line(line).ok_or_else(|| Error::MissingDelimiter {
            line: line_number,
            content: String::from_utf8_lossy(line).into_owned(),
        })?;
        let value = parse_measurement(raw_value).map_err(|reason| Error::InvalidMeasurement {
            line: line_number,
            field: String::from_utf8_lossy(raw_value).into_owned(),
            reason,
        })?;
        stations.record(name, value);
    }
    Ok(())
}

/// One worker's loop. Consumes batches until the queue is closed and
/// drained, then hands back its private grouping.
///
/// On a bad line the worker raises `abort` and returns the error at once.
/// Once `abort` is up, the remaining workers keep draining the queue without
/// aggregating so the chunker is never left blocked on a full queue.
pub fn aggregate_batches<S: BuildHasher>(
    worker: usize,
    batches: Receiver<PooledBatch<'_>>,
    hasher: S,
    abort: &AtomicBool,
) -> Result<StationMap<S>> {
    let mut stations = StationMap::with_hasher(hasher);
    let mut processed = 0u64;

    for batch in batches.iter() {
        if abort.load(Ordering::Relaxed) {
            continue;
        }
        if let Err(err) = aggregate_batch(&batch, &mut stations) {
            abort.store(true, Ordering::Relaxed);
            return Err(err);
        }

        let before = processed;
        processed += batch.len() as u64;
        if processed / PROGRESS_INTERVAL != before / PROGRESS_INTERVAL {
            debug!(worker, lines = processed, "aggregating");
        }
    }

    debug!(worker, lines = processed, stations = stations.len(), "publishing partial grouping");
    Ok(stations)
}
