//! Wiring of the aggregation pipeline.
//!
//! ```text
//! input -> Chunker -> bounded batch queue -> N workers -> results queue -> Reducer -> report
//!                         ^                      |
//!                         +---- BatchPool <------+
//! ```
//!
//! Every stage runs as a task on one rayon pool sized for the chunker, the
//! workers and the reducer, so the blocking channel operations never starve
//! each other. Batches and partial groupings only ever move between tasks;
//! nothing is shared behind a lock.

use std::fs::File;
use std::hash::BuildHasher;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crossbeam::channel;
use rayon::ThreadPoolBuilder;
use tracing::info;

use crate::chunker::Chunker;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::hash::FnvBuildHasher;
use crate::pool::BatchPool;
use crate::reduce::reduce_results;
use crate::report::format_report;
use crate::station::StationMap;
use crate::worker::aggregate_batches;

const READ_BUFFER_SIZE: usize = 1 << 20;

/// Reads the whole input and returns the combined grouping.
pub fn aggregate<R: BufRead + Send>(reader: R, config: &Config) -> Result<StationMap> {
    aggregate_with_hasher(reader, config, FnvBuildHasher)
}

/// [`aggregate`] with the grouping maps built on `hasher`.
pub fn aggregate_with_hasher<R, S>(reader: R, config: &Config, hasher: S) -> Result<StationMap<S>>
where
    R: BufRead + Send,
    S: BuildHasher + Clone + Send + Sync,
{
    config.validate()?;
    let workers = config.workers;
    info!(workers, chunk_size = config.chunk_size, "starting pipeline");
    let begin = Instant::now();

    // one thread per worker, plus the chunker and the reducer
    let threads = ThreadPoolBuilder::new()
        .num_threads(workers + 2)
        .thread_name(|i| format!("brc-{i}"))
        .build()?;

    let pool = BatchPool::new(config.chunk_size, config.pool_capacity);
    let abort = AtomicBool::new(false);
    let (batch_tx, batch_rx) = channel::bounded(workers);
    let (result_tx, result_rx) = channel::unbounded();
    let (final_tx, final_rx) = channel::bounded(1);

    let lines = threads.scope(|s| {
        for worker in 0..workers {
            let batches = batch_rx.clone();
            let results = result_tx.clone();
            let hasher = hasher.clone();
            let abort = &abort;
            s.spawn(move |_| {
                let _ = results.send(aggregate_batches(worker, batches, hasher, abort));
            });
        }
        // only the workers may keep these ends open
        drop(batch_rx);
        drop(result_tx);

        let hasher = hasher.clone();
        s.spawn(move |_| {
            let _ = final_tx.send(reduce_results(result_rx, hasher, workers));
        });

        let lines = Chunker::new(reader, &pool, config.max_line_len).run(batch_tx, &abort);
        if lines.is_err() {
            abort.store(true, Ordering::Relaxed);
        }
        lines
    });

    let combined = final_rx.recv().map_err(|_| Error::WorkerLost)??;
    let lines = lines?;

    info!(
        lines,
        stations = combined.len(),
        batches_allocated = pool.allocated(),
        elapsed_ms = begin.elapsed().as_millis() as u64,
        "pipeline finished"
    );
    Ok(combined)
}

/// Aggregates `reader` and renders the report line, without terminator.
pub fn process_reader<R: BufRead + Send>(reader: R, config: &Config) -> Result<String> {
    aggregate(reader, config).map(format_report)
}

pub fn process_file<P: AsRef<Path>>(path: P, config: &Config) -> Result<String> {
    let file = File::open(path)?;
    let reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    process_reader(reader, config)
}
