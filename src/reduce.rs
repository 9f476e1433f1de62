use std::hash::BuildHasher;

use crossbeam::channel::Receiver;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::hash::FnvBuildHasher;
use crate::station::StationMap;

/// Merges partial groupings into one combined grouping. Stations new to the
/// combined grouping are moved in whole; known ones are unioned.
#[derive(Debug)]
pub struct Reducer<S = FnvBuildHasher> {
    combined: StationMap<S>,
    merged: usize,
}

impl<S: BuildHasher> Reducer<S> {
    pub fn new(hasher: S) -> Self {
        Reducer {
            combined: StationMap::with_hasher(hasher),
            merged: 0,
        }
    }

    pub fn merge(&mut self, partial: StationMap<S>) {
        self.combined.merge(partial);
        self.merged += 1;
    }

    /// Partial groupings merged so far.
    pub fn merged(&self) -> usize {
        self.merged
    }

    pub fn finish(self) -> StationMap<S> {
        self.combined
    }
}

/// The reducer task. Runs until the results queue closes, which happens once
/// every worker has published. Exactly `workers` results are expected; the
/// first failure reported by any worker wins.
pub fn reduce_results<S: BuildHasher>(
    results: Receiver<Result<StationMap<S>>>,
    hasher: S,
    workers: usize,
) -> Result<StationMap<S>> {
    let mut reducer = Reducer::new(hasher);
    let mut received = 0;
    let mut first_error = None;

    for result in results.iter() {
        received += 1;
        match result {
            Ok(partial) if first_error.is_none() => reducer.merge(partial),
            Ok(_) => {}
            Err(err) => {
                if first_error.is_none() {
                    warn!(error = %err, "aborting run");
                    first_error = Some(err);
                }
            }
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }
    if received != workers {
        return Err(Error::WorkerLost);
    }
    debug!(merged = reducer.merged(), "combined grouping complete");
    Ok(reducer.finish())
}
