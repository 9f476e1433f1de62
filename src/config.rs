use crate::error::{Error, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Tuning knobs for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Lines per batch handed to a worker.
    pub chunk_size: usize,
    /// Aggregation workers; also the capacity of the batch queue.
    pub workers: usize,
    /// Longest accepted line in bytes, terminator excluded.
    pub max_line_len: usize,
    /// Idle batches kept for reuse.
    pub pool_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        let workers = num_cpus::get();
        Config {
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers,
            max_line_len: DEFAULT_MAX_LINE_LENGTH,
            pool_capacity: pool_capacity_for(workers),
        }
    }
}

// chunker + every queue slot + every worker, plus one spare
fn pool_capacity_for(workers: usize) -> usize {
    2 * workers + 2
}

impl Config {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Also resizes the batch pool to match.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self.pool_capacity = pool_capacity_for(workers);
        self
    }

    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    pub fn with_pool_capacity(mut self, pool_capacity: usize) -> Self {
        self.pool_capacity = pool_capacity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.chunk_size, "chunk size"),
            (self.workers, "worker count"),
            (self.max_line_len, "maximum line length"),
            (self.pool_capacity, "pool capacity"),
        ];
        for (value, name) in checks {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }
}
