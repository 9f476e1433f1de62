use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::Sender;
use tracing::debug;

use crate::error::{Error, Result};
use crate::pool::{BatchPool, PooledBatch, ReadLine};

/// Producer side of the pipeline: cuts the input into batches of
/// `chunk_size` lines and publishes them to the workers.
pub struct Chunker<'a, R> {
    reader: R,
    pool: &'a BatchPool,
    max_line_len: usize,
    next_line: u64,
}

impl<'a, R: BufRead> Chunker<'a, R> {
    pub fn new(reader: R, pool: &'a BatchPool, max_line_len: usize) -> Self {
        Chunker {
            reader,
            pool,
            max_line_len,
            next_line: 1,
        }
    }

    /// Fills the next batch, or returns `None` once the input is exhausted.
    pub fn next_batch(&mut self) -> Result<Option<PooledBatch<'a>>> {
        let mut batch = self.pool.acquire();
        batch.set_first_line(self.next_line);
        while batch.len() < self.pool.chunk_size() {
            match batch.read_line(&mut self.reader, self.max_line_len)? {
                ReadLine::Eof => break,
                ReadLine::Line => self.next_line += 1,
                ReadLine::TooLong => {
                    return Err(Error::LineTooLong {
                        line: self.next_line,
                        limit: self.max_line_len,
                    })
                }
            }
        }
        if batch.is_empty() {
            return Ok(None);
        }
        Ok(Some(batch))
    }

    /// Publishes every batch, blocking while the queue is full. Dropping
    /// `batches` on return closes the queue, which is what stops the workers.
    ///
    /// Returns the number of lines read.
    pub fn run(mut self, batches: Sender<PooledBatch<'a>>, abort: &AtomicBool) -> Result<u64> {
        while let Some(batch) = self.next_batch()? {
            if abort.load(Ordering::Relaxed) {
                debug!("chunker stopping, run aborted");
                break;
            }
            if batches.send(batch).is_err() {
                // every worker has already gone
                break;
            }
        }
        Ok(self.next_line - 1)
    }
}
