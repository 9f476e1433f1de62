use std::io::{self, BufRead, Read};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam::queue::ArrayQueue;

const AVERAGE_LINE_LENGTH: usize = 16;

/// Up to `chunk_size` consecutive input lines, stored back to back in one
/// buffer so that refilling a recycled batch allocates nothing.
#[derive(Debug, Default)]
pub struct Batch {
    data: Vec<u8>,
    ends: Vec<usize>,
    first_line: u64,
}

/// Outcome of pulling one line from the input into a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadLine {
    Eof,
    Line,
    TooLong,
}

impl Batch {
    pub fn with_capacity(lines: usize) -> Self {
        Batch {
            data: Vec::with_capacity(lines * AVERAGE_LINE_LENGTH),
            ends: Vec::with_capacity(lines),
            first_line: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// 1-based input line number of the first line in the batch.
    pub fn first_line(&self) -> u64 {
        self.first_line
    }

    pub(crate) fn set_first_line(&mut self, line: u64) {
        self.first_line = line;
    }

    pub fn push_line(&mut self, line: &[u8]) {
        self.data.extend_from_slice(line);
        self.ends.push(self.data.len());
    }

    /// Copies the next line of `reader` into the batch, without its `\n` or
    /// `\r\n` terminator. At most `limit + 2` bytes are pulled for one line,
    /// enough for `limit` bytes of content followed by `\r\n`.
    pub(crate) fn read_line<R: BufRead>(
        &mut self,
        reader: &mut R,
        limit: usize,
    ) -> io::Result<ReadLine> {
        let start = self.data.len();
        let read = reader
            .by_ref()
            .take(limit as u64 + 2)
            .read_until(b'\n', &mut self.data)?;
        if read == 0 {
            return Ok(ReadLine::Eof);
        }
        if self.data.last() == Some(&b'\n') {
            self.data.pop();
            if self.data.len() > start && self.data.last() == Some(&b'\r') {
                self.data.pop();
            }
        }
        if self.data.len() - start > limit {
            self.data.truncate(start);
            return Ok(ReadLine::TooLong);
        }
        self.ends.push(self.data.len());
        Ok(ReadLine::Line)
    }

    pub fn lines(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let mut start = 0;
        self.ends.iter().map(move |&end| {
            let line = &self.data[start..end];
            start = end;
            line
        })
    }

    /// Drops the contents, keeping the allocations.
    pub fn clear(&mut self) {
        self.data.clear();
        self.ends.clear();
        self.first_line = 0;
    }
}

/// Recycles batches between the chunker and the workers.
///
/// At most `capacity` idle batches are retained; extra releases are freed.
#[derive(Debug)]
pub struct BatchPool {
    idle: ArrayQueue<Batch>,
    chunk_size: usize,
    allocated: AtomicUsize,
}

impl BatchPool {
    pub fn new(chunk_size: usize, capacity: usize) -> Self {
        BatchPool {
            idle: ArrayQueue::new(capacity.max(1)),
            chunk_size,
            allocated: AtomicUsize::new(0),
        }
    }

    /// Hands out an empty batch, reusing an idle one when available. The
    /// batch comes back to the pool when the guard is dropped.
    pub fn acquire(&self) -> PooledBatch<'_> {
        let batch = self.idle.pop().unwrap_or_else(|| {
            self.allocated.fetch_add(1, Ordering::Relaxed);
            Batch::with_capacity(self.chunk_size)
        });
        PooledBatch {
            pool: self,
            batch: Some(batch),
        }
    }

    pub fn release(&self, mut batch: Batch) {
        batch.clear();
        // a full pool just lets the batch go
        let _ = self.idle.push(batch);
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn idle(&self) -> usize {
        self.idle.len()
    }

    /// Batches allocated over the pool's lifetime.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }
}

/// A batch on loan from a [`BatchPool`]. Released on drop, on every path.
#[derive(Debug)]
pub struct PooledBatch<'a> {
    pool: &'a BatchPool,
    batch: Option<Batch>,
}

impl Deref for PooledBatch<'_> {
    type Target = Batch;

    fn deref(&self) -> &Batch {
        self.batch.as_ref().expect("batch present until drop")
    }
}

impl DerefMut for PooledBatch<'_> {
    fn deref_mut(&mut self) -> &mut Batch {
        self.batch.as_mut().expect("batch present until drop")
    }
}

impl Drop for PooledBatch<'_> {
    fn drop(&mut self) {
        if let Some(batch) = self.batch.take() {
            self.pool.release(batch);
        }
    }
}
