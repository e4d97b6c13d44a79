//! Bounded output capture

use std::io::{self, Write};

/// Writes to `inner` but keeps no more than `limit` bytes.
///
/// Once the limit is reached the rest is discarded silently: every write
/// reports the full input length, so the producer never sees a short
/// write or an error.
#[derive(Debug)]
pub struct LimitedWriter<W> {
    inner: W,
    remaining: usize,
}

impl<W: Write> LimitedWriter<W> {
    pub fn new(inner: W, limit: usize) -> Self {
        Self {
            inner,
            remaining: limit,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for LimitedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(buf.len());
        }
        let take = buf.len().min(self.remaining);
        self.inner.write_all(&buf[..take])?;
        self.remaining -= take;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
