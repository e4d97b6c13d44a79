//! Pipe plumbing between the supervisor and a child process

use std::io::{self, Read, Write};

/// Copy everything from a child pipe into `sink` until the pipe closes.
///
/// Read errors end the copy; whatever was captured so far is kept.
pub fn drain<R: Read>(mut pipe: R, sink: &mut (dyn Write + Send)) -> u64 {
    io::copy(&mut pipe, sink).unwrap_or(0)
}

/// Write `data` to the child's stdin and close it.
///
/// A child that exits without reading its input is not an error.
pub fn feed<W: Write>(mut pipe: W, data: &[u8]) {
    let _ = pipe.write_all(data);
    let _ = pipe.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::LimitedWriter;

    #[test]
    fn drain_copies_until_eof() {
        let mut sink = Vec::new();
        let copied = drain(&b"hello world"[..], &mut sink);
        assert_eq!(copied, 11);
        assert_eq!(sink, b"hello world");
    }

    #[test]
    fn drain_through_limiter_reads_everything() {
        let mut sink = LimitedWriter::new(Vec::new(), 3);
        let copied = drain(&b"0123456789"[..], &mut sink);
        assert_eq!(copied, 10);
        assert_eq!(sink.into_inner(), b"012");
    }

    #[test]
    fn feed_writes_all() {
        let mut buf = Vec::new();
        feed(&mut buf, b"input");
        assert_eq!(buf, b"input");
    }
}
