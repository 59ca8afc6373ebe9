use crate::hashing;
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::Path;

/// No single chunk buffer grows beyond this, whatever size the caller declares.
pub const MAX_CHUNK_CEILING: usize = 1 << 30; // 1 GiB
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024; // 1 MiB

/// How a chunked read ended, relative to the size declared up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// End of stream arrived exactly at the declared size.
    Complete,
    /// End of stream arrived early. The declared size is still what gets recorded.
    Truncated { read: u64, declared: u64 },
    /// More data was available after the declared size was reached; reading
    /// stopped there and the result covers only the declared prefix.
    Grown { declared: u64 },
}

/// Open a file for a single front-to-back pass.
pub fn open_for_chunking(path: &Path) -> io::Result<File> {
    let f = File::open(path)?;
    hashing::advise_sequential(&f);
    Ok(f)
}

/// Buffer size for one file: bounded by the configured chunk size, the hard
/// ceiling and the declared size, and never zero so growth past a declared
/// size of 0 is still observable.
pub fn chunk_capacity(declared_size: u64, max_chunk_size: usize) -> usize {
    let limit = max_chunk_size.clamp(1, MAX_CHUNK_CEILING) as u64;
    declared_size.min(limit).max(1) as usize
}

/// Streams a reader as a sequence of chunks, reusing one buffer.
///
/// Each chunk is as large as the buffer allows; only the last one before end
/// of stream may be short. The reader never consumes past `declared_size`
/// except for a one-byte probe that detects growth.
pub struct ChunkReader<R> {
    inner: R,
    buf: Vec<u8>,
    declared: u64,
    read: u64,
    done: bool,
    outcome: ReadOutcome,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(inner: R, declared_size: u64, max_chunk_size: usize) -> Self {
        let cap = chunk_capacity(declared_size, max_chunk_size);
        Self {
            inner,
            buf: vec![0u8; cap],
            declared: declared_size,
            read: 0,
            done: false,
            outcome: ReadOutcome::Complete,
        }
    }

    /// Next chunk, or `None` once the stream is exhausted or the declared
    /// size has been reached. The slice is only valid until the next call.
    pub fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        if self.done {
            return Ok(None);
        }

        let remaining = self.declared - self.read;
        if remaining == 0 {
            self.done = true;
            let mut probe = [0u8; 1];
            if fill(&mut self.inner, &mut probe)? > 0 {
                self.outcome = ReadOutcome::Grown {
                    declared: self.declared,
                };
            }
            return Ok(None);
        }

        let want = remaining.min(self.buf.len() as u64) as usize;
        let n = fill(&mut self.inner, &mut self.buf[..want])?;
        if n == 0 {
            self.done = true;
            self.outcome = ReadOutcome::Truncated {
                read: self.read,
                declared: self.declared,
            };
            return Ok(None);
        }

        self.read += n as u64;
        Ok(Some(&self.buf[..n]))
    }

    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    /// Meaningful once `next_chunk` has returned `None`.
    pub fn outcome(&self) -> ReadOutcome {
        self.outcome
    }
}

// Blocking fill in the manner of fread: short only at end of stream.
fn fill<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn drain<R: Read>(r: &mut ChunkReader<R>) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(c) = r.next_chunk().unwrap() {
            out.push(c.to_vec());
        }
        out
    }

    /// Yields one byte per call and fails with `Interrupted` every other call.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        flip: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.flip = !self.flip;
            if self.flip {
                return Err(io::Error::new(ErrorKind::Interrupted, "again"));
            }
            if self.pos >= self.data.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn test_capacity_bounds() {
        assert_eq!(chunk_capacity(10, 1024), 10);
        assert_eq!(chunk_capacity(1 << 40, 1024), 1024);
        assert_eq!(chunk_capacity(1 << 40, usize::MAX), MAX_CHUNK_CEILING);
        assert_eq!(chunk_capacity(0, 1024), 1);
        assert_eq!(chunk_capacity(10, 0), 1);
    }

    #[test]
    fn test_exact_size_is_complete() {
        let data: Vec<u8> = (0..100u8).collect();
        let mut r = ChunkReader::new(Cursor::new(data.clone()), 100, 32);

        let chunks = drain(&mut r);
        let lens: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(lens, vec![32, 32, 32, 4]);
        assert_eq!(chunks.concat(), data);
        assert_eq!(r.bytes_read(), 100);
        assert_eq!(r.outcome(), ReadOutcome::Complete);
    }

    #[test]
    fn test_growth_stops_at_declared_size() {
        let data = vec![7u8; 150];
        let mut r = ChunkReader::new(Cursor::new(data), 100, 64);

        let chunks = drain(&mut r);
        assert_eq!(chunks.concat().len(), 100);
        assert!(chunks.iter().all(|c| c.len() <= 64));
        assert_eq!(r.bytes_read(), 100);
        assert_eq!(r.outcome(), ReadOutcome::Grown { declared: 100 });
    }

    #[test]
    fn test_short_stream_is_truncated() {
        let mut r = ChunkReader::new(Cursor::new(vec![1u8; 40]), 100, 64);

        let chunks = drain(&mut r);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 40);
        assert_eq!(
            r.outcome(),
            ReadOutcome::Truncated {
                read: 40,
                declared: 100
            }
        );
    }

    #[test]
    fn test_empty_stream_has_no_chunks() {
        let mut r = ChunkReader::new(Cursor::new(Vec::new()), 0, 64);
        assert!(drain(&mut r).is_empty());
        assert_eq!(r.outcome(), ReadOutcome::Complete);
    }

    #[test]
    fn test_growth_from_zero_declared() {
        let mut r = ChunkReader::new(Cursor::new(b"late".to_vec()), 0, 64);
        assert!(drain(&mut r).is_empty());
        assert_eq!(r.outcome(), ReadOutcome::Grown { declared: 0 });
    }

    #[test]
    fn test_interrupted_reads_still_fill_chunks() {
        let data: Vec<u8> = (0..20u8).collect();
        let src = Trickle {
            data: data.clone(),
            pos: 0,
            flip: false,
        };
        let mut r = ChunkReader::new(src, 20, 8);

        let chunks = drain(&mut r);
        let lens: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(lens, vec![8, 8, 4]);
        assert_eq!(chunks.concat(), data);
    }

    #[test]
    fn test_no_chunks_after_exhaustion() {
        let mut r = ChunkReader::new(Cursor::new(vec![0u8; 4]), 4, 64);
        drain(&mut r);
        assert!(r.next_chunk().unwrap().is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Chunks concatenate back to the stream, each within the size bound.
        #[test]
        fn prop_chunks_reassemble(
            data in prop::collection::vec(any::<u8>(), 0..2048),
            max in 1usize..300,
        ) {
            let mut r = ChunkReader::new(Cursor::new(data.clone()), data.len() as u64, max);
            let chunks = drain(&mut r);

            prop_assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= max));
            prop_assert_eq!(chunks.concat(), data);
            prop_assert_eq!(r.outcome(), ReadOutcome::Complete);
        }
    }
}
