use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use super::Error;

/// How many of the most recently consumed bytes are kept around, and so how
/// far back the stream can be rewound.
pub const REWIND_WINDOW: usize = 64;

/// A forward-only byte stream with a small rewind window.
///
/// Gzip streams cannot seek, so the bytes handed out last are retained and
/// replayed after a rewind before anything new is read from the inner
/// reader.
pub struct ByteStream<R> {
    inner: R,

    /// Bytes handed out most recently, oldest first.
    history: VecDeque<u8>,
    /// Rewound bytes waiting to be handed out again.
    pending: VecDeque<u8>,

    offset: u64,
}

impl<R: Read> ByteStream<R> {
    pub fn new(inner: R) -> Self {
        ByteStream {
            inner,
            history: VecDeque::with_capacity(REWIND_WINDOW),
            pending: VecDeque::new(),
            offset: 0,
        }
    }

    /// Absolute offset of the next byte to be read.
    #[inline]
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Reads exactly `buf.len()` bytes.
    ///
    /// Returns `Error::Eof` if the stream ends first, no matter how many
    /// bytes were already copied, and `Error::Io` on any other failure.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let replayed = self.pending.len().min(buf.len());
        for (dst, src) in buf.iter_mut().zip(self.pending.drain(..replayed)) {
            *dst = src;
        }

        let mut filled = replayed;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(Error::Eof),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Err(Error::Eof),
                Err(err) => return Err(Error::Io(err)),
            }
        }

        self.remember(buf);
        self.offset += buf.len() as u64;

        Ok(())
    }

    /// Reads `length` bytes into a freshly allocated buffer.
    pub fn read_vec(&mut self, length: usize) -> Result<Vec<u8>, Error> {
        let mut buf = vec![0; length];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Moves the cursor back by `n` bytes, they will be read again.
    pub fn rewind(&mut self, n: usize) -> Result<(), Error> {
        if n > self.history.len() {
            return Err(Error::Rewind {
                requested: n,
                available: self.history.len(),
            });
        }

        for _ in 0..n {
            if let Some(b) = self.history.pop_back() {
                self.pending.push_front(b);
            }
        }
        self.offset -= n as u64;

        Ok(())
    }

    fn remember(&mut self, buf: &[u8]) {
        let keep = &buf[buf.len().saturating_sub(REWIND_WINDOW)..];
        let overflow = (self.history.len() + keep.len()).saturating_sub(REWIND_WINDOW);
        self.history.drain(..overflow);
        self.history.extend(keep);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk on fire"))
        }
    }

    /// Hands out one byte per read call, like a slow decoder might.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.0.split_first() {
                Some((first, rest)) if !buf.is_empty() => {
                    buf[0] = *first;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn rewind_replays() {
        let data = (0u8..32).collect::<Vec<_>>();
        let mut stream = ByteStream::new(Cursor::new(data));

        let mut buf = [0u8; 16];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(stream.position(), 16);

        stream.rewind(15).unwrap();
        assert_eq!(stream.position(), 1);

        stream.read_exact(&mut buf).unwrap();
        assert_eq!(buf[0], 1);
        assert_eq!(buf[15], 16);
        assert_eq!(stream.position(), 17);
    }

    #[test]
    fn rewind_beyond_window() {
        let mut stream = ByteStream::new(Cursor::new(vec![0u8; 256]));
        stream.read_vec(200).unwrap();

        stream.rewind(REWIND_WINDOW).unwrap();
        let err = stream.rewind(1).unwrap_err();
        assert!(matches!(
            err,
            Error::Rewind {
                requested: 1,
                available: 0
            }
        ));
    }

    #[test]
    fn partial_read_at_end_is_eof() {
        let mut stream = ByteStream::new(Cursor::new(vec![9u8; 10]));
        let err = stream.read_vec(16).unwrap_err();
        assert!(matches!(err, Error::Eof));

        let mut stream = ByteStream::new(Cursor::new(Vec::<u8>::new()));
        assert!(matches!(stream.read_vec(1).unwrap_err(), Error::Eof));
    }

    #[test]
    fn read_error() {
        let mut stream = ByteStream::new(Broken);
        let err = stream.read_vec(4).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn short_reads_are_stitched() {
        let data = [1, 2, 3, 4, 5, 6];
        let mut stream = ByteStream::new(Trickle(&data));

        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);

        stream.rewind(2).unwrap();
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [3, 4, 5, 6]);
    }
}
