//! Re-entrant in-memory byte streams.

use bytes::Bytes;
use std::io::{self, Read};

/// A byte stream that rewinds itself when fully consumed.
///
/// Reading to EOF yields `Ok(0)` once and resets the cursor, so the next
/// consumer reads the full content again. Clones share the underlying buffer
/// but keep their own cursor, which makes a stream safe to hand to several
/// concurrent bundlers.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_pack::bundler::ReplayStream;
/// use std::io::Read;
///
/// let mut stream = ReplayStream::new(&b"icon"[..]);
/// let mut first = Vec::new();
/// stream.read_to_end(&mut first).unwrap();
/// let mut second = Vec::new();
/// stream.read_to_end(&mut second).unwrap();
/// assert_eq!(first, second);
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReplayStream {
    data: Bytes,
    pos: usize,
}

impl ReplayStream {
    /// Wraps `data` with the cursor at the start.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// The full content, independent of the cursor.
    pub fn contents(&self) -> Bytes {
        self.data.clone()
    }

    /// Total length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the stream holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Read for ReplayStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.data[self.pos..];
        if remaining.is_empty() {
            self.pos = 0;
            return Ok(0);
        }
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl From<Vec<u8>> for ReplayStream {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<Bytes> for ReplayStream {
    fn from(data: Bytes) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_reads_repeat_identically() {
        let mut stream = ReplayStream::new(vec![7u8; 10_000]);
        let mut first = Vec::new();
        let mut second = Vec::new();
        stream.read_to_end(&mut first).expect("read");
        stream.read_to_end(&mut second).expect("read");
        assert_eq!(first.len(), 10_000);
        assert_eq!(first, second);
    }

    #[test]
    fn partial_read_then_eof_rewinds() {
        let mut stream = ReplayStream::new(&b"abcdef"[..]);
        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).expect("read"), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(stream.read(&mut buf).expect("read"), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(stream.read(&mut buf).expect("read"), 0);
        assert_eq!(stream.read(&mut buf).expect("read"), 4);
        assert_eq!(&buf, b"abcd");
    }

    #[test]
    fn clones_keep_independent_cursors() {
        let mut a = ReplayStream::new(&b"xyz"[..]);
        let mut byte = [0u8; 1];
        a.read_exact(&mut byte).expect("read");
        let mut b = a.clone();
        let mut rest = Vec::new();
        a.read_to_end(&mut rest).expect("read");
        assert_eq!(rest, b"yz");

        let mut whole = Vec::new();
        b.pos = 0;
        b.read_to_end(&mut whole).expect("read");
        assert_eq!(whole, b"xyz");
        assert_eq!(b.contents(), Bytes::from_static(b"xyz"));
    }

    #[test]
    fn contents_is_independent_of_cursor_with_read_in_scope() {
        let mut stream = ReplayStream::new(&b"payload"[..]);
        let mut head = [0u8; 3];
        stream.read_exact(&mut head).expect("read");

        let owned = stream.clone();
        assert_eq!(owned.contents(), Bytes::from_static(b"payload"));
        assert_eq!(stream.contents().len(), stream.len());
    }
}
