//! Copy, transfer and stringify helpers over byte regions
//!
//! None of these helpers keep state of their own. `LineBuffer` is the only
//! owning type here: a bounded accumulator that each decoder keeps for
//! itself, so partially received lines survive between reads.
use std::borrow::Cow;
use std::cmp::min;

use netbuf::Buf;


/// Line did not fit into the configured limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow;

/// Bounded accumulator for CRLF-terminated lines
///
/// Bytes are scanned one by one, so a line may be split across any number
/// of reads. A bare `\n` also terminates a line, a trailing `\r` is
/// stripped from the resulting line.
pub struct LineBuffer {
    buf: Buf,
    limit: usize,
    complete: bool,
}

impl LineBuffer {
    /// Creates a line buffer that fails on lines longer than `limit` bytes
    /// (not counting the line terminator)
    pub fn new(limit: usize) -> LineBuffer {
        LineBuffer {
            buf: Buf::new(),
            limit: limit,
            complete: false,
        }
    }

    /// Consumes bytes from `data` until a line terminator is found
    ///
    /// Returns number of bytes consumed. Check `is_complete()` to find out
    /// whether the whole line is accumulated.
    pub fn feed(&mut self, data: &[u8]) -> Result<usize, Overflow> {
        debug_assert!(!self.complete, "line must be taken before feeding");
        for (idx, &byte) in data.iter().enumerate() {
            if byte == b'\n' {
                if self.buf.len() > 0 && self.buf[self.buf.len()-1] == b'\r'
                {
                    let len = self.buf.len();
                    self.buf.remove_range(len-1..len);
                }
                if self.buf.len() > self.limit {
                    return Err(Overflow);
                }
                self.complete = true;
                return Ok(idx + 1);
            }
            // one spare byte is kept for the '\r' which is stripped later
            if self.buf.len() > self.limit {
                return Err(Overflow);
            }
            self.buf.extend(&[byte]);
        }
        if self.buf.len() > self.limit &&
            self.buf[self.buf.len()-1] != b'\r'
        {
            return Err(Overflow);
        }
        Ok(data.len())
    }

    /// True when the line terminator has been seen
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The accumulated line without the terminator
    pub fn line(&self) -> &[u8] {
        &self.buf[..]
    }

    /// Number of bytes accumulated so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Forget the current line
    pub fn clear(&mut self) {
        clear(&mut self.buf);
        self.complete = false;
    }
}

/// Copies as many bytes as fit from `src` into `dst`
///
/// Returns the number of bytes copied.
pub fn copy(src: &[u8], dst: &mut [u8]) -> usize {
    let n = min(src.len(), dst.len());
    dst[..n].copy_from_slice(&src[..n]);
    n
}

/// Copies consecutive regions into `dst` until it's full
///
/// Returns the number of bytes copied.
pub fn gather<'a, I>(regions: I, dst: &mut [u8]) -> usize
    where I: IntoIterator<Item=&'a [u8]>
{
    let mut filled = 0;
    for region in regions {
        if filled == dst.len() {
            break;
        }
        filled += copy(region, &mut dst[filled..]);
    }
    filled
}

/// Moves up to `max` bytes from the head of `src` into a new vector
pub fn transfer(src: &mut Buf, max: usize) -> Vec<u8> {
    let n = min(src.len(), max);
    let result = src[..n].to_vec();
    src.consume(n);
    result
}

/// Empties the buffer
pub fn clear(buf: &mut Buf) {
    let len = buf.len();
    buf.consume(len);
}

/// Converts bytes to a string for diagnostics, replacing invalid utf-8
pub fn stringify(data: &[u8]) -> Cow<str> {
    String::from_utf8_lossy(data)
}

/// Strips leading and trailing whitespace
pub fn trim(mut x: &[u8]) -> &[u8] {
    while x.len() > 0 && matches!(x[0], b'\r' | b'\n' | b' ' | b'\t') {
        x = &x[1..];
    }
    while x.len() > 0 && matches!(x[x.len()-1],  b'\r' | b'\n' | b' ' | b'\t')
    {
        x = &x[..x.len()-1];
    }
    return x;
}

#[cfg(test)]
mod test {
    use netbuf::Buf;
    use super::{LineBuffer, Overflow, copy, gather, transfer, trim};

    #[test]
    fn line_in_one_piece() {
        let mut line = LineBuffer::new(100);
        assert_eq!(line.feed(b"GET / HTTP/1.1\r\nHost"), Ok(16));
        assert!(line.is_complete());
        assert_eq!(line.line(), b"GET / HTTP/1.1");
        line.clear();
        assert_eq!(line.len(), 0);
    }

    #[test]
    fn line_split() {
        let mut line = LineBuffer::new(100);
        assert_eq!(line.feed(b"Host: exa"), Ok(9));
        assert!(!line.is_complete());
        assert_eq!(line.feed(b"mple.com\r"), Ok(9));
        assert!(!line.is_complete());
        assert_eq!(line.feed(b"\n"), Ok(1));
        assert_eq!(line.line(), b"Host: example.com");
    }

    #[test]
    fn bare_newline() {
        let mut line = LineBuffer::new(100);
        assert_eq!(line.feed(b"abc\ndef"), Ok(4));
        assert_eq!(line.line(), b"abc");
    }

    #[test]
    fn limit_exact() {
        let mut line = LineBuffer::new(3);
        assert_eq!(line.feed(b"abc\r"), Ok(4));
        assert_eq!(line.feed(b"\n"), Ok(1));
        assert_eq!(line.line(), b"abc");
    }

    #[test]
    fn limit_exceeded() {
        let mut line = LineBuffer::new(3);
        assert_eq!(line.feed(b"ab"), Ok(2));
        assert_eq!(line.feed(b"cd"), Err(Overflow));
    }

    #[test]
    fn copy_and_gather() {
        let mut dst = [0u8; 5];
        assert_eq!(copy(b"abcdefgh", &mut dst), 5);
        assert_eq!(&dst, b"abcde");
        let mut dst = [0u8; 5];
        let parts: Vec<&[u8]> = vec![b"ab", b"", b"cd", b"ef"];
        assert_eq!(gather(parts, &mut dst), 5);
        assert_eq!(&dst, b"abcde");
    }

    #[test]
    fn transfer_head() {
        let mut buf = Buf::new();
        buf.extend(b"hello world");
        assert_eq!(transfer(&mut buf, 5), b"hello");
        assert_eq!(&buf[..], b" world");
        assert_eq!(transfer(&mut buf, 100), b" world");
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn trim_whitespace() {
        assert_eq!(trim(b"  13\r\n"), b"13");
        assert_eq!(trim(b"\t"), b"");
    }
}
