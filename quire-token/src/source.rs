//! Byte sources the token reader pulls from.

use std::io::BufRead;

use crate::error::Result;

/// A pull-based byte stream with one byte of lookahead.
pub trait Source {
    /// Return the next byte without consuming it, or `None` at the end of
    /// the stream.
    fn peek_byte(&mut self) -> Result<Option<u8>>;

    /// Consume and return the next byte, or `None` at the end of the stream.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    /// The offset of the next byte, counted from the start of the stream.
    fn tell(&self) -> u64;
}

/// A source over an in-memory byte slice.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> SliceSource<'a> {
    /// Create a new source over the given bytes.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// The bytes that haven't been consumed yet.
    #[inline]
    pub fn tail(&self) -> &'a [u8] {
        self.data.get(self.offset..).unwrap_or_default()
    }
}

impl Source for SliceSource<'_> {
    #[inline]
    fn peek_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.data.get(self.offset).copied())
    }

    #[inline]
    fn read_byte(&mut self) -> Result<Option<u8>> {
        let b = self.data.get(self.offset).copied();

        if b.is_some() {
            self.offset += 1;
        }

        Ok(b)
    }

    #[inline]
    fn tell(&self) -> u64 {
        self.offset as u64
    }
}

/// A source over any buffered reader.
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
    pos: u64,
}

impl<R: BufRead> IoSource<R> {
    /// Create a new source reading from `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> Source for IoSource<R> {
    fn peek_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.inner.fill_buf()?.first().copied())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let b = self.peek_byte()?;

        if b.is_some() {
            self.inner.consume(1);
            self.pos += 1;
        }

        Ok(b)
    }

    fn tell(&self) -> u64 {
        self.pos
    }
}

#[inline(always)]
pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, 0x00 | 0x09 | 0x0a | 0x0c | 0x0d | 0x20)
}

#[inline(always)]
pub(crate) fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

#[inline(always)]
pub(crate) fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !is_delimiter(b)
}

#[inline(always)]
pub(crate) fn is_eol(b: u8) -> bool {
    matches!(b, 0x0a | 0x0d)
}

#[inline(always)]
pub(crate) fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}
