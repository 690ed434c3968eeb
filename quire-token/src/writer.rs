//! Serialization of tokens back into PDF syntax.

use std::io::Write;

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::source::{is_eol, is_regular};
use crate::token::Token;

bitflags! {
    /// Flags controlling how [`TokenWriter::write`] serializes tokens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WriteFlags: u32 {
        /// Reject names that would need `#XX` escapes instead of writing
        /// the escapes.
        const NO_NAME_ESCAPES = 1 << 0;
        /// Always write strings as hex strings.
        const HEX_STRINGS = 1 << 3;
        /// Escape control characters (and non-ASCII bytes, unless the string
        /// is valid UTF-8) in literal strings.
        const READABLE_STRINGS = 1 << 4;
    }
}

/// The default maximum line length, as recommended for PDF files.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 255;

/// A writer that serializes [`Token`]s into PDF syntax, inserting whitespace
/// and line breaks where needed.
#[derive(Debug)]
pub struct TokenWriter<W> {
    inner: W,
    line_length: usize,
    max_line_length: usize,
    /// Whether the last written byte was a regular character.
    in_keyword: bool,
}

impl<W: Write> TokenWriter<W> {
    /// Create a new token writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            line_length: 0,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            in_keyword: false,
        }
    }

    /// Set the length after which lines are broken. `0` disables line
    /// breaking.
    pub fn set_max_line_length(&mut self, max_line_length: usize) {
        self.max_line_length = max_line_length;
    }

    /// Forget about the current line, like at the start of a new stream.
    pub fn reset(&mut self) {
        self.line_length = 0;
        self.in_keyword = false;
    }

    /// Get a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Write a single token.
    pub fn write(&mut self, flags: WriteFlags, token: &Token) -> Result<()> {
        match token {
            Token::Integer(i) => {
                let text = i.to_string();
                self.start_token(true, text.len())?;
                self.emit(text.as_bytes())
            }
            Token::Real(r) => {
                let text = format_real(*r)?;
                self.start_token(true, text.len())?;
                self.emit(text.as_bytes())
            }
            Token::String(data) => self.write_string(flags, data),
            Token::Name(data) => self.write_name(flags, data),
            Token::Keyword(data) => {
                if data.contains(&0) {
                    return Err(Error::BadToken);
                }

                self.start_token(true, data.len())?;
                self.emit(data)
            }
            Token::Comment(data) => {
                // A comment can't span multiple lines.
                if data.iter().copied().any(is_eol) {
                    return Err(Error::BadToken);
                }

                self.start_token(false, data.len() + 1)?;
                self.emit(b"%")?;
                self.emit(data)?;
                self.emit(b"\n")
            }
            Token::DictStart => self.write_delimiter(b"<<"),
            Token::DictEnd => self.write_delimiter(b">>"),
            Token::ArrayStart => self.write_delimiter(b"["),
            Token::ArrayEnd => self.write_delimiter(b"]"),
            Token::ProcStart => self.write_delimiter(b"{"),
            Token::ProcEnd => self.write_delimiter(b"}"),
        }
    }

    fn write_delimiter(&mut self, delimiter: &[u8]) -> Result<()> {
        self.start_token(false, delimiter.len())?;
        self.emit(delimiter)
    }

    /// Separate the next token from the previous one if needed: numbers and
    /// keywords must not run into a previous regular character, and a token
    /// that doesn't fit on the current line starts a new one.
    fn start_token(&mut self, need_space: bool, len: usize) -> Result<()> {
        let add_space = need_space && self.in_keyword;
        let len = len + usize::from(add_space);

        if self.max_line_length > 0
            && self.line_length > 0
            && self.line_length + len > self.max_line_length
        {
            self.emit(b"\n")
        } else if add_space {
            self.emit(b" ")
        } else {
            Ok(())
        }
    }

    fn emit(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data)?;

        for &b in data {
            if is_eol(b) {
                self.line_length = 0;
            } else {
                self.line_length += 1;
            }
        }

        if let Some(&last) = data.last() {
            self.in_keyword = is_regular(last);
        }

        Ok(())
    }

    fn write_name(&mut self, flags: WriteFlags, data: &[u8]) -> Result<()> {
        let mut out = Vec::with_capacity(data.len() + 1);
        out.push(b'/');

        for &b in data {
            if b == 0 {
                return Err(Error::BadToken);
            }

            let mut escape = !is_regular(b);

            if flags.contains(WriteFlags::NO_NAME_ESCAPES) {
                if escape {
                    return Err(Error::BadToken);
                }
            } else {
                escape |= b == b'#' || !(0x21..0x7f).contains(&b);
            }

            if escape {
                out.extend_from_slice(&[b'#', hex_digit(b >> 4), hex_digit(b & 0xf)]);
            } else {
                out.push(b);
            }
        }

        self.start_token(false, out.len())?;
        self.emit(&out)?;
        // An empty name ends in `/`, but it still can't be followed by a
        // regular character.
        self.in_keyword = true;

        Ok(())
    }

    fn write_string(&mut self, flags: WriteFlags, data: &[u8]) -> Result<()> {
        let scan = StringScan::new(flags, data);

        if flags.contains(WriteFlags::HEX_STRINGS) || scan.escaped_len > data.len() * 2 {
            return self.write_hex_string(data);
        }

        // The exact length doesn't matter much, long strings are split.
        self.start_token(false, (data.len() + 2).min(20))?;

        let mut out = Vec::with_capacity(data.len() + 2);
        let mut line_length = self.line_length;
        push_tracked(&mut out, &mut line_length, b"(");

        for (pos, &b) in data.iter().enumerate() {
            let mut escaped = [b'\\', 0, 0, 0];

            let piece: &[u8] = if scan.should_escape(pos, b) {
                let len = escape_string_byte(b, data.get(pos + 1).copied(), &mut escaped);
                &escaped[..len]
            } else {
                &data[pos..pos + 1]
            };

            // The line can't be filled up completely, there must be room for
            // the backslash of the continuation.
            if self.max_line_length > 0
                && !is_eol(piece[0])
                && line_length + piece.len() >= self.max_line_length
            {
                push_tracked(&mut out, &mut line_length, b"\\\n");
            }

            push_tracked(&mut out, &mut line_length, piece);
        }

        out.push(b')');
        self.emit(&out)
    }

    fn write_hex_string(&mut self, data: &[u8]) -> Result<()> {
        self.start_token(false, (data.len() * 2 + 2).min(20))?;

        let mut out = Vec::with_capacity(data.len() * 2 + 2);
        let mut line_length = self.line_length;
        push_tracked(&mut out, &mut line_length, b"<");

        for (pos, &b) in data.iter().enumerate() {
            if self.max_line_length > 0 && line_length + 2 > self.max_line_length {
                push_tracked(&mut out, &mut line_length, b"\n");
            }

            // A missing final digit is read back as 0.
            if pos + 1 == data.len() && b & 0xf == 0 {
                push_tracked(&mut out, &mut line_length, &[hex_digit(b >> 4)]);
            } else {
                push_tracked(
                    &mut out,
                    &mut line_length,
                    &[hex_digit(b >> 4), hex_digit(b & 0xf)],
                );
            }
        }

        out.push(b'>');
        self.emit(&out)
    }
}

/// Which bytes of a literal string need escaping, and how long the escaped
/// string will be.
struct StringScan {
    flags: WriteFlags,
    utf8: bool,
    /// Positions of parentheses without a partner, in ascending order.
    unbalanced: Vec<usize>,
    escaped_len: usize,
}

impl StringScan {
    fn new(flags: WriteFlags, data: &[u8]) -> Self {
        let mut open = vec![];
        let mut unbalanced = vec![];

        for (pos, &b) in data.iter().enumerate() {
            match b {
                b'(' => open.push(pos),
                b')' => {
                    if open.pop().is_none() {
                        unbalanced.push(pos);
                    }
                }
                _ => {}
            }
        }

        // An unmatched `)` empties the stack, so every `(` that is still open
        // comes after it.
        unbalanced.extend(open);

        let mut scan = Self {
            flags,
            utf8: flags.contains(WriteFlags::READABLE_STRINGS) && std::str::from_utf8(data).is_ok(),
            unbalanced,
            escaped_len: 0,
        };

        scan.escaped_len = data
            .iter()
            .enumerate()
            .map(|(pos, &b)| {
                if scan.should_escape(pos, b) {
                    escaped_len(b, data.get(pos + 1).copied())
                } else {
                    1
                }
            })
            .sum();

        scan
    }

    fn should_escape(&self, pos: usize, b: u8) -> bool {
        match b {
            b'\\' | b'\r' => true,
            b'(' | b')' => self.unbalanced.binary_search(&pos).is_ok(),
            _ => {
                self.flags.contains(WriteFlags::READABLE_STRINGS)
                    && (b == 0x7f || (b < 0x20 && b != b'\n') || (b >= 0x80 && !self.utf8))
            }
        }
    }
}

/// The number of octal digits needed to escape `b`, given the byte that
/// follows it.
fn octal_digits(b: u8, next: Option<u8>) -> usize {
    if next.is_some_and(|n| n.is_ascii_digit()) || b >= 0o100 {
        3
    } else if b >= 0o10 {
        2
    } else {
        1
    }
}

fn escaped_len(b: u8, next: Option<u8>) -> usize {
    match b {
        0x08 | b'\t' | b'\n' | 0x0c | b'\r' | b'(' | b')' | b'\\' => 2,
        _ => 1 + octal_digits(b, next),
    }
}

/// Write the escape sequence for `b` into `out`, which already starts with a
/// backslash. Returns the length of the sequence.
fn escape_string_byte(b: u8, next: Option<u8>, out: &mut [u8; 4]) -> usize {
    out[1] = match b {
        0x08 => b'b',
        b'\t' => b't',
        b'\n' => b'n',
        0x0c => b'f',
        b'\r' => b'r',
        b'(' | b')' | b'\\' => b,
        _ => {
            let digits = octal_digits(b, next);

            for i in 0..digits {
                let shift = 3 * (digits - 1 - i);
                out[1 + i] = b'0' + ((b >> shift) & 0o7);
            }

            return 1 + digits;
        }
    };

    2
}

fn push_tracked(out: &mut Vec<u8>, line_length: &mut usize, data: &[u8]) {
    for &b in data {
        if is_eol(b) {
            *line_length = 0;
        } else {
            *line_length += 1;
        }
    }

    out.extend_from_slice(data);
}

fn hex_digit(value: u8) -> u8 {
    b"0123456789ABCDEF"[usize::from(value & 0xf)]
}

/// Format a real with a decimal point but without trailing zeros, like `1.5`
/// or `2.`.
///
/// The shortest representation that reads back as the same `f32` is used,
/// so small values like `1e-7` keep all of their digits instead of being
/// rounded to a fixed number of decimals.
fn format_real(value: f32) -> Result<String> {
    if !value.is_finite() {
        return Err(Error::BadToken);
    }

    // `Display` for floats never uses an exponent.
    let mut text = value.to_string();

    if !text.contains('.') {
        text.push('.');
    }

    Ok(text)
}
