//! A character-driven state machine turning a byte stream into tokens.

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::number;
use crate::source::{Source, hex_value, is_delimiter, is_eol, is_whitespace};
use crate::token::Token;

bitflags! {
    /// Flags controlling how [`TokenReader::read`] treats its input.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ReadFlags: u32 {
        /// Keep `#` in names as a literal byte instead of decoding `#XX`
        /// escapes.
        const NO_NAME_ESCAPES = 1 << 0;
        /// Return comments as tokens instead of skipping them.
        const RET_COMMENTS = 1 << 1;
        /// Stop at the first line feed, like after a `stream` keyword. Only
        /// whitespace and comments may come before it.
        const END_AT_STREAM = 1 << 2;
    }
}

/// The capacity the token buffer is shrunk back to after each token. Names
/// and keywords may not exceed it, strings and comments grow the buffer as
/// needed.
const MIN_BUFFER_CAPACITY: usize = 32768;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    DictStart,
    ArrayStart,
    ArrayEnd,
    ProcStart,
    ProcEnd,
}

impl Delimiter {
    fn token(self) -> Token {
        match self {
            Self::DictStart => Token::DictStart,
            Self::ArrayStart => Token::ArrayStart,
            Self::ArrayEnd => Token::ArrayEnd,
            Self::ProcStart => Token::ProcStart,
            Self::ProcEnd => Token::ProcEnd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameEscape {
    None,
    /// Saw `#`.
    First,
    /// Saw `#` and the high nibble.
    Second(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringMode {
    Normal,
    /// Saw a CR, a directly following LF belongs to the same line break.
    SkipLf,
    /// Saw a backslash.
    Escape,
    /// Inside an octal escape with `digits` digits read so far.
    Octal { digits: u8, value: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Comment { skip: bool },
    Keyword,
    Name(NameEscape),
    String { depth: u32, mode: StringMode },
    HexString { started: bool, high: Option<u8> },
    /// Saw a `>`.
    DictEnd,
    /// A single-byte delimiter that is emitted once the previous token has
    /// been flushed.
    Pending(Delimiter),
    Eof,
}

/// What the state machine did with the byte it was handed.
enum Step {
    /// The byte was accepted and can be consumed.
    Consume,
    /// The byte wasn't accepted and has to be handed over again.
    Retry,
}

/// A tokenizer for PDF object syntax.
///
/// The reader pulls bytes from a [`Source`] one at a time and never consumes
/// a byte it didn't accept, so after an error the source is positioned at
/// the offending byte.
#[derive(Debug)]
pub struct TokenReader<S> {
    source: S,
    buffer: Vec<u8>,
    state: State,
    state_pos: u64,
    begin_pos: u64,
}

impl<S: Source> TokenReader<S> {
    /// Create a new token reader pulling from `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            buffer: Vec::with_capacity(MIN_BUFFER_CAPACITY),
            state: State::None,
            state_pos: 0,
            begin_pos: 0,
        }
    }

    /// Read the next token.
    ///
    /// Returns `Ok(None)` at the end of the input, and, with
    /// [`ReadFlags::END_AT_STREAM`], once the line feed that starts the
    /// stream data has been consumed. Call [`TokenReader::reset`] to continue
    /// reading after that point.
    pub fn read(&mut self, flags: ReadFlags) -> Result<Option<Token>> {
        let res = self.read_inner(flags);

        if let Err(e) = &res {
            ldebug!("failed to read token at offset {}: {}", self.source.tell(), e);
        }

        res
    }

    fn read_inner(&mut self, flags: ReadFlags) -> Result<Option<Token>> {
        loop {
            if self.state == State::Eof {
                return Ok(None);
            }

            let Some(b) = self.source.peek_byte()? else {
                break;
            };

            let (step, token) = self.handle_byte(flags, b)?;

            if let Step::Consume = step {
                self.source.read_byte()?;
            }

            if let Some(token) = token {
                ltrace!("read {:?} at offset {}", token, self.begin_pos);

                return Ok(Some(token));
            }
        }

        let token = self.exit_state(flags)?;
        self.state = State::Eof;

        Ok(token)
    }

    /// Return an iterator over the remaining tokens.
    ///
    /// The iterator stops after the first error.
    pub fn tokens(&mut self, flags: ReadFlags) -> Tokens<'_, S> {
        Tokens {
            reader: self,
            flags,
            done: false,
        }
    }

    /// The offset in the source at which the most recently returned token
    /// began.
    pub fn begin_pos(&self) -> u64 {
        self.begin_pos
    }

    /// Drop any partially read token and start over at the current position
    /// of the source.
    pub fn reset(&mut self) {
        self.state = State::None;
        self.reset_buffer();
    }

    /// Get a reference to the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Unwrap the underlying source.
    pub fn into_inner(self) -> S {
        self.source
    }

    fn handle_byte(&mut self, flags: ReadFlags, b: u8) -> Result<(Step, Option<Token>)> {
        // First the states that aren't ended by whitespace or delimiters.
        match self.state {
            State::Eof => return Ok((Step::Retry, None)),
            State::String { depth, mode } => return self.string_byte(depth, mode, b),
            State::HexString { started, high } => {
                return self.hex_string_byte(flags, started, high, b);
            }
            State::DictEnd => {
                if b != b'>' {
                    return Err(Error::UnterminatedDict);
                }

                return Ok((Step::Consume, Some(self.finish(Token::DictEnd))));
            }
            State::Comment { skip } => {
                if is_eol(b) {
                    // The line break is handled again in the `None` state.
                    let token = self.exit_state(flags)?;
                    return Ok((Step::Retry, token));
                }

                let skip = skip || !flags.contains(ReadFlags::RET_COMMENTS);
                self.state = State::Comment { skip };

                if !skip {
                    self.store_grow(b)?;
                }

                return Ok((Step::Consume, None));
            }
            State::None | State::Keyword | State::Name(_) | State::Pending(_) => {}
        }

        if is_whitespace(b) {
            if self.state != State::None {
                // Don't consume the byte, so that a CR doesn't get lost for
                // `END_AT_STREAM`.
                let token = self.exit_state(flags)?;
                return Ok((Step::Retry, token));
            }

            if flags.contains(ReadFlags::END_AT_STREAM) && b == b'\n' {
                self.enter(State::Eof);
            }

            return Ok((Step::Consume, None));
        } else if flags.contains(ReadFlags::END_AT_STREAM) && b != b'%' {
            return Err(Error::InvalidCharacter(b));
        }

        if is_delimiter(b) {
            if self.state != State::None {
                let token = self.exit_state(flags)?;
                return Ok((Step::Retry, token));
            }

            let state = match b {
                b'%' => State::Comment { skip: false },
                b'(' => State::String {
                    depth: 0,
                    mode: StringMode::Normal,
                },
                b'/' => State::Name(NameEscape::None),
                b'<' => State::HexString {
                    started: false,
                    high: None,
                },
                b'>' => State::DictEnd,
                // The previous token may have just been flushed, so these
                // are emitted on the next byte.
                b'[' => State::Pending(Delimiter::ArrayStart),
                b']' => State::Pending(Delimiter::ArrayEnd),
                b'{' => State::Pending(Delimiter::ProcStart),
                b'}' => State::Pending(Delimiter::ProcEnd),
                // `)` outside of a string.
                _ => return Err(Error::InvalidCharacter(b)),
            };

            self.enter(state);

            return Ok((Step::Consume, None));
        }

        // A regular character.
        match self.state {
            State::Pending(_) => {
                let token = self.exit_state(flags)?;
                Ok((Step::Retry, token))
            }
            State::Name(escape) => {
                self.name_byte(flags, escape, b)?;
                Ok((Step::Consume, None))
            }
            State::None => {
                // Numbers are treated as keywords until they are flushed.
                self.enter(State::Keyword);
                self.store(b)?;
                Ok((Step::Consume, None))
            }
            _ => {
                self.store(b)?;
                Ok((Step::Consume, None))
            }
        }
    }

    fn name_byte(&mut self, flags: ReadFlags, escape: NameEscape, b: u8) -> Result<()> {
        match escape {
            NameEscape::None => {
                if !(0x21..=0x7e).contains(&b) {
                    return Err(Error::InvalidCharacter(b));
                }

                if b == b'#' && !flags.contains(ReadFlags::NO_NAME_ESCAPES) {
                    self.state = State::Name(NameEscape::First);
                } else {
                    self.store(b)?;
                }
            }
            NameEscape::First => {
                let high = hex_value(b).ok_or(Error::InvalidCharacter(b))?;
                self.state = State::Name(NameEscape::Second(high));
            }
            NameEscape::Second(high) => {
                let low = hex_value(b).ok_or(Error::InvalidCharacter(b))?;
                let decoded = (high << 4) | low;

                // `#00` is forbidden.
                if decoded == 0 {
                    return Err(Error::InvalidCharacter(b));
                }

                self.store(decoded)?;
                self.state = State::Name(NameEscape::None);
            }
        }

        Ok(())
    }

    fn string_byte(&mut self, depth: u32, mode: StringMode, b: u8) -> Result<(Step, Option<Token>)> {
        match mode {
            StringMode::Normal => {}
            StringMode::SkipLf => {
                self.state = State::String {
                    depth,
                    mode: StringMode::Normal,
                };

                if b == b'\n' {
                    return Ok((Step::Consume, None));
                }
            }
            StringMode::Escape => {
                let mut next = StringMode::Normal;

                match b {
                    b'b' => self.store_grow(0x08)?,
                    b'f' => self.store_grow(0x0c)?,
                    b'n' => self.store_grow(b'\n')?,
                    b'r' => self.store_grow(b'\r')?,
                    b't' => self.store_grow(b'\t')?,
                    // An escaped line break is ignored.
                    b'\n' => {}
                    b'\r' => next = StringMode::SkipLf,
                    b'0'..=b'7' => {
                        next = StringMode::Octal {
                            digits: 1,
                            value: b - b'0',
                        };
                    }
                    // Including `(`, `)` and `\`.
                    _ => self.store_grow(b)?,
                }

                self.state = State::String { depth, mode: next };

                return Ok((Step::Consume, None));
            }
            StringMode::Octal { digits, value } => {
                if (b'0'..=b'7').contains(&b) {
                    // High-order overflow is ignored.
                    let value = (value << 3) | (b - b'0');

                    let mode = if digits == 2 {
                        self.store_grow(value)?;
                        StringMode::Normal
                    } else {
                        StringMode::Octal {
                            digits: digits + 1,
                            value,
                        }
                    };

                    self.state = State::String { depth, mode };

                    return Ok((Step::Consume, None));
                }

                // The escape ended early, `b` is a regular string byte.
                self.store_grow(value)?;
                self.state = State::String {
                    depth,
                    mode: StringMode::Normal,
                };
            }
        }

        let (depth, mode) = match b {
            b'\\' => (depth, StringMode::Escape),
            b')' if depth == 0 => {
                let token = Token::String(self.buffer.clone());
                return Ok((Step::Consume, Some(self.finish(token))));
            }
            b'\r' => {
                self.store_grow(b'\n')?;
                (depth, StringMode::SkipLf)
            }
            b'(' => {
                self.store_grow(b)?;
                (depth + 1, StringMode::Normal)
            }
            b')' => {
                self.store_grow(b)?;
                (depth - 1, StringMode::Normal)
            }
            _ => {
                self.store_grow(b)?;
                (depth, StringMode::Normal)
            }
        };

        self.state = State::String { depth, mode };

        Ok((Step::Consume, None))
    }

    fn hex_string_byte(
        &mut self,
        flags: ReadFlags,
        started: bool,
        high: Option<u8>,
        b: u8,
    ) -> Result<(Step, Option<Token>)> {
        if !started && b == b'<' {
            // This was the start of a dictionary.
            self.state = State::Pending(Delimiter::DictStart);
            let token = self.exit_state(flags)?;

            return Ok((Step::Consume, token));
        }

        if is_whitespace(b) {
            self.state = State::HexString {
                started: true,
                high,
            };

            return Ok((Step::Consume, None));
        }

        if b == b'>' {
            // A missing final digit is assumed to be 0.
            if let Some(high) = high {
                self.store_grow(high << 4)?;
            }

            let token = Token::String(self.buffer.clone());

            return Ok((Step::Consume, Some(self.finish(token))));
        }

        let digit = hex_value(b).ok_or(Error::InvalidCharacter(b))?;

        let high = match high {
            Some(high) => {
                self.store_grow((high << 4) | digit)?;
                None
            }
            None => Some(digit),
        };

        self.state = State::HexString {
            started: true,
            high,
        };

        Ok((Step::Consume, None))
    }

    fn enter(&mut self, state: State) {
        self.state = state;
        self.state_pos = self.source.tell();
    }

    /// Finish the token of the current state and return to the `None` state.
    fn exit_state(&mut self, flags: ReadFlags) -> Result<Option<Token>> {
        let token = match self.state {
            State::None | State::Eof => return Ok(None),
            State::Comment { skip } => {
                if skip || !flags.contains(ReadFlags::RET_COMMENTS) {
                    self.reset_buffer();
                    self.state = State::None;

                    return Ok(None);
                }

                Token::Comment(self.buffer.clone())
            }
            State::Keyword => {
                number::recognize(&self.buffer).unwrap_or_else(|| Token::Keyword(self.buffer.clone()))
            }
            State::Name(NameEscape::None) => Token::Name(self.buffer.clone()),
            State::Name(_) => return Err(Error::UnterminatedName),
            State::String { .. } => return Err(Error::UnterminatedString),
            State::HexString { .. } => return Err(Error::UnterminatedHexString),
            State::DictEnd => return Err(Error::UnterminatedDict),
            State::Pending(delimiter) => delimiter.token(),
        };

        Ok(Some(self.finish(token)))
    }

    fn finish(&mut self, token: Token) -> Token {
        self.begin_pos = self.state_pos;
        self.reset_buffer();
        self.state = State::None;

        token
    }

    fn reset_buffer(&mut self) {
        self.buffer.clear();

        if self.buffer.capacity() > MIN_BUFFER_CAPACITY {
            self.buffer.shrink_to(MIN_BUFFER_CAPACITY);
        }
    }

    /// Store a byte of a keyword or name, which may not exceed the minimum
    /// buffer capacity.
    fn store(&mut self, b: u8) -> Result<()> {
        if self.buffer.len() >= MIN_BUFFER_CAPACITY {
            return Err(Error::BufferExhausted);
        }

        self.buffer.push(b);

        Ok(())
    }

    /// Store a byte of a string or comment, growing the buffer if necessary.
    fn store_grow(&mut self, b: u8) -> Result<()> {
        self.buffer
            .try_reserve(1)
            .map_err(|_| Error::BufferExhausted)?;
        self.buffer.push(b);

        Ok(())
    }
}

/// An iterator over the tokens of a [`TokenReader`].
#[derive(Debug)]
pub struct Tokens<'a, S> {
    reader: &'a mut TokenReader<S>,
    flags: ReadFlags,
    done: bool,
}

impl<S: Source> Iterator for Tokens<'_, S> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let res = self.reader.read(self.flags).transpose();

        if !matches!(res, Some(Ok(_))) {
            self.done = true;
        }

        res
    }
}
