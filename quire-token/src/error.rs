//! Error types for reading and writing PDF tokens.

use std::fmt;
use std::io;

/// A specialized [`Result`] type for tokenizer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// An error encountered while reading or writing a token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A byte that is not allowed at this point, like a non-hex digit in a
    /// hex string, a control byte in a name or a stray `)`.
    InvalidCharacter(u8),
    /// The input ended inside a literal string.
    UnterminatedString,
    /// The input ended inside a hex string.
    UnterminatedHexString,
    /// A `>` that wasn't followed by a second `>`.
    UnterminatedDict,
    /// The input ended inside a `#XX` escape of a name.
    UnterminatedName,
    /// A token didn't fit into the token buffer.
    BufferExhausted,
    /// A token that can't be represented in PDF syntax was handed to the
    /// writer.
    BadToken,
    /// The underlying stream failed.
    Io(io::ErrorKind),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCharacter(b) => write!(f, "invalid character 0x{b:02x}"),
            Self::UnterminatedString => f.write_str("unterminated string"),
            Self::UnterminatedHexString => f.write_str("unterminated hex string"),
            Self::UnterminatedDict => f.write_str("unterminated dictionary end marker"),
            Self::UnterminatedName => f.write_str("unterminated name escape"),
            Self::BufferExhausted => f.write_str("token buffer exhausted"),
            Self::BadToken => f.write_str("token can't be written"),
            Self::Io(kind) => write!(f, "I/O error: {kind}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err.kind())
    }
}
