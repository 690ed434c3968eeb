/*!
A streaming tokenizer for PDF object syntax.

This crate turns a byte stream into the lexical tokens of PDF files (numbers,
strings, names, keywords, comments and the `<<`, `>>`, `[`, `]`, `{`, `}`
delimiters) without building any objects from them. Input is pulled one byte
at a time from a [`Source`], so the reader works equally well on in-memory
slices and on buffered readers.

The reverse direction is covered by [`TokenWriter`], which serializes tokens
while taking care of separating whitespace, escapes and line lengths.

```
use quire_token::{ReadFlags, SliceSource, Token, TokenReader};

let mut reader = TokenReader::new(SliceSource::new(b"<< /Length 3 >>"));
let tokens: Vec<Token> = reader
    .tokens(ReadFlags::empty())
    .collect::<Result<_, _>>()
    .unwrap();

assert_eq!(tokens[1], Token::Name(b"Length".to_vec()));
assert_eq!(tokens[2], Token::Integer(3));
```

## Cargo features
- `logging`: Report malformed input through the `log` crate.

## Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

#[macro_use]
mod log;

mod error;
mod number;
mod reader;
mod source;
mod token;
mod writer;

pub use error::{Error, Result};
pub use reader::{ReadFlags, TokenReader, Tokens};
pub use source::{IoSource, SliceSource, Source};
pub use token::Token;
pub use writer::{DEFAULT_MAX_LINE_LENGTH, TokenWriter, WriteFlags};
