//! Print the tokens of a PDF file, or re-serialize them with `--rewrite`.

#![allow(missing_docs)]

use quire_token::{
    ReadFlags, SliceSource, Source, Token, TokenReader, TokenWriter, WriteFlags,
};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;

fn main() {
    let mut args = env::args().skip(1);
    let mut rewrite = false;

    let path = match args.next() {
        Some(a) if a == "--rewrite" => {
            rewrite = true;
            args.next()
        }
        other => other,
    };

    let Some(path) = path else {
        eprintln!("Usage: tokenize [--rewrite] <file>");
        process::exit(1);
    };

    let data = match fs::read(&path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            process::exit(1);
        }
    };

    let mut reader = TokenReader::new(SliceSource::new(&data));
    let mut writer = TokenWriter::new(io::stdout().lock());
    // Offset of the reader's input within the file.
    let mut base = 0;

    loop {
        match reader.read(ReadFlags::RET_COMMENTS) {
            Ok(Some(token)) => {
                if rewrite {
                    if let Err(e) = writer.write(WriteFlags::READABLE_STRINGS, &token) {
                        eprintln!("Error writing {token:?}: {e}");
                    }
                } else {
                    print_token(base + reader.begin_pos(), &token);
                }

                // Skip over the stream data, it isn't made of tokens.
                if token.is_keyword(b"stream") {
                    base += skip_stream(&mut reader);
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("Error at offset {}: {e}", base + reader.begin_pos());
                break;
            }
        }
    }

    let _ = writer.into_inner().write_all(b"\n");
}

/// Move the reader to the `endstream` keyword and return how many bytes
/// were skipped.
fn skip_stream(reader: &mut TokenReader<SliceSource<'_>>) -> u64 {
    if reader.read(ReadFlags::END_AT_STREAM).is_err() {
        return 0;
    }

    let tail = reader.get_ref().tail();
    let Some(end) = tail.windows(9).position(|w| w == b"endstream") else {
        return 0;
    };

    let skipped = reader.get_ref().tell() + end as u64;
    *reader = TokenReader::new(SliceSource::new(&tail[end..]));

    skipped
}

fn print_token(offset: u64, token: &Token) {
    match token {
        Token::Integer(n) => println!("{offset:>8} Integer({n})"),
        Token::Real(n) => println!("{offset:>8} Real({n})"),
        Token::String(s) => println!("{offset:>8} String({})", String::from_utf8_lossy(s)),
        Token::Name(s) => println!("{offset:>8} Name({})", String::from_utf8_lossy(s)),
        Token::Keyword(s) => println!("{offset:>8} Keyword({})", String::from_utf8_lossy(s)),
        Token::Comment(s) => println!("{offset:>8} Comment({})", String::from_utf8_lossy(s)),
        other => println!("{offset:>8} {other:?}"),
    }
}
