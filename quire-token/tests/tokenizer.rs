use proptest::prelude::*;
use quire_token::{
    Error, IoSource, ReadFlags, SliceSource, Token, TokenReader, TokenWriter, WriteFlags,
};

fn tokenize(input: &[u8], flags: ReadFlags) -> Result<Vec<Token>, Error> {
    TokenReader::new(SliceSource::new(input))
        .tokens(flags)
        .collect()
}

fn single(input: &[u8]) -> Token {
    let tokens = tokenize(input, ReadFlags::empty()).unwrap();
    assert_eq!(tokens.len(), 1, "{tokens:?}");
    tokens.into_iter().next().unwrap()
}

#[test]
fn literal_string_escapes() {
    assert_eq!(single(b"(Hello\\nWorld)"), Token::String(b"Hello\nWorld".to_vec()));
}

#[test]
fn hex_string() {
    assert_eq!(single(b"<48656C6C6F>"), Token::String(b"Hello".to_vec()));
    assert_eq!(single(b"< 48 65\n6c 6C 6f >"), Token::String(b"Hello".to_vec()));
}

#[test]
fn name_escapes() {
    assert_eq!(single(b"/Name#20Space"), Token::Name(b"Name Space".to_vec()));
    assert_eq!(
        tokenize(b"/Name#20Space", ReadFlags::NO_NAME_ESCAPES).unwrap(),
        vec![Token::Name(b"Name#20Space".to_vec())]
    );
}

#[test]
fn numbers() {
    assert_eq!(single(b"123"), Token::Integer(123));
    assert_eq!(single(b"-0"), Token::Integer(0));
    assert_eq!(single(b"4."), Token::Real(4.0));
    assert_eq!(single(b"-.002"), Token::Real(-0.002));
    assert_eq!(single(b"2147483647"), Token::Integer(i32::MAX));
    assert_eq!(single(b"2147483648"), Token::Real(2147483648.0));
    // PDF numbers have no exponent syntax.
    assert_eq!(single(b"1.5e"), Token::Keyword(b"1.5e".to_vec()));
    assert_eq!(single(b"1e5"), Token::Keyword(b"1e5".to_vec()));
    assert_eq!(single(b"1.2.3"), Token::Keyword(b"1.2.3".to_vec()));
}

#[test]
fn content_stream() {
    let tokens = tokenize(
        b"BT /F1 12 Tf 72 712 Td (A [bracket]) Tj ET",
        ReadFlags::empty(),
    )
    .unwrap();

    assert_eq!(
        tokens,
        vec![
            Token::Keyword(b"BT".to_vec()),
            Token::Name(b"F1".to_vec()),
            Token::Integer(12),
            Token::Keyword(b"Tf".to_vec()),
            Token::Integer(72),
            Token::Integer(712),
            Token::Keyword(b"Td".to_vec()),
            Token::String(b"A [bracket]".to_vec()),
            Token::Keyword(b"Tj".to_vec()),
            Token::Keyword(b"ET".to_vec()),
        ]
    );
}

#[test]
fn unterminated() {
    assert_eq!(
        tokenize(b"(abc", ReadFlags::empty()),
        Err(Error::UnterminatedString)
    );
    assert_eq!(
        tokenize(b"<414", ReadFlags::empty()),
        Err(Error::UnterminatedHexString)
    );
}

#[test]
fn error_position() {
    let mut reader = TokenReader::new(SliceSource::new(b"1 2 <4Z>"));
    assert_eq!(reader.read(ReadFlags::empty()), Ok(Some(Token::Integer(1))));
    assert_eq!(reader.read(ReadFlags::empty()), Ok(Some(Token::Integer(2))));
    assert_eq!(
        reader.read(ReadFlags::empty()),
        Err(Error::InvalidCharacter(b'Z'))
    );
    assert_eq!(reader.get_ref().tail(), b"Z>");
}

#[test]
fn buffered_source() {
    let input: &[u8] = b"[1 2.5 (x)] % trailing";
    let mut reader = TokenReader::new(IoSource::new(input));
    let tokens: Vec<Token> = reader
        .tokens(ReadFlags::RET_COMMENTS)
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        tokens,
        vec![
            Token::ArrayStart,
            Token::Integer(1),
            Token::Real(2.5),
            Token::String(b"x".to_vec()),
            Token::ArrayEnd,
            Token::Comment(b" trailing".to_vec()),
        ]
    );
}

#[test]
fn write_then_read() {
    let tokens = vec![
        Token::Comment(b"PDF-2.0".to_vec()),
        Token::Integer(4),
        Token::Integer(0),
        Token::Keyword(b"obj".to_vec()),
        Token::DictStart,
        Token::Name(b"Title".to_vec()),
        Token::String(b"(Unbalanced".to_vec()),
        Token::Name(b"Odd Name".to_vec()),
        Token::ArrayStart,
        Token::Real(-1.25),
        Token::Integer(-3),
        Token::ArrayEnd,
        Token::DictEnd,
        Token::Keyword(b"endobj".to_vec()),
    ];

    let mut writer = TokenWriter::new(Vec::new());
    for token in &tokens {
        writer.write(WriteFlags::empty(), token).unwrap();
    }
    let written = writer.into_inner();

    assert_eq!(tokenize(&written, ReadFlags::RET_COMMENTS).unwrap(), tokens);
}

fn token_strategy() -> impl Strategy<Value = Token> {
    prop_oneof![
        any::<i32>().prop_map(Token::Integer),
        (-100_000..100_000_i32).prop_map(|v| Token::Real(v as f32 / 4.0 + 0.25)),
        prop::collection::vec(any::<u8>(), 0..40).prop_map(Token::String),
        prop::collection::vec(prop::sample::select(vec![b'(', b')', b'\\', b'x']), 0..16)
            .prop_map(Token::String),
        any::<f32>()
            .prop_filter("finite", |v| v.is_finite())
            .prop_map(Token::Real),
        prop::collection::vec(1..=255_u8, 0..20).prop_map(Token::Name),
        "[a-zA-Z*']{1,8}".prop_map(|k| Token::Keyword(k.into_bytes())),
        Just(Token::DictStart),
        Just(Token::DictEnd),
        Just(Token::ArrayStart),
        Just(Token::ArrayEnd),
        Just(Token::ProcStart),
        Just(Token::ProcEnd),
    ]
}

proptest! {
    #[test]
    fn written_tokens_read_back(
        tokens in prop::collection::vec(token_strategy(), 0..30),
        readable in any::<bool>(),
        max_line_length in prop::sample::select(vec![0_usize, 16, 255]),
    ) {
        let flags = if readable { WriteFlags::READABLE_STRINGS } else { WriteFlags::empty() };
        let mut writer = TokenWriter::new(Vec::new());
        writer.set_max_line_length(max_line_length);

        for token in &tokens {
            writer.write(flags, token).unwrap();
        }

        let written = writer.into_inner();
        prop_assert_eq!(tokenize(&written, ReadFlags::empty()).unwrap(), tokens);
    }
}
