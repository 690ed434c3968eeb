/// A single token of PDF object syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A keyword whose lexeme is a valid integer that fits into an `i32`.
    Integer(i32),
    /// A keyword whose lexeme is a valid real number, or an integer that
    /// overflowed an `i32`.
    Real(f32),
    /// A literal or hex string, with escapes already decoded.
    String(Vec<u8>),
    /// A name, without the leading `/`.
    Name(Vec<u8>),
    /// Any other run of regular characters, like `obj` or `true`.
    Keyword(Vec<u8>),
    /// The body of a comment, without the leading `%` and the line break.
    Comment(Vec<u8>),
    /// `<<`
    DictStart,
    /// `>>`
    DictEnd,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `{`
    ProcStart,
    /// `}`
    ProcEnd,
}

impl Token {
    /// The payload bytes of string, name, keyword and comment tokens.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::String(b) | Self::Name(b) | Self::Keyword(b) | Self::Comment(b) => Some(b),
            _ => None,
        }
    }

    /// The value of a numeric token.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(f64::from(*i)),
            Self::Real(r) => Some(f64::from(*r)),
            _ => None,
        }
    }

    /// Whether this is the keyword `kw`.
    pub fn is_keyword(&self, kw: &[u8]) -> bool {
        matches!(self, Self::Keyword(b) if b == kw)
    }
}
