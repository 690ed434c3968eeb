//! The operators of PostScript calculator functions.

use phf::phf_map;

/// An operator of a PostScript calculator function.
///
/// The discriminant is the tag of the operator in the byte encoding of a
/// [`Program`](crate::Program).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Operator {
    Abs,
    Add,
    Atan,
    Ceiling,
    Cos,
    Cvi,
    Cvr,
    Div,
    Exp,
    Floor,
    Idiv,
    Ln,
    Log,
    Mod,
    Mul,
    Neg,
    Round,
    Sin,
    Sqrt,
    Sub,
    Truncate,
    And,
    Bitshift,
    Eq,
    False,
    Ge,
    Gt,
    Le,
    Lt,
    Ne,
    Not,
    Or,
    True,
    Xor,
    Copy,
    Dup,
    Exch,
    Index,
    Pop,
    Roll,
}

/// All operators, in the order of their tags.
const OPERATORS: [Operator; 40] = [
    Operator::Abs,
    Operator::Add,
    Operator::Atan,
    Operator::Ceiling,
    Operator::Cos,
    Operator::Cvi,
    Operator::Cvr,
    Operator::Div,
    Operator::Exp,
    Operator::Floor,
    Operator::Idiv,
    Operator::Ln,
    Operator::Log,
    Operator::Mod,
    Operator::Mul,
    Operator::Neg,
    Operator::Round,
    Operator::Sin,
    Operator::Sqrt,
    Operator::Sub,
    Operator::Truncate,
    Operator::And,
    Operator::Bitshift,
    Operator::Eq,
    Operator::False,
    Operator::Ge,
    Operator::Gt,
    Operator::Le,
    Operator::Lt,
    Operator::Ne,
    Operator::Not,
    Operator::Or,
    Operator::True,
    Operator::Xor,
    Operator::Copy,
    Operator::Dup,
    Operator::Exch,
    Operator::Index,
    Operator::Pop,
    Operator::Roll,
];

impl Operator {
    /// The operator with the given tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        OPERATORS.get(usize::from(tag)).copied()
    }

    /// The tag of the operator.
    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// A token of a PostScript calculator program that is not a number or a
/// brace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    Op(Operator),
    If,
    IfElse,
}

pub(crate) static KEYWORDS: phf::Map<&'static [u8], Keyword> = phf_map! {
    b"abs" => Keyword::Op(Operator::Abs),
    b"add" => Keyword::Op(Operator::Add),
    b"atan" => Keyword::Op(Operator::Atan),
    b"ceiling" => Keyword::Op(Operator::Ceiling),
    b"cos" => Keyword::Op(Operator::Cos),
    b"cvi" => Keyword::Op(Operator::Cvi),
    b"cvr" => Keyword::Op(Operator::Cvr),
    b"div" => Keyword::Op(Operator::Div),
    b"exp" => Keyword::Op(Operator::Exp),
    b"floor" => Keyword::Op(Operator::Floor),
    b"idiv" => Keyword::Op(Operator::Idiv),
    b"ln" => Keyword::Op(Operator::Ln),
    b"log" => Keyword::Op(Operator::Log),
    b"mod" => Keyword::Op(Operator::Mod),
    b"mul" => Keyword::Op(Operator::Mul),
    b"neg" => Keyword::Op(Operator::Neg),
    b"round" => Keyword::Op(Operator::Round),
    b"sin" => Keyword::Op(Operator::Sin),
    b"sqrt" => Keyword::Op(Operator::Sqrt),
    b"sub" => Keyword::Op(Operator::Sub),
    b"truncate" => Keyword::Op(Operator::Truncate),
    b"and" => Keyword::Op(Operator::And),
    b"bitshift" => Keyword::Op(Operator::Bitshift),
    b"eq" => Keyword::Op(Operator::Eq),
    b"false" => Keyword::Op(Operator::False),
    b"ge" => Keyword::Op(Operator::Ge),
    b"gt" => Keyword::Op(Operator::Gt),
    b"le" => Keyword::Op(Operator::Le),
    b"lt" => Keyword::Op(Operator::Lt),
    b"ne" => Keyword::Op(Operator::Ne),
    b"not" => Keyword::Op(Operator::Not),
    b"or" => Keyword::Op(Operator::Or),
    b"true" => Keyword::Op(Operator::True),
    b"xor" => Keyword::Op(Operator::Xor),
    b"copy" => Keyword::Op(Operator::Copy),
    b"dup" => Keyword::Op(Operator::Dup),
    b"exch" => Keyword::Op(Operator::Exch),
    b"index" => Keyword::Op(Operator::Index),
    b"pop" => Keyword::Op(Operator::Pop),
    b"roll" => Keyword::Op(Operator::Roll),
    b"if" => Keyword::If,
    b"ifelse" => Keyword::IfElse,
};
