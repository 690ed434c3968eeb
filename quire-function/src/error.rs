//! Errors that can occur while building or evaluating a function.

use core::fmt;

/// A specialized [`Result`] type for function operations.
pub type Result<T> = core::result::Result<T, Error>;

/// A constructor argument that doesn't describe a valid function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterError {
    /// The bits per sample of a sampled function are not one of 1, 2, 4, 8,
    /// 12, 16, 24 or 32.
    BadBitsPerSample(u32),
    /// A sampled function has more inputs than supported.
    TooManyInputs(usize),
    /// The interpolation order is neither 1 nor 3.
    BadOrder(u32),
    /// The function type requires a range, but none was given.
    MissingRange,
    /// Two arrays that describe the same dimension have different lengths,
    /// or an array of pairs has an odd length.
    DimensionMismatch,
    /// The bounds of a stitching function are not sorted or lie outside of
    /// its domain.
    MalformedBounds,
    /// The function type is not 0, 2, 3 or 4.
    BadFunctionType(i32),
    /// A sampled function has zero samples in some dimension.
    BadSize,
}

/// An error encountered while building or evaluating a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An invalid constructor argument.
    BadParameter(ParameterError),
    /// The size of the sample table doesn't fit into a 32-bit count.
    Overflow,
    /// The sample table doesn't match the declared geometry.
    BadSampleData,
    /// The sample data ended before all samples were read.
    Truncated,
    /// The program of a PostScript calculator function failed to compile.
    BadPostScriptProgram,
    /// A PostScript calculator program is malformed.
    CompileError,
    /// An operator needed more operands than were on the stack.
    StackUnderflow,
    /// The operand stack exceeded its capacity.
    StackOverflow,
    /// A program left more values on the stack than the function has
    /// outputs.
    StackError,
    /// An operand had the wrong type, like a boolean passed to `add` or a
    /// non-integral number passed to `idiv`.
    TypeError,
    /// An operand was outside of the range accepted by an operator.
    RangeError,
    /// A result was not a number, like after a division by zero.
    MathError,
    /// A result exceeded the range of representable numbers.
    LimitCheck,
    /// The program is structurally broken.
    BlockError,
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadBitsPerSample(bps) => write!(f, "invalid bits per sample {bps}"),
            Self::TooManyInputs(m) => write!(f, "too many inputs ({m})"),
            Self::BadOrder(order) => write!(f, "invalid interpolation order {order}"),
            Self::MissingRange => f.write_str("missing range"),
            Self::DimensionMismatch => f.write_str("mismatched dimensions"),
            Self::MalformedBounds => f.write_str("malformed bounds"),
            Self::BadFunctionType(t) => write!(f, "invalid function type {t}"),
            Self::BadSize => f.write_str("invalid sample table size"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadParameter(e) => write!(f, "bad parameter: {e}"),
            Self::Overflow => f.write_str("sample table too large"),
            Self::BadSampleData => f.write_str("bad sample data"),
            Self::Truncated => f.write_str("truncated sample data"),
            Self::BadPostScriptProgram => f.write_str("bad PostScript calculator program"),
            Self::CompileError => f.write_str("failed to compile program"),
            Self::StackUnderflow => f.write_str("stack underflow"),
            Self::StackOverflow => f.write_str("stack overflow"),
            Self::StackError => f.write_str("unexpected number of values on the stack"),
            Self::TypeError => f.write_str("type check"),
            Self::RangeError => f.write_str("range check"),
            Self::MathError => f.write_str("undefined result"),
            Self::LimitCheck => f.write_str("limit check"),
            Self::BlockError => f.write_str("invalid program structure"),
        }
    }
}

impl core::error::Error for Error {}

impl From<ParameterError> for Error {
    fn from(err: ParameterError) -> Self {
        Self::BadParameter(err)
    }
}
