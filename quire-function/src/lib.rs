/*!
Construction and evaluation of PDF functions.

PDF functions map `m` input values to `n` output values and are used for
things like shadings, transfer functions and tint transforms of separation
color spaces. All four function types of the PDF specification are
supported:

- Type 0 (sampled) functions, with multilinear or Catmull-Rom cubic
  interpolation over a bit-packed sample table of any dimension.
- Type 2 (exponential interpolation) functions.
- Type 3 (stitching) functions, which delegate to one of their child
  functions depending on the input.
- Type 4 (PostScript calculator) functions, which are compiled into a small
  instruction set once and then run on a stack machine.

```
use quire_function::Function;

// A type 4 function converting a gray value into RGB.
let function = Function::new_postscript(
    &[(0.0, 1.0)],
    &[(0.0, 1.0); 3],
    b"{ dup dup }",
)
.unwrap();

assert_eq!(function.evaluate(&[0.25]).unwrap().as_slice(), &[0.25, 0.25, 0.25]);
```

Functions are immutable once built and can be shared between threads. The
working memory needed to evaluate sampled functions lives in a separate
[`Scratch`] value, which can be reused across calls with
[`Function::evaluate_with`].

## Cargo features
- `logging`: Report rejected parameters and failed programs through the
  `log` crate.

## Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

#[macro_use]
mod log;

mod dict;
mod error;
mod interpolate;
mod sample;
mod type0;
mod type2;
mod type3;
mod type4;

use crate::type0::Type0;
use crate::type2::Type2;
use crate::type3::Type3;
use crate::type4::Type4;
use smallvec::SmallVec;
use std::sync::Arc;

pub use dict::FunctionDict;
pub use error::{Error, ParameterError, Result};
pub use sample::{decode_samples, pack_samples};
pub use type4::{Instruction, Operator, Program};

/// A list of `(min, max)` pairs, like the domain or range of a function.
pub type TupleVec = SmallVec<[(f64, f64); 4]>;
/// The output values of a function.
pub type Values = SmallVec<[f64; 6]>;

/// The maximum number of inputs of a sampled function.
pub const MAX_INPUTS: usize = 12;

/// A PDF function.
#[derive(Debug, Clone)]
pub struct Function(Arc<FunctionType>);

#[derive(Debug)]
enum FunctionType {
    Type0(Type0),
    Type2(Type2),
    Type3(Type3),
    Type4(Type4),
}

impl Function {
    /// Create a type 0 (sampled) function.
    ///
    /// `data` holds the bit-packed samples, `n = range.len()` per grid point,
    /// with the first input dimension varying fastest. `order` is 1 for
    /// linear and 3 for cubic interpolation. `encode` defaults to
    /// `(0, size - 1)` for each input and `decode` to the range.
    pub fn new_sampled(
        domain: &[(f64, f64)],
        range: &[(f64, f64)],
        size: &[u32],
        bits_per_sample: u32,
        order: u32,
        encode: Option<&[(f64, f64)]>,
        decode: Option<&[(f64, f64)]>,
        data: &[u8],
    ) -> Result<Self> {
        Type0::new(
            domain,
            range,
            size,
            bits_per_sample,
            order,
            encode,
            decode,
            data,
        )
        .map(|f| Self(Arc::new(FunctionType::Type0(f))))
        .inspect_err(|e| {
            lwarn!("failed to create sampled function: {}", e);
        })
    }

    /// Create a type 2 (exponential interpolation) function with a single
    /// input.
    ///
    /// `c0` defaults to `[0.0]` and `c1` to `[1.0]`, unless the other one or
    /// the range implies more outputs.
    pub fn new_exponential(
        domain: &[(f64, f64)],
        range: Option<&[(f64, f64)]>,
        exponent: f64,
        c0: Option<&[f64]>,
        c1: Option<&[f64]>,
    ) -> Result<Self> {
        Type2::new(domain, range, exponent, c0, c1)
            .map(|f| Self(Arc::new(FunctionType::Type2(f))))
            .inspect_err(|e| {
                lwarn!("failed to create exponential function: {}", e);
            })
    }

    /// Create a type 3 (stitching) function with a single input.
    ///
    /// `bounds` contains the `k - 1` interior boundaries between the `k`
    /// functions, and `encode` one pair per function that its subdomain is
    /// mapped to.
    pub fn new_stitching(
        domain: &[(f64, f64)],
        range: Option<&[(f64, f64)]>,
        functions: Vec<Self>,
        bounds: &[f64],
        encode: &[(f64, f64)],
    ) -> Result<Self> {
        Type3::new(domain, range, functions, bounds, encode)
            .map(|f| Self(Arc::new(FunctionType::Type3(f))))
            .inspect_err(|e| {
                lwarn!("failed to create stitching function: {}", e);
            })
    }

    /// Create a type 4 (PostScript calculator) function from its program
    /// text.
    pub fn new_postscript(
        domain: &[(f64, f64)],
        range: &[(f64, f64)],
        code: &[u8],
    ) -> Result<Self> {
        Type4::new(domain, range, code)
            .map(|f| Self(Arc::new(FunctionType::Type4(f))))
            .inspect_err(|e| {
                lwarn!("failed to create PostScript function: {}", e);
            })
    }

    /// Create a function from the entries of a function dictionary.
    pub fn from_dict(dict: &FunctionDict<'_>) -> Result<Self> {
        dict::build(dict)
    }

    /// Evaluate the function.
    ///
    /// This allocates new scratch space on each call, use
    /// [`Function::evaluate_with`] to avoid that.
    pub fn evaluate(&self, input: &[f64]) -> Result<Values> {
        self.evaluate_with(input, &mut Scratch::new(self))
    }

    /// Evaluate the function, using the given scratch space.
    pub fn evaluate_with(&self, input: &[f64], scratch: &mut Scratch) -> Result<Values> {
        if input.len() != self.inputs() {
            return Err(ParameterError::DimensionMismatch.into());
        }

        match self.0.as_ref() {
            FunctionType::Type0(t0) => t0.eval(input, scratch),
            FunctionType::Type2(t2) => t2.eval(input[0]),
            FunctionType::Type3(t3) => t3.eval(input[0], scratch),
            FunctionType::Type4(t4) => t4.eval(input),
        }
    }

    /// The number of input values.
    pub fn inputs(&self) -> usize {
        self.domain().len()
    }

    /// The number of output values.
    pub fn outputs(&self) -> usize {
        match self.0.as_ref() {
            FunctionType::Type0(t0) => t0.outputs(),
            FunctionType::Type2(t2) => t2.outputs(),
            FunctionType::Type3(t3) => t3.outputs(),
            FunctionType::Type4(t4) => t4.outputs(),
        }
    }

    /// The domain of the function, one pair per input.
    pub fn domain(&self) -> &[(f64, f64)] {
        &self.clamper().domain
    }

    /// The range of the function, one pair per output, if it has one.
    pub fn range(&self) -> Option<&[(f64, f64)]> {
        self.clamper().range.as_deref()
    }

    fn clamper(&self) -> &Clamper {
        match self.0.as_ref() {
            FunctionType::Type0(t0) => &t0.clamper,
            FunctionType::Type2(t2) => &t2.clamper,
            FunctionType::Type3(t3) => &t3.clamper,
            FunctionType::Type4(t4) => &t4.clamper,
        }
    }

    /// The largest number of inputs of a sampled function in this function
    /// tree.
    fn scratch_inputs(&self) -> usize {
        match self.0.as_ref() {
            FunctionType::Type0(t0) => t0.inputs(),
            FunctionType::Type3(t3) => t3.scratch_inputs(),
            FunctionType::Type2(_) | FunctionType::Type4(_) => 0,
        }
    }
}

/// Working memory for evaluating sampled functions.
///
/// A scratch is not tied to a specific function. It grows if it's used with
/// a function that needs more space than it was created for.
#[derive(Debug, Clone, Default)]
pub struct Scratch {
    pub(crate) k: Vec<usize>,
    pub(crate) wm: Vec<f64>,
    pub(crate) w0: Vec<f64>,
    pub(crate) w1: Vec<f64>,
    pub(crate) w2: Vec<f64>,
}

impl Scratch {
    /// Create scratch space that is big enough for the given function.
    pub fn new(function: &Function) -> Self {
        let mut scratch = Self::default();
        scratch.reserve(function.scratch_inputs());

        scratch
    }

    pub(crate) fn reserve(&mut self, inputs: usize) {
        if self.k.len() < inputs {
            self.k.resize(inputs, 0);
            self.wm.resize(inputs, 0.0);
            self.w0.resize(inputs, 0.0);
            self.w1.resize(inputs, 0.0);
            self.w2.resize(inputs, 0.0);
        }
    }
}

/// The domain and range of a function.
#[derive(Debug, Clone)]
struct Clamper {
    domain: TupleVec,
    range: Option<TupleVec>,
}

impl Clamper {
    fn new(domain: &[(f64, f64)], range: Option<&[(f64, f64)]>) -> Result<Self> {
        if domain.is_empty() || range.is_some_and(|r| r.is_empty()) {
            return Err(ParameterError::DimensionMismatch.into());
        }

        Ok(Self {
            domain: domain.iter().copied().collect(),
            range: range.map(|r| r.iter().copied().collect()),
        })
    }

    fn clamp_input(&self, input: &mut [f64]) -> Result<()> {
        for (val, domain) in input.iter_mut().zip(self.domain.iter()) {
            *val = clip(*val, *domain)?;
        }

        Ok(())
    }

    fn clamp_output(&self, output: &mut [f64]) -> Result<()> {
        match &self.range {
            Some(range) => {
                for (val, range) in output.iter_mut().zip(range.iter()) {
                    *val = clip(*val, *range)?;
                }
            }
            None => {
                if output.iter().any(|v| v.is_nan()) {
                    return Err(Error::MathError);
                }
            }
        }

        Ok(())
    }
}

/// Clip a value to an interval, rejecting NaN.
fn clip(val: f64, (min, max): (f64, f64)) -> Result<f64> {
    if val.is_nan() {
        return Err(Error::MathError);
    }

    // Not `f64::clamp`, which panics for inverted intervals.
    Ok(val.max(min).min(max))
}

/// An affine map `x * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine {
    scale: f64,
    offset: f64,
}

impl Affine {
    /// The map taking `from.0` to `to.0` and `from.1` to `to.1`. An empty
    /// source interval maps everything to `to.0`.
    fn between(from: (f64, f64), to: (f64, f64)) -> Self {
        let width = from.1 - from.0;

        if width == 0.0 {
            return Self {
                scale: 0.0,
                offset: to.0,
            };
        }

        let scale = (to.1 - to.0) / width;

        Self {
            scale,
            offset: to.0 - from.0 * scale,
        }
    }

    #[inline]
    fn apply(self, x: f64) -> f64 {
        x * self.scale + self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affine() {
        let a = Affine::between((0.0, 1.0), (0.0, 10.0));
        assert_eq!(a.apply(0.5), 5.0);

        let a = Affine::between((2.0, 4.0), (1.0, 0.0));
        assert_eq!(a.apply(2.0), 1.0);
        assert_eq!(a.apply(3.0), 0.5);
        assert_eq!(a.apply(4.0), 0.0);

        let a = Affine::between((3.0, 3.0), (7.0, 9.0));
        assert_eq!(a.apply(3.0), 7.0);
        assert_eq!(a.apply(-100.0), 7.0);
    }

    #[test]
    fn clipping() {
        assert_eq!(clip(-1.0, (0.0, 1.0)), Ok(0.0));
        assert_eq!(clip(0.5, (0.0, 1.0)), Ok(0.5));
        assert_eq!(clip(f64::INFINITY, (0.0, 1.0)), Ok(1.0));
        assert_eq!(clip(f64::NAN, (0.0, 1.0)), Err(Error::MathError));
        // Doesn't panic for inverted intervals.
        assert_eq!(clip(0.5, (1.0, 0.0)), Ok(0.0));
    }

    #[test]
    fn send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<Function>();
    }

    #[test]
    fn scratch_grows() {
        let mut scratch = Scratch::default();
        scratch.reserve(3);
        assert_eq!(scratch.k.len(), 3);
        scratch.reserve(1);
        assert_eq!(scratch.w2.len(), 3);
    }

    #[test]
    fn dimensions() {
        let f = Function::new_exponential(&[(0.0, 1.0)], None, 1.0, Some(&[0.0, 0.0]), None)
            .unwrap();

        assert_eq!(f.inputs(), 1);
        assert_eq!(f.outputs(), 2);
        assert_eq!(f.domain(), &[(0.0, 1.0)]);
        assert_eq!(f.range(), None);

        assert_eq!(
            f.evaluate(&[0.0, 1.0]),
            Err(Error::BadParameter(ParameterError::DimensionMismatch))
        );
    }
}
