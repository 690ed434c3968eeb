use crate::error::{Error, ParameterError, Result};
use crate::{Clamper, Values, clip};
use smallvec::smallvec;

/// A type 2 function (exponential function).
#[derive(Debug)]
pub(crate) struct Type2 {
    pub(crate) clamper: Clamper,
    c0: Values,
    c1: Values,
    exponent: f64,
}

impl Type2 {
    /// Create a new type 2 function.
    pub(crate) fn new(
        domain: &[(f64, f64)],
        range: Option<&[(f64, f64)]>,
        exponent: f64,
        c0: Option<&[f64]>,
        c1: Option<&[f64]>,
    ) -> Result<Self> {
        let clamper = Clamper::new(domain, range)?;

        if domain.len() != 1 {
            return Err(ParameterError::DimensionMismatch.into());
        }

        let n = c0
            .or(c1)
            .map(|c| c.len())
            .or(range.map(|r| r.len()))
            .unwrap_or(1);

        let c0: Values = c0.map_or_else(|| smallvec![0.0; n], Values::from_slice);
        let c1: Values = c1.map_or_else(|| smallvec![1.0; n], Values::from_slice);

        if n == 0 || c0.len() != n || c1.len() != n || range.is_some_and(|r| r.len() != n) {
            return Err(ParameterError::DimensionMismatch.into());
        }

        Ok(Self {
            clamper,
            c0,
            c1,
            exponent,
        })
    }

    pub(crate) fn outputs(&self) -> usize {
        self.c0.len()
    }

    /// Evaluate the function with the given input.
    pub(crate) fn eval(&self, input: f64) -> Result<Values> {
        let x = clip(input, self.clamper.domain[0])?;
        let factor = x.powf(self.exponent);

        let mut out: Values = self
            .c0
            .iter()
            .zip(self.c1.iter())
            .map(|(c0, c1)| *c0 + factor * (*c1 - *c0))
            .collect();

        // A pole like `0^-1` is fine as long as a range clips it.
        self.clamper.clamp_output(&mut out)?;

        if out.iter().any(|y| !y.is_finite()) {
            return Err(Error::MathError);
        }

        Ok(out)
    }
}
