use crate::error::{ParameterError, Result};
use crate::{Affine, Clamper, Function, Scratch, Values};

/// A type 3 function (stitching function).
#[derive(Debug)]
pub(crate) struct Type3 {
    pub(crate) clamper: Clamper,
    functions: Vec<Function>,
    /// The domain start, the interior bounds and the domain end.
    bounds: Vec<f64>,
    encode: Vec<Affine>,
}

impl Type3 {
    /// Create a new type 3 function.
    pub(crate) fn new(
        domain: &[(f64, f64)],
        range: Option<&[(f64, f64)]>,
        functions: Vec<Function>,
        bounds: &[f64],
        encode: &[(f64, f64)],
    ) -> Result<Self> {
        let clamper = Clamper::new(domain, range)?;

        let &[(d0, d1)] = domain else {
            return Err(ParameterError::DimensionMismatch.into());
        };

        let k = functions.len();

        if k == 0 || bounds.len() != k - 1 || encode.len() != k {
            return Err(ParameterError::DimensionMismatch.into());
        }

        let n = functions[0].outputs();

        if functions.iter().any(|f| f.inputs() != 1 || f.outputs() != n)
            || range.is_some_and(|r| r.len() != n)
        {
            return Err(ParameterError::DimensionMismatch.into());
        }

        let mut full_bounds = Vec::with_capacity(k + 1);
        full_bounds.push(d0);
        full_bounds.extend_from_slice(bounds);
        full_bounds.push(d1);

        // Also rejects NaN bounds.
        if !full_bounds.windows(2).all(|w| w[0] <= w[1]) {
            return Err(ParameterError::MalformedBounds.into());
        }

        let encode = full_bounds
            .windows(2)
            .zip(encode.iter())
            .map(|(w, encode)| Affine::between((w[0], w[1]), *encode))
            .collect();

        Ok(Self {
            clamper,
            functions,
            bounds: full_bounds,
            encode,
        })
    }

    pub(crate) fn outputs(&self) -> usize {
        self.functions.first().map_or(0, Function::outputs)
    }

    pub(crate) fn scratch_inputs(&self) -> usize {
        self.functions
            .iter()
            .map(Function::scratch_inputs)
            .max()
            .unwrap_or(0)
    }

    /// Evaluate the function with the given input.
    pub(crate) fn eval(&self, input: f64, scratch: &mut Scratch) -> Result<Values> {
        let (index, x) = self.locate(input);

        let function = &self.functions[index];
        let mut out = function.evaluate_with(&[self.encode[index].apply(x)], scratch)?;

        self.clamper.clamp_output(&mut out)?;

        Ok(out)
    }

    /// Find the function responsible for `x` and clip `x` to the domain.
    ///
    /// Each subdomain includes its lower bound, the last one includes the
    /// upper end of the domain as well. NaN is treated like a value below the
    /// domain.
    fn locate(&self, x: f64) -> (usize, f64) {
        let k = self.functions.len();
        let d0 = self.bounds[0];
        let d1 = self.bounds[k];

        if x >= d1 {
            (k - 1, d1)
        } else if x >= d0 {
            let interior = &self.bounds[1..k];

            (interior.partition_point(|b| *b <= x), x)
        } else {
            (0, d0)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, Function, ParameterError};

    fn constant(value: f64) -> Function {
        Function::new_exponential(&[(0.0, 1.0)], None, 1.0, Some(&[value]), Some(&[value]))
            .unwrap()
    }

    fn identity() -> Function {
        Function::new_exponential(&[(0.0, 1.0)], None, 1.0, None, None).unwrap()
    }

    #[test]
    fn simple() {
        let function = Function::new_stitching(
            &[(-7.0, 7.0)],
            None,
            vec![constant(0.5), constant(0.7)],
            &[0.0],
            &[(0.0, 1.0), (0.0, 1.0)],
        )
        .unwrap();

        assert_eq!(function.evaluate(&[-7.0]).unwrap().as_slice(), &[0.5]);
        assert_eq!(function.evaluate(&[-3.0]).unwrap().as_slice(), &[0.5]);
        assert_eq!(function.evaluate(&[-0.5]).unwrap().as_slice(), &[0.5]);
        assert_eq!(function.evaluate(&[0.0]).unwrap().as_slice(), &[0.7]);
        assert_eq!(function.evaluate(&[7.0]).unwrap().as_slice(), &[0.7]);
        assert_eq!(function.evaluate(&[100.0]).unwrap().as_slice(), &[0.7]);
        assert_eq!(function.evaluate(&[-100.0]).unwrap().as_slice(), &[0.5]);
    }

    #[test]
    fn encode() {
        let function = Function::new_stitching(
            &[(0.0, 2.0)],
            None,
            vec![identity(), identity()],
            &[1.0],
            &[(0.0, 1.0), (1.0, 0.0)],
        )
        .unwrap();

        assert_eq!(function.evaluate(&[0.25]).unwrap().as_slice(), &[0.25]);
        assert_eq!(function.evaluate(&[1.0]).unwrap().as_slice(), &[1.0]);
        assert_eq!(function.evaluate(&[1.75]).unwrap().as_slice(), &[0.25]);
        assert_eq!(function.evaluate(&[2.0]).unwrap().as_slice(), &[0.0]);
    }

    #[test]
    fn nan_selects_first_function() {
        let function = Function::new_stitching(
            &[(0.0, 1.0)],
            None,
            vec![constant(1.0), constant(2.0)],
            &[0.5],
            &[(0.0, 1.0), (0.0, 1.0)],
        )
        .unwrap();

        assert_eq!(function.evaluate(&[f64::NAN]).unwrap().as_slice(), &[1.0]);
    }

    #[test]
    fn empty_subdomain() {
        let function = Function::new_stitching(
            &[(0.0, 1.0)],
            None,
            vec![constant(1.0), constant(2.0), constant(3.0)],
            &[0.5, 0.5],
            &[(0.0, 1.0), (0.0, 1.0), (0.0, 1.0)],
        )
        .unwrap();

        assert_eq!(function.evaluate(&[0.5]).unwrap().as_slice(), &[3.0]);
        assert_eq!(function.evaluate(&[0.4]).unwrap().as_slice(), &[1.0]);
    }

    #[test]
    fn nested() {
        let inner = Function::new_stitching(
            &[(0.0, 1.0)],
            None,
            vec![constant(1.0), constant(2.0)],
            &[0.5],
            &[(0.0, 1.0), (0.0, 1.0)],
        )
        .unwrap();

        let outer = Function::new_stitching(
            &[(0.0, 1.0)],
            Some(&[(0.0, 1.5)]),
            vec![inner, constant(0.0)],
            &[0.5],
            &[(0.0, 1.0), (0.0, 1.0)],
        )
        .unwrap();

        assert_eq!(outer.evaluate(&[0.1]).unwrap().as_slice(), &[1.0]);
        // Clipped to the range of the outer function.
        assert_eq!(outer.evaluate(&[0.4]).unwrap().as_slice(), &[1.5]);
        assert_eq!(outer.evaluate(&[0.6]).unwrap().as_slice(), &[0.0]);
    }

    #[test]
    fn malformed() {
        let build = |bounds: &[f64], functions: Vec<Function>| {
            let encode = vec![(0.0, 1.0); functions.len()];
            Function::new_stitching(&[(0.0, 1.0)], None, functions, bounds, &encode).err()
        };

        assert_eq!(
            build(&[0.7, 0.3], vec![identity(), identity(), identity()]),
            Some(Error::BadParameter(ParameterError::MalformedBounds))
        );
        assert_eq!(
            build(&[1.5], vec![identity(), identity()]),
            Some(Error::BadParameter(ParameterError::MalformedBounds))
        );
        assert_eq!(
            build(&[0.5], vec![identity()]),
            Some(Error::BadParameter(ParameterError::DimensionMismatch))
        );
        assert_eq!(
            build(&[], vec![]),
            Some(Error::BadParameter(ParameterError::DimensionMismatch))
        );

        let two_outputs =
            Function::new_exponential(&[(0.0, 1.0)], None, 1.0, Some(&[0.0, 0.0]), None).unwrap();
        assert_eq!(
            build(&[0.5], vec![identity(), two_outputs]),
            Some(Error::BadParameter(ParameterError::DimensionMismatch))
        );
    }
}
