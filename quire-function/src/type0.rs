use crate::error::{Error, ParameterError, Result};
use crate::interpolate::{Grid, Order, set_weights};
use crate::sample::decode_samples;
use crate::{Affine, Clamper, MAX_INPUTS, Scratch, Values};
use quire_common::bit::bit_mask;
use smallvec::SmallVec;

type IntVec = SmallVec<[usize; 4]>;

/// A type 0 function (sampled function).
#[derive(Debug)]
pub(crate) struct Type0 {
    pub(crate) clamper: Clamper,
    sizes: IntVec,
    /// The distance between neighboring grid points of each dimension, in
    /// grid points.
    strides: IntVec,
    encode: SmallVec<[Affine; 4]>,
    decode: SmallVec<[Affine; 6]>,
    order: Order,
    samples: Vec<f64>,
}

impl Type0 {
    /// Create a new type 0 function.
    pub(crate) fn new(
        domain: &[(f64, f64)],
        range: &[(f64, f64)],
        size: &[u32],
        bits_per_sample: u32,
        order: u32,
        encode: Option<&[(f64, f64)]>,
        decode: Option<&[(f64, f64)]>,
        data: &[u8],
    ) -> Result<Self> {
        let bits_per_sample = match bits_per_sample {
            1 | 2 | 4 | 8 | 12 | 16 | 24 | 32 => bits_per_sample as u8,
            _ => return Err(ParameterError::BadBitsPerSample(bits_per_sample).into()),
        };

        let order = match order {
            1 => Order::Linear,
            3 => Order::Cubic,
            _ => return Err(ParameterError::BadOrder(order).into()),
        };

        if range.is_empty() {
            return Err(ParameterError::MissingRange.into());
        }

        let clamper = Clamper::new(domain, Some(range))?;
        let m = domain.len();
        let n = range.len();

        if m > MAX_INPUTS {
            return Err(ParameterError::TooManyInputs(m).into());
        }

        if size.len() != m {
            return Err(ParameterError::DimensionMismatch.into());
        }

        if size.contains(&0) {
            return Err(ParameterError::BadSize.into());
        }

        let encode: SmallVec<[(f64, f64); 4]> = match encode {
            Some(encode) => encode.iter().copied().collect(),
            None => size.iter().map(|s| (0.0, f64::from(s - 1))).collect(),
        };

        let decode = decode.unwrap_or(range);

        if encode.len() != m || decode.len() != n {
            return Err(ParameterError::DimensionMismatch.into());
        }

        let n_samples = size
            .iter()
            .try_fold(1_u32, |acc, s| acc.checked_mul(*s))
            .ok_or(Error::Overflow)?;
        let n_outputs = u32::try_from(n).map_err(|_| Error::Overflow)?;

        let samples = decode_samples(data, bits_per_sample, n_samples, n_outputs)
            .map_err(|e| match e {
                Error::Overflow => Error::Overflow,
                _ => Error::BadSampleData,
            })?;

        let sizes: IntVec = size.iter().map(|s| *s as usize).collect();
        let strides = sizes
            .iter()
            .scan(1, |stride, size| {
                let cur = *stride;
                *stride *= size;

                Some(cur)
            })
            .collect();

        let encode = clamper
            .domain
            .iter()
            .zip(encode.iter())
            .map(|(domain, encode)| Affine::between(*domain, *encode))
            .collect();

        let max_sample = f64::from(bit_mask(bits_per_sample));
        let decode = decode
            .iter()
            .map(|decode| Affine::between((0.0, max_sample), *decode))
            .collect();

        Ok(Self {
            clamper,
            sizes,
            strides,
            encode,
            decode,
            order,
            samples,
        })
    }

    pub(crate) fn inputs(&self) -> usize {
        self.sizes.len()
    }

    pub(crate) fn outputs(&self) -> usize {
        self.decode.len()
    }

    /// Evaluate a type 0 function with the given input.
    pub(crate) fn eval(&self, input: &[f64], scratch: &mut Scratch) -> Result<Values> {
        let mut input: SmallVec<[f64; 4]> = input.iter().copied().collect();
        self.clamper.clamp_input(&mut input)?;

        scratch.reserve(self.inputs());

        for (dim, (x, encode)) in input.iter().zip(self.encode.iter()).enumerate() {
            let size = self.sizes[dim];
            let e = encode.apply(*x);

            if e.is_nan() {
                return Err(Error::MathError);
            }

            let e = e.max(0.0).min((size - 1) as f64);
            set_weights(self.order, scratch, dim, e, size);
        }

        let grid = Grid {
            sizes: &self.sizes,
            strides: &self.strides,
            samples: &self.samples,
            outputs: self.outputs(),
        };

        let mut out = self
            .decode
            .iter()
            .enumerate()
            .map(|(j, decode)| Ok(decode.apply(grid.interpolate(scratch, j)?)))
            .collect::<Result<Values>>()?;

        self.clamper.clamp_output(&mut out)?;

        Ok(out)
    }
}
