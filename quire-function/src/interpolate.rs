//! Interpolation over an n-dimensional grid of samples.
//!
//! For each input dimension, the encoded input is split into the index `k`
//! of the sample at or below it and up to four weights for the samples at
//! `k - 1`, `k`, `k + 1` and `k + 2`. The result for one output is then the
//! weighted sum over all combinations of neighbors, computed one dimension
//! at a time. A weight of exactly zero means that the neighbor must not be
//! read, which is what keeps the lookups inside the grid at its edges.

use crate::Scratch;
use crate::error::{Error, Result};

/// The interpolation order of a sampled function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Order {
    Linear,
    Cubic,
}

/// Compute index and weights of dimension `dim` for the encoded input `e`,
/// which must already be clamped to `[0, size - 1]`.
pub(crate) fn set_weights(order: Order, scratch: &mut Scratch, dim: usize, e: f64, size: usize) {
    let last = size - 1;
    let (mut wm, mut w0, mut w1, mut w2) = (0.0, 1.0, 0.0, 0.0);

    let k = if e >= last as f64 {
        last
    } else {
        let k = e.floor() as usize;
        let v = e - k as f64;

        match order {
            Order::Linear => {
                w0 = 1.0 - v;
                w1 = v;
            }
            // Only two samples remain, so the curve can't be extended past
            // the end of the grid.
            Order::Cubic if k + 1 >= last && k >= 1 => {
                wm = -0.5 * v * (1.0 - v);
                w0 = 1.0 - v * v;
                w1 = 0.5 * v * (1.0 + v);
            }
            Order::Cubic if k + 1 >= last => {
                w0 = 1.0 - v;
                w1 = v;
            }
            Order::Cubic if k >= 1 => {
                wm = ((-0.5 * v + 1.0) * v - 0.5) * v;
                w0 = (1.5 * v - 2.5) * v * v + 1.0;
                w1 = ((-1.5 * v + 2.0) * v + 0.5) * v;
                w2 = (0.5 * v - 0.5) * v * v;
            }
            Order::Cubic => {
                w0 = (0.5 * v - 1.5) * v + 1.0;
                w1 = (2.0 - v) * v;
                w2 = 0.5 * (v - 1.0) * v;
            }
        }

        k
    };

    scratch.k[dim] = k;
    scratch.wm[dim] = wm;
    scratch.w0[dim] = w0;
    scratch.w1[dim] = w1;
    scratch.w2[dim] = w2;
}

/// A table of samples, `outputs` values per grid point, with the first
/// dimension varying fastest.
pub(crate) struct Grid<'a> {
    pub(crate) sizes: &'a [usize],
    pub(crate) strides: &'a [usize],
    pub(crate) samples: &'a [f64],
    pub(crate) outputs: usize,
}

impl Grid<'_> {
    /// Interpolate output `j` at the point whose weights are in `scratch`.
    pub(crate) fn interpolate(&self, scratch: &Scratch, j: usize) -> Result<f64> {
        match self.sizes.len().checked_sub(1) {
            Some(dim) => self.blend(scratch, dim, 0, j),
            None => Err(Error::BadSampleData),
        }
    }

    fn blend(&self, scratch: &Scratch, dim: usize, offset: usize, j: usize) -> Result<f64> {
        let k = scratch.k[dim];
        let size = self.sizes[dim];
        let neighbors = [
            (scratch.wm[dim], -1),
            (scratch.w0[dim], 0),
            (scratch.w1[dim], 1),
            (scratch.w2[dim], 2),
        ];

        let mut sum = 0.0;

        for (weight, delta) in neighbors {
            if weight == 0.0 {
                continue;
            }

            let idx = k.checked_add_signed(delta).ok_or(Error::BadSampleData)?;
            debug_assert!(idx < size, "non-zero weight for a sample outside the grid");

            if idx >= size {
                return Err(Error::BadSampleData);
            }

            let offset = offset + idx * self.strides[dim];

            let value = if dim == 0 {
                self.sample(offset, j)?
            } else {
                self.blend(scratch, dim - 1, offset, j)?
            };

            sum += weight * value;
        }

        Ok(sum)
    }

    fn sample(&self, point: usize, j: usize) -> Result<f64> {
        self.samples
            .get(point * self.outputs + j)
            .copied()
            .ok_or(Error::BadSampleData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(order: Order, e: f64, size: usize) -> (usize, [f64; 4]) {
        let mut scratch = Scratch::default();
        scratch.reserve(1);
        set_weights(order, &mut scratch, 0, e, size);

        (
            scratch.k[0],
            [scratch.wm[0], scratch.w0[0], scratch.w1[0], scratch.w2[0]],
        )
    }

    #[test]
    fn linear_weights() {
        assert_eq!(weights(Order::Linear, 1.25, 4), (1, [0.0, 0.75, 0.25, 0.0]));
        assert_eq!(weights(Order::Linear, 2.0, 4), (2, [0.0, 1.0, 0.0, 0.0]));
        // The upper edge doesn't read past the grid.
        assert_eq!(weights(Order::Linear, 3.0, 4), (3, [0.0, 1.0, 0.0, 0.0]));
        assert_eq!(weights(Order::Linear, 0.0, 1), (0, [0.0, 1.0, 0.0, 0.0]));
    }

    #[test]
    fn cubic_weights_sum_to_one() {
        for size in 2..6 {
            for step in 0..=40 {
                let e = (size - 1) as f64 * f64::from(step) / 40.0;
                let (k, w) = weights(Order::Cubic, e, size);
                let sum: f64 = w.iter().sum();

                assert!((sum - 1.0).abs() < 1e-12, "size {size}, e {e}: {w:?}");

                // Neighbors with a weight must lie inside the grid.
                for (i, weight) in w.iter().enumerate() {
                    if *weight != 0.0 {
                        let idx = k as isize + i as isize - 1;
                        assert!(idx >= 0 && (idx as usize) < size, "size {size}, e {e}");
                    }
                }
            }
        }
    }

    #[test]
    fn cubic_interior() {
        let (k, w) = weights(Order::Cubic, 1.5, 4);
        assert_eq!(k, 1);
        assert_eq!(w, [-0.0625, 0.5625, 0.5625, -0.0625]);
    }

    #[test]
    fn bilinear() {
        // 2x2 grid, single output, first dimension varies fastest.
        let samples = [0.0, 10.0, 20.0, 30.0];
        let grid = Grid {
            sizes: &[2, 2],
            strides: &[1, 2],
            samples: &samples,
            outputs: 1,
        };

        let mut scratch = Scratch::default();
        scratch.reserve(2);
        set_weights(Order::Linear, &mut scratch, 0, 0.5, 2);
        set_weights(Order::Linear, &mut scratch, 1, 0.25, 2);

        assert_eq!(grid.interpolate(&scratch, 0), Ok(10.0));
    }

    #[test]
    fn missing_samples() {
        let samples = [0.0];
        let grid = Grid {
            sizes: &[2],
            strides: &[1],
            samples: &samples,
            outputs: 1,
        };

        let mut scratch = Scratch::default();
        scratch.reserve(1);
        set_weights(Order::Linear, &mut scratch, 0, 0.5, 2);

        assert_eq!(grid.interpolate(&scratch, 0), Err(Error::BadSampleData));
    }
}
