//! Building functions from the entries of a PDF function dictionary.

use crate::error::{ParameterError, Result};
use crate::{Function, TupleVec};

/// The entries of a function dictionary, or of the stream dictionary of a
/// sampled or PostScript function.
///
/// Arrays of pairs like `Domain` are given flat, the way they appear in a PDF
/// file. Entries that don't apply to the function type are ignored.
#[derive(Debug, Clone, Default)]
pub struct FunctionDict<'a> {
    /// The `FunctionType` entry.
    pub function_type: i32,
    /// The `Domain` entry.
    pub domain: &'a [f64],
    /// The `Range` entry.
    pub range: Option<&'a [f64]>,
    /// The `Size` entry of a sampled function.
    pub size: &'a [u32],
    /// The `BitsPerSample` entry of a sampled function.
    pub bits_per_sample: u32,
    /// The `Order` entry of a sampled function, 1 if missing.
    pub order: Option<u32>,
    /// The `Encode` entry of a sampled or stitching function.
    pub encode: Option<&'a [f64]>,
    /// The `Decode` entry of a sampled function.
    pub decode: Option<&'a [f64]>,
    /// The `C0` entry of an exponential function.
    pub c0: Option<&'a [f64]>,
    /// The `C1` entry of an exponential function.
    pub c1: Option<&'a [f64]>,
    /// The `N` entry of an exponential function.
    pub exponent: f64,
    /// The `Functions` entry of a stitching function.
    pub functions: &'a [FunctionDict<'a>],
    /// The `Bounds` entry of a stitching function.
    pub bounds: &'a [f64],
    /// The decoded stream data of a sampled or PostScript function.
    pub stream: &'a [u8],
}

/// Group a flat array into pairs.
fn pairs(values: &[f64]) -> Result<TupleVec> {
    if !values.len().is_multiple_of(2) {
        return Err(ParameterError::DimensionMismatch.into());
    }

    Ok(values.chunks_exact(2).map(|c| (c[0], c[1])).collect())
}

fn optional_pairs(values: Option<&[f64]>) -> Result<Option<TupleVec>> {
    values.map(pairs).transpose()
}

pub(crate) fn build(dict: &FunctionDict<'_>) -> Result<Function> {
    let domain = pairs(dict.domain)?;
    let range = optional_pairs(dict.range)?;

    match dict.function_type {
        0 => {
            let encode = optional_pairs(dict.encode)?;
            let decode = optional_pairs(dict.decode)?;

            Function::new_sampled(
                &domain,
                range.as_deref().unwrap_or_default(),
                dict.size,
                dict.bits_per_sample,
                dict.order.unwrap_or(1),
                encode.as_deref(),
                decode.as_deref(),
                dict.stream,
            )
        }
        2 => Function::new_exponential(&domain, range.as_deref(), dict.exponent, dict.c0, dict.c1),
        3 => {
            let functions = dict
                .functions
                .iter()
                .map(build)
                .collect::<Result<Vec<_>>>()?;
            let encode = pairs(dict.encode.unwrap_or_default())?;

            Function::new_stitching(&domain, range.as_deref(), functions, dict.bounds, &encode)
        }
        4 => Function::new_postscript(&domain, range.as_deref().unwrap_or_default(), dict.stream),
        t => {
            lwarn!("unknown function type {}", t);

            Err(ParameterError::BadFunctionType(t).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn exponential() {
        let dict = FunctionDict {
            function_type: 2,
            domain: &[0.0, 1.0],
            c0: Some(&[1.0, 0.0]),
            c1: Some(&[0.0, 1.0]),
            exponent: 1.0,
            ..FunctionDict::default()
        };

        let function = Function::from_dict(&dict).unwrap();
        assert_eq!(function.evaluate(&[0.25]).unwrap().as_slice(), &[0.75, 0.25]);
    }

    #[test]
    fn sampled() {
        let dict = FunctionDict {
            function_type: 0,
            domain: &[0.0, 1.0],
            range: Some(&[0.0, 255.0]),
            size: &[2],
            bits_per_sample: 8,
            decode: Some(&[0.0, 255.0]),
            stream: &[0, 255],
            ..FunctionDict::default()
        };

        let function = Function::from_dict(&dict).unwrap();
        assert_eq!(function.evaluate(&[0.5]).unwrap().as_slice(), &[127.5]);

        let dict = FunctionDict {
            range: None,
            ..dict
        };
        assert_eq!(
            Function::from_dict(&dict).err(),
            Some(Error::BadParameter(ParameterError::MissingRange))
        );
    }

    #[test]
    fn stitching() {
        let children = [
            FunctionDict {
                function_type: 2,
                domain: &[0.0, 1.0],
                c0: Some(&[0.0]),
                c1: Some(&[0.0]),
                exponent: 1.0,
                ..FunctionDict::default()
            },
            FunctionDict {
                function_type: 4,
                domain: &[0.0, 1.0],
                range: Some(&[0.0, 10.0]),
                stream: b"{ 10 mul }",
                ..FunctionDict::default()
            },
        ];

        let dict = FunctionDict {
            function_type: 3,
            domain: &[0.0, 2.0],
            functions: &children,
            bounds: &[1.0],
            encode: Some(&[0.0, 1.0, 0.0, 1.0]),
            ..FunctionDict::default()
        };

        let function = Function::from_dict(&dict).unwrap();
        assert_eq!(function.evaluate(&[0.5]).unwrap().as_slice(), &[0.0]);
        assert_eq!(function.evaluate(&[1.5]).unwrap().as_slice(), &[5.0]);
    }

    #[test]
    fn invalid() {
        let dict = FunctionDict {
            function_type: 1,
            domain: &[0.0, 1.0],
            ..FunctionDict::default()
        };
        assert_eq!(
            Function::from_dict(&dict).err(),
            Some(Error::BadParameter(ParameterError::BadFunctionType(1)))
        );

        let dict = FunctionDict {
            function_type: 2,
            domain: &[0.0, 1.0, 2.0],
            exponent: 1.0,
            ..FunctionDict::default()
        };
        assert_eq!(
            Function::from_dict(&dict).err(),
            Some(Error::BadParameter(ParameterError::DimensionMismatch))
        );
    }
}
