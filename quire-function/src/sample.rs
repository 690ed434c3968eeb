//! Bit-packed sample tables.

use crate::error::{Error, ParameterError, Result};
use quire_common::bit::{BitReader, BitWriter, packed_len};

/// Unpack `n_samples * n_outputs` samples of `bits_per_sample` bits each.
///
/// Samples are packed MSB-first without any padding between them. Trailing
/// data after the last sample is ignored.
pub fn decode_samples(
    data: &[u8],
    bits_per_sample: u8,
    n_samples: u32,
    n_outputs: u32,
) -> Result<Vec<f64>> {
    if !(1..=32).contains(&bits_per_sample) {
        return Err(ParameterError::BadBitsPerSample(u32::from(bits_per_sample)).into());
    }

    let count = n_samples.checked_mul(n_outputs).ok_or(Error::Overflow)?;
    let count = usize::try_from(count).map_err(|_| Error::Overflow)?;

    // Check the length up front so that a bogus size can't trigger a huge
    // allocation.
    if packed_len(count, bits_per_sample).is_none_or(|len| len > data.len()) {
        return Err(Error::Truncated);
    }

    let mut reader = BitReader::new(data);
    let mut samples = Vec::with_capacity(count);

    for _ in 0..count {
        let sample = reader.read(bits_per_sample).ok_or(Error::Truncated)?;
        samples.push(f64::from(sample));
    }

    Ok(samples)
}

/// Pack samples into a buffer that [`decode_samples`] can read.
///
/// Bits above `bits_per_sample` are ignored. Returns `None` if
/// `bits_per_sample` is not between 1 and 32.
pub fn pack_samples(samples: &[u32], bits_per_sample: u8) -> Option<Vec<u8>> {
    let mut data = vec![0; packed_len(samples.len(), bits_per_sample)?];
    BitWriter::new(&mut data, bits_per_sample)?.write_all(samples.iter().copied())?;

    Some(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_12_bit() {
        let data = [0xAB, 0xCD, 0xEF, 0x12, 0x34, 0x56];
        assert_eq!(
            decode_samples(&data, 12, 2, 2).unwrap(),
            vec![f64::from(0xABC), f64::from(0xDEF), f64::from(0x123), f64::from(0x456)]
        );
    }

    #[test]
    fn decode_ignores_trailing_data() {
        assert_eq!(decode_samples(&[0xF0, 0xFF], 4, 1, 1).unwrap(), vec![15.0]);
    }

    #[test]
    fn decode_truncated() {
        assert_eq!(decode_samples(&[0xFF; 3], 8, 2, 2), Err(Error::Truncated));
        assert_eq!(decode_samples(&[0xFF], 12, 1, 1), Err(Error::Truncated));
    }

    #[test]
    fn decode_overflow() {
        assert_eq!(
            decode_samples(&[], 8, u32::MAX, 2),
            Err(Error::Overflow)
        );
    }

    #[test]
    fn decode_bad_width() {
        assert_eq!(
            decode_samples(&[0xFF], 0, 1, 1),
            Err(Error::BadParameter(ParameterError::BadBitsPerSample(0)))
        );
        assert_eq!(
            decode_samples(&[0xFF; 8], 33, 1, 1),
            Err(Error::BadParameter(ParameterError::BadBitsPerSample(33)))
        );
    }

    #[test]
    fn pack() {
        assert_eq!(pack_samples(&[1, 0, 1], 1), Some(vec![0b1010_0000]));
        assert_eq!(pack_samples(&[0xFFF, 0x1], 12), Some(vec![0xFF, 0xF0, 0x01]));
        assert_eq!(pack_samples(&[1], 0), None);
    }
}
