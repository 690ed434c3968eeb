//! Reading and writing of MSB-first packed bit fields.

/// A reader for bit fields of up to 32 bits, packed MSB-first without any
/// alignment between consecutive fields.
///
/// Bytes are shifted into an accumulator 8 bits at a time until enough bits
/// are available for the requested field, which is then taken from the top
/// of the accumulator.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_pos: usize,
    acc: u64,
    avail: u32,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            acc: 0,
            avail: 0,
        }
    }

    /// Read the next `bit_size` bits as an unsigned number.
    ///
    /// Returns `None` if `bit_size` is not in `1..=32` or if the data runs
    /// out before the field is complete.
    #[inline]
    pub fn read(&mut self, bit_size: u8) -> Option<u32> {
        if !(1..=32).contains(&bit_size) {
            return None;
        }

        let bit_size = u32::from(bit_size);

        while self.avail < bit_size {
            let byte = *self.data.get(self.byte_pos)?;
            self.acc = (self.acc << 8) | u64::from(byte);
            self.avail += 8;
            self.byte_pos += 1;
        }

        self.avail -= bit_size;
        let value = (self.acc >> self.avail) as u32 & bit_mask(bit_size as u8);
        // Only keep the bits that haven't been handed out yet.
        self.acc &= (1_u64 << self.avail) - 1;

        Some(value)
    }

    /// Whether all bits of the underlying data have been consumed.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.avail == 0 && self.byte_pos >= self.data.len()
    }

    /// The number of bits that have been handed out so far.
    #[inline]
    pub fn bits_read(&self) -> usize {
        self.byte_pos * 8 - self.avail as usize
    }
}

/// Get the mask for the given bit size.
#[inline]
pub fn bit_mask(bit_size: u8) -> u32 {
    ((1_u64 << bit_size) - 1) as u32
}

/// The number of bytes needed to store `count` fields of `bit_size` bits.
pub fn packed_len(count: usize, bit_size: u8) -> Option<usize> {
    Some(count.checked_mul(usize::from(bit_size))?.div_ceil(8))
}

/// A writer that packs fixed-width fields MSB-first into a byte buffer.
#[derive(Debug)]
pub struct BitWriter<'a> {
    data: &'a mut [u8],
    bit_pos: usize,
    bit_size: u8,
}

impl<'a> BitWriter<'a> {
    /// Create a writer for fields of `bit_size` bits.
    ///
    /// Returns `None` unless `bit_size` is in `1..=32`.
    #[inline]
    pub fn new(data: &'a mut [u8], bit_size: u8) -> Option<Self> {
        if !(1..=32).contains(&bit_size) {
            return None;
        }

        Some(Self {
            data,
            bit_pos: 0,
            bit_size,
        })
    }

    /// The number of bits written so far.
    #[inline]
    pub fn bits_written(&self) -> usize {
        self.bit_pos
    }

    /// Write a single field. Bits above the field width are ignored.
    ///
    /// Returns `None` if the buffer is too small.
    pub fn write(&mut self, value: u32) -> Option<()> {
        let value = value & bit_mask(self.bit_size);
        let mut remaining = self.bit_size;

        while remaining > 0 {
            let byte = self.data.get_mut(self.bit_pos / 8)?;
            let free = 8 - (self.bit_pos % 8) as u8;
            let take = free.min(remaining);
            remaining -= take;

            let shift = free - take;
            let chunk = ((value >> remaining) & bit_mask(take)) as u8;
            let mask = (bit_mask(take) as u8) << shift;
            *byte = (*byte & !mask) | (chunk << shift);

            self.bit_pos += usize::from(take);
        }

        Some(())
    }

    /// Write all fields of an iterator.
    pub fn write_all(&mut self, values: impl IntoIterator<Item = u32>) -> Option<()> {
        for value in values {
            self.write(value)?;
        }

        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn read_all(data: &[u8], bit_size: u8, count: usize) -> Vec<u32> {
        let mut reader = BitReader::new(data);
        (0..count).map(|_| reader.read(bit_size).unwrap()).collect()
    }

    #[test]
    fn read_bytes() {
        assert_eq!(read_all(&[0x01, 0xFE, 0x7F], 8, 3), vec![0x01, 0xFE, 0x7F]);
    }

    #[test]
    fn read_words() {
        assert_eq!(read_all(&[0xBE, 0xEF, 0x00, 0x2A], 16, 2), vec![0xBEEF, 0x002A]);
    }

    #[test]
    fn read_bits() {
        assert_eq!(
            read_all(&[0b1010_0110], 1, 8),
            vec![1, 0, 1, 0, 0, 1, 1, 0]
        );
    }

    #[test]
    fn read_nibbles() {
        assert_eq!(read_all(&[0xAB, 0xCD], 4, 4), vec![0xA, 0xB, 0xC, 0xD]);
    }

    #[test]
    fn read_12() {
        assert_eq!(read_all(&[0x7F, 0x30, 0x05], 12, 2), vec![0x7F3, 0x005]);
    }

    #[test]
    fn read_24() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC];
        assert_eq!(read_all(&data, 24, 2), vec![0x123456, 0x789ABC]);
    }

    #[test]
    fn read_32() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x01];
        assert_eq!(read_all(&data, 32, 2), vec![0xFFFF_FFFF, 1]);
    }

    #[test]
    fn read_unaligned_32() {
        // A 4 bit field followed by a 32 bit field straddling five bytes.
        let data = [0x9F, 0xFF, 0xFF, 0xFF, 0xF0];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read(4), Some(0x9));
        assert_eq!(reader.read(32), Some(0xFFFF_FFFF));
        assert_eq!(reader.read(4), Some(0));
        assert!(reader.at_end());
    }

    #[test]
    fn read_truncated() {
        let mut reader = BitReader::new(&[0xFF]);
        assert_eq!(reader.read(4), Some(0xF));
        assert_eq!(reader.read(12), None);
    }

    #[test]
    fn read_invalid_size() {
        let mut reader = BitReader::new(&[0xFF; 8]);
        assert_eq!(reader.read(0), None);
        assert_eq!(reader.read(33), None);
        assert_eq!(reader.bits_read(), 0);
    }

    #[test]
    fn write_nibbles() {
        let mut buf = vec![0_u8; 2];
        let mut writer = BitWriter::new(&mut buf, 4).unwrap();
        writer.write_all([0xA, 0xB, 0xC]).unwrap();
        assert_eq!(writer.bits_written(), 12);
        assert_eq!(buf, vec![0xAB, 0xC0]);
    }

    #[test]
    fn write_12() {
        let mut buf = vec![0_u8; 3];
        let mut writer = BitWriter::new(&mut buf, 12).unwrap();
        writer.write_all([0xABC, 0xDEF]).unwrap();
        assert_eq!(buf, vec![0xAB, 0xCD, 0xEF]);
    }

    #[test]
    fn write_past_end() {
        let mut buf = vec![0_u8; 1];
        let mut writer = BitWriter::new(&mut buf, 16).unwrap();
        assert!(writer.write(1).is_none());
    }

    #[test]
    fn packed_lengths() {
        assert_eq!(packed_len(3, 4), Some(2));
        assert_eq!(packed_len(2, 12), Some(3));
        assert_eq!(packed_len(0, 32), Some(0));
        assert_eq!(packed_len(usize::MAX, 2), None);
    }

    proptest! {
        #[test]
        fn write_then_read(
            bit_size in prop::sample::select(vec![1_u8, 2, 4, 8, 12, 16, 24, 32]),
            raw in prop::collection::vec(any::<u32>(), 0..64),
        ) {
            let values: Vec<u32> = raw.iter().map(|v| v & bit_mask(bit_size)).collect();
            let mut buf = vec![0_u8; packed_len(values.len(), bit_size).unwrap()];
            BitWriter::new(&mut buf, bit_size)
                .unwrap()
                .write_all(values.iter().copied())
                .unwrap();

            prop_assert_eq!(read_all(&buf, bit_size, values.len()), values);
        }
    }
}
