use std::sync::Arc;

/// Bit width used to store categorical indices.
///
/// Index `0` is reserved for missing values, so a width of `w` bits can hold
/// `2^w - 1` distinct dictionary values. The format is fixed when a buffer is
/// created; running out of indices is an error, never an automatic upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U2,
    U4,
    U8,
    U16,
    U32,
}

impl IndexFormat {
    pub fn bits(self) -> u32 {
        match self {
            IndexFormat::U2 => 2,
            IndexFormat::U4 => 4,
            IndexFormat::U8 => 8,
            IndexFormat::U16 => 16,
            IndexFormat::U32 => 32,
        }
    }

    /// Largest index value representable in this format.
    pub fn max_index(self) -> u32 {
        match self {
            IndexFormat::U2 => 3,
            IndexFormat::U4 => 15,
            IndexFormat::U8 => u8::MAX as u32,
            IndexFormat::U16 => u16::MAX as u32,
            IndexFormat::U32 => u32::MAX,
        }
    }

    /// Number of distinct dictionary values this format can hold (index 0 is
    /// reserved).
    pub fn max_cardinality(self) -> usize {
        self.max_index() as usize
    }

    /// The minimal format able to hold `values` distinct dictionary values.
    pub fn for_max_cardinality(values: usize) -> IndexFormat {
        [
            IndexFormat::U2,
            IndexFormat::U4,
            IndexFormat::U8,
            IndexFormat::U16,
        ]
        .into_iter()
        .find(|f| f.max_cardinality() >= values)
        .unwrap_or(IndexFormat::U32)
    }
}

/// Immutable categorical index storage at one of the fixed bit widths.
///
/// The 2- and 4-bit variants pack several indices per byte; the wider
/// variants use plain arrays.
#[derive(Clone, Debug)]
pub(crate) enum IndexArray {
    U2 { data: Arc<[u8]>, len: usize },
    U4 { data: Arc<[u8]>, len: usize },
    U8(Arc<[u8]>),
    U16(Arc<[u16]>),
    U32(Arc<[u32]>),
}

impl IndexArray {
    pub fn len(&self) -> usize {
        match self {
            IndexArray::U2 { len, .. } | IndexArray::U4 { len, .. } => *len,
            IndexArray::U8(data) => data.len(),
            IndexArray::U16(data) => data.len(),
            IndexArray::U32(data) => data.len(),
        }
    }

    pub fn get(&self, index: usize) -> u32 {
        match self {
            IndexArray::U2 { data, .. } => ((data[index / 4] >> ((index % 4) * 2)) & 0b11) as u32,
            IndexArray::U4 { data, .. } => ((data[index / 2] >> ((index % 2) * 4)) & 0b1111) as u32,
            IndexArray::U8(data) => data[index] as u32,
            IndexArray::U16(data) => data[index] as u32,
            IndexArray::U32(data) => data[index],
        }
    }

    pub fn format(&self) -> IndexFormat {
        match self {
            IndexArray::U2 { .. } => IndexFormat::U2,
            IndexArray::U4 { .. } => IndexFormat::U4,
            IndexArray::U8(_) => IndexFormat::U8,
            IndexArray::U16(_) => IndexFormat::U16,
            IndexArray::U32(_) => IndexFormat::U32,
        }
    }
}

/// Mutable counterpart of [`IndexArray`], used while a buffer is still open.
#[derive(Debug)]
pub(crate) enum IndexArrayMut {
    U2 { data: Vec<u8>, len: usize },
    U4 { data: Vec<u8>, len: usize },
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexArrayMut {
    pub fn new(format: IndexFormat, len: usize) -> Self {
        match format {
            IndexFormat::U2 => IndexArrayMut::U2 {
                data: vec![0; len.div_ceil(4)],
                len,
            },
            IndexFormat::U4 => IndexArrayMut::U4 {
                data: vec![0; len.div_ceil(2)],
                len,
            },
            IndexFormat::U8 => IndexArrayMut::U8(vec![0; len]),
            IndexFormat::U16 => IndexArrayMut::U16(vec![0; len]),
            IndexFormat::U32 => IndexArrayMut::U32(vec![0; len]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexArrayMut::U2 { len, .. } | IndexArrayMut::U4 { len, .. } => *len,
            IndexArrayMut::U8(data) => data.len(),
            IndexArrayMut::U16(data) => data.len(),
            IndexArrayMut::U32(data) => data.len(),
        }
    }

    pub fn get(&self, index: usize) -> u32 {
        match self {
            IndexArrayMut::U2 { data, .. } => {
                ((data[index / 4] >> ((index % 4) * 2)) & 0b11) as u32
            }
            IndexArrayMut::U4 { data, .. } => {
                ((data[index / 2] >> ((index % 2) * 4)) & 0b1111) as u32
            }
            IndexArrayMut::U8(data) => data[index] as u32,
            IndexArrayMut::U16(data) => data[index] as u32,
            IndexArrayMut::U32(data) => data[index],
        }
    }

    /// Stores `value` at `index`. The value must fit the format.
    pub fn set(&mut self, index: usize, value: u32) {
        match self {
            IndexArrayMut::U2 { data, .. } => {
                debug_assert!(value <= 0b11);
                let shift = (index % 4) * 2;
                let byte = &mut data[index / 4];
                *byte = (*byte & !(0b11 << shift)) | ((value as u8) << shift);
            }
            IndexArrayMut::U4 { data, .. } => {
                debug_assert!(value <= 0b1111);
                let shift = (index % 2) * 4;
                let byte = &mut data[index / 2];
                *byte = (*byte & !(0b1111 << shift)) | ((value as u8) << shift);
            }
            IndexArrayMut::U8(data) => {
                debug_assert!(value <= u8::MAX as u32);
                data[index] = value as u8;
            }
            IndexArrayMut::U16(data) => {
                debug_assert!(value <= u16::MAX as u32);
                data[index] = value as u16;
            }
            IndexArrayMut::U32(data) => data[index] = value,
        }
    }

    pub fn format(&self) -> IndexFormat {
        match self {
            IndexArrayMut::U2 { .. } => IndexFormat::U2,
            IndexArrayMut::U4 { .. } => IndexFormat::U4,
            IndexArrayMut::U8(_) => IndexFormat::U8,
            IndexArrayMut::U16(_) => IndexFormat::U16,
            IndexArrayMut::U32(_) => IndexFormat::U32,
        }
    }

    pub fn freeze(self) -> IndexArray {
        match self {
            IndexArrayMut::U2 { data, len } => IndexArray::U2 {
                data: data.into(),
                len,
            },
            IndexArrayMut::U4 { data, len } => IndexArray::U4 {
                data: data.into(),
                len,
            },
            IndexArrayMut::U8(data) => IndexArray::U8(data.into()),
            IndexArrayMut::U16(data) => IndexArray::U16(data.into()),
            IndexArrayMut::U32(data) => IndexArray::U32(data.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_selection_is_minimal() {
        assert_eq!(IndexFormat::for_max_cardinality(0), IndexFormat::U2);
        assert_eq!(IndexFormat::for_max_cardinality(3), IndexFormat::U2);
        assert_eq!(IndexFormat::for_max_cardinality(4), IndexFormat::U4);
        assert_eq!(IndexFormat::for_max_cardinality(15), IndexFormat::U4);
        assert_eq!(IndexFormat::for_max_cardinality(16), IndexFormat::U8);
        assert_eq!(IndexFormat::for_max_cardinality(256), IndexFormat::U16);
        assert_eq!(IndexFormat::for_max_cardinality(70_000), IndexFormat::U32);
    }

    #[test]
    fn packed_set_get_roundtrip() {
        for format in [
            IndexFormat::U2,
            IndexFormat::U4,
            IndexFormat::U8,
            IndexFormat::U16,
            IndexFormat::U32,
        ] {
            let modulus = (format.max_index() as u64 + 1).max(4);
            let expected = |i: usize| ((i as u64 * 7 + 1) % modulus) as u32;
            let mut array = IndexArrayMut::new(format, 17);
            for i in 0..17 {
                array.set(i, expected(i));
            }
            // overwrite to make sure neighbors survive
            array.set(3, 2);
            let frozen = array.freeze();
            assert_eq!(frozen.len(), 17);
            assert_eq!(frozen.get(3), 2);
            for i in 0..17 {
                if i != 3 {
                    assert_eq!(frozen.get(i), expected(i), "format {format:?}, index {i}");
                }
            }
        }
    }
}
