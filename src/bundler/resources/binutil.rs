//! Little-endian structure encoding.
//!
//! Binary layouts are declared as plain structs and serialized by walking
//! their fields in declaration order: fixed-width integers are written
//! little-endian, byte blobs are copied verbatim and sequences are written
//! element by element. [`encode_fields!`](crate::encode_fields) generates the
//! walk for a struct.

use bytes::Bytes;

/// A value with a fixed binary layout.
pub trait Encode {
    /// Appends the binary form of `self` to `out`.
    fn encode(&self, out: &mut Vec<u8>);

    /// Length in bytes of the binary form.
    fn encoded_len(&self) -> usize;

    /// Binary form as a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode(&mut out);
        out
    }
}

macro_rules! encode_int {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn encoded_len(&self) -> usize {
                    size_of::<$ty>()
                }
            }
        )*
    };
}

encode_int!(u8, u16, u32);

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self, out: &mut Vec<u8>) {
        self.iter().for_each(|item| item.encode(out));
    }

    fn encoded_len(&self) -> usize {
        self.iter().map(Encode::encoded_len).sum()
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        self.iter().for_each(|item| item.encode(out));
    }

    fn encoded_len(&self) -> usize {
        self.iter().map(Encode::encoded_len).sum()
    }
}

/// Raw bytes emitted verbatim, zero-padded to an alignment boundary.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Blob {
    data: Bytes,
    align: usize,
}

impl Blob {
    /// Wraps `data` with no padding.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self::aligned(data, 1)
    }

    /// Wraps `data`, padding it to a multiple of `align` bytes.
    pub fn aligned(data: impl Into<Bytes>, align: usize) -> Self {
        Self {
            data: data.into(),
            align: align.max(1),
        }
    }

    /// Unpadded length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the blob holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn padding(&self) -> usize {
        (self.align - self.data.len() % self.align) % self.align
    }
}

impl Encode for Blob {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.data);
        out.resize(out.len() + self.padding(), 0);
    }

    fn encoded_len(&self) -> usize {
        self.data.len() + self.padding()
    }
}

/// Implements [`Encode`] for a struct by walking the listed fields in order.
#[macro_export]
macro_rules! encode_fields {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::bundler::resources::binutil::Encode for $ty {
            fn encode(&self, out: &mut Vec<u8>) {
                $( $crate::bundler::resources::binutil::Encode::encode(&self.$field, out); )+
            }

            fn encoded_len(&self) -> usize {
                0 $( + $crate::bundler::resources::binutil::Encode::encoded_len(&self.$field) )+
            }
        }
    };
}

/// Bounds-checked little-endian reads from a byte slice.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Starts reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Takes the next `n` bytes, or `None` past the end.
    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    pub fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    pub fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> Option<u32> {
        self.take(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
