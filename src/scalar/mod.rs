//! Fixed-size scalars transferred in native representation
//!
//! Values are written byte-for-byte as they sit in memory, so files are only
//! portable between machines of the same endianness. `bool` is the exception:
//! it is always one byte, `1` or `0`.

/// Largest `Scalar::SIZE` of any implementor (`u128`/`i128`)
pub const MAX_SIZE: usize = 16;

/// A value with a fixed-size native byte encoding
pub trait Scalar: Copy {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Write the encoding into `out`, which is exactly `SIZE` bytes long
    fn encode(self, out: &mut [u8]);

    /// Decode from `bytes`, which is exactly `SIZE` bytes long
    fn decode(bytes: &[u8]) -> Self;
}

macro_rules! impl_native_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn encode(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_ne_bytes());
                }

                fn decode(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_ne_bytes(raw)
                }
            }
        )*
    };
}

impl_native_scalar!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

impl Scalar for bool {
    const SIZE: usize = 1;

    fn encode(self, out: &mut [u8]) {
        out[0] = u8::from(self);
    }

    fn decode(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}
