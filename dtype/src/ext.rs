//! Rust scalar types that map onto a [`DType`].

use crate::DType;

/// A Rust scalar that can back literal elements.
///
/// `DTYPE.bytes()` equals `size_of::<Self>()` for every implementor. The
/// 16-bit float types have no native Rust scalar and are only reachable
/// through raw bytes.
pub trait HasDType: Copy + Send + Sync + 'static {
    const DTYPE: DType;

    /// Bytes occupied by `len` elements, or `None` on overflow.
    fn bytes_for(len: usize) -> Option<usize> {
        len.checked_mul(Self::DTYPE.bytes())
    }
}

macro_rules! has_dtype {
    ($($dtype:ident: $ty:ty;)*) => {
        $(
            impl HasDType for $ty {
                const DTYPE: DType = DType::$dtype;
            }
        )*
    };
}

has_dtype! {
    Bool: bool;
    Int8: i8;
    Int16: i16;
    Int32: i32;
    Int64: i64;
    UInt8: u8;
    UInt16: u16;
    UInt32: u32;
    UInt64: u64;
    Float32: f32;
    Float64: f64;
}
