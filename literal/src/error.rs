use kernjit_dtype::DType;
use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Dimensions of the source do not match the literal.
    #[snafu(display("shape mismatch: expected {expected:?}, got {actual:?}"))]
    ShapeMismatch { expected: Vec<usize>, actual: Vec<usize> },

    /// Requested element type differs from the literal's dtype.
    #[snafu(display("dtype mismatch: literal holds {expected}, requested {actual}"))]
    DTypeMismatch { expected: DType, actual: DType },

    /// Element count or byte size does not fit in `usize`.
    #[snafu(display("size of {shape} overflows usize"))]
    SizeOverflow { shape: String },

    #[snafu(display("failed to allocate {size} bytes"))]
    AllocationFailed { size: usize },

    #[snafu(display("cannot reinterpret literal storage: {reason}"))]
    Cast { reason: String },
}
