//! Host literals: typed, shaped, contiguous buffers for kernel arguments.
//!
//! A [`Literal`] owns one 64-byte aligned allocation of exactly
//! `shape.byte_size()` bytes. Typed access goes through zero-copy slices and
//! `ndarray` views when the element type matches the literal's dtype; building a
//! literal from an array, or extracting an owned array, copies.

pub mod error;
pub mod literal;
pub mod shape;
pub mod storage;


pub use error::{Error, Result};
pub use literal::{Literal, NativeType};
pub use shape::Shape;
pub use storage::{ALIGNMENT, BufferOptions, RawBuffer};

pub use kernjit_dtype::{DType, HasDType};
