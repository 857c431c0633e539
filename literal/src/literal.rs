use std::fmt;

use kernjit_dtype::{DType, HasDType};
use ndarray::{ArrayBase, ArrayD, ArrayViewD, ArrayViewMutD, Data, Dimension, IxDyn};
use snafu::{OptionExt, ensure};

use crate::error::{CastSnafu, DTypeMismatchSnafu, Result, ShapeMismatchSnafu, SizeOverflowSnafu};
use crate::shape::Shape;
use crate::storage::{BufferOptions, RawBuffer};

/// Element types a literal can be viewed as without copying.
pub trait NativeType: HasDType + bytemuck::Pod {}

impl<T: HasDType + bytemuck::Pod> NativeType for T {}

/// A shaped, typed, contiguous host buffer.
///
/// Invariant: the storage length always equals `shape.byte_size()`.
pub struct Literal {
    shape: Shape,
    data: RawBuffer,
}

impl Literal {
    /// Zero-initialized literal.
    pub fn new(shape: Shape) -> Result<Self> {
        Self::allocate(shape, &BufferOptions { zero_init: true })
    }

    /// Literal with uninitialized contents.
    ///
    /// # Safety
    ///
    /// Every byte must be written (by the caller or a kernel) before any read.
    pub unsafe fn new_uninit(shape: Shape) -> Result<Self> {
        Self::allocate(shape, &BufferOptions { zero_init: false })
    }

    fn allocate(shape: Shape, options: &BufferOptions) -> Result<Self> {
        let size = shape.byte_size().context(SizeOverflowSnafu { shape: shape.to_string() })?;
        let data = RawBuffer::alloc(size, options)?;
        Ok(Self { shape, data })
    }

    pub fn scalar<T: NativeType>(value: T) -> Result<Self> {
        let mut literal = Self::new(Shape::scalar(T::DTYPE))?;
        literal.as_mut_slice::<T>()?[0] = value;
        Ok(literal)
    }

    /// Rank-1 literal copied from `values`.
    pub fn from_slice<T: NativeType>(values: &[T]) -> Result<Self> {
        let mut literal = Self::new(Shape::new(T::DTYPE, [values.len()]))?;
        literal.as_mut_slice::<T>()?.copy_from_slice(values);
        Ok(literal)
    }

    /// Literal with the array's dims, copied in logical (row-major) order.
    pub fn from_array<T, S, D>(array: &ArrayBase<S, D>) -> Result<Self>
    where
        T: NativeType,
        S: Data<Elem = T>,
        D: Dimension,
    {
        let mut literal = Self::new(Shape::array(T::DTYPE, array.shape()))?;
        literal.copy_from_array(array)?;
        Ok(literal)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.shape.dtype()
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn element_count(&self) -> usize {
        self.data.len() / self.dtype().bytes()
    }

    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: safe constructors zero the storage; `new_uninit` callers promise to write first.
        unsafe { self.data.as_slice() }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: see `as_bytes`.
        unsafe { self.data.as_mut_slice() }
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_mut_ptr()
    }

    fn check_dtype<T: HasDType>(&self) -> Result<()> {
        ensure!(T::DTYPE == self.dtype(), DTypeMismatchSnafu { expected: self.dtype(), actual: T::DTYPE });
        Ok(())
    }

    pub fn as_slice<T: NativeType>(&self) -> Result<&[T]> {
        self.check_dtype::<T>()?;
        bytemuck::try_cast_slice(self.as_bytes()).map_err(|e| CastSnafu { reason: e.to_string() }.build())
    }

    pub fn as_mut_slice<T: NativeType>(&mut self) -> Result<&mut [T]> {
        self.check_dtype::<T>()?;
        bytemuck::try_cast_slice_mut(self.as_bytes_mut()).map_err(|e| CastSnafu { reason: e.to_string() }.build())
    }

    /// Zero-copy view with the literal's dims.
    pub fn view<T: NativeType>(&self) -> Result<ArrayViewD<'_, T>> {
        let dims = IxDyn(self.shape.dims());
        let slice = self.as_slice::<T>()?;
        ArrayViewD::from_shape(dims, slice).map_err(|e| CastSnafu { reason: e.to_string() }.build())
    }

    /// Zero-copy mutable view; writes land in the literal's storage.
    pub fn view_mut<T: NativeType>(&mut self) -> Result<ArrayViewMutD<'_, T>> {
        let dims = IxDyn(self.shape.dims());
        let slice = self.as_mut_slice::<T>()?;
        ArrayViewMutD::from_shape(dims, slice).map_err(|e| CastSnafu { reason: e.to_string() }.build())
    }

    /// Owned copy of the contents.
    pub fn to_array<T: NativeType>(&self) -> Result<ArrayD<T>> {
        Ok(self.view::<T>()?.to_owned())
    }

    pub fn to_vec<T: NativeType>(&self) -> Result<Vec<T>> {
        Ok(self.as_slice::<T>()?.to_vec())
    }

    /// Copy `array` into this literal. Dims and element type must match.
    pub fn copy_from_array<T, S, D>(&mut self, array: &ArrayBase<S, D>) -> Result<()>
    where
        T: NativeType,
        S: Data<Elem = T>,
        D: Dimension,
    {
        ensure!(
            array.shape() == self.dims(),
            ShapeMismatchSnafu { expected: self.dims().to_vec(), actual: array.shape().to_vec() }
        );

        let dst = self.as_mut_slice::<T>()?;
        match array.as_slice() {
            Some(src) => dst.copy_from_slice(src),
            None => dst.iter_mut().zip(array.iter()).for_each(|(d, s)| *d = *s),
        }
        Ok(())
    }

    /// Copy the contents of another literal with the same shape.
    pub fn copy_from(&mut self, src: &Literal) -> Result<()> {
        ensure!(
            src.dtype() == self.dtype(),
            DTypeMismatchSnafu { expected: self.dtype(), actual: src.dtype() }
        );
        ensure!(
            src.dims() == self.dims(),
            ShapeMismatchSnafu { expected: self.dims().to_vec(), actual: src.dims().to_vec() }
        );

        self.as_bytes_mut().copy_from_slice(src.as_bytes());
        Ok(())
    }
}

impl Clone for Literal {
    fn clone(&self) -> Self {
        let data = RawBuffer::alloc(self.data.len(), &BufferOptions::default())
            .unwrap_or_else(|e| panic!("failed to clone literal {}: {e}", self.shape));
        let mut literal = Self { shape: self.shape.clone(), data };
        literal.as_bytes_mut().copy_from_slice(self.as_bytes());
        literal
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Literal").field("shape", &self.shape.to_string()).field("bytes", &self.byte_size()).finish()
    }
}
