use std::fmt;

use kernjit_dtype::DType;
use smallvec::SmallVec;

/// Element type plus dimensions.
///
/// An empty dimension list is a scalar with one element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dtype: DType,
    /// Stack-allocated for rank <= 4.
    dims: SmallVec<[usize; 4]>,
}

impl Shape {
    pub fn new(dtype: DType, dims: impl IntoIterator<Item = usize>) -> Self {
        Self { dtype, dims: dims.into_iter().collect() }
    }

    /// Dense array shape, mirroring `Shape.array_shape(dtype, dims)` of the host bindings.
    pub fn array(dtype: DType, dims: &[usize]) -> Self {
        Self::new(dtype, dims.iter().copied())
    }

    pub fn scalar(dtype: DType) -> Self {
        Self { dtype, dims: SmallVec::new() }
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Product of the dimensions, `None` on overflow.
    pub fn element_count(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// `dtype.bytes() * element_count`, `None` on overflow.
    pub fn byte_size(&self) -> Option<usize> {
        self.element_count()?.checked_mul(self.dtype.bytes())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.dtype)?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{dim}")?;
        }
        f.write_str("]")
    }
}
