use test_case::test_case;

use crate::{DType, Shape};

#[test_case(Shape::scalar(DType::Int32), 1, 4; "scalar")]
#[test_case(Shape::array(DType::Int32, &[4]), 4, 16; "vector")]
#[test_case(Shape::array(DType::Float64, &[2, 3]), 6, 48; "matrix")]
#[test_case(Shape::array(DType::UInt8, &[3, 0, 5]), 0, 0; "zero_extent")]
fn test_counts(shape: Shape, elements: usize, bytes: usize) {
    assert_eq!(shape.element_count(), Some(elements));
    assert_eq!(shape.byte_size(), Some(bytes));
}

#[test]
fn test_overflow_is_reported() {
    let shape = Shape::array(DType::Int64, &[usize::MAX / 4, 2]);
    assert_eq!(shape.element_count(), Some((usize::MAX / 4) * 2));
    assert_eq!(shape.byte_size(), None);

    let shape = Shape::array(DType::Int8, &[usize::MAX, 2]);
    assert_eq!(shape.element_count(), None);
}

#[test]
fn test_display() {
    assert_eq!(Shape::array(DType::Int32, &[4, 2]).to_string(), "s32[4,2]");
    assert_eq!(Shape::scalar(DType::Float32).to_string(), "f32[]");
}
