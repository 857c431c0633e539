use ndarray::{Array2, ArrayD, IxDyn, array};

use crate::{DType, Error, Literal, Shape};

#[test]
fn test_new_is_zeroed() {
    let literal = Literal::new(Shape::array(DType::Int32, &[4])).unwrap();
    assert_eq!(literal.byte_size(), 16);
    assert_eq!(literal.element_count(), 4);
    assert_eq!(literal.as_slice::<i32>().unwrap(), &[0, 0, 0, 0]);
}

#[test]
fn test_uninit_then_written() {
    let mut literal = unsafe { Literal::new_uninit(Shape::array(DType::Float32, &[3])).unwrap() };
    literal.as_mut_slice::<f32>().unwrap().copy_from_slice(&[1.0, 2.0, 3.0]);
    assert_eq!(literal.to_vec::<f32>().unwrap(), vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_from_array_round_trip() {
    let array = array![[1i32, 2, 3], [4, 5, 6]];
    let literal = Literal::from_array(&array).unwrap();

    assert_eq!(literal.shape(), &Shape::array(DType::Int32, &[2, 3]));
    assert_eq!(literal.to_array::<i32>().unwrap(), array.into_dyn());
}

#[test]
fn test_from_non_contiguous_array_copies_logical_order() {
    let array = array![[1i64, 2, 3], [4, 5, 6]];
    let transposed = array.t();
    assert!(transposed.as_slice().is_none());

    let literal = Literal::from_array(&transposed).unwrap();
    assert_eq!(literal.dims(), &[3, 2]);
    assert_eq!(literal.as_slice::<i64>().unwrap(), &[1, 4, 2, 5, 3, 6]);
}

#[test]
fn test_view_mut_aliases_storage() {
    let mut literal = Literal::new(Shape::array(DType::UInt16, &[2, 2])).unwrap();
    let ptr = literal.as_ptr();

    {
        let mut view = literal.view_mut::<u16>().unwrap();
        view[[1, 0]] = 7;
        assert_eq!(view.as_ptr() as *const u8, ptr);
    }

    assert_eq!(literal.as_slice::<u16>().unwrap(), &[0, 0, 7, 0]);
    assert_eq!(literal.view::<u16>().unwrap()[[1, 0]], 7);
}

#[test]
fn test_dtype_mismatch() {
    let literal = Literal::from_slice(&[1i32, 2]).unwrap();
    let err = literal.as_slice::<f32>().unwrap_err();
    assert!(matches!(err, Error::DTypeMismatch { expected: DType::Int32, actual: DType::Float32 }));
    assert!(literal.view::<u32>().is_err());
}

#[test]
fn test_copy_from_array_checks_dims() {
    let mut literal = Literal::new(Shape::array(DType::Float64, &[2, 2])).unwrap();

    let wrong = Array2::<f64>::zeros((4, 1));
    assert!(matches!(literal.copy_from_array(&wrong).unwrap_err(), Error::ShapeMismatch { .. }));

    let right = ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    literal.copy_from_array(&right).unwrap();
    assert_eq!(literal.to_array::<f64>().unwrap(), right);
}

#[test]
fn test_scalar_and_clone() {
    let literal = Literal::scalar(42u64).unwrap();
    assert!(literal.shape().is_scalar());
    assert_eq!(literal.element_count(), 1);

    let copy = literal.clone();
    assert_eq!(copy, literal);
    assert_ne!(copy.as_ptr(), literal.as_ptr());
}

#[test]
fn test_copy_from_literal() {
    let src = Literal::from_slice(&[1u8, 2, 3]).unwrap();
    let mut dst = Literal::new(Shape::array(DType::UInt8, &[3])).unwrap();
    dst.copy_from(&src).unwrap();
    assert_eq!(dst, src);

    let mut other = Literal::new(Shape::array(DType::Int8, &[3])).unwrap();
    assert!(other.copy_from(&src).is_err());
}

#[test]
fn test_empty_literal() {
    let literal = Literal::new(Shape::array(DType::Float32, &[0])).unwrap();
    assert_eq!(literal.byte_size(), 0);
    assert!(literal.as_slice::<f32>().unwrap().is_empty());
    assert_eq!(literal.view::<f32>().unwrap().len(), 0);
}
