#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use pretty_assertions::assert_eq;
use strata_layout::{FieldType, LayoutError, Primitive};

use crate::{allocated, AllocationState, Scalar, StructError, Structure};

#[test]
fn starts_unallocated() {
    let scalar = Scalar::<i32>::new();
    assert_eq!(scalar.state(), AllocationState::Unallocated);
    assert_eq!(scalar.descriptor(), None);
    assert_eq!(scalar.address(), None);
}

#[test]
fn generate_info_resolves_natural_descriptor() {
    let mut scalar = Scalar::<f64>::new();
    let descriptor = scalar.generate_info().unwrap();
    assert_eq!(descriptor.size(), 8);
    assert_eq!(descriptor.alignment(), 8);
    assert_eq!(scalar.state(), AllocationState::Allocatable);
}

#[test]
fn generate_info_is_idempotent() {
    let mut scalar = Scalar::<u16>::array(3);
    let first = scalar.generate_info().unwrap();
    let second = scalar.generate_info().unwrap();
    assert_eq!(first, second);
    assert_eq!(scalar.state(), AllocationState::Allocatable);
}

#[test]
fn zero_length_vector_is_rejected() {
    let mut scalar = Scalar::<i32>::array(0);
    let err = scalar.generate_info().unwrap_err();
    assert!(matches!(
        err,
        StructError::Layout(LayoutError::MissingLength { .. })
    ));
}

#[test]
fn allocate_requires_allocatable() {
    let mut scalar = Scalar::<i32>::new();
    assert!(matches!(
        scalar.allocate(),
        Err(StructError::IllegalState { .. })
    ));

    let mut scalar = allocated(Scalar::<i32>::new()).unwrap();
    assert!(matches!(
        scalar.allocate(),
        Err(StructError::IllegalState { .. })
    ));
}

#[test]
fn allocate_makes_root_and_zeroes() {
    let scalar = allocated(Scalar::<i64>::new()).unwrap();
    assert!(scalar.is_root());
    assert_eq!(scalar.offset(), Some(0));
    assert_eq!(scalar.value().unwrap(), 0);
}

#[test]
fn set_then_get() {
    let mut scalar = allocated(Scalar::<f32>::new()).unwrap();
    scalar.set_value(1.5).unwrap();
    assert_eq!(scalar.value().unwrap(), 1.5);
}

#[test]
fn vector_elements_are_independent() {
    let mut vector = allocated(Scalar::<i32>::array(4)).unwrap();
    vector.write_slice(&[1, -2, 3]).unwrap();
    vector.try_put(3, 40).unwrap();
    assert_eq!(vector.to_vec().unwrap(), vec![1, -2, 3, 40]);
}

#[test]
fn checked_access_reports_state_then_range() {
    let mut scalar = Scalar::<u8>::array(2);
    assert!(matches!(
        scalar.try_get(0),
        Err(StructError::IllegalState { .. })
    ));
    scalar.generate_info().unwrap();
    scalar.allocate().unwrap();
    assert_eq!(
        scalar.try_put(2, 1),
        Err(StructError::OutOfRange { index: 2, len: 2 })
    );
}

#[test]
fn write_slice_rejects_overlong_input() {
    let mut vector = allocated(Scalar::<u8>::array(2)).unwrap();
    assert_eq!(
        vector.write_slice(&[1, 2, 3]),
        Err(StructError::OutOfRange { index: 2, len: 2 })
    );
}

#[test]
fn raw_accessors_match_checked_ones() {
    let mut vector = allocated(Scalar::<u64>::array(2)).unwrap();
    // SAFETY: allocated, indices in range.
    unsafe {
        vector.put(1, u64::MAX);
        assert_eq!(vector.get(1), u64::MAX);
        assert_eq!(vector.get(0), 0);
    }
}

#[test]
fn field_type_reflects_length() {
    assert_eq!(
        Scalar::<i16>::new().field_type(),
        FieldType::Primitive(Primitive::I16)
    );
    assert_eq!(Scalar::<i16>::array(3).type_name(), "int16_t[3]");
}
