#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use strata_layout::{FieldType, LayoutError, Primitive};

use crate::{
    AllocationState, CompositeStructure, NativeString, Scalar, StructError, Structure,
    StructureArray, StructureConfig,
};

fn lazy() -> StructureConfig {
    StructureConfig::default().with_lazy_arrays(true)
}

fn point(config: &StructureConfig) -> CompositeStructure {
    CompositeStructure::new("Point", config)
        .with_field(0, "x", Scalar::<f64>::new())
        .unwrap()
        .with_field(1, "tag", Scalar::<u8>::new())
        .unwrap()
}

#[test]
fn lazy_elements_appear_on_first_get() {
    let array = StructureArray::new_allocated(12, Scalar::<i32>::new, &lazy()).unwrap();
    assert!(array.get_or_null(0).is_none());
    let first = array.get(0).unwrap();
    assert_eq!(first.state(), AllocationState::Allocated);
    assert!(array.get_or_null(0).is_some());
    assert!(array.get_or_null(1).is_none());
}

#[test]
fn eager_elements_exist_after_allocation() {
    let config = StructureConfig::default();
    let array = StructureArray::new_allocated(3, Scalar::<i32>::new, &config).unwrap();
    assert!((0..3).all(|i| array.get_or_null(i).is_some()));
}

#[test]
fn factory_runs_once_per_element() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let array = StructureArray::new_allocated(
        4,
        move || {
            counter.set(counter.get() + 1);
            Scalar::<u16>::new()
        },
        &lazy(),
    )
    .unwrap();
    // One prototype call during generate_info.
    assert_eq!(calls.get(), 1);
    array.get(2).unwrap();
    array.get(2).unwrap();
    assert_eq!(calls.get(), 2);
}

#[test]
fn elements_sit_at_stride() {
    let config = StructureConfig::default();
    let array = StructureArray::new_allocated(5, move || point(&config), &lazy()).unwrap();
    assert_eq!(array.stride(), 16);
    assert_eq!(array.descriptor().unwrap().size(), 80);
    let base = array.address().unwrap();
    assert_eq!(array.element_address(3).unwrap(), base + 48);
    assert_eq!(array.get(3).unwrap().address(), Some(base + 48));
    assert_eq!(array.get(3).unwrap().offset(), Some(48));
}

#[test]
fn unaligned_element_stride_rounds_up() {
    let config = StructureConfig::default();
    let mut array = StructureArray::new_unallocated(3, || NativeString::new(5), &config);
    array.generate_info().unwrap();
    assert_eq!(array.stride(), 5);
    assert_eq!(array.descriptor().unwrap().alignment(), 1);
}

#[test]
fn writes_to_elements_are_independent() {
    let mut array = StructureArray::new_allocated(4, Scalar::<i64>::new, &lazy()).unwrap();
    for (i, value) in [0, 10, 20, 30].into_iter().enumerate() {
        array.get_mut(i).unwrap().set_value(value).unwrap();
    }
    let values: Vec<i64> = array.iter().map(|e| e.unwrap().value().unwrap()).collect();
    assert_eq!(values, vec![0, 10, 20, 30]);
}

#[test]
fn index_checks() {
    let config = StructureConfig::default();
    let unallocated = StructureArray::new_unallocated(2, Scalar::<i8>::new, &config);
    assert!(matches!(
        unallocated.get(0),
        Err(StructError::IllegalState { .. })
    ));

    let array = StructureArray::new_allocated(2, Scalar::<i8>::new, &config).unwrap();
    assert_eq!(
        array.get(2).unwrap_err(),
        StructError::OutOfRange { index: 2, len: 2 }
    );
    assert!(array.get_or_null(5).is_none());
}

#[test]
fn empty_array_is_rejected() {
    let config = StructureConfig::default();
    let err = StructureArray::new_allocated(0, Scalar::<i8>::new, &config).unwrap_err();
    assert!(matches!(
        err,
        StructError::Layout(LayoutError::MissingLength { .. })
    ));
}

#[test]
fn mismatched_elements_are_rejected() {
    let flip = Cell::new(false);
    let factory = move || {
        let wide = flip.replace(true);
        Scalar::<u8>::array(if wide { 2 } else { 1 })
    };
    let config = StructureConfig::default();
    let err = StructureArray::new_allocated(3, factory, &config).unwrap_err();
    assert_eq!(err, StructError::Layout(LayoutError::ElementMismatch { index: 0 }));
}

#[test]
fn failed_allocation_leaves_every_field_unclaimed() {
    let config = StructureConfig::default();
    let calls = Cell::new(0);
    // call 0 is the prototype, so call 2 builds element 1
    let samples = StructureArray::new_unallocated(
        3,
        move || {
            let call = calls.replace(calls.get() + 1);
            Scalar::<i32>::array(if call == 2 { 2 } else { 1 })
        },
        &config,
    );
    let mut record = CompositeStructure::new("Samples", &config)
        .with_field(0, "x", Scalar::<i32>::new())
        .unwrap()
        .with_field(1, "values", samples)
        .unwrap();
    record.generate_info().unwrap();

    assert_eq!(
        record.allocate().unwrap_err(),
        StructError::Layout(LayoutError::ElementMismatch { index: 1 })
    );
    assert_eq!(record.state(), AllocationState::Allocatable);
    assert!(record
        .fields()
        .all(|(_, _, child)| child.state() == AllocationState::Allocatable));

    // later elements match again, so a retry goes through
    record.allocate().unwrap();
    assert!(record
        .fields()
        .all(|(_, _, child)| child.state() == AllocationState::Allocated));
}

#[test]
fn view_aliases_the_array() {
    let mut array = StructureArray::new_allocated(10, Scalar::<u32>::new, &lazy()).unwrap();
    {
        let mut window = array.view_mut(4, 3).unwrap();
        assert_eq!(window.len(), 3);
        window.get_mut(1).unwrap().set_value(99).unwrap();
    }
    assert_eq!(array.get(5).unwrap().value().unwrap(), 99);
    let view = array.view(4, 3).unwrap();
    assert_eq!(view.get(1).unwrap().value().unwrap(), 99);
    assert_eq!(
        view.element_address(0).unwrap(),
        array.element_address(4).unwrap()
    );
}

#[test]
fn views_nest() {
    let array = StructureArray::new_allocated(10, Scalar::<u32>::new, &lazy()).unwrap();
    let outer = array.view(2, 6).unwrap();
    let inner = outer.view(3, 2).unwrap();
    assert_eq!(inner.start(), 5);
    assert_eq!(
        inner.get(1).unwrap().address(),
        array.get(6).unwrap().address()
    );
    assert_eq!(
        inner.get(2).unwrap_err(),
        StructError::OutOfRange { index: 2, len: 2 }
    );
}

#[test]
fn view_bounds() {
    let array = StructureArray::new_allocated(4, Scalar::<u32>::new, &lazy()).unwrap();
    assert!(array.view(4, 0).unwrap().is_empty());
    assert_eq!(
        array.view(3, 2).unwrap_err(),
        StructError::OutOfRange { index: 4, len: 4 }
    );
    let outer = array.view(1, 2).unwrap();
    assert!(matches!(
        outer.view(1, 2),
        Err(StructError::OutOfRange { .. })
    ));
}

#[test]
fn array_as_composite_field() {
    let config = StructureConfig::default();
    let samples = StructureArray::new_unallocated(3, Scalar::<i16>::new, &config);
    let mut record = crate::allocated(
        CompositeStructure::new("Samples", &config)
            .with_field(0, "count", Scalar::<u8>::new())
            .unwrap()
            .with_field(1, "values", samples)
            .unwrap(),
    )
    .unwrap();
    assert_eq!(record.layout().unwrap().offsets(), &[0, 2]);
    assert_eq!(record.descriptor().unwrap().extent(), 8);

    let values = record.field_as_mut::<StructureArray<Scalar<i16>>>(1).unwrap();
    values.get_mut(2).unwrap().set_value(-5).unwrap();
    assert_eq!(values.get(2).unwrap().offset(), Some(6));

    assert_eq!(
        record.struct_def().fields[1].ty,
        FieldType::Array(Box::new(FieldType::Primitive(Primitive::I16)), 3)
    );
}

#[test]
fn type_name_includes_length() {
    let config = StructureConfig::default();
    let array = StructureArray::new_unallocated(7, || point(&StructureConfig::default()), &config);
    assert_eq!(array.type_name(), "Point[7]");
    assert_eq!(array.element_type_name(), "Point");
}
