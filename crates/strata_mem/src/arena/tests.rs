#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use crate::{
    AllocationState, Arena, CompositeStructure, Scalar, StructError, Structure, StructureConfig,
};

fn record(config: &StructureConfig) -> CompositeStructure {
    CompositeStructure::new("Record", config)
        .with_field(0, "a", Scalar::<i8>::new())
        .unwrap()
        .with_field(1, "b", Scalar::<i16>::new())
        .unwrap()
        .with_field(2, "c", Scalar::<i8>::new())
        .unwrap()
        .with_field(3, "d", Scalar::<i32>::new())
        .unwrap()
}

#[test]
fn starts_empty_and_aligned() {
    let arena = Arena::new(256).unwrap();
    assert_eq!(arena.base_pointer() % 16, 0);
    assert_eq!(arena.stack_pointer(), arena.base_pointer());
    assert_eq!(arena.capacity(), 256);
    assert_eq!(arena.remaining(), 256);
    assert_eq!(arena.depth(), 0);
}

#[test]
fn push_pop_walks_the_stack_pointer() {
    let config = StructureConfig::default();
    let mut arena = Arena::new(256).unwrap();
    let base = arena.base_pointer();
    assert!(arena.check_safe_point());

    let first = arena.push(Scalar::<i64>::new()).unwrap();
    let second = arena.push(record(&config)).unwrap();
    assert_eq!(arena.stack_pointer(), base + 8 + 12);
    assert_eq!(first.address(), Some(base));
    assert_eq!(second.address(), Some(base + 8));

    arena.pop().unwrap();
    assert_eq!(arena.stack_pointer(), base + 8);
    arena.pop().unwrap();
    assert_eq!(arena.stack_pointer(), base);
    assert!(arena.check_safe_point());
}

#[test]
fn pop_restores_pointer_before_alignment_padding() {
    let mut arena = Arena::new(64).unwrap();
    let base = arena.base_pointer();
    arena.push(Scalar::<u8>::new()).unwrap();
    let wide = arena.push(Scalar::<f64>::new()).unwrap();
    assert_eq!(wide.offset(), Some(8));
    assert_eq!(arena.used(), 16);
    arena.pop().unwrap();
    assert_eq!(arena.stack_pointer(), base + 1);
}

#[test]
fn pushed_structures_are_claimed() {
    let config = StructureConfig::default();
    let mut arena = Arena::new(64).unwrap();
    let pushed = arena.push_with(|| record(&config)).unwrap();
    assert_eq!(pushed.state(), AllocationState::Allocated);
    assert!(!pushed.is_root());
    assert!(pushed.buffer().unwrap().same_region(arena.buffer()));
    assert_eq!(
        pushed.field(3).unwrap().address(),
        Some(arena.base_pointer() + 8)
    );
}

#[test]
fn overflow_is_capacity_error() {
    let mut arena = Arena::new(16).unwrap();
    arena.push(Scalar::<u8>::new()).unwrap();
    assert_eq!(
        arena.push(Scalar::<u64>::array(2)).unwrap_err(),
        StructError::Capacity {
            requested: 23,
            available: 15,
        }
    );
    assert_eq!(arena.depth(), 1);
    assert_eq!(arena.used(), 1);
}

#[test]
fn pop_on_empty_is_illegal() {
    let mut arena = Arena::new(16).unwrap();
    assert!(matches!(
        arena.pop(),
        Err(StructError::IllegalState { .. })
    ));
}

#[test]
fn pop_structure_enforces_order() {
    let mut arena = Arena::new(64).unwrap();
    let first = arena.push(Scalar::<i32>::new()).unwrap();
    let second = arena.push(Scalar::<i32>::new()).unwrap();
    assert!(matches!(
        arena.pop_structure(&first),
        Err(StructError::IllegalState { .. })
    ));
    arena.pop_structure(&second).unwrap();
    arena.pop_structure(&first).unwrap();
    assert_eq!(arena.depth(), 0);
}

#[test]
fn pop_structure_rejects_foreign_structure() {
    let mut arena = Arena::new(64).unwrap();
    arena.push(Scalar::<i32>::new()).unwrap();
    let outsider = crate::allocated(Scalar::<i32>::new()).unwrap();
    assert!(matches!(
        arena.pop_structure(&outsider),
        Err(StructError::IllegalState { .. })
    ));
}

#[test]
fn reused_storage_is_zeroed() {
    let mut arena = Arena::new(64).unwrap();
    let mut scratch = arena.push(Scalar::<i32>::new()).unwrap();
    scratch.set_value(5).unwrap();
    arena.pop().unwrap();
    let fresh = arena.push(Scalar::<i32>::new()).unwrap();
    assert_eq!(fresh.value().unwrap(), 0);
}

#[test]
fn nested_safe_points() {
    let mut arena = Arena::new(128).unwrap();
    let outer = arena.create_safe_point();
    assert_eq!(outer.depth(), 0);

    arena.push(Scalar::<i32>::new()).unwrap();
    assert!(!arena.check_safe_point());

    let inner = arena.create_safe_point();
    assert_eq!(inner.stack_pointer(), arena.base_pointer() + 4);
    assert_eq!(arena.safe_point_depth(), 2);
    assert!(arena.check_safe_point());
    arena.push(Scalar::<i32>::new()).unwrap();
    assert!(!arena.check_safe_point());
    arena.pop().unwrap();
    assert!(arena.check_safe_point());

    assert_eq!(arena.release_safe_point().unwrap(), inner);
    assert_eq!(arena.safe_point_depth(), 1);
    assert!(!arena.check_safe_point());
    arena.pop().unwrap();
    assert!(arena.check_safe_point());
    assert_eq!(arena.release_safe_point().unwrap(), outer);
    assert_eq!(arena.safe_point_depth(), 0);
    assert!(matches!(
        arena.release_safe_point(),
        Err(StructError::IllegalState { .. })
    ));
}

#[test]
fn check_is_stable_between_mutations() {
    let mut arena = Arena::new(32).unwrap();
    arena.create_safe_point();
    arena.push(Scalar::<u16>::new()).unwrap();
    let first = arena.check_safe_point();
    assert_eq!(arena.check_safe_point(), first);
    assert_eq!(arena.check_safe_point(), first);
}
