#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use super::{LayoutDescriptor, Primitive};
use crate::LayoutError;

#[test]
fn footprint_includes_both_paddings() {
    let desc = LayoutDescriptor::padded(10, 4, 2, 4).unwrap();
    assert_eq!(desc.footprint(), 16);
    assert_eq!(desc.extent(), 14);
    assert!(!desc.is_compressed());
}

#[test]
fn rejects_non_power_of_two_alignment() {
    assert_eq!(
        LayoutDescriptor::new(12, 3),
        Err(LayoutError::NotPowerOfTwo { alignment: 3 })
    );
    assert_eq!(
        LayoutDescriptor::new(12, 0),
        Err(LayoutError::NotPowerOfTwo { alignment: 0 })
    );
}

#[test]
fn compressed_descriptor_is_unaligned_and_unpadded() {
    let desc = LayoutDescriptor::compressed(14);
    assert_eq!(desc.alignment(), 1);
    assert_eq!(desc.pre_padding(), 0);
    assert_eq!(desc.post_padding(), 0);
    assert_eq!(desc.footprint(), 14);
    assert!(desc.is_compressed());
}

#[test]
fn primitive_runs_scale_size_not_alignment() {
    let desc = Primitive::F32.descriptor(4).unwrap();
    assert_eq!(desc.size(), 16);
    assert_eq!(desc.alignment(), 4);
}

#[test]
fn zero_length_primitive_run_is_missing_length() {
    assert!(matches!(
        Primitive::I32.descriptor(0),
        Err(LayoutError::MissingLength { .. })
    ));
}

#[test]
fn primitive_names_parse() {
    assert_eq!(Primitive::from_name("short"), Some(Primitive::I16));
    assert_eq!(Primitive::from_name("double"), Some(Primitive::F64));
    assert_eq!(Primitive::from_name("quad"), None);
}

#[test]
fn display_marks_packed_descriptors() {
    assert_eq!(
        LayoutDescriptor::compressed(3).to_string(),
        "size=3 align=1 pad=[0, 0] packed"
    );
}
