//! Binary layout computation for native structures.
//!
//! This crate is the pure half of Strata: it turns ordered field
//! descriptors into C-ABI-compatible layouts and knows nothing about
//! memory. `strata_mem` builds storage on top of it and `strata_emit`
//! renders the same layouts as native source text.
//!
//! - **Descriptors** ([`LayoutDescriptor`], [`Primitive`]): size, alignment
//!   and padding of a single field or a whole structure.
//! - **ABI strategies** ([`AbiStrategy`], [`MsvcX64`], [`SysVI386`]): the
//!   pluggable algorithm mapping children to offsets and a composite
//!   descriptor, selected at runtime through [`AbiSelector`].
//! - **Registry** ([`LayoutRegistry`]): an explicit per-type layout cache
//!   threaded through configuration instead of living in static state.
//! - **Declarations** ([`StructDef`], [`FieldDecl`], [`FieldType`]): field
//!   names and types, consumed by code generation.
//!
//! # Example
//!
//! ```
//! use strata_layout::{AbiStrategy, MsvcX64, Primitive};
//!
//! let fields = [
//!     Primitive::I32.descriptor(1)?,
//!     Primitive::F64.descriptor(1)?,
//!     Primitive::I16.descriptor(1)?,
//! ];
//! let layout = MsvcX64.compute_layout(false, &fields)?;
//! assert_eq!(layout.offsets(), &[0, 8, 16]);
//! assert_eq!(layout.size(), 24);
//! # Ok::<(), strata_layout::LayoutError>(())
//! ```

mod abi;
mod decl;
mod descriptor;
mod error;
mod registry;

pub use abi::{AbiSelector, AbiStrategy, MsvcX64, StructLayout, SysVI386};
pub use decl::{FieldDecl, FieldType, StructDef};
pub use descriptor::{LayoutDescriptor, Primitive};
pub use error::LayoutError;
pub use registry::{LayoutKey, LayoutRegistry};

/// Round `value` up to the next multiple of `align`.
///
/// `align` must be a power of two; `align == 1` returns `value` unchanged.
/// Returns `None` on overflow.
#[inline]
pub const fn align_up(value: usize, align: usize) -> Option<usize> {
    let mask = align - 1;
    match value.checked_add(mask) {
        Some(bumped) => Some(bumped & !mask),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::align_up;

    #[test]
    fn align_up_rounds_to_power_of_two() {
        assert_eq!(align_up(0, 8), Some(0));
        assert_eq!(align_up(1, 8), Some(8));
        assert_eq!(align_up(8, 8), Some(8));
        assert_eq!(align_up(13, 4), Some(16));
        assert_eq!(align_up(13, 1), Some(13));
    }

    #[test]
    fn align_up_reports_overflow() {
        assert_eq!(align_up(usize::MAX, 2), None);
    }
}
