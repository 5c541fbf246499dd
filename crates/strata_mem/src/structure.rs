//! The `Structure` trait: storage API shared by every native-backed value.

use std::any::Any;

use strata_layout::{FieldType, LayoutDescriptor, LayoutError, StructDef, StructLayout};

use crate::error::StructError;
use crate::region::Buffer;
use crate::state::{AllocationState, Ownership, StructCore};

/// A value whose binary layout and storage location are managed
/// explicitly.
///
/// Implementors supply the descriptor (`resolve_descriptor`) and, for
/// containers, the placement of their children (`place_children`). The
/// provided methods implement the allocation state machine on top of
/// [`StructCore`].
pub trait Structure: Any {
    fn core(&self) -> &StructCore;

    fn core_mut(&mut self) -> &mut StructCore;

    /// Structural type name, as used by typed pointers and diagnostics.
    fn type_name(&self) -> String;

    /// How this structure is spelled when it appears as a struct member.
    fn field_type(&self) -> FieldType;

    /// Compute the descriptor. Called once, from `generate_info`.
    fn resolve_descriptor(&mut self) -> Result<LayoutDescriptor, StructError>;

    /// Build and check everything `place_children` will claim. Runs before
    /// any storage is assigned, so a failure leaves the whole tree
    /// `Allocatable`.
    fn prepare_children(&mut self) -> Result<(), StructError> {
        Ok(())
    }

    /// Assign storage to children; `offset` is this structure's value
    /// offset inside `buffer`. Only called after `prepare_children`
    /// succeeded. Leaves have nothing to place.
    fn place_children(&mut self, _buffer: &Buffer, _offset: usize) -> Result<(), StructError> {
        Ok(())
    }

    /// Append the composite definitions this structure depends on,
    /// innermost first. Leaves contribute nothing.
    fn collect_definitions(
        &self,
        _out: &mut Vec<(StructDef, StructLayout)>,
    ) -> Result<(), StructError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    #[inline]
    fn state(&self) -> AllocationState {
        self.core().state()
    }

    #[inline]
    fn descriptor(&self) -> Option<LayoutDescriptor> {
        self.core().descriptor()
    }

    /// Offset relative to the root structure's region.
    #[inline]
    fn offset(&self) -> Option<usize> {
        self.core().placement().map(crate::Placement::offset)
    }

    /// Absolute address: root base plus relative offset.
    #[inline]
    fn address(&self) -> Option<usize> {
        self.core().placement().map(crate::Placement::address)
    }

    #[inline]
    fn buffer(&self) -> Option<&Buffer> {
        self.core().placement().map(crate::Placement::buffer)
    }

    /// Whether this structure carved its own storage.
    fn is_root(&self) -> bool {
        self.core()
            .placement()
            .is_some_and(|p| p.ownership() == Ownership::Root)
    }

    /// `Unallocated -> Allocatable`. Idempotent once a descriptor exists.
    fn generate_info(&mut self) -> Result<LayoutDescriptor, StructError> {
        if let Some(descriptor) = self.core().descriptor() {
            return Ok(descriptor);
        }
        let descriptor = self.resolve_descriptor()?;
        self.core_mut().mark_allocatable(descriptor);
        Ok(descriptor)
    }

    /// `Allocatable -> Allocated` on a fresh region owned by this structure.
    fn allocate(&mut self) -> Result<(), StructError> {
        let descriptor = self
            .core()
            .expect_state(AllocationState::Allocatable, "allocate")?;
        let buffer = Buffer::new(descriptor.footprint(), descriptor.alignment())?;
        tracing::debug!(
            type_name = %self.type_name(),
            region = %buffer.id(),
            bytes = descriptor.footprint(),
            "allocated root structure"
        );
        bind(self, buffer, 0, Ownership::Root, "allocate")
    }

    /// `Allocatable -> Allocated` on storage supplied by the caller, with
    /// the footprint starting at `offset`.
    fn claim_buffer(&mut self, buffer: &Buffer, offset: usize) -> Result<(), StructError> {
        bind(self, buffer.clone(), offset, Ownership::Claimed, "claim buffer")
    }
}

fn bind<S: Structure + ?Sized>(
    structure: &mut S,
    buffer: Buffer,
    offset: usize,
    ownership: Ownership,
    operation: &'static str,
) -> Result<(), StructError> {
    let descriptor = structure
        .core()
        .expect_state(AllocationState::Allocatable, operation)?;
    let available = buffer.len().saturating_sub(offset);
    if descriptor.footprint() > available {
        return Err(StructError::Capacity {
            requested: descriptor.footprint(),
            available,
        });
    }

    structure.prepare_children()?;
    let value_offset = offset + descriptor.pre_padding();
    structure.place_children(&buffer, value_offset)?;
    tracing::trace!(
        region = %buffer.id(),
        offset = value_offset,
        ?ownership,
        "bound structure"
    );
    structure
        .core_mut()
        .mark_allocated(buffer, value_offset, ownership);
    Ok(())
}

/// Claim storage for a child whose value the parent places at
/// `value_offset`. The parent's layout already accounts for the gap before
/// the child, so the child's own pre-padding is folded back out.
pub(crate) fn place_value<S: Structure + ?Sized>(
    child: &mut S,
    buffer: &Buffer,
    value_offset: usize,
) -> Result<(), StructError> {
    let pre = child.descriptor().map_or(0, |d| d.pre_padding());
    let start = value_offset
        .checked_sub(pre)
        .ok_or(LayoutError::Overflow)?;
    child.claim_buffer(buffer, start)
}

/// Resolve and allocate `structure` as a root in one step.
pub fn allocated<S: Structure>(mut structure: S) -> Result<S, StructError> {
    structure.generate_info()?;
    structure.allocate()?;
    Ok(structure)
}
