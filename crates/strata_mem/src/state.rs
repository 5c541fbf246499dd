//! Allocation state carried by every structure.

use std::fmt;
use std::ptr;

use strata_layout::LayoutDescriptor;

use crate::error::StructError;
use crate::region::Buffer;

/// Lifecycle of a structure. Transitions only move forward.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AllocationState {
    /// No descriptor yet.
    #[default]
    Unallocated,
    /// Descriptor known, no storage.
    Allocatable,
    /// Storage assigned; accessors are live.
    Allocated,
}

impl fmt::Display for AllocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unallocated => "unallocated",
            Self::Allocatable => "allocatable",
            Self::Allocated => "allocated",
        })
    }
}

/// Who provided a structure's storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// The structure carved a fresh region itself and is its root.
    Root,
    /// Storage was handed in by a parent, an array or an arena.
    Claimed,
}

/// Where an allocated structure lives: a region plus an offset relative to
/// the region start, which is where the root structure sits.
#[derive(Clone, Debug)]
pub struct Placement {
    buffer: Buffer,
    offset: usize,
    ownership: Ownership,
}

impl Placement {
    #[inline]
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Offset of the value's first byte, relative to the root region.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// `root.base + offset`.
    #[inline]
    pub fn address(&self) -> usize {
        self.buffer.base_address() + self.offset
    }
}

/// State shared by every [`Structure`](crate::Structure) implementation.
///
/// Implementors embed one and hand it out through `core()`/`core_mut()`;
/// the provided trait methods drive all transitions.
#[derive(Debug)]
pub struct StructCore {
    state: AllocationState,
    descriptor: Option<LayoutDescriptor>,
    placement: Option<Placement>,
    // Cached `placement.address()` as a pointer; null until allocated.
    resolved: *mut u8,
}

impl Default for StructCore {
    fn default() -> Self {
        Self::new()
    }
}

impl StructCore {
    pub const fn new() -> Self {
        Self {
            state: AllocationState::Unallocated,
            descriptor: None,
            placement: None,
            resolved: ptr::null_mut(),
        }
    }

    #[inline]
    pub fn state(&self) -> AllocationState {
        self.state
    }

    #[inline]
    pub fn descriptor(&self) -> Option<LayoutDescriptor> {
        self.descriptor
    }

    #[inline]
    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.state == AllocationState::Allocated
    }

    /// Address of the value's first byte, null before allocation.
    #[inline]
    pub fn resolved_ptr(&self) -> *mut u8 {
        self.resolved
    }

    /// The descriptor, provided the structure is in `expected`.
    pub(crate) fn expect_state(
        &self,
        expected: AllocationState,
        operation: &'static str,
    ) -> Result<LayoutDescriptor, StructError> {
        match self.descriptor {
            Some(descriptor) if self.state == expected => Ok(descriptor),
            _ => Err(StructError::illegal_state(operation, self.state)),
        }
    }

    /// `IllegalState` unless allocated.
    pub fn ensure_allocated(&self, operation: &'static str) -> Result<(), StructError> {
        if self.is_allocated() {
            Ok(())
        } else {
            Err(StructError::illegal_state(operation, self.state))
        }
    }

    /// Checked access gate used by the `try_*` accessors: `IllegalState`
    /// first, then `OutOfRange`.
    pub fn check_index(
        &self,
        index: usize,
        len: usize,
        operation: &'static str,
    ) -> Result<(), StructError> {
        self.ensure_allocated(operation)?;
        if index >= len {
            return Err(StructError::OutOfRange { index, len });
        }
        Ok(())
    }

    pub(crate) fn mark_allocatable(&mut self, descriptor: LayoutDescriptor) {
        debug_assert_eq!(self.state, AllocationState::Unallocated);
        self.descriptor = Some(descriptor);
        self.state = AllocationState::Allocatable;
    }

    pub(crate) fn mark_allocated(&mut self, buffer: Buffer, offset: usize, ownership: Ownership) {
        debug_assert_eq!(self.state, AllocationState::Allocatable);
        // SAFETY: callers checked `offset + footprint <= buffer.len()`.
        self.resolved = unsafe { buffer.as_ptr().add(offset) };
        self.placement = Some(Placement {
            buffer,
            offset,
            ownership,
        });
        self.state = AllocationState::Allocated;
    }
}
