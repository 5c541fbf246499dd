//! LIFO stack allocator over one fixed region.
//!
//! `push` claims the next aligned block for a structure and `pop` hands
//! it back; pops must mirror pushes exactly. Safe points snapshot the
//! stack pointer so callers can assert that a scope released everything
//! it pushed.

use std::ptr;

use strata_layout::LayoutError;

use crate::error::StructError;
use crate::region::Buffer;
use crate::structure::Structure;

/// Alignment of the arena's base address.
const BASE_ALIGN: usize = 16;

/// One push: where the stack pointer was before, and where the value went.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Frame {
    previous: usize,
    value_offset: usize,
}

/// A snapshot taken by [`Arena::create_safe_point`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SafePoint {
    stack_pointer: usize,
    depth: usize,
}

impl SafePoint {
    /// Absolute stack pointer at the time of the snapshot.
    #[inline]
    pub fn stack_pointer(&self) -> usize {
        self.stack_pointer
    }

    /// Outstanding pushes at the time of the snapshot.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Scoped storage for short-lived structures.
///
/// The arena is the root of its region: pushed structures claim slices of
/// it and never own memory themselves.
#[derive(Debug)]
pub struct Arena {
    buffer: Buffer,
    // Offsets below are relative to the region base.
    stack_pointer: usize,
    frames: Vec<Frame>,
    safe_points: Vec<SafePoint>,
}

impl Arena {
    /// A zeroed arena of `capacity` bytes.
    pub fn new(capacity: usize) -> Result<Self, StructError> {
        let buffer = Buffer::new(capacity, BASE_ALIGN)?;
        tracing::debug!(region = %buffer.id(), capacity, "created arena");
        Ok(Self {
            buffer,
            stack_pointer: 0,
            frames: Vec::new(),
            safe_points: Vec::new(),
        })
    }

    /// Resolve `structure`, claim the next aligned block for it and return
    /// it allocated.
    pub fn push<S: Structure>(&mut self, mut structure: S) -> Result<S, StructError> {
        let descriptor = structure.generate_info()?;
        let base = self.buffer.base_address();
        let available = self.remaining();

        let aligned = strata_layout::align_up(base + self.stack_pointer, descriptor.alignment())
            .ok_or(LayoutError::Overflow)?
            - base;
        let end = aligned
            .checked_add(descriptor.footprint())
            .ok_or(LayoutError::Overflow)?;
        if end > self.capacity() {
            return Err(StructError::Capacity {
                requested: end - self.stack_pointer,
                available,
            });
        }

        // SAFETY: `[aligned, end)` lies inside the region.
        unsafe { ptr::write_bytes(self.buffer.as_ptr().add(aligned), 0, end - aligned) };
        structure.claim_buffer(&self.buffer, aligned)?;

        let frame = Frame {
            previous: self.stack_pointer,
            value_offset: aligned + descriptor.pre_padding(),
        };
        self.frames.push(frame);
        self.stack_pointer = end;
        tracing::debug!(
            type_name = %structure.type_name(),
            offset = frame.value_offset,
            bytes = end - frame.previous,
            depth = self.frames.len(),
            "arena push"
        );
        Ok(structure)
    }

    /// Build with `factory` and push.
    pub fn push_with<S: Structure>(
        &mut self,
        factory: impl FnOnce() -> S,
    ) -> Result<S, StructError> {
        self.push(factory())
    }

    /// Release the most recent push.
    pub fn pop(&mut self) -> Result<(), StructError> {
        let frame = self.frames.pop().ok_or_else(|| StructError::IllegalState {
            operation: "pop",
            reason: "arena has no outstanding pushes".to_string(),
        })?;
        self.stack_pointer = frame.previous;
        tracing::debug!(
            stack_pointer = self.stack_pointer,
            depth = self.frames.len(),
            "arena pop"
        );
        Ok(())
    }

    /// Release `structure`, which must be the most recent push.
    pub fn pop_structure<S: Structure + ?Sized>(&mut self, structure: &S) -> Result<(), StructError> {
        let is_top = self.frames.last().is_some_and(|frame| {
            structure
                .buffer()
                .is_some_and(|buffer| buffer.same_region(&self.buffer))
                && structure.offset() == Some(frame.value_offset)
        });
        if !is_top {
            return Err(StructError::IllegalState {
                operation: "pop structure",
                reason: format!(
                    "`{}` is not the most recent arena push",
                    structure.type_name()
                ),
            });
        }
        self.pop()
    }

    /// Remember the current stack pointer.
    pub fn create_safe_point(&mut self) -> SafePoint {
        let point = SafePoint {
            stack_pointer: self.stack_pointer(),
            depth: self.frames.len(),
        };
        self.safe_points.push(point);
        point
    }

    /// Whether every push since the most recent safe point was popped.
    /// With no safe point the arena must be empty.
    pub fn check_safe_point(&self) -> bool {
        let expected = self
            .safe_points
            .last()
            .map_or(self.base_pointer(), SafePoint::stack_pointer);
        self.stack_pointer() == expected
    }

    /// Forget the most recent safe point.
    pub fn release_safe_point(&mut self) -> Result<SafePoint, StructError> {
        self.safe_points.pop().ok_or_else(|| StructError::IllegalState {
            operation: "release safe point",
            reason: "no safe point is active".to_string(),
        })
    }

    #[inline]
    pub fn base_pointer(&self) -> usize {
        self.buffer.base_address()
    }

    #[inline]
    pub fn stack_pointer(&self) -> usize {
        self.buffer.base_address() + self.stack_pointer
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn used(&self) -> usize {
        self.stack_pointer
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.stack_pointer
    }

    /// Outstanding pushes.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn safe_point_depth(&self) -> usize {
        self.safe_points.len()
    }

    #[inline]
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        if !self.frames.is_empty() {
            tracing::warn!(
                outstanding = self.frames.len(),
                used = self.stack_pointer,
                "arena dropped with outstanding pushes"
            );
        }
    }
}

#[cfg(test)]
mod tests;
