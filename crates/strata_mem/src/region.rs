//! Off-heap storage regions.

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use strata_layout::LayoutError;

use crate::error::StructError;

static NEXT_REGION: AtomicU64 = AtomicU64::new(1);

/// Identity of one allocated region.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(u64);

impl RegionId {
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region#{}", self.0)
    }
}

/// A zeroed heap block; freed when the last [`Buffer`] handle drops.
struct Region {
    id: RegionId,
    ptr: NonNull<u8>,
    len: usize,
    layout: Layout,
}

impl Drop for Region {
    fn drop(&mut self) {
        // SAFETY: `ptr` came from `alloc_zeroed` with exactly `layout`.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

/// Shared handle to a native storage region.
///
/// The root structure (or arena) that created the region and every
/// descendant placed in it hold a clone. The handle only keeps the bytes
/// mapped; lifecycle decisions belong to the root.
#[derive(Clone)]
pub struct Buffer(Rc<Region>);

impl Buffer {
    /// Allocate `len` zeroed bytes aligned to `align` (a power of two).
    pub fn new(len: usize, align: usize) -> Result<Self, StructError> {
        if !align.is_power_of_two() {
            return Err(LayoutError::NotPowerOfTwo { alignment: align }.into());
        }
        let layout =
            Layout::from_size_align(len.max(1), align).map_err(|_| LayoutError::Overflow)?;
        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout)
        };
        let id = RegionId(NEXT_REGION.fetch_add(1, Ordering::Relaxed));
        tracing::trace!(%id, len, align, "allocated region");
        Ok(Self(Rc::new(Region {
            id,
            ptr,
            len,
            layout,
        })))
    }

    #[inline]
    pub fn id(&self) -> RegionId {
        self.0.id
    }

    /// Usable length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.len == 0
    }

    /// Absolute address of the first byte.
    #[inline]
    pub fn base_address(&self) -> usize {
        self.0.ptr.as_ptr() as usize
    }

    /// Raw pointer to the first byte.
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.0.ptr.as_ptr()
    }

    /// Whether two handles refer to the same region.
    #[inline]
    pub fn same_region(&self, other: &Buffer) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of live handles, the root's included.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.0.id)
            .field("base", &format_args!("{:#x}", self.base_address()))
            .field("len", &self.0.len)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests {
    use super::Buffer;

    #[test]
    fn buffers_are_aligned_and_zeroed() {
        let buffer = Buffer::new(64, 32).unwrap();
        assert_eq!(buffer.base_address() % 32, 0);
        assert_eq!(buffer.len(), 64);
        // SAFETY: the region is 64 bytes long.
        let bytes = unsafe { std::slice::from_raw_parts(buffer.as_ptr(), 64) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn clones_share_one_region() {
        let a = Buffer::new(8, 8).unwrap();
        let b = a.clone();
        let c = Buffer::new(8, 8).unwrap();
        assert!(a.same_region(&b));
        assert!(!a.same_region(&c));
        assert_eq!(a.id(), b.id());
        assert_eq!(a.handle_count(), 2);
    }

    #[test]
    fn invalid_alignment_is_rejected() {
        assert!(Buffer::new(8, 12).is_err());
    }
}
