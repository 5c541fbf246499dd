//! Fixed-capacity, NUL-terminated strings (`char name[N]`).

use std::any::Any;
use std::ptr;
use std::slice;

use strata_layout::{FieldType, LayoutDescriptor, LayoutError, Primitive};

use crate::error::StructError;
use crate::state::StructCore;
use crate::structure::Structure;

/// A `char[capacity]` field holding UTF-8 text.
///
/// Writes keep one byte for the terminator, so at most `capacity - 1`
/// bytes of text are stored; longer input is cut at a char boundary.
#[derive(Debug)]
pub struct NativeString {
    core: StructCore,
    capacity: usize,
}

impl NativeString {
    pub fn new(capacity: usize) -> Self {
        Self {
            core: StructCore::new(),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Read up to the first NUL. Invalid UTF-8 is replaced.
    ///
    /// # Safety
    ///
    /// The structure must be allocated.
    pub unsafe fn get(&self) -> String {
        debug_assert!(self.core.is_allocated(), "read from unallocated string");
        // SAFETY: an allocated string owns `capacity` bytes at its address.
        let bytes = unsafe { slice::from_raw_parts(self.core.resolved_ptr(), self.capacity) };
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    }

    /// Store `text`, truncated to fit, and zero the rest of the field.
    ///
    /// # Safety
    ///
    /// The structure must be allocated.
    pub unsafe fn put(&mut self, text: &str) {
        debug_assert!(self.core.is_allocated(), "write to unallocated string");
        let stored = truncate_to_boundary(text, self.capacity.saturating_sub(1));
        let dst = self.core.resolved_ptr();
        // SAFETY: `stored.len() < capacity` and the field owns `capacity` bytes.
        unsafe {
            ptr::copy_nonoverlapping(stored.as_ptr(), dst, stored.len());
            ptr::write_bytes(dst.add(stored.len()), 0, self.capacity - stored.len());
        }
    }

    pub fn try_get(&self) -> Result<String, StructError> {
        self.core.ensure_allocated("read string")?;
        // SAFETY: allocation checked above.
        Ok(unsafe { self.get() })
    }

    pub fn try_put(&mut self, text: &str) -> Result<(), StructError> {
        self.core.ensure_allocated("write string")?;
        // SAFETY: allocation checked above.
        unsafe { self.put(text) };
        Ok(())
    }
}

fn truncate_to_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

impl Structure for NativeString {
    fn core(&self) -> &StructCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StructCore {
        &mut self.core
    }

    fn type_name(&self) -> String {
        self.field_type().to_string()
    }

    fn field_type(&self) -> FieldType {
        FieldType::Array(Box::new(FieldType::Primitive(Primitive::Char)), self.capacity)
    }

    fn resolve_descriptor(&mut self) -> Result<LayoutDescriptor, StructError> {
        if self.capacity == 0 {
            return Err(LayoutError::MissingLength {
                what: "string capacity",
            }
            .into());
        }
        Ok(Primitive::Char.descriptor(self.capacity)?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
