//! Enum fields stored as their C `int` discriminant.

use std::any::Any;
use std::marker::PhantomData;
use std::ptr;

use strata_layout::{FieldType, LayoutDescriptor, Primitive};

use crate::error::StructError;
use crate::state::StructCore;
use crate::structure::Structure;

/// Mapping between a Rust enum and its native discriminant.
pub trait EnumRepr: Copy + 'static {
    const NAME: &'static str;

    fn to_raw(self) -> i32;

    /// `None` for a discriminant with no variant.
    fn from_raw(raw: i32) -> Option<Self>;
}

/// An `E`-typed field backed by an `int32_t`.
#[derive(Debug)]
pub struct NativeEnum<E: EnumRepr> {
    core: StructCore,
    _marker: PhantomData<E>,
}

impl<E: EnumRepr> Default for NativeEnum<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EnumRepr> NativeEnum<E> {
    pub fn new() -> Self {
        Self {
            core: StructCore::new(),
            _marker: PhantomData,
        }
    }

    /// The stored discriminant.
    ///
    /// # Safety
    ///
    /// The structure must be allocated.
    #[inline]
    pub unsafe fn raw(&self) -> i32 {
        debug_assert!(self.core.is_allocated(), "read from unallocated enum");
        // SAFETY: upheld by the caller.
        unsafe { ptr::read_unaligned(self.core.resolved_ptr().cast::<i32>()) }
    }

    /// Decode the stored discriminant.
    ///
    /// # Safety
    ///
    /// The structure must be allocated.
    #[inline]
    pub unsafe fn get(&self) -> Option<E> {
        // SAFETY: upheld by the caller.
        E::from_raw(unsafe { self.raw() })
    }

    /// # Safety
    ///
    /// The structure must be allocated.
    #[inline]
    pub unsafe fn put(&mut self, value: E) {
        debug_assert!(self.core.is_allocated(), "write to unallocated enum");
        // SAFETY: upheld by the caller.
        unsafe { ptr::write_unaligned(self.core.resolved_ptr().cast::<i32>(), value.to_raw()) };
    }

    /// Checked read; `TypeMismatch` when the discriminant has no variant.
    pub fn try_get(&self) -> Result<E, StructError> {
        self.core.ensure_allocated("read enum")?;
        // SAFETY: allocation checked above.
        let raw = unsafe { self.raw() };
        E::from_raw(raw).ok_or_else(|| StructError::TypeMismatch {
            expected: E::NAME.to_string(),
            found: format!("discriminant {raw}"),
        })
    }

    pub fn try_put(&mut self, value: E) -> Result<(), StructError> {
        self.core.ensure_allocated("write enum")?;
        // SAFETY: allocation checked above.
        unsafe { self.put(value) };
        Ok(())
    }
}

impl<E: EnumRepr> Structure for NativeEnum<E> {
    fn core(&self) -> &StructCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StructCore {
        &mut self.core
    }

    fn type_name(&self) -> String {
        E::NAME.to_string()
    }

    fn field_type(&self) -> FieldType {
        FieldType::Primitive(Primitive::I32)
    }

    fn resolve_descriptor(&mut self) -> Result<LayoutDescriptor, StructError> {
        Ok(Primitive::I32.descriptor(1)?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
