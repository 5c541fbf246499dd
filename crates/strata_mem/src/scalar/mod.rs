//! Numeric leaves: single values and fixed-length vectors.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;

use strata_layout::{FieldType, LayoutDescriptor, Primitive};

use crate::error::StructError;
use crate::state::StructCore;
use crate::structure::Structure;

/// A Rust type with a fixed native representation.
///
/// `bool` is deliberately absent: not every byte pattern is a valid `bool`.
pub trait NativeScalar: Copy + PartialEq + fmt::Debug + 'static {
    const PRIMITIVE: Primitive;
}

macro_rules! native_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl NativeScalar for $ty {
                const PRIMITIVE: Primitive = Primitive::$kind;
            }
        )*
    };
}

native_scalar! {
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

/// `len` consecutive values of `T` in native memory.
///
/// Length 1 is a plain scalar field; anything longer is a fixed-length
/// vector such as `int32_t[4]`.
#[derive(Debug)]
pub struct Scalar<T: NativeScalar> {
    core: StructCore,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: NativeScalar> Default for Scalar<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NativeScalar> Scalar<T> {
    pub fn new() -> Self {
        Self::array(1)
    }

    /// A vector of `len` elements. A zero length fails in `generate_info`.
    pub fn array(len: usize) -> Self {
        Self {
            core: StructCore::new(),
            len,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read element `index`.
    ///
    /// # Safety
    ///
    /// The structure must be allocated and `index < self.len()`.
    #[inline]
    pub unsafe fn get(&self, index: usize) -> T {
        debug_assert!(self.core.is_allocated(), "read from unallocated scalar");
        debug_assert!(index < self.len, "scalar index {index} >= {}", self.len);
        // SAFETY: upheld by the caller.
        unsafe {
            ptr::read_unaligned(
                self.core
                    .resolved_ptr()
                    .add(index * T::PRIMITIVE.size())
                    .cast::<T>(),
            )
        }
    }

    /// Write element `index`.
    ///
    /// # Safety
    ///
    /// The structure must be allocated and `index < self.len()`.
    #[inline]
    pub unsafe fn put(&mut self, index: usize, value: T) {
        debug_assert!(self.core.is_allocated(), "write to unallocated scalar");
        debug_assert!(index < self.len, "scalar index {index} >= {}", self.len);
        // SAFETY: upheld by the caller.
        unsafe {
            ptr::write_unaligned(
                self.core
                    .resolved_ptr()
                    .add(index * T::PRIMITIVE.size())
                    .cast::<T>(),
                value,
            );
        }
    }

    pub fn try_get(&self, index: usize) -> Result<T, StructError> {
        self.core.check_index(index, self.len, "read scalar")?;
        // SAFETY: allocation and bounds checked above.
        Ok(unsafe { self.get(index) })
    }

    pub fn try_put(&mut self, index: usize, value: T) -> Result<(), StructError> {
        self.core.check_index(index, self.len, "write scalar")?;
        // SAFETY: allocation and bounds checked above.
        unsafe { self.put(index, value) };
        Ok(())
    }

    /// Element 0.
    pub fn value(&self) -> Result<T, StructError> {
        self.try_get(0)
    }

    pub fn set_value(&mut self, value: T) -> Result<(), StructError> {
        self.try_put(0, value)
    }

    pub fn to_vec(&self) -> Result<Vec<T>, StructError> {
        (0..self.len).map(|i| self.try_get(i)).collect()
    }

    /// Write `values` starting at element 0; the tail is left untouched.
    pub fn write_slice(&mut self, values: &[T]) -> Result<(), StructError> {
        if values.len() > self.len {
            return Err(StructError::OutOfRange {
                index: values.len() - 1,
                len: self.len,
            });
        }
        for (index, value) in values.iter().enumerate() {
            self.try_put(index, *value)?;
        }
        Ok(())
    }
}

impl<T: NativeScalar> Structure for Scalar<T> {
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
        FieldType::Primitive(T::PRIMITIVE).repeated(self.len)
    }

    fn resolve_descriptor(&mut self) -> Result<LayoutDescriptor, StructError> {
        Ok(T::PRIMITIVE.descriptor(self.len)?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests;
