//! Native addresses: raw pointers, typed pointers and pointer fields.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;

use strata_layout::{FieldType, LayoutDescriptor, LayoutError, Primitive};

use crate::array::StructureArray;
use crate::error::StructError;
use crate::state::StructCore;
use crate::structure::Structure;

/// An absolute native address. `0` is `NULL`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pointer(usize);

impl Pointer {
    pub const NULL: Self = Self(0);

    #[inline]
    pub const fn from_address(address: usize) -> Self {
        Self(address)
    }

    #[inline]
    pub const fn address(self) -> usize {
        self.0
    }

    /// Address of `target`, or `NULL` for `None`.
    pub fn of<S: Structure + ?Sized>(target: Option<&S>) -> Result<Self, StructError> {
        let Some(target) = target else {
            return Ok(Self::NULL);
        };
        target
            .address()
            .map(Self)
            .ok_or_else(|| StructError::illegal_state("take address", target.state()))
    }

    /// Address of the array's first element.
    pub fn of_array<T: Structure>(array: &StructureArray<T>) -> Result<Self, StructError> {
        array.element_address(0).map(Self)
    }

    #[inline]
    pub const fn is_null_ptr(self) -> bool {
        self.0 == 0
    }

    /// `self + bytes`, or `None` on overflow.
    #[inline]
    pub fn offset_by(self, bytes: usize) -> Option<Self> {
        self.0.checked_add(bytes).map(Self)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null_ptr() {
            f.write_str("NULL")
        } else {
            write!(f, "{:#x}", self.0)
        }
    }
}

/// A pointer that remembers what it points at.
///
/// The pointee is identified structurally by type name, so a cast only
/// succeeds when it names the same type. A `NULL` typed pointer has no
/// pointee and casts freely.
pub struct TypedPointer<T: Structure> {
    pointer: Pointer,
    type_name: Option<String>,
    stride: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Structure> TypedPointer<T> {
    pub fn null() -> Self {
        Self {
            pointer: Pointer::NULL,
            type_name: None,
            stride: 0,
            _marker: PhantomData,
        }
    }

    pub fn of(target: Option<&T>) -> Result<Self, StructError> {
        let Some(target) = target else {
            return Ok(Self::null());
        };
        Ok(Self {
            pointer: Pointer::of(Some(target))?,
            type_name: Some(target.type_name()),
            stride: target.descriptor().map_or(0, |d| d.extent()),
            _marker: PhantomData,
        })
    }

    /// Pointer to the first element, stepping by the array stride.
    pub fn of_array(array: &StructureArray<T>) -> Result<Self, StructError> {
        Ok(Self {
            pointer: Pointer::of_array(array)?,
            type_name: Some(array.element_type_name()),
            stride: array.stride(),
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn pointer(&self) -> Pointer {
        self.pointer
    }

    #[inline]
    pub fn address(&self) -> usize {
        self.pointer.address()
    }

    #[inline]
    pub fn is_null_ptr(&self) -> bool {
        self.pointer.is_null_ptr()
    }

    /// Structural name of the pointee; `None` for `NULL`.
    pub fn pointee(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Reinterpret as a pointer to `U`, named `type_name`.
    pub fn cast<U: Structure>(self, type_name: &str) -> Result<TypedPointer<U>, StructError> {
        match &self.type_name {
            Some(found) if found != type_name => Err(StructError::TypeMismatch {
                expected: type_name.to_string(),
                found: found.clone(),
            }),
            _ => Ok(TypedPointer {
                pointer: self.pointer,
                type_name: self.type_name,
                stride: self.stride,
                _marker: PhantomData,
            }),
        }
    }

    /// Pointer to element `index`: `address + index * stride`.
    /// Stepping a `NULL` pointer stays `NULL`.
    pub fn element(&self, index: usize) -> Result<Self, StructError> {
        if self.is_null_ptr() {
            return Ok(Self::null());
        }
        let address = index
            .checked_mul(self.stride)
            .and_then(|bytes| self.pointer.offset_by(bytes))
            .ok_or(LayoutError::Overflow)?;
        Ok(Self {
            pointer: address,
            type_name: self.type_name.clone(),
            stride: self.stride,
            _marker: PhantomData,
        })
    }
}

impl<T: Structure> Clone for TypedPointer<T> {
    fn clone(&self) -> Self {
        Self {
            pointer: self.pointer,
            type_name: self.type_name.clone(),
            stride: self.stride,
            _marker: PhantomData,
        }
    }
}

impl<T: Structure> PartialEq for TypedPointer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.pointer == other.pointer && self.type_name == other.type_name
    }
}

impl<T: Structure> fmt::Debug for TypedPointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedPointer")
            .field("pointer", &format_args!("{}", self.pointer))
            .field("pointee", &self.type_name)
            .field("stride", &self.stride)
            .finish()
    }
}

/// A host-width address stored inside native memory.
#[derive(Debug, Default)]
pub struct PointerField {
    core: StructCore,
    pointee: Option<String>,
}

impl PointerField {
    /// An untyped (`void*`) pointer field.
    pub fn new() -> Self {
        Self::default()
    }

    /// A pointer field spelled as `pointee*` in generated code.
    pub fn with_pointee(pointee: impl Into<String>) -> Self {
        Self {
            core: StructCore::new(),
            pointee: Some(pointee.into()),
        }
    }

    pub fn get(&self) -> Result<Pointer, StructError> {
        self.core.ensure_allocated("read pointer")?;
        // SAFETY: allocated, and the field owns a host-width slot.
        let raw = unsafe { ptr::read_unaligned(self.core.resolved_ptr().cast::<usize>()) };
        Ok(Pointer(raw))
    }

    pub fn set_pointer(&mut self, pointer: Pointer) -> Result<(), StructError> {
        self.core.ensure_allocated("write pointer")?;
        // SAFETY: allocated, and the field owns a host-width slot.
        unsafe { ptr::write_unaligned(self.core.resolved_ptr().cast::<usize>(), pointer.0) };
        Ok(())
    }

    /// Store the address of `target`, or `NULL` for `None`.
    pub fn set<S: Structure + ?Sized>(&mut self, target: Option<&S>) -> Result<(), StructError> {
        self.set_pointer(Pointer::of(target)?)
    }

    pub fn set_of_array<T: Structure>(
        &mut self,
        array: &StructureArray<T>,
    ) -> Result<(), StructError> {
        self.set_pointer(Pointer::of_array(array)?)
    }

    pub fn set_typed<T: Structure>(&mut self, pointer: &TypedPointer<T>) -> Result<(), StructError> {
        self.set_pointer(pointer.pointer())
    }

    pub fn is_null_ptr(&self) -> Result<bool, StructError> {
        Ok(self.get()?.is_null_ptr())
    }
}

impl Structure for PointerField {
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
        FieldType::Pointer(self.pointee.clone())
    }

    fn resolve_descriptor(&mut self) -> Result<LayoutDescriptor, StructError> {
        Ok(Primitive::Pointer.descriptor(1)?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
