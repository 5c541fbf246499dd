//! Layout descriptors for fields and structures.

use std::fmt;

use crate::error::LayoutError;

/// Size, alignment and padding of one field or of a whole structure.
///
/// Invariants (enforced by the constructors):
/// - `alignment` is a power of two; `1` means unconstrained.
/// - `size` excludes padding; the footprint is
///   `pre_padding + size + post_padding`.
/// - A compressed descriptor has `alignment == 1` and zero padding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutDescriptor {
    alignment: usize,
    compressed: bool,
    pre_padding: usize,
    size: usize,
    post_padding: usize,
}

impl LayoutDescriptor {
    /// A naturally aligned descriptor with no padding.
    pub fn new(size: usize, alignment: usize) -> Result<Self, LayoutError> {
        Self::padded(size, alignment, 0, 0)
    }

    /// A naturally aligned descriptor with explicit padding on either side.
    pub fn padded(
        size: usize,
        alignment: usize,
        pre_padding: usize,
        post_padding: usize,
    ) -> Result<Self, LayoutError> {
        if !alignment.is_power_of_two() {
            return Err(LayoutError::NotPowerOfTwo { alignment });
        }
        pre_padding
            .checked_add(size)
            .and_then(|n| n.checked_add(post_padding))
            .ok_or(LayoutError::Overflow)?;
        Ok(Self {
            alignment,
            compressed: false,
            pre_padding,
            size,
            post_padding,
        })
    }

    /// A packed descriptor: alignment 1, no padding.
    pub const fn compressed(size: usize) -> Self {
        Self {
            alignment: 1,
            compressed: true,
            pre_padding: 0,
            size,
            post_padding: 0,
        }
    }

    #[inline]
    pub const fn alignment(&self) -> usize {
        self.alignment
    }

    #[inline]
    pub const fn is_compressed(&self) -> bool {
        self.compressed
    }

    #[inline]
    pub const fn pre_padding(&self) -> usize {
        self.pre_padding
    }

    /// Payload size, excluding padding.
    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub const fn post_padding(&self) -> usize {
        self.post_padding
    }

    /// Bytes this descriptor occupies when placed: `size + post_padding`.
    ///
    /// This is the C `sizeof`. Pre-padding is decided by whoever places the
    /// value, so it is not part of the extent.
    #[inline]
    pub const fn extent(&self) -> usize {
        self.size + self.post_padding
    }

    /// Total bytes including padding on both sides.
    #[inline]
    pub const fn footprint(&self) -> usize {
        self.pre_padding + self.size + self.post_padding
    }
}

impl fmt::Display for LayoutDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "size={} align={} pad=[{}, {}]",
            self.size, self.alignment, self.pre_padding, self.post_padding
        )?;
        if self.compressed {
            write!(f, " packed")?;
        }
        Ok(())
    }
}

/// Native scalar kinds with their natural size and alignment.
///
/// `Pointer` is host pointer width; every other kind has a fixed width.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Primitive {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    /// C `_Bool`, one byte.
    Bool,
    /// C `char`, one byte.
    Char,
    /// Data pointer, host width.
    Pointer,
}

impl Primitive {
    /// Natural size in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 | Self::Bool | Self::Char => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
            Self::Pointer => std::mem::size_of::<usize>(),
        }
    }

    /// Natural alignment; equal to the size for every scalar kind.
    pub const fn alignment(self) -> usize {
        self.size()
    }

    /// Descriptor for a run of `count` values (`count == 1` for a plain field).
    pub fn descriptor(self, count: usize) -> Result<LayoutDescriptor, LayoutError> {
        if count == 0 {
            return Err(LayoutError::MissingLength {
                what: "primitive array",
            });
        }
        let size = self
            .size()
            .checked_mul(count)
            .ok_or(LayoutError::Overflow)?;
        LayoutDescriptor::new(size, self.alignment())
    }

    /// The C spelling (`<stdint.h>` names).
    pub const fn c_name(self) -> &'static str {
        match self {
            Self::I8 => "int8_t",
            Self::U8 => "uint8_t",
            Self::I16 => "int16_t",
            Self::U16 => "uint16_t",
            Self::I32 => "int32_t",
            Self::U32 => "uint32_t",
            Self::I64 => "int64_t",
            Self::U64 => "uint64_t",
            Self::F32 => "float",
            Self::F64 => "double",
            Self::Bool => "_Bool",
            Self::Char => "char",
            Self::Pointer => "void*",
        }
    }

    /// The Rust spelling.
    pub const fn rust_name(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Bool => "bool",
            Self::Char => "core::ffi::c_char",
            Self::Pointer => "*mut core::ffi::c_void",
        }
    }

    /// Parse a short name as accepted on the command line
    /// (`i32`, `int`, `double`, `char`, `ptr`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "i8" | "int8_t" | "schar" => Self::I8,
            "u8" | "uint8_t" | "byte" => Self::U8,
            "i16" | "int16_t" | "short" => Self::I16,
            "u16" | "uint16_t" => Self::U16,
            "i32" | "int32_t" | "int" => Self::I32,
            "u32" | "uint32_t" => Self::U32,
            "i64" | "int64_t" | "long" => Self::I64,
            "u64" | "uint64_t" => Self::U64,
            "f32" | "float" => Self::F32,
            "f64" | "double" => Self::F64,
            "bool" => Self::Bool,
            "char" => Self::Char,
            "ptr" | "pointer" => Self::Pointer,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}

#[cfg(test)]
mod tests;
