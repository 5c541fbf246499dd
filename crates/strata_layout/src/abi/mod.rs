//! ABI strategies: ordered child descriptors in, composite layout out.
//!
//! Every strategy shares the same C struct algorithm and differs only in
//! how far it lets a field's alignment reach:
//!
//! ```text
//! cursor = 0
//! for child i:
//!     offset[i] = align_up(cursor, min(align_i, max_field_alignment))
//!     cursor    = offset[i] + extent_i
//! struct_align = max(capped align_i)
//! size         = align_up(cursor, struct_align)      // unless compressed
//! ```
//!
//! A compressed layout skips all of it: fields are packed back-to-back,
//! alignment is 1 and the size is the final cursor.

use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::descriptor::LayoutDescriptor;
use crate::error::LayoutError;

/// Computed layout of a composite: its own descriptor plus per-field
/// placement.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct StructLayout {
    descriptor: LayoutDescriptor,
    offsets: SmallVec<[usize; 8]>,
    padding: SmallVec<[usize; 8]>,
}

impl StructLayout {
    /// The composite descriptor. Its `size` is the end of the last field
    /// and its `post_padding` is the tail padding.
    #[inline]
    pub fn descriptor(&self) -> LayoutDescriptor {
        self.descriptor
    }

    /// Total size of the composite (the C `sizeof`).
    #[inline]
    pub fn size(&self) -> usize {
        self.descriptor.extent()
    }

    #[inline]
    pub fn alignment(&self) -> usize {
        self.descriptor.alignment()
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.descriptor.is_compressed()
    }

    /// Byte offset of every field, in field order.
    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Padding injected immediately before each field, the field's own
    /// pre-padding included.
    #[inline]
    pub fn padding_before(&self) -> &[usize] {
        &self.padding
    }

    /// Padding after the last field, up to the composite alignment.
    #[inline]
    pub fn tail_padding(&self) -> usize {
        self.descriptor.post_padding()
    }

    #[inline]
    pub fn field_count(&self) -> usize {
        self.offsets.len()
    }
}

/// A target ABI's struct layout algorithm.
///
/// Implementations must be pure: identical inputs give identical layouts.
pub trait AbiStrategy {
    /// Stable identifier, also used as a registry key component.
    fn name(&self) -> &'static str;

    /// Upper bound applied to every field alignment.
    fn max_field_alignment(&self) -> usize;

    /// Effective alignment of `field` inside a non-compressed composite.
    fn field_alignment(&self, field: &LayoutDescriptor) -> usize {
        field.alignment().min(self.max_field_alignment())
    }

    /// Lay out `children` in order.
    fn compute_layout(
        &self,
        compressed: bool,
        children: &[LayoutDescriptor],
    ) -> Result<StructLayout, LayoutError> {
        sequential_layout(self, compressed, children)
    }
}

fn sequential_layout<S: AbiStrategy + ?Sized>(
    abi: &S,
    compressed: bool,
    children: &[LayoutDescriptor],
) -> Result<StructLayout, LayoutError> {
    if children.is_empty() {
        return Err(LayoutError::EmptyComposite {
            type_name: "<anonymous>".to_string(),
        });
    }

    let mut offsets = SmallVec::with_capacity(children.len());
    let mut padding = SmallVec::with_capacity(children.len());
    let mut cursor = 0usize;
    let mut struct_align = 1usize;

    for child in children {
        if !child.alignment().is_power_of_two() {
            return Err(LayoutError::NotPowerOfTwo {
                alignment: child.alignment(),
            });
        }
        let align = if compressed {
            1
        } else {
            abi.field_alignment(child)
        };
        // The child's own pre-padding sits between the cursor and its value.
        let offset = cursor
            .checked_add(child.pre_padding())
            .and_then(|start| crate::align_up(start, align))
            .ok_or(LayoutError::Overflow)?;
        padding.push(offset - cursor);
        offsets.push(offset);
        cursor = offset
            .checked_add(child.extent())
            .ok_or(LayoutError::Overflow)?;
        struct_align = struct_align.max(align);
    }

    let descriptor = if compressed {
        LayoutDescriptor::compressed(cursor)
    } else {
        let total = crate::align_up(cursor, struct_align).ok_or(LayoutError::Overflow)?;
        LayoutDescriptor::padded(cursor, struct_align, 0, total - cursor)?
    };

    tracing::trace!(
        abi = abi.name(),
        compressed,
        fields = children.len(),
        size = descriptor.extent(),
        align = descriptor.alignment(),
        "computed struct layout"
    );

    Ok(StructLayout {
        descriptor,
        offsets,
        padding,
    })
}

/// Microsoft x64: natural alignment under the default `/Zp16` packing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MsvcX64;

impl AbiStrategy for MsvcX64 {
    fn name(&self) -> &'static str {
        "msvc-x64"
    }

    fn max_field_alignment(&self) -> usize {
        16
    }
}

/// System V i386: struct members are aligned to at most 4 bytes, so
/// `double` and `int64_t` members sit on 4-byte boundaries.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SysVI386;

impl AbiStrategy for SysVI386 {
    fn name(&self) -> &'static str {
        "sysv-i386"
    }

    fn max_field_alignment(&self) -> usize {
        4
    }
}

/// Runtime choice of ABI strategy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum AbiSelector {
    #[default]
    MsvcX64,
    SysVI386,
}

impl AbiSelector {
    /// The strategy this selector names.
    pub fn strategy(self) -> &'static dyn AbiStrategy {
        match self {
            Self::MsvcX64 => &MsvcX64,
            Self::SysVI386 => &SysVI386,
        }
    }

    pub fn name(self) -> &'static str {
        self.strategy().name()
    }
}

impl fmt::Display for AbiSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AbiSelector {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "msvc-x64" | "msvc" | "win64" => Ok(Self::MsvcX64),
            "sysv-i386" | "i386" | "x86" => Ok(Self::SysVI386),
            other => Err(LayoutError::UnknownAbi(other.to_string())),
        }
    }
}
