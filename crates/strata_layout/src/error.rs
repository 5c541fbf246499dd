//! Layout errors.

use thiserror::Error;

/// A field or composite cannot produce a valid layout descriptor.
///
/// Raised at construction time; layout errors are never transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// An alignment that is zero or not a power of two.
    #[error("alignment {alignment} is not a power of two")]
    NotPowerOfTwo { alignment: usize },
    /// A composite was laid out with no children.
    #[error("composite `{type_name}` has no fields")]
    EmptyComposite { type_name: String },
    /// A fixed-length field (array, string) was declared with length zero.
    #[error("{what} requires a non-zero length")]
    MissingLength { what: &'static str },
    /// Two fields were registered at the same index.
    #[error("field index {index} of `{type_name}` is registered twice")]
    DuplicateField { type_name: String, index: usize },
    /// An array factory produced elements with differing layouts.
    #[error("array element {index} does not match the layout of element 0")]
    ElementMismatch { index: usize },
    /// Size arithmetic exceeded the address space.
    #[error("layout size overflows usize")]
    Overflow,
    /// An ABI name that no strategy answers to.
    #[error("unknown ABI `{0}` (expected `msvc-x64` or `sysv-i386`)")]
    UnknownAbi(String),
}
