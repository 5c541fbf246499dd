//! Native-backed structures for Strata.
//!
//! Every value here lives in off-heap memory laid out by `strata_layout`.
//! A [`Structure`] moves through a one-way allocation state machine:
//!
//! ```text
//! Unallocated ──generate_info()──▶ Allocatable ──allocate()──────────▶ Allocated
//!                                              └─claim_buffer(buf, off)─┘
//! ```
//!
//! - **Leaves** ([`Scalar`], [`NativeString`], [`NativeEnum`], [`PointerField`])
//!   read and write typed values at `address + index * element_size`.
//! - **Composites** ([`CompositeStructure`]) lay out explicitly registered
//!   children through an ABI strategy and place them inside their own
//!   storage.
//! - **Arrays** ([`StructureArray`], [`ArrayView`]) share one allocation
//!   across homogeneous elements, materialized eagerly or lazily.
//! - **Arena** ([`Arena`]) hands out LIFO storage from one fixed region.
//!
//! # Ownership
//!
//! Exactly one root owns an allocation: the structure that called
//! [`Structure::allocate`], or the arena. Descendants hold a
//! [`Buffer`] handle and an offset relative to the root region; they never
//! free memory themselves.
//!
//! # Threading
//!
//! Nothing here is `Send` or `Sync`. Use one arena per thread.
//!
//! # Safety
//!
//! The raw `get`/`put` accessors are `unsafe fn`: they perform no state or
//! bounds check so the hot path stays a pointer add and an unaligned
//! load/store. The `try_*` companions check both.

#![allow(
    unsafe_code,
    reason = "structures read and write native memory through raw pointers"
)]

mod arena;
mod array;
mod composite;
mod config;
mod enumeration;
mod error;
mod pointer;
mod region;
mod scalar;
mod state;
mod string;
mod structure;

pub use arena::{Arena, SafePoint};
pub use array::{ArrayView, ArrayViewMut, StructureArray};
pub use composite::CompositeStructure;
pub use config::{SharedRegistry, StructureConfig};
pub use enumeration::{EnumRepr, NativeEnum};
pub use error::StructError;
pub use pointer::{Pointer, PointerField, TypedPointer};
pub use region::{Buffer, RegionId};
pub use scalar::{NativeScalar, Scalar};
pub use state::{AllocationState, Ownership, Placement, StructCore};
pub use string::NativeString;
pub use structure::{allocated, Structure};
