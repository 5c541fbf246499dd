//! Strata: native structure layout engine.
//!
//! Facade over the three library crates:
//!
//! ```text
//! strata_layout   descriptors, ABI strategies, layout registry   (pure)
//!      │
//!      ├──► strata_mem    native-backed structures, arrays, arena, pointers
//!      │
//!      └──► strata_emit   C / Rust source for computed layouts
//! ```
//!
//! The `strata` binary exposes layout computation and code emission on
//! the command line; see [`commands`].

use std::sync::Once;

pub mod commands;

pub use strata_emit::{emit, emit_many, EmitError, Language};
pub use strata_layout::{
    AbiSelector, AbiStrategy, FieldDecl, FieldType, LayoutDescriptor, LayoutError, LayoutKey,
    LayoutRegistry, MsvcX64, Primitive, StructDef, StructLayout, SysVI386,
};
pub use strata_mem::{
    allocated, AllocationState, Arena, ArrayView, ArrayViewMut, Buffer, CompositeStructure,
    EnumRepr, NativeEnum, NativeScalar, NativeString, Pointer, PointerField, SafePoint, Scalar,
    StructCore, StructError, Structure, StructureArray, StructureConfig, TypedPointer,
};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber driven by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset, and nothing after the first call.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
