//! Structure errors.

use strata_layout::LayoutError;
use thiserror::Error;

use crate::state::AllocationState;

/// Failure of a structure, array, arena or pointer operation.
///
/// None of these are transient: each one is either a layout that cannot
/// exist or a programming error in how the API was driven.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructError {
    /// A field cannot produce a valid descriptor.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// An operation was attempted in the wrong lifecycle state.
    #[error("cannot {operation}: {reason}")]
    IllegalState {
        operation: &'static str,
        reason: String,
    },
    /// Storage cannot hold the requested footprint.
    #[error("capacity exceeded: requested {requested} bytes, {available} available")]
    Capacity { requested: usize, available: usize },
    /// A checked index fell outside the sequence.
    #[error("index {index} out of range for length {len}")]
    OutOfRange { index: usize, len: usize },
    /// A checked cast or downcast named the wrong type.
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch { expected: String, found: String },
}

impl StructError {
    pub(crate) fn illegal_state(operation: &'static str, state: AllocationState) -> Self {
        Self::IllegalState {
            operation,
            reason: format!("structure is {state}"),
        }
    }
}
