//! Explicit per-type layout cache.
//!
//! Composite types with the same name, ABI and packing share one computed
//! layout. The registry is an ordinary value handed around through
//! configuration; there is no global cache, so layout computation stays a
//! pure function in tests.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::abi::{AbiSelector, StructLayout};
use crate::descriptor::LayoutDescriptor;
use crate::error::LayoutError;

/// Cache key for a composite type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LayoutKey {
    pub type_name: String,
    pub abi: AbiSelector,
    pub compressed: bool,
}

impl LayoutKey {
    pub fn new(type_name: impl Into<String>, abi: AbiSelector, compressed: bool) -> Self {
        Self {
            type_name: type_name.into(),
            abi,
            compressed,
        }
    }
}

#[derive(Clone, Debug)]
struct CachedLayout {
    children: SmallVec<[LayoutDescriptor; 8]>,
    layout: StructLayout,
}

/// Memo table of computed layouts.
///
/// An entry only answers a lookup when the child descriptors match the ones
/// it was computed from, so a stale entry can never leak a wrong layout.
#[derive(Clone, Debug, Default)]
pub struct LayoutRegistry {
    entries: FxHashMap<LayoutKey, CachedLayout>,
    hits: u64,
    misses: u64,
}

impl LayoutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached layout for `key`, if it was computed from `children`.
    pub fn lookup(&self, key: &LayoutKey, children: &[LayoutDescriptor]) -> Option<&StructLayout> {
        self.entries
            .get(key)
            .filter(|cached| cached.children.as_slice() == children)
            .map(|cached| &cached.layout)
    }

    /// Return the cached layout or compute it with the key's ABI strategy.
    pub fn get_or_compute(
        &mut self,
        key: LayoutKey,
        children: &[LayoutDescriptor],
    ) -> Result<StructLayout, LayoutError> {
        if let Some(layout) = self.lookup(&key, children) {
            let layout = layout.clone();
            self.hits += 1;
            return Ok(layout);
        }

        self.misses += 1;
        let layout = key
            .abi
            .strategy()
            .compute_layout(key.compressed, children)
            .map_err(|err| match err {
                LayoutError::EmptyComposite { .. } => LayoutError::EmptyComposite {
                    type_name: key.type_name.clone(),
                },
                other => other,
            })?;

        tracing::debug!(
            type_name = %key.type_name,
            abi = %key.abi,
            compressed = key.compressed,
            size = layout.size(),
            align = layout.alignment(),
            "registered layout"
        );

        self.entries.insert(
            key,
            CachedLayout {
                children: children.iter().copied().collect(),
                layout: layout.clone(),
            },
        );
        Ok(layout)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of layouts computed.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
