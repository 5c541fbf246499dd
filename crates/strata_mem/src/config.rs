//! Structure configuration: ABI, packing, array materialization and the
//! shared layout registry.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use strata_layout::{AbiSelector, LayoutError, LayoutRegistry};

/// Layout registry shared by every structure built from one config.
pub type SharedRegistry = Rc<RefCell<LayoutRegistry>>;

/// Settings handed to constructors in place of annotations.
///
/// Cloning shares the registry, so composites of the same type built from
/// clones of one config compute their layout once.
#[derive(Clone, Default)]
pub struct StructureConfig {
    pub abi: AbiSelector,
    pub compressed: bool,
    /// Materialize array elements on first access instead of at allocation.
    pub lazy_arrays: bool,
    registry: SharedRegistry,
}

impl StructureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_abi(mut self, abi: AbiSelector) -> Self {
        self.abi = abi;
        self
    }

    #[must_use]
    pub fn with_compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    #[must_use]
    pub fn with_lazy_arrays(mut self, lazy: bool) -> Self {
        self.lazy_arrays = lazy;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: SharedRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Handle to the shared registry.
    pub fn shared_registry(&self) -> SharedRegistry {
        Rc::clone(&self.registry)
    }

    pub fn registry(&self) -> Ref<'_, LayoutRegistry> {
        self.registry.borrow()
    }

    /// Defaults overridden by `STRATA_ABI` and `STRATA_LAZY_ARRAYS`.
    pub fn from_env() -> Result<Self, LayoutError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LayoutError> {
        let mut config = Self::default();
        if let Some(abi) = lookup("STRATA_ABI") {
            config.abi = abi.parse()?;
        }
        if let Some(lazy) = lookup("STRATA_LAZY_ARRAYS") {
            config.lazy_arrays = matches!(
                lazy.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        Ok(config)
    }
}

impl fmt::Debug for StructureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructureConfig")
            .field("abi", &self.abi)
            .field("compressed", &self.compressed)
            .field("lazy_arrays", &self.lazy_arrays)
            .field("cached_layouts", &self.registry.borrow().len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults() {
        let config = StructureConfig::default();
        assert_eq!(config.abi, AbiSelector::MsvcX64);
        assert!(!config.compressed);
        assert!(!config.lazy_arrays);
        assert!(config.registry().is_empty());
    }

    #[test]
    fn clones_share_registry() {
        let config = StructureConfig::default();
        let other = config.clone().with_compressed(true);
        assert!(Rc::ptr_eq(&config.shared_registry(), &other.shared_registry()));
    }

    #[test]
    fn lookup_overrides() {
        let config = StructureConfig::from_lookup(|key| match key {
            "STRATA_ABI" => Some("sysv-i386".to_string()),
            "STRATA_LAZY_ARRAYS" => Some("On".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.abi, AbiSelector::SysVI386);
        assert!(config.lazy_arrays);
    }

    #[test]
    fn lookup_rejects_unknown_abi() {
        let err = StructureConfig::from_lookup(|key| {
            (key == "STRATA_ABI").then(|| "vax".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, LayoutError::UnknownAbi(_)));
    }
}
