//! Composite structures: ordered, named children laid out by an ABI.

use std::any::Any;
use std::fmt;

use smallvec::SmallVec;
use strata_layout::{
    AbiSelector, FieldDecl, FieldType, LayoutDescriptor, LayoutError, LayoutKey, StructDef,
    StructLayout,
};

use crate::config::{SharedRegistry, StructureConfig};
use crate::error::StructError;
use crate::region::Buffer;
use crate::state::{AllocationState, StructCore};
use crate::structure::{place_value, Structure};

struct Field {
    index: usize,
    name: String,
    child: Box<dyn Structure>,
}

/// A C struct assembled from explicitly registered fields.
///
/// Fields are ordered by their registration index, not by call order.
/// The layout is computed once, in `generate_info`, through the ABI and
/// packing chosen by the config (or overridden per composite) and cached
/// in the config's shared [`LayoutRegistry`](strata_layout::LayoutRegistry).
pub struct CompositeStructure {
    core: StructCore,
    type_name: String,
    abi: AbiSelector,
    compressed: bool,
    registry: SharedRegistry,
    fields: Vec<Field>,
    layout: Option<StructLayout>,
}

impl CompositeStructure {
    pub fn new(type_name: impl Into<String>, config: &StructureConfig) -> Self {
        Self {
            core: StructCore::new(),
            type_name: type_name.into(),
            abi: config.abi,
            compressed: config.compressed,
            registry: config.shared_registry(),
            fields: Vec::new(),
            layout: None,
        }
    }

    /// Override the config's ABI. Takes effect at `generate_info`.
    #[must_use]
    pub fn with_abi(mut self, abi: AbiSelector) -> Self {
        self.abi = abi;
        self
    }

    /// Override the config's packing. Takes effect at `generate_info`.
    #[must_use]
    pub fn with_compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    #[inline]
    pub fn abi(&self) -> AbiSelector {
        self.abi
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Register `child` as field `index`.
    pub fn register_field<S: Structure>(
        &mut self,
        index: usize,
        name: impl Into<String>,
        child: S,
    ) -> Result<(), StructError> {
        self.insert_field(index, name.into(), Box::new(child))
    }

    /// Builder form of [`register_field`](Self::register_field).
    pub fn with_field<S: Structure>(
        mut self,
        index: usize,
        name: impl Into<String>,
        child: S,
    ) -> Result<Self, StructError> {
        self.register_field(index, name, child)?;
        Ok(self)
    }

    /// Register `child` after the highest index so far. Returns its index.
    pub fn push_field<S: Structure>(
        &mut self,
        name: impl Into<String>,
        child: S,
    ) -> Result<usize, StructError> {
        let index = self.fields.last().map_or(0, |f| f.index + 1);
        self.register_field(index, name, child)?;
        Ok(index)
    }

    fn insert_field(
        &mut self,
        index: usize,
        name: String,
        child: Box<dyn Structure>,
    ) -> Result<(), StructError> {
        if self.core.state() != AllocationState::Unallocated {
            return Err(StructError::IllegalState {
                operation: "register field",
                reason: format!("layout of `{}` is already generated", self.type_name),
            });
        }
        if child.state() == AllocationState::Allocated {
            return Err(StructError::IllegalState {
                operation: "register field",
                reason: format!("child `{name}` already has storage"),
            });
        }
        match self.fields.binary_search_by_key(&index, |f| f.index) {
            Ok(_) => Err(LayoutError::DuplicateField {
                type_name: self.type_name.clone(),
                index,
            }
            .into()),
            Err(position) => {
                self.fields.insert(position, Field { index, name, child });
                Ok(())
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn position(&self, index: usize) -> Option<usize> {
        self.fields.binary_search_by_key(&index, |f| f.index).ok()
    }

    pub fn field(&self, index: usize) -> Option<&dyn Structure> {
        self.position(index).map(|p| &*self.fields[p].child)
    }

    pub fn field_mut(&mut self, index: usize) -> Option<&mut dyn Structure> {
        let position = self.position(index)?;
        let child: &mut dyn Structure = &mut *self.fields[position].child;
        Some(child)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&dyn Structure> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &*f.child)
    }

    pub fn field_by_name_mut(&mut self, name: &str) -> Option<&mut dyn Structure> {
        let field = self.fields.iter_mut().find(|f| f.name == name)?;
        let child: &mut dyn Structure = &mut *field.child;
        Some(child)
    }

    /// Fields in layout order as `(index, name, child)`.
    pub fn fields(&self) -> impl Iterator<Item = (usize, &str, &dyn Structure)> {
        self.fields
            .iter()
            .map(|f| (f.index, f.name.as_str(), &*f.child))
    }

    /// Field `index` downcast to its concrete type.
    pub fn field_as<T: Structure>(&self, index: usize) -> Result<&T, StructError> {
        let child = self.field(index).ok_or(StructError::OutOfRange {
            index,
            len: self.fields.len(),
        })?;
        child
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| mismatch::<T>(child.type_name()))
    }

    pub fn field_as_mut<T: Structure>(&mut self, index: usize) -> Result<&mut T, StructError> {
        let len = self.fields.len();
        let child = self
            .field_mut(index)
            .ok_or(StructError::OutOfRange { index, len })?;
        let found = child.type_name();
        child
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| mismatch::<T>(found))
    }

    /// Offset of field `index` from the start of this composite.
    pub fn field_offset(&self, index: usize) -> Option<usize> {
        let position = self.position(index)?;
        self.layout
            .as_ref()
            .and_then(|layout| layout.offsets().get(position).copied())
    }

    /// The computed layout, once `generate_info` has run.
    #[inline]
    pub fn layout(&self) -> Option<&StructLayout> {
        self.layout.as_ref()
    }

    /// Field declarations in layout order.
    pub fn struct_def(&self) -> StructDef {
        StructDef {
            name: self.type_name.clone(),
            fields: self
                .fields
                .iter()
                .map(|f| FieldDecl::new(f.name.clone(), f.child.field_type()))
                .collect(),
        }
    }

    /// Every composite definition this one depends on, innermost first and
    /// this composite last, each name once.
    pub fn definitions(&self) -> Result<Vec<(StructDef, StructLayout)>, StructError> {
        let mut out = Vec::new();
        self.collect_definitions(&mut out)?;
        Ok(out)
    }
}

fn mismatch<T: Structure>(found: String) -> StructError {
    StructError::TypeMismatch {
        expected: std::any::type_name::<T>().to_string(),
        found,
    }
}

impl Structure for CompositeStructure {
    fn core(&self) -> &StructCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StructCore {
        &mut self.core
    }

    fn type_name(&self) -> String {
        self.type_name.clone()
    }

    fn field_type(&self) -> FieldType {
        FieldType::Named(self.type_name.clone())
    }

    fn resolve_descriptor(&mut self) -> Result<LayoutDescriptor, StructError> {
        let mut children: SmallVec<[LayoutDescriptor; 8]> =
            SmallVec::with_capacity(self.fields.len());
        for field in &mut self.fields {
            children.push(field.child.generate_info()?);
        }

        let key = LayoutKey::new(self.type_name.clone(), self.abi, self.compressed);
        let layout = self
            .registry
            .borrow_mut()
            .get_or_compute(key, &children)?;
        let descriptor = layout.descriptor();
        self.layout = Some(layout);
        Ok(descriptor)
    }

    fn prepare_children(&mut self) -> Result<(), StructError> {
        for field in &mut self.fields {
            field.child.prepare_children()?;
        }
        Ok(())
    }

    fn place_children(&mut self, buffer: &Buffer, offset: usize) -> Result<(), StructError> {
        let Some(layout) = self.layout.as_ref() else {
            return Err(StructError::illegal_state("place fields", self.core.state()));
        };
        for (field, field_offset) in self.fields.iter_mut().zip(layout.offsets()) {
            place_value(&mut *field.child, buffer, offset + field_offset)?;
        }
        Ok(())
    }

    fn collect_definitions(
        &self,
        out: &mut Vec<(StructDef, StructLayout)>,
    ) -> Result<(), StructError> {
        let Some(layout) = self.layout.as_ref() else {
            return Err(StructError::illegal_state(
                "collect definitions",
                self.core.state(),
            ));
        };
        for field in &self.fields {
            field.child.collect_definitions(out)?;
        }
        if !out.iter().any(|(def, _)| def.name == self.type_name) {
            out.push((self.struct_def(), layout.clone()));
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl fmt::Debug for CompositeStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeStructure")
            .field("type_name", &self.type_name)
            .field("abi", &self.abi)
            .field("compressed", &self.compressed)
            .field(
                "fields",
                &self.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            )
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}
