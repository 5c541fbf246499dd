//! Homogeneous arrays of structures sharing one allocation.

use std::any::Any;
use std::cell::OnceCell;
use std::fmt;

use strata_layout::{FieldType, LayoutDescriptor, LayoutError, StructDef, StructLayout};

use crate::config::StructureConfig;
use crate::error::StructError;
use crate::region::Buffer;
use crate::state::StructCore;
use crate::structure::Structure;

mod view;

pub use view::{ArrayView, ArrayViewMut};

type Factory<T> = Box<dyn Fn() -> T>;

/// `len` elements built by one factory, laid out at a fixed stride.
///
/// Elements are claimed in place when the array is allocated, or on first
/// access when the config asks for lazy arrays. The first element produced
/// fixes the descriptor; every later element must match it. Eager arrays
/// build and check all elements before claiming any storage.
pub struct StructureArray<T: Structure> {
    core: StructCore,
    len: usize,
    lazy: bool,
    factory: Factory<T>,
    /// Descriptor source; never placed in storage.
    prototype: Option<T>,
    stride: usize,
    // Built and resolved by `prepare_children`, placed by `place_children`.
    staged: Vec<T>,
    elements: Vec<OnceCell<T>>,
}

impl<T: Structure> StructureArray<T> {
    /// An array ready to be registered as a field or pushed to an arena.
    pub fn new_unallocated(
        len: usize,
        factory: impl Fn() -> T + 'static,
        config: &StructureConfig,
    ) -> Self {
        Self {
            core: StructCore::new(),
            len,
            lazy: config.lazy_arrays,
            factory: Box::new(factory),
            prototype: None,
            stride: 0,
            staged: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// An allocated root array.
    pub fn new_allocated(
        len: usize,
        factory: impl Fn() -> T + 'static,
        config: &StructureConfig,
    ) -> Result<Self, StructError> {
        crate::structure::allocated(Self::new_unallocated(len, factory, config))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Bytes from one element's start to the next; zero before
    /// `generate_info`.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Structural type name of one element.
    pub fn element_type_name(&self) -> String {
        match &self.prototype {
            Some(prototype) => prototype.type_name(),
            None => (self.factory)().type_name(),
        }
    }

    fn element_field_type(&self) -> FieldType {
        match &self.prototype {
            Some(prototype) => prototype.field_type(),
            None => (self.factory)().field_type(),
        }
    }

    fn check(&self, index: usize, operation: &'static str) -> Result<(), StructError> {
        self.core.check_index(index, self.len, operation)
    }

    /// Build and resolve element `index`, checking it against the
    /// prototype. Nothing is claimed.
    fn build(&self, index: usize) -> Result<T, StructError> {
        let Some(expected) = self.prototype.as_ref().and_then(Structure::descriptor) else {
            return Err(StructError::illegal_state("build element", self.core.state()));
        };
        let mut element = (self.factory)();
        if element.generate_info()? != expected {
            return Err(LayoutError::ElementMismatch { index }.into());
        }
        element.prepare_children()?;
        Ok(element)
    }

    /// Claim the slot of element `index` in an array whose value starts at
    /// `offset` in `buffer`.
    fn place(
        &self,
        element: &mut T,
        buffer: &Buffer,
        offset: usize,
        index: usize,
    ) -> Result<(), StructError> {
        let start = offset + index * self.stride;
        element.claim_buffer(buffer, start)?;
        tracing::trace!(index, offset = start, "placed array element");
        Ok(())
    }

    fn materialize_placed(&self, index: usize) -> Result<T, StructError> {
        let placement = self
            .core
            .placement()
            .ok_or_else(|| StructError::illegal_state("materialize element", self.core.state()))?;
        let mut element = self.build(index)?;
        self.place(&mut element, placement.buffer(), placement.offset(), index)?;
        Ok(element)
    }

    /// Element `index`, materializing it if the array is lazy.
    pub fn get(&self, index: usize) -> Result<&T, StructError> {
        self.check(index, "get element")?;
        let cell = &self.elements[index];
        if let Some(element) = cell.get() {
            return Ok(element);
        }
        let element = self.materialize_placed(index)?;
        Ok(cell.get_or_init(|| element))
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, StructError> {
        self.check(index, "get element")?;
        if self.elements[index].get().is_none() {
            let element = self.materialize_placed(index)?;
            self.elements[index] = OnceCell::from(element);
        }
        let state = self.core.state();
        self.elements[index]
            .get_mut()
            .ok_or_else(|| StructError::illegal_state("get element", state))
    }

    /// Element `index` if it already exists; never materializes.
    pub fn get_or_null(&self, index: usize) -> Option<&T> {
        self.elements.get(index).and_then(OnceCell::get)
    }

    /// Absolute address of element `index`, without materializing it.
    pub fn element_address(&self, index: usize) -> Result<usize, StructError> {
        self.check(index, "address element")?;
        let placement = self
            .core
            .placement()
            .ok_or_else(|| StructError::illegal_state("address element", self.core.state()))?;
        let element_pre = self
            .prototype
            .as_ref()
            .and_then(Structure::descriptor)
            .map_or(0, |d| d.pre_padding());
        Ok(placement.address() + index * self.stride + element_pre)
    }

    /// Zero-copy window over `count` elements starting at `start`.
    pub fn view(&self, start: usize, count: usize) -> Result<ArrayView<'_, T>, StructError> {
        ArrayView::new(self, 0, self.len, start, count)
    }

    pub fn view_mut(
        &mut self,
        start: usize,
        count: usize,
    ) -> Result<ArrayViewMut<'_, T>, StructError> {
        let len = self.len;
        ArrayViewMut::new(self, 0, len, start, count)
    }

    /// Every element in order, materializing lazily as it goes.
    pub fn iter(&self) -> impl Iterator<Item = Result<&T, StructError>> {
        (0..self.len).map(move |i| self.get(i))
    }
}

impl<T: Structure> Structure for StructureArray<T> {
    fn core(&self) -> &StructCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StructCore {
        &mut self.core
    }

    fn type_name(&self) -> String {
        format!("{}[{}]", self.element_type_name(), self.len)
    }

    fn field_type(&self) -> FieldType {
        FieldType::Array(Box::new(self.element_field_type()), self.len)
    }

    fn resolve_descriptor(&mut self) -> Result<LayoutDescriptor, StructError> {
        if self.len == 0 {
            return Err(LayoutError::MissingLength {
                what: "structure array",
            }
            .into());
        }
        let mut prototype = (self.factory)();
        let element = prototype.generate_info()?;
        let stride = if element.is_compressed() {
            element.footprint()
        } else {
            strata_layout::align_up(element.footprint(), element.alignment())
                .ok_or(LayoutError::Overflow)?
        };
        let size = stride.checked_mul(self.len).ok_or(LayoutError::Overflow)?;

        self.stride = stride;
        self.prototype = Some(prototype);
        Ok(if element.is_compressed() {
            LayoutDescriptor::compressed(size)
        } else {
            LayoutDescriptor::new(size, element.alignment())?
        })
    }

    fn prepare_children(&mut self) -> Result<(), StructError> {
        if self.lazy || self.staged.len() == self.len {
            return Ok(());
        }
        let staged = (0..self.len)
            .map(|index| self.build(index))
            .collect::<Result<Vec<_>, _>>()?;
        self.staged = staged;
        Ok(())
    }

    fn place_children(&mut self, buffer: &Buffer, offset: usize) -> Result<(), StructError> {
        if self.lazy {
            self.elements = (0..self.len).map(|_| OnceCell::new()).collect();
            return Ok(());
        }
        self.prepare_children()?;
        let mut elements = Vec::with_capacity(self.len);
        for (index, mut element) in std::mem::take(&mut self.staged).into_iter().enumerate() {
            self.place(&mut element, buffer, offset, index)?;
            elements.push(OnceCell::from(element));
        }
        self.elements = elements;
        Ok(())
    }

    fn collect_definitions(
        &self,
        out: &mut Vec<(StructDef, StructLayout)>,
    ) -> Result<(), StructError> {
        match &self.prototype {
            Some(prototype) => prototype.collect_definitions(out),
            None => Err(StructError::illegal_state(
                "collect definitions",
                self.core.state(),
            )),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: Structure> fmt::Debug for StructureArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructureArray")
            .field("len", &self.len)
            .field("lazy", &self.lazy)
            .field("stride", &self.stride)
            .field(
                "materialized",
                &self.elements.iter().filter(|c| c.get().is_some()).count(),
            )
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
