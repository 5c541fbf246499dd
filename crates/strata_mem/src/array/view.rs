//! Zero-copy windows over a [`StructureArray`].
//!
//! A view owns no storage and no elements. Index `i` of a view is index
//! `start + i` of the array it was cut from, so views nest by adding
//! starts.

use crate::error::StructError;
use crate::structure::Structure;

use super::StructureArray;

fn window(
    outer_start: usize,
    outer_len: usize,
    start: usize,
    count: usize,
) -> Result<usize, StructError> {
    match start.checked_add(count) {
        Some(end) if end <= outer_len => Ok(outer_start + start),
        _ => Err(StructError::OutOfRange {
            index: start.saturating_add(count.saturating_sub(1)),
            len: outer_len,
        }),
    }
}

fn check_local(index: usize, len: usize) -> Result<(), StructError> {
    if index < len {
        Ok(())
    } else {
        Err(StructError::OutOfRange { index, len })
    }
}

/// Shared window of `len` elements.
#[derive(Debug)]
pub struct ArrayView<'a, T: Structure> {
    array: &'a StructureArray<T>,
    start: usize,
    len: usize,
}

impl<T: Structure> Clone for ArrayView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Structure> Copy for ArrayView<'_, T> {}

impl<'a, T: Structure> ArrayView<'a, T> {
    pub(super) fn new(
        array: &'a StructureArray<T>,
        outer_start: usize,
        outer_len: usize,
        start: usize,
        count: usize,
    ) -> Result<Self, StructError> {
        Ok(Self {
            array,
            start: window(outer_start, outer_len, start, count)?,
            len: count,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index in the underlying array of this view's element 0.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn get(&self, index: usize) -> Result<&'a T, StructError> {
        check_local(index, self.len)?;
        self.array.get(self.start + index)
    }

    pub fn get_or_null(&self, index: usize) -> Option<&'a T> {
        if index < self.len {
            self.array.get_or_null(self.start + index)
        } else {
            None
        }
    }

    pub fn element_address(&self, index: usize) -> Result<usize, StructError> {
        check_local(index, self.len)?;
        self.array.element_address(self.start + index)
    }

    /// A narrower view; `start` is relative to this view.
    pub fn view(&self, start: usize, count: usize) -> Result<ArrayView<'a, T>, StructError> {
        ArrayView::new(self.array, self.start, self.len, start, count)
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<&'a T, StructError>> + 'a {
        let (array, start) = (self.array, self.start);
        (start..start + self.len).map(move |i| array.get(i))
    }
}

/// Exclusive window of `len` elements.
#[derive(Debug)]
pub struct ArrayViewMut<'a, T: Structure> {
    array: &'a mut StructureArray<T>,
    start: usize,
    len: usize,
}

impl<'a, T: Structure> ArrayViewMut<'a, T> {
    pub(super) fn new(
        array: &'a mut StructureArray<T>,
        outer_start: usize,
        outer_len: usize,
        start: usize,
        count: usize,
    ) -> Result<Self, StructError> {
        let start = window(outer_start, outer_len, start, count)?;
        Ok(Self {
            array,
            start,
            len: count,
        })
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
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn get(&self, index: usize) -> Result<&T, StructError> {
        check_local(index, self.len)?;
        self.array.get(self.start + index)
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, StructError> {
        check_local(index, self.len)?;
        self.array.get_mut(self.start + index)
    }

    pub fn view(&self, start: usize, count: usize) -> Result<ArrayView<'_, T>, StructError> {
        ArrayView::new(self.array, self.start, self.len, start, count)
    }

    pub fn view_mut(
        &mut self,
        start: usize,
        count: usize,
    ) -> Result<ArrayViewMut<'_, T>, StructError> {
        ArrayViewMut::new(self.array, self.start, self.len, start, count)
    }
}
