//! Field declarations: the names and types that accompany a layout.
//!
//! A layout only knows offsets and sizes. Code generation also needs to
//! know what each field *is*, which structures report through
//! [`FieldType`].

use std::fmt;

use crate::descriptor::Primitive;

/// How a field's type is spelled in generated code.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldType {
    /// A native scalar.
    Primitive(Primitive),
    /// Another composite, by type name.
    Named(String),
    /// A pointer, optionally to a named pointee.
    Pointer(Option<String>),
    /// A fixed-length array of `len` elements.
    Array(Box<FieldType>, usize),
}

impl FieldType {
    /// Wrap in an array of `len`, or return `self` unchanged when `len == 1`.
    pub fn repeated(self, len: usize) -> Self {
        if len == 1 {
            self
        } else {
            Self::Array(Box::new(self), len)
        }
    }

    /// The innermost non-array type and the array dimensions, outermost first.
    pub fn split_dimensions(&self) -> (&FieldType, Vec<usize>) {
        let mut dims = Vec::new();
        let mut ty = self;
        while let Self::Array(inner, len) = ty {
            dims.push(*len);
            ty = inner;
        }
        (ty, dims)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{kind}"),
            Self::Named(name) => f.write_str(name),
            Self::Pointer(Some(name)) => write!(f, "{name}*"),
            Self::Pointer(None) => f.write_str("void*"),
            Self::Array(inner, len) => write!(f, "{inner}[{len}]"),
        }
    }
}

/// One named field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDecl {
    pub name: String,
    pub ty: FieldType,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A named composite type with its fields in layout order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

impl StructDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldDecl::new(name, ty));
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::FieldType;
    use crate::Primitive;

    #[test]
    fn repeated_nests_arrays() {
        let grid = FieldType::Primitive(Primitive::I32).repeated(4).repeated(3);
        let (base, dims) = grid.split_dimensions();
        assert_eq!(base, &FieldType::Primitive(Primitive::I32));
        assert_eq!(dims, vec![3, 4]);
        assert_eq!(grid.to_string(), "int32_t[4][3]");
    }

    #[test]
    fn repeated_once_is_identity() {
        let ty = FieldType::Named("Vec3".to_string());
        assert_eq!(ty.clone().repeated(1), ty);
    }
}
