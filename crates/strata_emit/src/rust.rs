//! Rust declarations: `#[repr(C)]` structs with a compile-time size check.

use std::fmt::{self, Write};

use strata_layout::{FieldType, Primitive, StructDef, StructLayout};

use crate::members::Member;

const KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async",
    "await", "dyn",
];

pub(crate) fn write_struct(
    out: &mut String,
    def: &StructDef,
    layout: &StructLayout,
    members: &[Member<'_>],
) -> fmt::Result {
    let name = &def.name;
    writeln!(out, "{}", repr(def, layout))?;
    writeln!(out, "pub struct {name} {{")?;
    for member in members {
        match member {
            Member::Field { name, ty } => {
                writeln!(out, "    pub {}: {},", identifier(name), type_name(ty))?;
            }
            Member::Padding { name, bytes } => writeln!(out, "    {name}: [u8; {bytes}],")?,
        }
    }
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(
        out,
        "const _: () = assert!(core::mem::size_of::<{name}>() == {});",
        layout.size()
    )
}

/// `packed` for compressed layouts; `packed(N)` when the ABI placed a
/// scalar below its natural alignment, which plain `repr(C)` would undo.
fn repr(def: &StructDef, layout: &StructLayout) -> String {
    if layout.is_compressed() {
        return "#[repr(C, packed)]".to_string();
    }
    let underaligned = def.fields.iter().any(|field| {
        natural_alignment(&field.ty).is_some_and(|align| align > layout.alignment())
    });
    if underaligned {
        format!("#[repr(C, packed({}))]", layout.alignment())
    } else {
        "#[repr(C)]".to_string()
    }
}

fn natural_alignment(ty: &FieldType) -> Option<usize> {
    match ty.split_dimensions().0 {
        FieldType::Primitive(kind) => Some(kind.alignment()),
        FieldType::Pointer(_) => Some(Primitive::Pointer.alignment()),
        FieldType::Named(_) | FieldType::Array(..) => None,
    }
}

fn identifier(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// `i32`, `[[f64; 2]; 3]`, `*mut Node`, ...
fn type_name(ty: &FieldType) -> String {
    match ty {
        FieldType::Primitive(kind) => kind.rust_name().to_string(),
        FieldType::Named(name) => name.clone(),
        FieldType::Pointer(None) => Primitive::Pointer.rust_name().to_string(),
        FieldType::Pointer(Some(pointee)) => match Primitive::from_name(pointee) {
            Some(kind) => format!("*mut {}", kind.rust_name()),
            None => format!("*mut {pointee}"),
        },
        FieldType::Array(inner, len) => format!("[{}; {len}]", type_name(inner)),
    }
}
