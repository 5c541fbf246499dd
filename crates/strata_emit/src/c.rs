//! C declarations: `typedef struct` under `#pragma pack`.

use std::fmt::{self, Write};

use strata_layout::{FieldType, Primitive, StructDef, StructLayout};

use crate::members::Member;

pub(crate) fn write_struct(
    out: &mut String,
    def: &StructDef,
    layout: &StructLayout,
    members: &[Member<'_>],
) -> fmt::Result {
    let pack = if layout.is_compressed() {
        1
    } else {
        layout.alignment()
    };
    let name = &def.name;

    writeln!(out, "#pragma pack(push, {pack})")?;
    writeln!(out, "typedef struct {name} {{")?;
    for member in members {
        match member {
            Member::Field { name, ty } => writeln!(out, "    {};", declarator(ty, name))?,
            Member::Padding { name, bytes } => writeln!(out, "    uint8_t {name}[{bytes}];")?,
        }
    }
    writeln!(out, "}} {name};")?;
    writeln!(out, "#pragma pack(pop)")?;
    writeln!(
        out,
        "_Static_assert(sizeof({name}) == {size}, \"{name} must be {size} bytes\");",
        size = layout.size()
    )
}

/// `int32_t values[3][2]`, `struct Node* next`, ...
fn declarator(ty: &FieldType, name: &str) -> String {
    let (base, dims) = ty.split_dimensions();
    let mut text = format!("{} {name}", type_name(base));
    for len in dims {
        // Writing to a String cannot fail.
        let _ = write!(text, "[{len}]");
    }
    text
}

fn type_name(ty: &FieldType) -> String {
    match ty {
        FieldType::Primitive(kind) => kind.c_name().to_string(),
        FieldType::Named(name) => name.clone(),
        FieldType::Pointer(None) => "void*".to_string(),
        FieldType::Pointer(Some(pointee)) => match Primitive::from_name(pointee) {
            Some(kind) => format!("{}*", kind.c_name()),
            None => format!("struct {pointee}*"),
        },
        FieldType::Array(..) => ty.to_string(),
    }
}
