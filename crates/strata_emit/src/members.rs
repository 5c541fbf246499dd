//! Member planning: declared fields interleaved with explicit padding.

use strata_layout::{FieldType, StructDef, StructLayout};

use crate::EmitError;

pub(crate) enum Member<'a> {
    Field { name: &'a str, ty: &'a FieldType },
    Padding { name: String, bytes: usize },
}

/// Declared fields in order, with a `_padN` member before every gap and
/// one more for tail padding. `N` counts padding members from zero.
pub(crate) fn plan<'a>(
    def: &'a StructDef,
    layout: &StructLayout,
) -> Result<Vec<Member<'a>>, EmitError> {
    if def.fields.len() != layout.field_count() {
        return Err(EmitError::FieldCountMismatch {
            type_name: def.name.clone(),
            declared: def.fields.len(),
            laid_out: layout.field_count(),
        });
    }

    let mut members = Vec::with_capacity(def.fields.len() * 2 + 1);
    let mut pads = 0usize;
    let mut pad = |bytes: usize, members: &mut Vec<Member<'a>>| {
        members.push(Member::Padding {
            name: format!("_pad{pads}"),
            bytes,
        });
        pads += 1;
    };

    for (field, &gap) in def.fields.iter().zip(layout.padding_before()) {
        if gap > 0 {
            pad(gap, &mut members);
        }
        members.push(Member::Field {
            name: &field.name,
            ty: &field.ty,
        });
    }
    if layout.tail_padding() > 0 {
        pad(layout.tail_padding(), &mut members);
    }
    Ok(members)
}
