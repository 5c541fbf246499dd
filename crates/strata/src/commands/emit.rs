//! `strata emit`: print a C or Rust definition for a field list.

use strata_emit::{emit, Language};
use strata_layout::{StructDef, StructLayout};

use super::{descriptor_of, parse_field_type, CommandError, LayoutOptions};

/// Source for struct `name` built from `name:type` field arguments.
pub fn emit_source(
    language: Language,
    name: &str,
    options: LayoutOptions,
    fields: &[&str],
) -> Result<String, CommandError> {
    if fields.is_empty() {
        return Err(CommandError::Usage(
            "usage: strata emit <c|rust> <Name> [--abi=<abi>] [--packed] <field:type>..."
                .to_string(),
        ));
    }

    let mut def = StructDef::new(name);
    let mut descriptors = Vec::with_capacity(fields.len());
    for field in fields {
        let Some((field_name, ty)) = field.split_once(':') else {
            return Err(CommandError::Usage(format!(
                "expected `name:type`, found `{field}`"
            )));
        };
        let ty = parse_field_type(ty)?;
        descriptors.push(descriptor_of(&ty)?);
        def = def.field(field_name.trim(), ty);
    }

    let layout: StructLayout = options
        .abi
        .strategy()
        .compute_layout(options.packed, &descriptors)?;

    let mut out = String::from(language.prelude());
    out.push_str(&emit(language, &def, &layout)?);
    Ok(out)
}
