//! `strata layout`: print the offsets an ABI assigns to a field list.

use std::fmt::Write;

use strata_layout::LayoutDescriptor;

use super::{descriptor_of, parse_field_type, CommandError, LayoutOptions};

/// Layout table for `types`, one row per field.
pub fn layout_report(options: LayoutOptions, types: &[&str]) -> Result<String, CommandError> {
    if types.is_empty() {
        return Err(CommandError::Usage(
            "usage: strata layout [--abi=<abi>] [--packed] <type>...".to_string(),
        ));
    }
    let fields = types
        .iter()
        .map(|text| parse_field_type(text))
        .collect::<Result<Vec<_>, _>>()?;
    let descriptors = fields
        .iter()
        .map(descriptor_of)
        .collect::<Result<Vec<LayoutDescriptor>, _>>()?;
    let layout = options
        .abi
        .strategy()
        .compute_layout(options.packed, &descriptors)?;

    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(
        out,
        "abi {}{}",
        options.abi,
        if options.packed { ", packed" } else { "" }
    );
    let _ = writeln!(out, "field  offset  size  align  pad  type");
    for (index, ((ty, descriptor), (&offset, &pad))) in fields
        .iter()
        .zip(&descriptors)
        .zip(layout.offsets().iter().zip(layout.padding_before()))
        .enumerate()
    {
        let _ = writeln!(
            out,
            "{index:>5}  {offset:>6}  {:>4}  {:>5}  {pad:>3}  {ty}",
            descriptor.extent(),
            descriptor.alignment(),
        );
    }
    let _ = writeln!(
        out,
        "size {} align {} tail {}",
        layout.size(),
        layout.alignment(),
        layout.tail_padding()
    );
    Ok(out)
}
