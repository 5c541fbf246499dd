#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use pretty_assertions::assert_eq;
use strata_emit::Language;
use strata_layout::{AbiSelector, FieldType, LayoutError, Primitive};

use super::{emit_source, layout_report, parse_field_type, CommandError, LayoutOptions};

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

#[test]
fn parses_primitives_arrays_and_pointers() {
    assert_eq!(
        parse_field_type("int").unwrap(),
        FieldType::Primitive(Primitive::I32)
    );
    assert_eq!(
        parse_field_type("char[2][8]").unwrap(),
        FieldType::Array(
            Box::new(FieldType::Array(
                Box::new(FieldType::Primitive(Primitive::Char)),
                8
            )),
            2
        )
    );
    assert_eq!(parse_field_type("ptr").unwrap(), FieldType::Pointer(None));
    assert_eq!(parse_field_type("void*").unwrap(), FieldType::Pointer(None));
    assert_eq!(
        parse_field_type("Node*").unwrap(),
        FieldType::Pointer(Some("Node".to_string()))
    );
}

#[test]
fn rejects_unknown_types() {
    for text in ["quad", "int[", "int[x]", "int[2]junk"] {
        assert!(
            matches!(parse_field_type(text), Err(CommandError::UnknownType(_))),
            "{text} should be rejected"
        );
    }
}

#[test]
fn options_split_flags_from_positionals() {
    let raw = args(&["--abi=sysv-i386", "int", "--packed", "double"]);
    let (options, rest) = LayoutOptions::default().parse_with(&raw).unwrap();
    assert_eq!(options.abi, AbiSelector::SysVI386);
    assert!(options.packed);
    assert_eq!(rest, vec!["int", "double"]);
}

#[test]
fn options_reject_unknown_flags_and_abis() {
    assert!(matches!(
        LayoutOptions::default().parse_with(&args(&["--fast"])),
        Err(CommandError::Usage(_))
    ));
    assert!(matches!(
        LayoutOptions::default().parse_with(&args(&["--abi=vax"])),
        Err(CommandError::Layout(LayoutError::UnknownAbi(_)))
    ));
}

#[test]
fn layout_report_lists_offsets() {
    let report = layout_report(LayoutOptions::default(), &["char", "short", "char", "int"]).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "abi msvc-x64");
    let offsets: Vec<&str> = lines[2..6]
        .iter()
        .map(|line| line.split_whitespace().nth(1).unwrap())
        .collect();
    assert_eq!(offsets, vec!["0", "2", "4", "8"]);
    assert_eq!(lines[6], "size 12 align 4 tail 0");
}

#[test]
fn layout_report_honours_abi_and_packing() {
    let i386 = LayoutOptions {
        abi: AbiSelector::SysVI386,
        packed: false,
    };
    let report = layout_report(i386, &["int", "double", "short"]).unwrap();
    assert!(report.ends_with("size 16 align 4 tail 2\n"));

    let packed = LayoutOptions {
        abi: AbiSelector::MsvcX64,
        packed: true,
    };
    let report = layout_report(packed, &["int", "double", "short"]).unwrap();
    assert!(report.starts_with("abi msvc-x64, packed\n"));
    assert!(report.ends_with("size 14 align 1 tail 0\n"));
}

#[test]
fn layout_report_needs_types() {
    assert!(matches!(
        layout_report(LayoutOptions::default(), &[]),
        Err(CommandError::Usage(_))
    ));
}

#[test]
fn emit_source_builds_definition() {
    let text = emit_source(
        Language::C,
        "Sample",
        LayoutOptions::default(),
        &["id:u32", "name:char[6]", "next:Sample*"],
    )
    .unwrap();
    assert!(text.starts_with("#include <stdint.h>\n\n#pragma pack(push, 8)\n"));
    assert!(text.contains("    char name[6];\n"));
    assert!(text.contains("    uint8_t _pad0[6];\n"));
    assert!(text.contains("    struct Sample* next;\n"));
    assert!(text.contains("sizeof(Sample) == 24"));
}

#[test]
fn emit_source_rejects_malformed_fields() {
    assert!(matches!(
        emit_source(Language::Rust, "Bad", LayoutOptions::default(), &["id"]),
        Err(CommandError::Usage(_))
    ));
    assert!(matches!(
        emit_source(Language::Rust, "Bad", LayoutOptions::default(), &["id:int[0]"]),
        Err(CommandError::Layout(LayoutError::MissingLength { .. }))
    ));
}
