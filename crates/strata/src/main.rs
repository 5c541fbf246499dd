//! Strata CLI
//!
//! Layout inspection and struct code emission.

use strata::commands::{emit_source, layout_report, CommandError, LayoutOptions};
use strata::Language;

fn main() {
    strata::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    let result = match command.as_str() {
        "layout" => run_layout(&args[2..]),
        "emit" => run_emit(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            return;
        }
        "version" | "--version" | "-V" => {
            println!("strata {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    match result {
        Ok(text) => print!("{text}"),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn run_layout(args: &[String]) -> Result<String, CommandError> {
    let (options, types) = LayoutOptions::parse(args)?;
    layout_report(options, &types)
}

fn run_emit(args: &[String]) -> Result<String, CommandError> {
    let (options, positional) = LayoutOptions::parse(args)?;
    let [language, name, fields @ ..] = positional.as_slice() else {
        return Err(CommandError::Usage(
            "usage: strata emit <c|rust> <Name> [--abi=<abi>] [--packed] <field:type>..."
                .to_string(),
        ));
    };
    let language: Language = language.parse()?;
    emit_source(language, name, options, fields)
}

fn print_usage() {
    println!("Strata native structure layout engine");
    println!();
    println!("Usage: strata <command> [options]");
    println!();
    println!("Commands:");
    println!("  layout <type>...                    Print field offsets and padding");
    println!("  emit <c|rust> <Name> <field:type>... Print a struct definition");
    println!("  help                                Show this help message");
    println!("  version                             Show version information");
    println!();
    println!("Options:");
    println!("  --abi=<abi>    msvc-x64 (default) or sysv-i386");
    println!("  --packed       No padding, alignment 1");
    println!();
    println!("Types: i8 u8 i16 u16 i32 u32 i64 u64 f32 f64 bool char ptr,");
    println!("       C aliases (short, int, long, double), `T[N]` arrays, `T*` pointers.");
    println!();
    println!("Environment:");
    println!("  STRATA_ABI     Default ABI");
    println!("  RUST_LOG       Enable tracing output (e.g. RUST_LOG=strata_mem=debug)");
}
