//! Command handlers for the `strata` CLI.
//!
//! Each handler takes already-split arguments and returns the text to
//! print, so the binary stays a thin dispatcher and the handlers are
//! testable without a process. Nothing here touches the filesystem.

use strata_emit::EmitError;
use strata_layout::{AbiSelector, FieldType, LayoutDescriptor, LayoutError, Primitive};
use strata_mem::{StructError, StructureConfig};
use thiserror::Error;

mod emit;
mod layout;

pub use emit::emit_source;
pub use layout::layout_report;

/// Failure of a CLI command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Usage(String),
    #[error("unknown field type `{0}`")]
    UnknownType(String),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Struct(#[from] StructError),
    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// Flags shared by `layout` and `emit`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutOptions {
    pub abi: AbiSelector,
    pub packed: bool,
}

impl LayoutOptions {
    /// Defaults from the environment (`STRATA_ABI`), then `--abi=` and
    /// `--packed` from `args`. Returns the remaining positional arguments.
    pub fn parse(args: &[String]) -> Result<(Self, Vec<&str>), CommandError> {
        let config = StructureConfig::from_env()?;
        Self::parse_with(
            Self {
                abi: config.abi,
                packed: config.compressed,
            },
            args,
        )
    }

    fn parse_with(mut self, args: &[String]) -> Result<(Self, Vec<&str>), CommandError> {
        let mut positional = Vec::new();
        for arg in args {
            if let Some(abi) = arg.strip_prefix("--abi=") {
                self.abi = abi.parse()?;
            } else if arg == "--packed" || arg == "--compressed" {
                self.packed = true;
            } else if arg.starts_with("--") {
                return Err(CommandError::Usage(format!("unknown option `{arg}`")));
            } else {
                positional.push(arg.as_str());
            }
        }
        Ok((self, positional))
    }
}

/// Parse a field type: a primitive name, optionally followed by `*` for a
/// pointer or by `[N]` dimensions (`i32`, `double[4]`, `char[2][8]`,
/// `Node*`, `ptr`).
pub fn parse_field_type(text: &str) -> Result<FieldType, CommandError> {
    let text = text.trim();
    let unknown = || CommandError::UnknownType(text.to_string());

    if let Some(pointee) = text.strip_suffix('*') {
        let pointee = pointee.trim();
        return Ok(FieldType::Pointer(
            (!pointee.is_empty() && pointee != "void").then(|| pointee.to_string()),
        ));
    }

    let (base, mut rest) = match text.find('[') {
        Some(open) => (&text[..open], &text[open..]),
        None => (text, ""),
    };
    let mut dims = Vec::new();
    while let Some(after) = rest.strip_prefix('[') {
        let close = after.find(']').ok_or_else(unknown)?;
        let len: usize = after[..close].trim().parse().map_err(|_| unknown())?;
        dims.push(len);
        rest = &after[close + 1..];
    }
    if !rest.is_empty() {
        return Err(unknown());
    }

    let mut ty = match Primitive::from_name(base.trim()) {
        Some(Primitive::Pointer) => FieldType::Pointer(None),
        Some(kind) => FieldType::Primitive(kind),
        None => return Err(unknown()),
    };
    // `a[3][2]` is three runs of two, so wrap innermost first.
    for len in dims.into_iter().rev() {
        ty = FieldType::Array(Box::new(ty), len);
    }
    Ok(ty)
}

/// Descriptor of a CLI field type.
pub fn descriptor_of(ty: &FieldType) -> Result<LayoutDescriptor, CommandError> {
    let (base, dims) = ty.split_dimensions();
    let kind = match base {
        FieldType::Primitive(kind) => *kind,
        FieldType::Pointer(_) => Primitive::Pointer,
        FieldType::Named(name) => return Err(CommandError::UnknownType(name.clone())),
        FieldType::Array(..) => return Err(CommandError::UnknownType(ty.to_string())),
    };
    let count = dims
        .iter()
        .try_fold(1usize, |acc, &len| acc.checked_mul(len))
        .ok_or(LayoutError::Overflow)?;
    Ok(kind.descriptor(count)?)
}

#[cfg(test)]
mod tests;
