//! Source emission for computed layouts.
//!
//! [`emit`] renders one [`StructDef`] with its [`StructLayout`] as a C or
//! Rust declaration whose padding is spelled out as explicit `_padN`
//! members, so the generated type has the same size and offsets on any
//! compiler that honours the packing directive. Emission is pure: text in
//! a `String`, no I/O.

use std::fmt;
use std::str::FromStr;

use strata_layout::{StructDef, StructLayout};
use thiserror::Error;

mod c;
mod members;
mod rust;

/// Target language.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Rust,
}

impl Language {
    pub fn name(self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Rust => "rust",
        }
    }

    /// Text to place once before a run of definitions.
    pub fn prelude(self) -> &'static str {
        match self {
            Self::C => "#include <stdint.h>\n\n",
            Self::Rust => "",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = EmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "h" => Ok(Self::C),
            "rust" | "rs" => Ok(Self::Rust),
            other => Err(EmitError::UnknownLanguage(other.to_string())),
        }
    }
}

/// Emission failure.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The declaration and the layout describe different field lists.
    #[error("`{type_name}` declares {declared} fields but its layout has {laid_out}")]
    FieldCountMismatch {
        type_name: String,
        declared: usize,
        laid_out: usize,
    },
    #[error("unknown target language `{0}` (expected `c` or `rust`)")]
    UnknownLanguage(String),
    #[error(transparent)]
    Format(#[from] fmt::Error),
}

/// Render one definition.
pub fn emit(
    language: Language,
    def: &StructDef,
    layout: &StructLayout,
) -> Result<String, EmitError> {
    let members = members::plan(def, layout)?;
    let mut out = String::new();
    match language {
        Language::C => c::write_struct(&mut out, def, layout, &members)?,
        Language::Rust => rust::write_struct(&mut out, def, layout, &members)?,
    }
    tracing::debug!(
        %language,
        type_name = %def.name,
        members = members.len(),
        bytes = out.len(),
        "emitted struct"
    );
    Ok(out)
}

/// Render several definitions in order, separated by blank lines.
pub fn emit_many<'a, I>(language: Language, defs: I) -> Result<String, EmitError>
where
    I: IntoIterator<Item = (&'a StructDef, &'a StructLayout)>,
{
    let mut out = String::new();
    for (def, layout) in defs {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&emit(language, def, layout)?);
    }
    Ok(out)
}

/// Number of padding members an emission of `layout` introduces,
/// tail padding included.
pub fn padding_members(layout: &StructLayout) -> usize {
    layout.padding_before().iter().filter(|&&gap| gap > 0).count()
        + usize::from(layout.tail_padding() > 0)
}
