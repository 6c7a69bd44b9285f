//! Parameter format compilation.
//!
//! A macro definition declares each overload as a small format string
//! (`"number |+ string"`, `"...link"`). Compilation lexes and parses that
//! string into an immutable [`FormatNode`] tree, memoized per distinct
//! format string by [`FormatCache`].

mod lexer;
mod parser;
pub mod registry;
mod types;

pub use lexer::{lex_format, FormatToken, LEX_ITERATION_LIMIT};
pub use parser::{parse_format, PARSE_ITERATION_LIMIT};
pub use registry::{ParameterType, TypeCheck};
pub use types::{FormatNode, Parameters, ParametersKeyError, Variant, RESERVED_VARIANT_KEYS};

use std::collections::HashMap;

use crate::range::ByteSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatErrorKind {
    Lex,
    Parse,
    /// An iteration ceiling was exceeded; the format is adversarial.
    Complexity,
}

/// A positioned problem in a format string; the span indexes the format
/// string itself, not the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    pub kind: FormatErrorKind,
    pub message: String,
    pub span: ByteSpan,
}

/// Compiles one format string into a [`Variant`]. An empty (or
/// whitespace-only) format is a variant that accepts no arguments.
pub fn compile_format(text: &str) -> Result<Variant, FormatError> {
    let tokens = lex_format(text)?;
    if tokens.is_empty() {
        return Ok(Variant { format: None });
    }
    let node = parse_format(&tokens)?;
    Ok(Variant {
        format: Some(node),
    })
}

/// Memoizes compiled variants per distinct format string.
///
/// The cache is plain data behind `&mut` during construction and shared
/// read-only afterwards, so parallel validation needs no locking.
#[derive(Debug, Default)]
pub struct FormatCache {
    compiled: HashMap<String, Result<Variant, FormatError>>,
}

impl FormatCache {
    pub fn new() -> FormatCache {
        FormatCache::default()
    }

    pub fn compile(&mut self, text: &str) -> Result<Variant, FormatError> {
        if let Some(result) = self.compiled.get(text) {
            return result.clone();
        }
        let result = compile_format(text);
        self.compiled.insert(text.to_string(), result.clone());
        result
    }

    pub fn invalidate(&mut self) {
        self.compiled.clear();
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}
