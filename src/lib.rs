//! twixt: a macro analysis core for Twee-style markup
//!
//! This crate analyzes documents that embed a small templating language —
//! "macros" of the form `<<name ...>> ... <</name>>` — and reports
//! precise, range-anchored diagnostics about them.
//!
//! # Overview
//!
//! Analysis runs as a pipeline of pure stages over an immutable text
//! snapshot and an immutable definitions table:
//!
//! - **Scanning** ([`scan`]): find macro tags, resolve deprecated
//!   `<<endname>>` closes, pair opens with closes LIFO per name.
//! - **Argument lexing and classification** ([`args`]): tokenize the text
//!   between a macro's name and its `>>` and turn the items into typed
//!   arguments, including `[[link]]`/`[img[...]]` markup.
//! - **Format compilation** ([`format`]): compile each definition's
//!   declarative parameter grammar (`"number |+ string"`) into an
//!   immutable AST, memoized per format string.
//! - **Validation** ([`validate`]): rank supplied arguments against every
//!   overload of a macro and keep the best match.
//! - **Diagnostics** ([`diagnostics`]): assemble everything into
//!   LSP-style diagnostics for a whole document.
//!
//! Malformed input text is always representable state — unmatched tags,
//! error items, failing variants — never a panic or error return. Only
//! iteration ceilings on adversarial input and outright API misuse are
//! fatal ([`errors::FatalError`]).
//!
//! # Usage
//!
//! ```ignore
//! use twixt::config::Settings;
//! use twixt::definitions::{CompiledDefinitions, MacroDefTable};
//!
//! let table = MacroDefTable::from_json(&config_text)?;
//! let definitions = CompiledDefinitions::new(table);
//! let diags = twixt::diagnostics::diagnostics(&text, &definitions, &Settings::default());
//! ```

// Core analysis stages
pub mod args;
pub mod format;
pub mod scan;
pub mod validate;

// Document-level assembly
pub mod diagnostics;
pub mod document;
pub mod passage;

// Configuration and definitions
pub mod config;
pub mod definitions;

// Shared plumbing
pub mod errors;
pub mod range;
pub mod suggest;

// CLI entry points (used by the twixt binary)
pub mod cli;

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;
