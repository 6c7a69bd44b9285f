//! Shared test fixtures for twixt.
//!
//! This module provides the definitions table used across test modules.
//! It is only compiled when running tests.

use crate::definitions::{CompiledDefinitions, MacroDefTable};

/// A small but representative definitions table.
///
/// Built from JSON so every test also exercises the serde path. The
/// shapes mirror a real story-format config: containers with child tags,
/// overloaded parameters, a deprecated macro with replacements, a
/// skip-args macro, and a self-closable one.
pub fn definitions_fixture() -> MacroDefTable {
    MacroDefTable::from_json(
        r#"{
            "if": {
                "container": true,
                "parameters": ["bool"],
                "children": ["else", "elseif"]
            },
            "silently": { "container": true },
            "print": { "parameters": ["text"] },
            "=": { "parameters": ["text"] },
            "set": { "skipArgs": true },
            "audio": { "selfClose": true },
            "break": { "parameters": [""] },
            "link": { "parameters": ["linkNoSetter | text &+ passage"] },
            "button": {
                "container": true,
                "parameters": ["link | text |+ passage"]
            },
            "actions": {
                "deprecated": true,
                "deprecatedSuggestions": ["button", "link"],
                "parameters": ["...link"]
            }
        }"#,
    )
    .expect("fixture definitions are valid JSON")
}

/// The fixture table, compiled.
pub fn compiled_fixture() -> CompiledDefinitions {
    CompiledDefinitions::new(definitions_fixture())
}
