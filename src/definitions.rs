//! The macro definitions table and its compiled cache.
//!
//! Definitions arrive as JSON or YAML text (file discovery and workspace
//! merging happen outside this crate); the core only consumes the
//! resolved table. [`CompiledDefinitions`] holds the compiled parameter
//! formats, memoized per distinct format string, behind an explicit
//! `invalidate()` — no ambient globals.

use std::collections::HashMap;

use anyhow::anyhow;
use serde::Deserialize;

use crate::format::{FormatCache, Parameters, Variant, RESERVED_VARIANT_KEYS};

/// One macro definition as declared in a config file.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MacroDef {
    /// The macro requires a matching closing tag.
    pub container: bool,
    /// `<<name/>>` is an accepted shorthand for open-plus-close.
    pub self_close: bool,
    /// Parameter overloads, in declaration order. `None` disables
    /// validation entirely for this macro.
    pub parameters: Option<Vec<ParameterEntry>>,
    pub deprecated: bool,
    pub deprecated_suggestions: Vec<String>,
    /// Skip argument lexing/validation (macros with bespoke grammars).
    pub skip_args: bool,
    /// Names of child tags only valid inside this container (`else`,
    /// `elseif` inside `if`).
    pub children: Vec<String>,
    pub description: Option<String>,
}

/// A variant declaration: either a bare format string (keyed by its
/// position) or an explicitly named one.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ParameterEntry {
    Format(String),
    Named { name: String, format: String },
}

impl ParameterEntry {
    pub fn key_for(&self, index: usize) -> String {
        match self {
            ParameterEntry::Format(_) => index.to_string(),
            ParameterEntry::Named { name, .. } => name.clone(),
        }
    }

    pub fn format(&self) -> &str {
        match self {
            ParameterEntry::Format(format) => format,
            ParameterEntry::Named { format, .. } => format,
        }
    }
}

/// Resolved name → definition table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroDefTable {
    macros: HashMap<String, MacroDef>,
}

impl MacroDefTable {
    pub fn new() -> MacroDefTable {
        MacroDefTable::default()
    }

    pub fn from_json(text: &str) -> anyhow::Result<MacroDefTable> {
        let macros: HashMap<String, MacroDef> = serde_json::from_str(text)
            .map_err(|err| anyhow!("invalid macro definitions JSON: {err}"))?;
        Ok(MacroDefTable { macros })
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<MacroDefTable> {
        let macros: HashMap<String, MacroDef> = serde_yaml::from_str(text)
            .map_err(|err| anyhow!("invalid macro definitions YAML: {err}"))?;
        Ok(MacroDefTable { macros })
    }

    pub fn insert(&mut self, name: impl Into<String>, def: MacroDef) {
        self.macros.insert(name.into(), def);
    }

    /// Later tables override earlier ones per macro name.
    pub fn merge(&mut self, other: MacroDefTable) {
        self.macros.extend(other.macros);
    }

    pub fn get(&self, name: &str) -> Option<&MacroDef> {
        self.macros.get(name)
    }

    pub fn is_container(&self, name: &str) -> bool {
        self.get(name).map(|def| def.container).unwrap_or(false)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.macros.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MacroDef)> {
        self.macros.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Child tag name → names of the containers that declare it.
    pub fn child_parents(&self) -> HashMap<&str, Vec<&str>> {
        let mut map: HashMap<&str, Vec<&str>> = HashMap::new();
        for (name, def) in self.iter() {
            for child in &def.children {
                map.entry(child.as_str()).or_default().push(name);
            }
        }
        map
    }

    /// True when the name is declared as some container's child tag.
    pub fn is_child(&self, name: &str) -> bool {
        self.macros
            .values()
            .any(|def| def.children.iter().any(|c| c == name))
    }
}

/// A problem in a definition itself (bad format string, bad variant key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionIssue {
    pub variant_key: String,
    pub message: String,
}

/// One macro's compiled parameters, plus whatever was wrong with the
/// definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledMacro {
    pub parameters: Option<Parameters>,
    pub issues: Vec<DefinitionIssue>,
}

/// The definitions table plus compiled parameter formats.
///
/// Compilation is eager so the whole structure is read-only during
/// validation and can be shared across threads without locking. External
/// collaborators (file watchers) call [`CompiledDefinitions::invalidate`]
/// or [`CompiledDefinitions::set_table`] when the config changes.
#[derive(Debug, Default)]
pub struct CompiledDefinitions {
    table: MacroDefTable,
    compiled: HashMap<String, CompiledMacro>,
    cache: FormatCache,
}

impl CompiledDefinitions {
    pub fn new(table: MacroDefTable) -> CompiledDefinitions {
        let mut this = CompiledDefinitions {
            table,
            compiled: HashMap::new(),
            cache: FormatCache::new(),
        };
        this.rebuild();
        this
    }

    pub fn table(&self) -> &MacroDefTable {
        &self.table
    }

    pub fn get(&self, name: &str) -> Option<&CompiledMacro> {
        self.compiled.get(name)
    }

    /// Drops every compiled format and recompiles from the current table.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
        self.rebuild();
    }

    /// Replaces the table and recompiles.
    pub fn set_table(&mut self, table: MacroDefTable) {
        self.table = table;
        self.invalidate();
    }

    fn rebuild(&mut self) {
        let table = &self.table;
        let cache = &mut self.cache;
        let mut compiled = HashMap::new();

        for (name, def) in table.iter() {
            let Some(entries) = &def.parameters else {
                compiled.insert(name.to_string(), CompiledMacro::default());
                continue;
            };

            let mut variants: Vec<(String, Variant)> = Vec::new();
            let mut issues = Vec::new();
            let mut seen = std::collections::HashSet::new();

            for (index, entry) in entries.iter().enumerate() {
                let key = entry.key_for(index);

                if RESERVED_VARIANT_KEYS.contains(&key.as_str()) {
                    issues.push(DefinitionIssue {
                        variant_key: key.clone(),
                        message: format!("variant key `{key}` is reserved"),
                    });
                    continue;
                }
                if !seen.insert(key.clone()) {
                    issues.push(DefinitionIssue {
                        variant_key: key.clone(),
                        message: format!("variant key `{key}` appears more than once"),
                    });
                    continue;
                }

                match cache.compile(entry.format()) {
                    Ok(variant) => variants.push((key, variant)),
                    Err(error) => issues.push(DefinitionIssue {
                        variant_key: key,
                        message: format!("invalid parameter format: {}", error.message),
                    }),
                }
            }

            let parameters = match Parameters::new(variants) {
                Ok(parameters) => Some(parameters),
                Err(error) => {
                    issues.push(DefinitionIssue {
                        variant_key: String::new(),
                        message: error.to_string(),
                    });
                    None
                }
            };

            compiled.insert(
                name.to_string(),
                CompiledMacro { parameters, issues },
            );
        }

        self.compiled = compiled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: JSON definitions deserialize with camelCase keys and
    /// defaults.
    #[test]
    fn test_from_json() {
        let table = MacroDefTable::from_json(
            r#"{
                "if": {
                    "container": true,
                    "parameters": ["bool"],
                    "children": ["else", "elseif"]
                },
                "audio": { "skipArgs": true },
                "back": { "parameters": [{"name": "text", "format": "|+ text"}] }
            }"#,
        )
        .unwrap();

        assert!(table.is_container("if"));
        assert!(table.get("audio").unwrap().skip_args);
        assert!(table.is_child("else"));
        assert_eq!(
            table.get("back").unwrap().parameters.as_ref().unwrap()[0].key_for(0),
            "text"
        );
    }

    /// Test: YAML definitions parse through the same model.
    #[test]
    fn test_from_yaml() {
        let table = MacroDefTable::from_yaml(
            "link:\n  parameters:\n    - \"linkNoSetter | text &+ passage\"\n  deprecated: true\n  deprecatedSuggestions: [\"button\"]\n",
        )
        .unwrap();

        let def = table.get("link").unwrap();
        assert!(def.deprecated);
        assert_eq!(def.deprecated_suggestions, vec!["button"]);
    }

    /// Test: merge overrides per name, keeping unrelated entries.
    #[test]
    fn test_merge_overrides() {
        let mut base = MacroDefTable::from_json(
            r#"{"if": {"container": true}, "print": {}}"#,
        )
        .unwrap();
        let overlay = MacroDefTable::from_json(r#"{"if": {"container": false}}"#).unwrap();

        base.merge(overlay);
        assert!(!base.is_container("if"));
        assert!(base.get("print").is_some());
    }

    /// Test: compiled definitions expose parameters and reuse the format
    /// cache across invalidation.
    #[test]
    fn test_compiled_definitions() {
        let table = MacroDefTable::from_json(
            r#"{"if": {"container": true, "parameters": ["bool"]}}"#,
        )
        .unwrap();
        let mut compiled = CompiledDefinitions::new(table);

        let before = compiled
            .get("if")
            .and_then(|m| m.parameters.clone())
            .unwrap();

        compiled.invalidate();
        let after = compiled
            .get("if")
            .and_then(|m| m.parameters.clone())
            .unwrap();

        assert!(before.structurally_eq(&after));
    }

    /// Test: bad format strings become definition issues, not panics.
    #[test]
    fn test_bad_format_is_issue() {
        let table = MacroDefTable::from_json(
            r#"{"broken": {"parameters": ["number &- string"]}}"#,
        )
        .unwrap();
        let compiled = CompiledDefinitions::new(table);

        let broken = compiled.get("broken").unwrap();
        assert_eq!(broken.issues.len(), 1);
        assert!(broken.issues[0].message.contains("did you mean `&+`"));
        assert_eq!(broken.parameters.as_ref().map(|p| p.len()), Some(0));
    }

    /// Test: reserved variant keys are rejected as issues.
    #[test]
    fn test_reserved_key_is_issue() {
        let table = MacroDefTable::from_json(
            r#"{"bad": {"parameters": [{"name": "__proto__", "format": "text"}]}}"#,
        )
        .unwrap();
        let compiled = CompiledDefinitions::new(table);

        let bad = compiled.get("bad").unwrap();
        assert_eq!(bad.issues.len(), 1);
        assert!(bad.issues[0].message.contains("reserved"));
    }
}
