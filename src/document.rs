//! A scanned document snapshot.
//!
//! Scanning is cheap but not free, so consumers that answer many queries
//! against one revision (diagnostics, token lookups, hover-style
//! position queries) hold a `Document` and re-scan only when the text
//! actually changes. The token list is rebuilt wholesale on every
//! update, never patched in place.

use lsp_types::Diagnostic;

use crate::config::Settings;
use crate::definitions::{CompiledDefinitions, MacroDefTable};
use crate::diagnostics::diagnostics_with_tokens;
use crate::passage::PassageIndex;
use crate::scan::{scan_macros_with_passages, MacroToken};

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    text: String,
    passages: PassageIndex,
    tokens: Vec<MacroToken>,
}

impl Document {
    pub fn new(text: impl Into<String>, defs: &MacroDefTable, settings: &Settings) -> Document {
        let text = text.into();
        let passages = PassageIndex::new(&text);
        let tokens = scan_macros_with_passages(&text, defs, settings, &passages);
        Document {
            text,
            passages,
            tokens,
        }
    }

    /// Replaces the snapshot with a new revision and re-scans.
    pub fn update(&mut self, text: impl Into<String>, defs: &MacroDefTable, settings: &Settings) {
        *self = Document::new(text, defs, settings);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[MacroToken] {
        &self.tokens
    }

    pub fn passages(&self) -> &PassageIndex {
        &self.passages
    }

    /// The innermost macro tag covering a byte offset.
    pub fn token_at_offset(&self, offset: usize) -> Option<&MacroToken> {
        self.tokens
            .iter()
            .filter(|t| t.span.start <= offset && offset < t.span.end)
            .last()
    }

    pub fn diagnostics(
        &self,
        definitions: &CompiledDefinitions,
        settings: &Settings,
    ) -> Vec<Diagnostic> {
        diagnostics_with_tokens(
            &self.text,
            &self.tokens,
            &self.passages,
            definitions,
            settings,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{compiled_fixture, definitions_fixture};

    /// Test: updating a document rebuilds the token list wholesale.
    #[test]
    fn test_update_rescans() {
        let table = definitions_fixture();
        let settings = Settings::default();
        let mut doc = Document::new("<<if $x>>a<</if>>", &table, &settings);
        assert_eq!(doc.tokens().len(), 2);

        doc.update("<<print $x>>", &table, &settings);
        assert_eq!(doc.tokens().len(), 1);
        assert_eq!(doc.tokens()[0].name, "print");
    }

    /// Test: cached-token diagnostics equal a fresh scan's diagnostics.
    #[test]
    fn test_diagnostics_match_fresh_scan() {
        let table = definitions_fixture();
        let definitions = compiled_fixture();
        let settings = Settings::default();
        let text = "<<if maybe>>x<</if>> <<prnt>>";

        let doc = Document::new(text, &table, &settings);
        assert_eq!(
            doc.diagnostics(&definitions, &settings),
            crate::diagnostics::diagnostics(text, &definitions, &settings)
        );
    }

    /// Test: token lookup by offset finds the covering tag.
    #[test]
    fn test_token_at_offset() {
        let table = definitions_fixture();
        let doc = Document::new("ab <<print $x>> cd", &table, &Settings::default());

        assert_eq!(doc.token_at_offset(5).map(|t| t.name.as_str()), Some("print"));
        assert_eq!(doc.token_at_offset(0), None);
    }
}
