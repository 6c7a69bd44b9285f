//! Token types produced by the macro scanner.

use serde::{Deserialize, Serialize};

use crate::range::{ByteSpan, MyRange, Rangeable};

/// One `<<...>>` tag found in a document.
///
/// A matched open/close pair holds each other's ids in `pair`; a token
/// whose `pair` equals its own `id` is unmatched. The token list is
/// rebuilt wholesale on every scan and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroToken {
    pub id: usize,
    pub pair: usize,
    pub name: String,
    pub open: bool,
    /// Trailing `/` before `>>` was present on the tag.
    pub self_closed: bool,
    /// The tag used the deprecated `<<endname>>` close form.
    pub end_variant: bool,
    /// Synthesized zero-width close for a self-closing tag.
    pub synthetic: bool,
    pub range: MyRange,
    /// Byte span of the whole tag in the document.
    pub span: ByteSpan,
    /// Byte span of the argument substring (between name and `>>`),
    /// present when the tag carried non-whitespace argument text.
    /// Closing tags keep theirs so stray arguments can be diagnosed.
    pub args_span: Option<ByteSpan>,
}

impl MacroToken {
    pub fn is_unmatched(&self) -> bool {
        self.pair == self.id
    }

    /// The raw argument text of an open tag, if any.
    pub fn args_text<'a>(&self, source: &'a str) -> Option<&'a str> {
        let span = self.args_span?;
        source.get(span.start..span.end)
    }
}

impl Rangeable for MacroToken {
    fn range(&self) -> &MyRange {
        &self.range
    }
}
