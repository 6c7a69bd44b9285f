//! Passage headers and the passage-name index.
//!
//! Twee documents are divided into passages by `:: Name [tags]` header
//! lines. The index serves two consumers: link/image arguments check the
//! named passage exists, and the macro scanner masks the bodies of
//! passages tagged `script` or `stylesheet` so their contents are never
//! scanned for macro tags.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use ropey::Rope;

use crate::range::{ByteSpan, MyRange};

/// A single `:: Name [tags]` passage with its body span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    pub name: String,
    pub tags: Vec<String>,
    /// Range of the header line.
    pub range: MyRange,
    /// Byte span of the body, from the end of the header line to the next
    /// header (or end of text).
    pub body_span: ByteSpan,
}

impl Passage {
    pub fn is_script_or_stylesheet(&self) -> bool {
        self.tags
            .iter()
            .any(|t| t == "script" || t == "stylesheet")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassageIndex {
    passages: Vec<Passage>,
    names: HashSet<String>,
}

impl PassageIndex {
    pub fn new(text: &str) -> PassageIndex {
        static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?m)^::[ \t]*(?<name>[^\[\]\r\n]*?)[ \t]*(\[(?<tags>[^\[\]\r\n]*)\])?[ \t]*\r?$")
                .unwrap()
        });

        let rope = Rope::from_str(text);

        let headers = HEADER_RE
            .captures_iter(text)
            .flat_map(|c| match (c.get(0), c.name("name")) {
                (Some(full), Some(name)) => Some((full, name, c.name("tags"))),
                _ => None,
            })
            .map(|(full, name, tags)| {
                (
                    full.range(),
                    name.as_str().to_string(),
                    tags.map(|t| {
                        t.as_str()
                            .split_whitespace()
                            .map(String::from)
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default(),
                )
            })
            .collect::<Vec<_>>();

        let passages = headers
            .iter()
            .enumerate()
            .map(|(i, (header, name, tags))| {
                let body_start = (header.end + 1).min(text.len());
                let body_end = headers
                    .get(i + 1)
                    .map(|(next, ..)| next.start)
                    .unwrap_or(text.len());

                Passage {
                    name: name.clone(),
                    tags: tags.clone(),
                    range: MyRange::from_range(&rope, header.clone()),
                    body_span: ByteSpan::new(body_start, body_end.max(body_start)),
                }
            })
            .collect::<Vec<_>>();

        let names = passages.iter().map(|p| p.name.clone()).collect();

        PassageIndex { passages, names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.passages.iter().map(|p| p.name.as_str())
    }

    /// Body spans of passages whose content is code, not markup.
    pub fn inert_body_spans(&self) -> Vec<ByteSpan> {
        self.passages
            .iter()
            .filter(|p| p.is_script_or_stylesheet())
            .map(|p| p.body_span)
            .collect()
    }
}
