//! Macro tag scanning and pairing.
//!
//! Scanning works on a masked copy of the document: every `<<` inside a
//! comment-like region or a script/stylesheet passage body is replaced by
//! an equal-length placeholder first, so commented-out macro syntax never
//! becomes a token and every position in the masked text still lines up
//! with the original.
//!
//! Malformed input is representable state here — unmatched tags keep
//! `pair == id` — and never an error return.

mod types;

pub use types::MacroToken;

use once_cell::sync::Lazy;
use regex::Regex;
use ropey::Rope;

use crate::config::Settings;
use crate::definitions::MacroDefTable;
use crate::passage::PassageIndex;
use crate::range::{ByteSpan, MyRange};

/// Comment-like regions whose contents must never scan as macro tags.
static INERT_REGION_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?s)/\*.*?\*/",
        r"(?s)/%.*?%/",
        r"(?s)<!--.*?-->",
        r"(?s)\{\{\{.*?\}\}\}",
        r"(?is)<nowiki>.*?</nowiki>",
        r"(?is)<script[^>]*>.*?</script>",
        r"(?is)<style[^>]*>.*?</style>",
    ]
    .iter()
    .map(|pat| Regex::new(pat).unwrap())
    .collect()
});

static TAG_HEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<<(?<prefix>/|end)?(?<name>[A-Za-z][\w-]*|=|-)").unwrap());

/// Replaces every `<<` inside comment-like regions and script/stylesheet
/// passage bodies with two spaces, preserving all other byte positions.
pub fn mask_inert(text: &str, passages: &PassageIndex) -> String {
    let mut spans: Vec<ByteSpan> = INERT_REGION_RES
        .iter()
        .flat_map(|re| {
            re.find_iter(text)
                .map(|m| ByteSpan::new(m.start(), m.end()))
        })
        .collect();
    spans.extend(passages.inert_body_spans());

    let mut bytes = text.as_bytes().to_vec();
    for span in spans {
        let mut i = span.start;
        while i + 1 < span.end.min(bytes.len()) {
            if bytes[i] == b'<' && bytes[i + 1] == b'<' {
                bytes[i] = b' ';
                bytes[i + 1] = b' ';
                i += 2;
            } else {
                i += 1;
            }
        }
    }

    String::from_utf8(bytes).expect("masking replaces ascii with ascii")
}

/// Scans a document for macro tags and pairs opens with closes.
///
/// The definitions table is consulted only to resolve the deprecated
/// `<<endname>>` close form (it closes `name` only when `name` is a known
/// container) — recognition of tags themselves needs no definitions.
pub fn scan_macros(text: &str, defs: &MacroDefTable, settings: &Settings) -> Vec<MacroToken> {
    let passages = PassageIndex::new(text);
    scan_macros_with_passages(text, defs, settings, &passages)
}

/// As [`scan_macros`], reusing an already-built passage index.
pub fn scan_macros_with_passages(
    text: &str,
    defs: &MacroDefTable,
    settings: &Settings,
    passages: &PassageIndex,
) -> Vec<MacroToken> {
    let masked = mask_inert(text, passages);
    let rope = Rope::from_str(text);

    let mut tokens: Vec<MacroToken> = Vec::new();
    let mut search_pos = 0;

    while let Some(caps) = TAG_HEAD_RE.captures_at(&masked, search_pos) {
        let head = caps.get(0).expect("capture 0 always present");
        let prefix = caps.name("prefix").map(|m| m.as_str());
        let raw_name = caps.name("name").map(|m| m.as_str()).unwrap_or_default();

        let Some((args_end, trailing_slash, tag_end)) = find_tag_close(&masked, head.end()) else {
            // No closing `>>` for this head; resume after its `<<` so a
            // later head inside the dangling text can still match.
            search_pos = head.start() + 2;
            continue;
        };

        let (name, is_close, end_variant) = match prefix {
            Some("/") => (raw_name.to_string(), true, false),
            Some("end") => {
                if defs.is_container(raw_name) {
                    (raw_name.to_string(), true, true)
                } else {
                    (format!("end{raw_name}"), false, false)
                }
            }
            _ => (raw_name.to_string(), false, false),
        };

        let args_span = {
            let raw = &masked[head.end()..args_end];
            if raw.trim().is_empty() {
                None
            } else {
                Some(ByteSpan::new(head.end(), args_end))
            }
        };

        let id = tokens.len();
        let span = ByteSpan::new(head.start(), tag_end);
        tokens.push(MacroToken {
            id,
            pair: id,
            name: name.clone(),
            open: !is_close,
            self_closed: trailing_slash,
            end_variant,
            synthetic: false,
            range: MyRange::from_range(&rope, span.start..span.end),
            span,
            args_span,
        });

        // A self-closing open gets a synthetic zero-width close linked
        // directly to it; neither token ever touches the pairing stacks.
        if trailing_slash && !is_close && settings.self_close_macros {
            let close_id = tokens.len();
            tokens[id].pair = close_id;
            tokens.push(MacroToken {
                id: close_id,
                pair: id,
                name,
                open: false,
                self_closed: true,
                end_variant: false,
                synthetic: true,
                range: MyRange::from_range(&rope, tag_end..tag_end),
                span: ByteSpan::new(tag_end, tag_end),
                args_span: None,
            });
        }

        search_pos = tag_end;
    }

    pair_tokens(&mut tokens);

    tokens
}

/// LIFO pairing: an open pushes its id on a per-name stack, a close pops
/// the most recent same-name open. Self-closed pairs are already linked
/// and skipped entirely.
fn pair_tokens(tokens: &mut [MacroToken]) {
    let mut stacks: std::collections::HashMap<String, Vec<usize>> =
        std::collections::HashMap::new();

    for i in 0..tokens.len() {
        if tokens[i].pair != tokens[i].id {
            continue;
        }

        if tokens[i].open {
            stacks
                .entry(tokens[i].name.clone())
                .or_default()
                .push(tokens[i].id);
        } else if let Some(open_id) = stacks.get_mut(&tokens[i].name).and_then(|s| s.pop()) {
            let close_id = tokens[i].id;
            tokens[i].pair = open_id;
            tokens[open_id].pair = close_id;
        }
    }
}

/// Walks from the end of a tag head to its closing `>>`, skipping over
/// quoted strings and `[[...]]`/`[img[...]]` runs so a `>>` inside those
/// does not terminate the tag. Returns (args end, trailing `/` present,
/// end of tag). `None` when no closing `>>` exists.
fn find_tag_close(text: &str, args_start: usize) -> Option<(usize, bool, usize)> {
    let bytes = text.as_bytes();
    let mut p = args_start;

    while p < bytes.len() {
        match bytes[p] {
            b'>' if bytes.get(p + 1) == Some(&b'>') => {
                let self_closed = p > args_start && bytes[p - 1] == b'/';
                let args_end = if self_closed { p - 1 } else { p };
                return Some((args_end, self_closed, p + 2));
            }
            b'`' | b'"' | b'\'' => match skip_quoted(bytes, p) {
                Some(after) => p = after,
                None => p += 1,
            },
            b'[' => match skip_bracket_markup(bytes, p) {
                Some(after) => p = after,
                None => p += 1,
            },
            _ => p += 1,
        }
    }

    None
}

/// Skips a quoted run starting at `p` (which holds the quote byte).
/// Returns the position after the matching unescaped quote, or `None`
/// when the quote never closes — the caller then treats it as plain text.
fn skip_quoted(bytes: &[u8], p: usize) -> Option<usize> {
    let quote = bytes[p];
    let mut i = p + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Skips a `[[...]]` or `[<align>img[...]]` run: requires the second `[`
/// (optionally after align/img meta) and the nearest `]]` on the same
/// line. Anything else is not markup and the caller advances one byte.
fn skip_bracket_markup(bytes: &[u8], p: usize) -> Option<usize> {
    let mut q = p + 1;

    if q < bytes.len() && (bytes[q] == b'<' || bytes[q] == b'>') {
        q += 1;
    }
    if bytes.len() >= q + 3 && bytes[q].eq_ignore_ascii_case(&b'i')
        && bytes[q + 1].eq_ignore_ascii_case(&b'm')
        && bytes[q + 2].eq_ignore_ascii_case(&b'g')
    {
        q += 3;
    } else if q != p + 1 {
        // Align char without img is not image markup.
        return None;
    }

    if bytes.get(q) != Some(&b'[') {
        return None;
    }

    let mut i = q + 1;
    while i + 1 < bytes.len() {
        match bytes[i] {
            b'\r' | b'\n' => return None,
            b']' if bytes[i + 1] == b']' => return Some(i + 2),
            _ => i += 1,
        }
    }
    None
}
