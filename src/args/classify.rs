//! Classification of lexed argument items into typed [`Argument`]s.
//!
//! Barewords classify in a fixed order: variable sigil, settings/setup
//! access, literal keywords, numeric parse, plain bareword. Square-bracket
//! items go through a two-pass sub-lexer: pass one reads the left meta
//! (`[[` link vs `[<align>img[` image), pass two splits the body on
//! direction delimiters and `][` continuations.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::passage::PassageIndex;
use crate::range::ByteSpan;

use super::types::{
    Argument, ArgumentError, ArgumentItem, ArgumentWarning, Evaluatable, ImageAlign,
    ImageArgument, LinkArgument, LinkSyntax, ParsedArguments,
};

pub fn classify_arguments(
    items: &[ArgumentItem],
    passages: Option<&PassageIndex>,
) -> ParsedArguments {
    let mut parsed = ParsedArguments::default();

    for item in items {
        match item {
            ArgumentItem::Error { message, span, .. } => {
                parsed.errors.push(ArgumentError {
                    message: message.clone(),
                    span: *span,
                });
            }
            ArgumentItem::Bareword { text, span } => {
                parsed.arguments.push(classify_bareword(text, *span));
            }
            ArgumentItem::Expression { text, span } => {
                let inner = &text[1..text.len() - 1];
                if inner.trim().is_empty() {
                    parsed.arguments.push(Argument::EmptyExpression { span: *span });
                } else {
                    parsed.arguments.push(Argument::Expression {
                        text: inner.to_string(),
                        span: *span,
                    });
                }
            }
            ArgumentItem::String { text, span } => {
                // Delimiters stripped; contents passed through verbatim.
                parsed.arguments.push(Argument::String {
                    text: text[1..text.len() - 1].to_string(),
                    span: *span,
                });
            }
            ArgumentItem::SquareBracket { text, span } => {
                classify_markup(text, *span, passages, &mut parsed);
            }
        }
    }

    parsed
}

fn classify_bareword(text: &str, span: ByteSpan) -> Argument {
    static VAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[$_][A-Za-z$_][\w$]*$").unwrap());
    static ACCESS_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(settings|setup)[.\[]").unwrap());

    if VAR_RE.is_match(text) {
        return Argument::Variable {
            name: text.to_string(),
            span,
        };
    }
    if ACCESS_RE.is_match(text) {
        return Argument::SettingsSetupAccess {
            text: text.to_string(),
            span,
        };
    }

    match text {
        "null" => return Argument::Null { span },
        "undefined" => return Argument::Undefined { span },
        "true" => return Argument::True { span },
        "false" => return Argument::False { span },
        "NaN" => return Argument::NaN { span },
        _ => {}
    }

    if let Some(value) = parse_number(text) {
        return Argument::Number { value, span };
    }

    Argument::Bareword {
        value: text.to_string(),
        span,
    }
}

/// Parses decimal, float, exponent, and `0x` hex notation. Anything else
/// stays a bareword.
fn parse_number(text: &str) -> Option<f64> {
    static HEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?0[xX][0-9a-fA-F]+$").unwrap());
    static NUM_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").unwrap());

    if HEX_RE.is_match(text) {
        let (sign, rest) = match text.as_bytes()[0] {
            b'-' => (-1.0, &text[1..]),
            b'+' => (1.0, &text[1..]),
            _ => (1.0, text),
        };
        let digits = &rest[2..];
        return i64::from_str_radix(digits, 16).ok().map(|v| sign * v as f64);
    }

    if NUM_RE.is_match(text) {
        return text.parse::<f64>().ok();
    }

    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkupKind {
    Link,
    Image { align: Option<ImageAlign> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DelimKind {
    Pipe,
    Arrow,
    BackArrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentEnd {
    /// `][` continuation.
    Inner,
    /// Terminal `]]`.
    Terminal,
    Eof,
}

struct Segment {
    text: String,
    /// First top-level direction delimiter and its position in `text`.
    delim: Option<(DelimKind, usize)>,
    end: SegmentEnd,
}

/// Pass one: reads the opening meta and reports what the markup is.
/// Returns the char index where the body begins.
fn lex_left_meta(chars: &[char]) -> Option<(MarkupKind, usize)> {
    if chars.first() != Some(&'[') {
        return None;
    }
    if chars.get(1) == Some(&'[') {
        return Some((MarkupKind::Link, 2));
    }

    let mut i = 1;
    let align = match chars.get(i) {
        Some('<') => {
            i += 1;
            Some(ImageAlign::Left)
        }
        Some('>') => {
            i += 1;
            Some(ImageAlign::Right)
        }
        _ => None,
    };

    let img: String = chars.iter().skip(i).take(3).collect();
    if !img.eq_ignore_ascii_case("img") {
        return None;
    }
    i += 3;

    if chars.get(i) != Some(&'[') {
        return None;
    }

    Some((MarkupKind::Image { align }, i + 1))
}

/// Pass two: scans one `][`-delimited segment, tolerating nested brackets
/// and quoted strings, optionally splitting on the first direction
/// delimiter (`|`, `->`, `<-`).
fn scan_segment(chars: &[char], mut i: usize, detect_delims: bool) -> (Segment, usize) {
    let mut segment = Segment {
        text: String::new(),
        delim: None,
        end: SegmentEnd::Eof,
    };
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = quote {
            segment.text.push(c);
            if c == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    segment.text.push(escaped);
                    i += 1;
                }
            } else if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match c {
            '"' | '\'' | '`' => {
                quote = Some(c);
                segment.text.push(c);
            }
            '[' => {
                depth += 1;
                segment.text.push(c);
            }
            ']' if depth > 0 => {
                depth -= 1;
                segment.text.push(c);
            }
            ']' => match chars.get(i + 1) {
                Some('[') => {
                    segment.end = SegmentEnd::Inner;
                    return (segment, i + 2);
                }
                Some(']') => {
                    segment.end = SegmentEnd::Terminal;
                    return (segment, i + 2);
                }
                _ => segment.text.push(c),
            },
            '|' if detect_delims && segment.delim.is_none() => {
                segment.delim = Some((DelimKind::Pipe, segment.text.len()));
            }
            '-' if detect_delims
                && segment.delim.is_none()
                && chars.get(i + 1) == Some(&'>') =>
            {
                segment.delim = Some((DelimKind::Arrow, segment.text.len()));
                i += 1;
            }
            '<' if detect_delims
                && segment.delim.is_none()
                && chars.get(i + 1) == Some(&'-') =>
            {
                segment.delim = Some((DelimKind::BackArrow, segment.text.len()));
                i += 1;
            }
            _ => segment.text.push(c),
        }

        i += 1;
    }

    (segment, i)
}

fn classify_markup(
    text: &str,
    span: ByteSpan,
    passages: Option<&PassageIndex>,
    parsed: &mut ParsedArguments,
) {
    let chars: Vec<char> = text.chars().collect();

    let Some((kind, body_start)) = lex_left_meta(&chars) else {
        parsed.errors.push(ArgumentError {
            message: "malformed square bracket markup".to_string(),
            span,
        });
        return;
    };

    let mut segments = Vec::new();
    let mut i = body_start;
    loop {
        let detect = segments.is_empty();
        let (segment, next) = scan_segment(&chars, i, detect);
        let end = segment.end;
        segments.push(segment);
        i = next;
        match end {
            SegmentEnd::Inner => continue,
            SegmentEnd::Terminal => break,
            SegmentEnd::Eof => {
                parsed.errors.push(ArgumentError {
                    message: "unterminated square bracket markup".to_string(),
                    span,
                });
                return;
            }
        }
    }

    if i < chars.len() {
        parsed.errors.push(ArgumentError {
            message: "unexpected characters after markup end".to_string(),
            span,
        });
        return;
    }

    let main = &segments[0];
    let (target_raw, display) = match main.delim {
        None => (main.text.clone(), None),
        Some((DelimKind::Pipe | DelimKind::Arrow, pos)) => (
            main.text[pos..].to_string(),
            Some(main.text[..pos].trim().to_string()),
        ),
        Some((DelimKind::BackArrow, pos)) => (
            main.text[..pos].to_string(),
            Some(main.text[pos..].trim().to_string()),
        ),
    };

    match kind {
        MarkupKind::Link => {
            if segments.len() > 2 {
                parsed.errors.push(ArgumentError {
                    message: "too many `][` sections in link markup".to_string(),
                    span,
                });
                return;
            }
            let (passage, _) = evaluate_target(&target_raw);
            warn_unknown_passage(&passage, passages, span, &mut parsed.warnings);

            parsed.arguments.push(Argument::Link(LinkArgument {
                passage,
                text: display.filter(|t| !t.is_empty()),
                setter: segments
                    .get(1)
                    .map(|s| s.text.trim().to_string())
                    .filter(|s| !s.is_empty()),
                syntax: match main.delim {
                    None => LinkSyntax::Wiki,
                    Some(_) => LinkSyntax::Pretty,
                },
                span,
            }));
        }
        MarkupKind::Image { align } => {
            if segments.len() > 3 {
                parsed.errors.push(ArgumentError {
                    message: "too many `][` sections in image markup".to_string(),
                    span,
                });
                return;
            }
            // For images the directional split is title vs source.
            let (source_raw, title) = (target_raw, display);
            let (source, _) = evaluate_target(&source_raw);

            let link = segments.get(1).map(|s| evaluate_target(&s.text));
            let force_internal = link.as_ref().map(|(_, f)| *f).unwrap_or(false);
            let link = link.map(|(ev, _)| ev);
            if let Some(link_ev) = &link {
                warn_unknown_passage(link_ev, passages, span, &mut parsed.warnings);
            }

            parsed.arguments.push(Argument::Image(ImageArgument {
                source,
                title: title.filter(|t| !t.is_empty()),
                link,
                setter: segments
                    .get(2)
                    .map(|s| s.text.trim().to_string())
                    .filter(|s| !s.is_empty()),
                align,
                force_internal,
                span,
            }));
        }
    }
}

/// Best-effort static read of a link/image target. A `~` prefix forces an
/// internal (passage) target and is stripped. Returns the evaluatable and
/// whether the force marker was present.
fn evaluate_target(raw: &str) -> (Evaluatable<String>, bool) {
    let mut trimmed = raw.trim();
    let force_internal = trimmed.starts_with('~');
    if force_internal {
        trimmed = trimmed[1..].trim_start();
    }

    // Quoted string literal: the value is statically known.
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            let inner = &trimmed[1..trimmed.len() - 1];
            if !inner.contains(quote) {
                return (Evaluatable::evaluated(raw.trim(), inner.to_string()), force_internal);
            }
        }
    }

    // Backquote wrapping an inner string literal still evaluates.
    if trimmed.len() >= 2 && trimmed.starts_with('`') && trimmed.ends_with('`') {
        let inner = trimmed[1..trimmed.len() - 1].trim();
        for quote in ['"', '\''] {
            if inner.len() >= 2
                && inner.starts_with(quote)
                && inner.ends_with(quote)
                && !inner[1..inner.len() - 1].contains(quote)
            {
                return (
                    Evaluatable::evaluated(raw.trim(), inner[1..inner.len() - 1].to_string()),
                    force_internal,
                );
            }
        }
        return (Evaluatable::unevaluated(raw.trim()), force_internal);
    }

    // Variables and anything expression-shaped cannot be read statically.
    if trimmed.contains('$') || trimmed.contains('`') || trimmed.starts_with('_') {
        return (Evaluatable::unevaluated(raw.trim()), force_internal);
    }

    (
        Evaluatable::evaluated(raw.trim(), trimmed.to_string()),
        force_internal,
    )
}

fn warn_unknown_passage(
    target: &Evaluatable<String>,
    passages: Option<&PassageIndex>,
    span: ByteSpan,
    warnings: &mut Vec<ArgumentWarning>,
) {
    let Some(index) = passages else { return };
    if let (true, Some(name)) = (target.is_evaluated, target.value.as_ref()) {
        if !name.is_empty() && !index.contains(name) {
            warnings.push(ArgumentWarning {
                message: format!("nonexistent passage `{name}`"),
                span,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::lex_arguments;
    use super::*;

    fn classify(text: &str) -> ParsedArguments {
        classify_arguments(&lex_arguments(text), None)
    }

    fn classify_with(text: &str, passages: &PassageIndex) -> ParsedArguments {
        classify_arguments(&lex_arguments(text), Some(passages))
    }

    /// Test: bareword classification order — variable, access, keyword,
    /// number, bareword.
    #[test]
    fn test_bareword_order() {
        let parsed = classify("$hp _tmp settings.volume null undefined true false NaN 4.5 go");

        assert!(matches!(parsed.arguments[0], Argument::Variable { .. }));
        assert!(matches!(parsed.arguments[1], Argument::Variable { .. }));
        assert!(matches!(
            parsed.arguments[2],
            Argument::SettingsSetupAccess { .. }
        ));
        assert!(matches!(parsed.arguments[3], Argument::Null { .. }));
        assert!(matches!(parsed.arguments[4], Argument::Undefined { .. }));
        assert!(matches!(parsed.arguments[5], Argument::True { .. }));
        assert!(matches!(parsed.arguments[6], Argument::False { .. }));
        assert!(matches!(parsed.arguments[7], Argument::NaN { .. }));
        assert!(matches!(
            parsed.arguments[8],
            Argument::Number { value, .. } if value == 4.5
        ));
        assert!(matches!(
            parsed.arguments[9],
            Argument::Bareword { ref value, .. } if value == "go"
        ));
    }

    /// Test: exponent and hex notation parse as numbers.
    #[test]
    fn test_number_shapes() {
        let parsed = classify("1e3 -0x1A .5 +7");

        assert!(matches!(parsed.arguments[0], Argument::Number { value, .. } if value == 1000.0));
        assert!(matches!(parsed.arguments[1], Argument::Number { value, .. } if value == -26.0));
        assert!(matches!(parsed.arguments[2], Argument::Number { value, .. } if value == 0.5));
        assert!(matches!(parsed.arguments[3], Argument::Number { value, .. } if value == 7.0));
    }

    /// Test: strings strip delimiters and are not escape-processed.
    #[test]
    fn test_string_verbatim() {
        let parsed = classify(r#""a \n b""#);

        assert!(matches!(
            parsed.arguments[0],
            Argument::String { ref text, .. } if text == r"a \n b"
        ));
    }

    /// Test: backquote expressions strip backticks; empty ones classify
    /// as EmptyExpression.
    #[test]
    fn test_expressions() {
        let parsed = classify("`$a + 1` ``");

        assert!(matches!(
            parsed.arguments[0],
            Argument::Expression { ref text, .. } if text == "$a + 1"
        ));
        assert!(matches!(parsed.arguments[1], Argument::EmptyExpression { .. }));
    }

    /// Test: wiki link without display text.
    #[test]
    fn test_wiki_link() {
        let parsed = classify("[[Target]]");

        match &parsed.arguments[0] {
            Argument::Link(link) => {
                assert_eq!(link.passage.value.as_deref(), Some("Target"));
                assert!(link.passage.is_evaluated);
                assert_eq!(link.text, None);
                assert_eq!(link.syntax, LinkSyntax::Wiki);
            }
            other => panic!("expected link, got {other:?}"),
        }
    }

    /// Test: pretty links with `|`, `->`, and `<-` all split display from
    /// target, and a `][setter]` section is captured.
    #[test]
    fn test_pretty_link_forms() {
        for text in ["[[Go|Target]]", "[[Go->Target]]", "[[Target<-Go]]"] {
            let parsed = classify(text);
            match &parsed.arguments[0] {
                Argument::Link(link) => {
                    assert_eq!(link.passage.value.as_deref(), Some("Target"), "in {text}");
                    assert_eq!(link.text.as_deref(), Some("Go"), "in {text}");
                    assert_eq!(link.syntax, LinkSyntax::Pretty);
                }
                other => panic!("expected link, got {other:?}"),
            }
        }

        let parsed = classify("[[Go|Target][$visited to true]]");
        match &parsed.arguments[0] {
            Argument::Link(link) => {
                assert_eq!(link.setter.as_deref(), Some("$visited to true"));
            }
            other => panic!("expected link, got {other:?}"),
        }
    }

    /// Test: a variable target is left unevaluated.
    #[test]
    fn test_unevaluated_link_target() {
        let parsed = classify("[[Go|$destination]]");

        match &parsed.arguments[0] {
            Argument::Link(link) => {
                assert!(!link.passage.is_evaluated);
                assert_eq!(link.passage.value, None);
            }
            other => panic!("expected link, got {other:?}"),
        }
    }

    /// Test: image markup with align, inner link, and setter.
    #[test]
    fn test_image_markup_full() {
        let parsed = classify("[<img[Portrait|portrait.png][Gallery][$seen to true]]");

        match &parsed.arguments[0] {
            Argument::Image(image) => {
                assert_eq!(image.align, Some(ImageAlign::Left));
                assert_eq!(image.title.as_deref(), Some("Portrait"));
                assert_eq!(image.source.value.as_deref(), Some("portrait.png"));
                assert_eq!(
                    image.link.as_ref().and_then(|l| l.value.as_deref()),
                    Some("Gallery")
                );
                assert_eq!(image.setter.as_deref(), Some("$seen to true"));
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    /// Test: evaluated targets not in the passage index warn; known ones
    /// and unevaluated ones do not.
    #[test]
    fn test_passage_warnings() {
        let index = PassageIndex::new(":: Known\nbody\n");

        let parsed = classify_with("[[Known]] [[Missing]] [[Go|$var]]", &index);
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].message.contains("Missing"));
    }

    /// Test: quoted targets evaluate to their literal contents.
    #[test]
    fn test_quoted_target() {
        let parsed = classify(r#"[["The End"]]"#);

        match &parsed.arguments[0] {
            Argument::Link(link) => {
                assert!(link.passage.is_evaluated);
                assert_eq!(link.passage.value.as_deref(), Some("The End"));
            }
            other => panic!("expected link, got {other:?}"),
        }
    }

    /// Test: lexer error items become positioned argument errors.
    #[test]
    fn test_error_item_propagates() {
        let parsed = classify("`unterminated");

        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].message.contains("backquote"));
        assert!(parsed.arguments.is_empty());
    }
}
