//! State-machine lexer for macro argument text.
//!
//! Operates on the substring between a macro's name and its closing `>>`.
//! The cursor indexes an immutable char table so `backup` is cheap, and
//! every emitted item carries absolute byte offsets into the substring.
//! Malformed input becomes `ArgumentItem::Error` items, never a panic.

use crate::range::ByteSpan;

use super::types::ArgumentItem;

pub(crate) struct Cursor<'a> {
    text: &'a str,
    chars: Vec<(usize, char)>,
    idx: usize,
    start: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Cursor<'a> {
        Cursor {
            text,
            chars: text.char_indices().collect(),
            idx: 0,
            start: 0,
        }
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).map(|(_, c)| *c)
    }

    pub fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.idx += 1;
        Some(c)
    }

    pub fn backup(&mut self, n: usize) {
        self.idx = self.idx.saturating_sub(n);
    }

    /// Consumes one char if it is in `set`.
    pub fn accept(&mut self, set: &str) -> bool {
        match self.peek() {
            Some(c) if set.contains(c) => {
                self.idx += 1;
                true
            }
            _ => false,
        }
    }

    /// Consumes chars while the predicate holds.
    pub fn accept_run(&mut self, pred: impl Fn(char) -> bool) {
        while matches!(self.peek(), Some(c) if pred(c)) {
            self.idx += 1;
        }
    }

    /// Discards the pending run (start := current).
    pub fn ignore(&mut self) {
        self.start = self.idx;
    }

    fn byte_at(&self, idx: usize) -> usize {
        self.chars
            .get(idx)
            .map(|(b, _)| *b)
            .unwrap_or(self.text.len())
    }

    pub fn pending_span(&self) -> ByteSpan {
        ByteSpan::new(self.byte_at(self.start), self.byte_at(self.idx))
    }

    pub fn pending_text(&self) -> &'a str {
        &self.text[self.byte_at(self.start)..self.byte_at(self.idx)]
    }
}

/// Lexes an argument substring into items.
pub fn lex_arguments(text: &str) -> Vec<ArgumentItem> {
    let mut cursor = Cursor::new(text);
    let mut items = Vec::new();

    loop {
        cursor.accept_run(|c| c.is_whitespace());
        cursor.ignore();

        let Some(c) = cursor.peek() else { break };
        let item = match c {
            '`' => lex_delimited(&mut cursor, '`'),
            '"' | '\'' => lex_delimited(&mut cursor, c),
            '[' => lex_square_bracket(&mut cursor),
            _ => lex_bareword(&mut cursor),
        };
        items.push(item);
        cursor.ignore();
    }

    items
}

fn emit(cursor: &Cursor, make: impl FnOnce(String, ByteSpan) -> ArgumentItem) -> ArgumentItem {
    make(cursor.pending_text().to_string(), cursor.pending_span())
}

fn error(cursor: &Cursor, message: impl Into<String>) -> ArgumentItem {
    ArgumentItem::Error {
        message: message.into(),
        text: cursor.pending_text().to_string(),
        span: cursor.pending_span(),
    }
}

/// Slurps to the matching unescaped delimiter. An unescaped newline or
/// EOF before it produces an error item.
fn lex_delimited(cursor: &mut Cursor, delim: char) -> ArgumentItem {
    let _ = cursor.next(); // opening delimiter

    loop {
        match cursor.next() {
            None => {
                return error(cursor, unterminated_message(delim));
            }
            Some('\\') => {
                let _ = cursor.next();
            }
            Some('\n') => {
                cursor.backup(1);
                return error(cursor, unterminated_message(delim));
            }
            Some(c) if c == delim => {
                return match delim {
                    '`' => emit(cursor, |text, span| ArgumentItem::Expression { text, span }),
                    _ => emit(cursor, |text, span| ArgumentItem::String { text, span }),
                };
            }
            Some(_) => {}
        }
    }
}

fn unterminated_message(delim: char) -> String {
    match delim {
        '`' => "unterminated backquote expression".to_string(),
        '"' => "unterminated double quoted string".to_string(),
        _ => "unterminated single quoted string".to_string(),
    }
}

/// Slurps `[[...]]` or `[<align>img[...]]` markup, tracking nested
/// bracket depth until the balanced terminal `]]`.
fn lex_square_bracket(cursor: &mut Cursor) -> ArgumentItem {
    let _ = cursor.next(); // first `[`

    // Optional image meta between the brackets: align char and/or `img`.
    cursor.accept("<>");
    let mut meta = 0;
    while cursor.accept("iImMgG") {
        meta += 1;
        if meta >= 3 {
            break;
        }
    }

    if !cursor.accept("[") {
        cursor.accept_run(|c| !c.is_whitespace());
        return error(cursor, "malformed square bracket markup");
    }

    // Both opening brackets are open; every further `[` deepens and every
    // `]` closes one. Depth zero means the terminal `]]` was consumed.
    let mut depth = 2usize;
    loop {
        match cursor.next() {
            None => {
                return error(cursor, "unterminated square bracket markup");
            }
            Some('[') => depth += 1,
            Some(']') => {
                depth -= 1;
                if depth == 0 {
                    return emit(cursor, |text, span| ArgumentItem::SquareBracket {
                        text,
                        span,
                    });
                }
            }
            Some(_) => {}
        }
    }
}

/// Consumes to the next whitespace.
fn lex_bareword(cursor: &mut Cursor) -> ArgumentItem {
    cursor.accept_run(|c| !c.is_whitespace());
    emit(cursor, |text, span| ArgumentItem::Bareword { text, span })
}
