//! Lexer for parameter format strings.
//!
//! A format string is tiny, but it arrives from user-editable definition
//! files, so the lexer caps its own iteration count and turns the common
//! operator typos into targeted suggestions instead of bare failures.

use crate::range::ByteSpan;

use super::registry;
use super::{FormatError, FormatErrorKind};

pub const LEX_ITERATION_LIMIT: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatToken {
    AndNext(ByteSpan),
    MaybeNext(ByteSpan),
    Or(ByteSpan),
    Repeat(ByteSpan),
    OpenParen(ByteSpan),
    CloseParen(ByteSpan),
    Literal { value: String, span: ByteSpan },
    Type { name: String, span: ByteSpan },
}

impl FormatToken {
    pub fn span(&self) -> ByteSpan {
        match self {
            FormatToken::AndNext(span)
            | FormatToken::MaybeNext(span)
            | FormatToken::Or(span)
            | FormatToken::Repeat(span)
            | FormatToken::OpenParen(span)
            | FormatToken::CloseParen(span) => *span,
            FormatToken::Literal { span, .. } | FormatToken::Type { span, .. } => *span,
        }
    }
}

pub fn lex_format(text: &str) -> Result<Vec<FormatToken>, FormatError> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut iterations = 0usize;

    while i < chars.len() {
        iterations += 1;
        if iterations > LEX_ITERATION_LIMIT {
            return Err(FormatError {
                kind: FormatErrorKind::Complexity,
                message: format!(
                    "format lexing took excessive iterations (limit {LEX_ITERATION_LIMIT})"
                ),
                span: ByteSpan::new(chars[i].0, text.len()),
            });
        }

        let (byte, c) = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '&' => {
                match chars.get(i + 1).map(|(_, c)| *c) {
                    Some('+') => {
                        tokens.push(FormatToken::AndNext(ByteSpan::new(byte, byte + 2)));
                        i += 2;
                    }
                    Some('-') => {
                        return Err(lex_error(
                            "unknown operator `&-`; did you mean `&+`?",
                            byte,
                            byte + 2,
                        ));
                    }
                    _ => {
                        return Err(lex_error("lone `&`; did you mean `&+`?", byte, byte + 1));
                    }
                }
            }
            '|' => {
                match chars.get(i + 1).map(|(_, c)| *c) {
                    Some('+') => {
                        tokens.push(FormatToken::MaybeNext(ByteSpan::new(byte, byte + 2)));
                        i += 2;
                    }
                    Some('-') => {
                        return Err(lex_error(
                            "unknown operator `|-`; did you mean `|+` or `|`?",
                            byte,
                            byte + 2,
                        ));
                    }
                    _ => {
                        tokens.push(FormatToken::Or(ByteSpan::new(byte, byte + 1)));
                        i += 1;
                    }
                }
            }
            '+' => {
                return Err(lex_error(
                    "lone `+`; did you mean `&+` or `|+`?",
                    byte,
                    byte + 1,
                ));
            }
            '.' => {
                if matches!(chars.get(i + 1), Some((_, '.')))
                    && matches!(chars.get(i + 2), Some((_, '.')))
                {
                    tokens.push(FormatToken::Repeat(ByteSpan::new(byte, byte + 3)));
                    i += 3;
                } else {
                    return Err(lex_error("stray `.`; did you mean `...`?", byte, byte + 1));
                }
            }
            '(' => {
                tokens.push(FormatToken::OpenParen(ByteSpan::new(byte, byte + 1)));
                i += 1;
            }
            ')' => {
                tokens.push(FormatToken::CloseParen(ByteSpan::new(byte, byte + 1)));
                i += 1;
            }
            '"' | '\'' => {
                let quote = c;
                let mut j = i + 1;
                let mut value = String::new();
                let mut closed = false;
                while j < chars.len() {
                    let (_, cj) = chars[j];
                    if cj == quote {
                        closed = true;
                        break;
                    }
                    value.push(cj);
                    j += 1;
                }
                if !closed {
                    return Err(lex_error("unterminated literal", byte, text.len()));
                }
                let end = chars
                    .get(j + 1)
                    .map(|(b, _)| *b)
                    .unwrap_or(text.len());
                tokens.push(FormatToken::Literal {
                    value,
                    span: ByteSpan::new(byte, end),
                });
                i = j + 1;
            }
            c if c.is_ascii_alphabetic() => {
                let mut j = i;
                let mut name = String::new();
                while j < chars.len() {
                    let (_, cj) = chars[j];
                    if cj.is_ascii_alphanumeric() || cj == '_' {
                        name.push(cj);
                        j += 1;
                    } else {
                        break;
                    }
                }
                let end = chars.get(j).map(|(b, _)| *b).unwrap_or(text.len());
                if registry::lookup(&name).is_none() {
                    return Err(lex_error(
                        format!("unknown parameter type `{name}`"),
                        byte,
                        end,
                    ));
                }
                tokens.push(FormatToken::Type {
                    name,
                    span: ByteSpan::new(byte, end),
                });
                i = j;
            }
            other => {
                return Err(lex_error(
                    format!("unexpected character `{other}` in parameter format"),
                    byte,
                    byte + other.len_utf8(),
                ));
            }
        }
    }

    Ok(tokens)
}

fn lex_error(message: impl Into<String>, start: usize, end: usize) -> FormatError {
    FormatError {
        kind: FormatErrorKind::Lex,
        message: message.into(),
        span: ByteSpan::new(start, end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[FormatToken]) -> Vec<&'static str> {
        tokens
            .iter()
            .map(|t| match t {
                FormatToken::AndNext(_) => "&+",
                FormatToken::MaybeNext(_) => "|+",
                FormatToken::Or(_) => "|",
                FormatToken::Repeat(_) => "...",
                FormatToken::OpenParen(_) => "(",
                FormatToken::CloseParen(_) => ")",
                FormatToken::Literal { .. } => "lit",
                FormatToken::Type { .. } => "type",
            })
            .collect()
    }

    /// Test: operator and operand tokens lex with spans.
    #[test]
    fn test_basic_tokens() {
        let tokens = lex_format("number &+ 'go' |+ ...text | (bool)").unwrap();

        assert_eq!(
            kinds(&tokens),
            vec!["type", "&+", "lit", "|+", "...", "type", "|", "(", "type", ")"]
        );
    }

    /// Test: `|` followed by `+` is one MaybeNext token, not Or then
    /// stray `+`.
    #[test]
    fn test_pipe_plus_disambiguation() {
        let tokens = lex_format("number|+string").unwrap();
        assert_eq!(kinds(&tokens), vec!["type", "|+", "type"]);

        let tokens = lex_format("number|string").unwrap();
        assert_eq!(kinds(&tokens), vec!["type", "|", "type"]);
    }

    /// Test: common typos raise targeted suggestions.
    #[test]
    fn test_typo_suggestions() {
        let err = lex_format("number &- string").unwrap_err();
        assert!(err.message.contains("did you mean `&+`"));

        let err = lex_format("number |- string").unwrap_err();
        assert!(err.message.contains("did you mean `|+` or `|`"));

        let err = lex_format("number + string").unwrap_err();
        assert!(err.message.contains("did you mean `&+` or `|+`"));
    }

    /// Test: unknown identifiers fail at lex time.
    #[test]
    fn test_unknown_type() {
        let err = lex_format("numbr").unwrap_err();
        assert!(err.message.contains("unknown parameter type `numbr`"));
    }

    /// Test: unterminated literal is a lex error.
    #[test]
    fn test_unterminated_literal() {
        let err = lex_format("'go").unwrap_err();
        assert!(err.message.contains("unterminated literal"));
    }
}
