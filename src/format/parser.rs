//! Precedence-climbing parser for parameter format strings.
//!
//! Grammar (binding loosest to tightest: Or, MaybeNext, AndNext; the
//! prefix operators `...` and `|+` bind a single, possibly prefixed,
//! primary):
//!
//! ```text
//! primary := type | literal | '(' expr ')'
//! prefix  := ('...' | '|+') (prefix | primary)
//! expr    := Or-chain of MaybeNext-chain of AndNext-chain of (prefix | primary)
//! ```

use crate::range::ByteSpan;

use super::lexer::FormatToken;
use super::types::FormatNode;
use super::{FormatError, FormatErrorKind};

pub const PARSE_ITERATION_LIMIT: usize = 2000;

struct TokenCursor<'a> {
    tokens: &'a [FormatToken],
    idx: usize,
}

impl<'a> TokenCursor<'a> {
    fn peek(&self) -> Option<&'a FormatToken> {
        self.tokens.get(self.idx)
    }

    fn next(&mut self) -> Option<&'a FormatToken> {
        let token = self.tokens.get(self.idx)?;
        self.idx += 1;
        Some(token)
    }
}

struct Budget {
    used: usize,
}

impl Budget {
    fn tick(&mut self, at: ByteSpan) -> Result<(), FormatError> {
        self.used += 1;
        if self.used > PARSE_ITERATION_LIMIT {
            return Err(FormatError {
                kind: FormatErrorKind::Complexity,
                message: format!(
                    "format parsing took excessive iterations (limit {PARSE_ITERATION_LIMIT})"
                ),
                span: at,
            });
        }
        Ok(())
    }
}

pub fn parse_format(tokens: &[FormatToken]) -> Result<FormatNode, FormatError> {
    let mut cursor = TokenCursor { tokens, idx: 0 };
    let mut budget = Budget { used: 0 };

    let node = parse_expr(&mut cursor, 0, &mut budget)?;

    match cursor.peek() {
        None => Ok(node),
        Some(FormatToken::CloseParen(span)) => Err(parse_error("unmatched `)`", *span)),
        Some(token) => Err(parse_error(
            "expected an operator between parameter terms",
            token.span(),
        )),
    }
}

fn parse_expr(
    cursor: &mut TokenCursor,
    min_bp: u8,
    budget: &mut Budget,
) -> Result<FormatNode, FormatError> {
    let mut lhs = parse_operand(cursor, budget)?;

    loop {
        budget.tick(lhs.span())?;

        let (l_bp, r_bp, token) = match cursor.peek() {
            None | Some(FormatToken::CloseParen(_)) => break,
            Some(token @ FormatToken::Or(_)) => (1, 2, token),
            Some(token @ FormatToken::MaybeNext(_)) => (3, 4, token),
            Some(token @ FormatToken::AndNext(_)) => (5, 6, token),
            Some(token) => {
                return Err(parse_error(
                    "expected an operator between parameter terms",
                    token.span(),
                ))
            }
        };
        if l_bp < min_bp {
            break;
        }
        let op = token.clone();
        let _ = cursor.next();

        let rhs = parse_expr(cursor, r_bp, budget)?;
        let span = ByteSpan::new(lhs.span().start, rhs.span().end);
        lhs = match op {
            FormatToken::Or(_) => FormatNode::Or {
                left: Box::new(lhs),
                right: Box::new(rhs),
                span,
            },
            FormatToken::MaybeNext(_) => FormatNode::MaybeNext {
                left: Some(Box::new(lhs)),
                right: Box::new(rhs),
                span,
            },
            _ => FormatNode::AndNext {
                left: Box::new(lhs),
                right: Box::new(rhs),
                span,
            },
        };
    }

    Ok(lhs)
}

fn parse_operand(cursor: &mut TokenCursor, budget: &mut Budget) -> Result<FormatNode, FormatError> {
    let token = cursor
        .next()
        .ok_or_else(|| parse_error("unexpected end of parameter format", ByteSpan::default()))?;
    budget.tick(token.span())?;

    match token {
        FormatToken::Repeat(span) => {
            let inner = parse_operand(cursor, budget)?;
            let span = ByteSpan::new(span.start, inner.span().end);
            Ok(FormatNode::Repeat {
                inner: Box::new(inner),
                span,
            })
        }
        FormatToken::MaybeNext(span) => {
            let right = parse_operand(cursor, budget)?;
            let span = ByteSpan::new(span.start, right.span().end);
            Ok(FormatNode::MaybeNext {
                left: None,
                right: Box::new(right),
                span,
            })
        }
        FormatToken::OpenParen(open) => {
            let node = parse_expr(cursor, 0, budget)?;
            match cursor.next() {
                Some(FormatToken::CloseParen(_)) => Ok(node),
                _ => Err(parse_error("missing `)`", *open)),
            }
        }
        FormatToken::Type { name, span } => Ok(FormatNode::Type {
            name: name.clone(),
            span: *span,
        }),
        FormatToken::Literal { value, span } => Ok(FormatNode::Literal {
            value: value.clone(),
            span: *span,
        }),
        other => Err(parse_error(
            "expected a parameter type, literal, or `(`",
            other.span(),
        )),
    }
}

fn parse_error(message: impl Into<String>, span: ByteSpan) -> FormatError {
    FormatError {
        kind: FormatErrorKind::Parse,
        message: message.into(),
        span,
    }
}
