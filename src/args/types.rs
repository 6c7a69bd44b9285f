//! Lexed and classified argument types.
//!
//! The lexer produces flat [`ArgumentItem`]s with byte spans relative to
//! the argument substring; classification turns those into typed
//! [`Argument`] values. Both stages keep every span so diagnostics can be
//! anchored back into the document.

use crate::range::ByteSpan;

/// A raw item produced by the argument lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentItem {
    Bareword { text: String, span: ByteSpan },
    Expression { text: String, span: ByteSpan },
    String { text: String, span: ByteSpan },
    SquareBracket { text: String, span: ByteSpan },
    Error { message: String, text: String, span: ByteSpan },
}

impl ArgumentItem {
    pub fn span(&self) -> ByteSpan {
        match self {
            ArgumentItem::Bareword { span, .. } => *span,
            ArgumentItem::Expression { span, .. } => *span,
            ArgumentItem::String { span, .. } => *span,
            ArgumentItem::SquareBracket { span, .. } => *span,
            ArgumentItem::Error { span, .. } => *span,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ArgumentItem::Bareword { text, .. } => text,
            ArgumentItem::Expression { text, .. } => text,
            ArgumentItem::String { text, .. } => text,
            ArgumentItem::SquareBracket { text, .. } => text,
            ArgumentItem::Error { text, .. } => text,
        }
    }
}

/// A value that is either a statically known literal or an unevaluated
/// expression snippet. Never the result of executing code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluatable<T> {
    pub original: String,
    pub is_evaluated: bool,
    pub value: Option<T>,
}

impl<T> Evaluatable<T> {
    pub fn evaluated(original: impl Into<String>, value: T) -> Self {
        Evaluatable {
            original: original.into(),
            is_evaluated: true,
            value: Some(value),
        }
    }

    pub fn unevaluated(original: impl Into<String>) -> Self {
        Evaluatable {
            original: original.into(),
            is_evaluated: false,
            value: None,
        }
    }
}

/// How a link argument was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSyntax {
    /// Bare `[[target]]`.
    Wiki,
    /// Any form carrying display text (`|`, `->`, `<-`).
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAlign {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkArgument {
    pub passage: Evaluatable<String>,
    /// Display text, when the pretty form was used.
    pub text: Option<String>,
    pub setter: Option<String>,
    pub syntax: LinkSyntax,
    pub span: ByteSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageArgument {
    pub source: Evaluatable<String>,
    pub title: Option<String>,
    pub link: Option<Evaluatable<String>>,
    pub setter: Option<String>,
    pub align: Option<ImageAlign>,
    pub force_internal: bool,
    pub span: ByteSpan,
}

/// A classified macro argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Link(LinkArgument),
    Image(ImageArgument),
    Variable { name: String, span: ByteSpan },
    SettingsSetupAccess { text: String, span: ByteSpan },
    Null { span: ByteSpan },
    Undefined { span: ByteSpan },
    True { span: ByteSpan },
    False { span: ByteSpan },
    NaN { span: ByteSpan },
    Number { value: f64, span: ByteSpan },
    Bareword { value: String, span: ByteSpan },
    EmptyExpression { span: ByteSpan },
    Expression { text: String, span: ByteSpan },
    String { text: String, span: ByteSpan },
}

impl Argument {
    pub fn span(&self) -> ByteSpan {
        match self {
            Argument::Link(link) => link.span,
            Argument::Image(image) => image.span,
            Argument::Variable { span, .. } => *span,
            Argument::SettingsSetupAccess { span, .. } => *span,
            Argument::Null { span } => *span,
            Argument::Undefined { span } => *span,
            Argument::True { span } => *span,
            Argument::False { span } => *span,
            Argument::NaN { span } => *span,
            Argument::Number { span, .. } => *span,
            Argument::Bareword { span, .. } => *span,
            Argument::EmptyExpression { span } => *span,
            Argument::Expression { span, .. } => *span,
            Argument::String { span, .. } => *span,
        }
    }

    /// Human-readable name of the argument's kind for messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Argument::Link(_) => "link markup",
            Argument::Image(_) => "image markup",
            Argument::Variable { .. } => "variable",
            Argument::SettingsSetupAccess { .. } => "settings/setup access",
            Argument::Null { .. } => "null",
            Argument::Undefined { .. } => "undefined",
            Argument::True { .. } | Argument::False { .. } => "boolean",
            Argument::NaN { .. } => "NaN",
            Argument::Number { .. } => "number",
            Argument::Bareword { .. } => "bareword",
            Argument::EmptyExpression { .. } => "empty expression",
            Argument::Expression { .. } => "expression",
            Argument::String { .. } => "string",
        }
    }
}

/// A positioned problem found while lexing or classifying arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentError {
    pub message: String,
    pub span: ByteSpan,
}

/// A positioned non-fatal observation (e.g. a nonexistent passage name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentWarning {
    pub message: String,
    pub span: ByteSpan,
}

/// The classified arguments of one open macro tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArguments {
    pub errors: Vec<ArgumentError>,
    pub warnings: Vec<ArgumentWarning>,
    pub arguments: Vec<Argument>,
}
