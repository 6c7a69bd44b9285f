//! Compiled parameter-format AST and its containers.

use crate::range::ByteSpan;

/// One node of a compiled parameter format.
///
/// Immutable once compiled; spans index into the source format string.
/// Structural equality deliberately ignores spans so caches can compare
/// formats compiled from different positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatNode {
    /// A registered parameter type, e.g. `number`.
    Type { name: String, span: ByteSpan },
    /// A quoted literal that one argument must equal.
    Literal { value: String, span: ByteSpan },
    /// `l &+ r` — l then r, both required.
    AndNext {
        left: Box<FormatNode>,
        right: Box<FormatNode>,
        span: ByteSpan,
    },
    /// `l |+ r` — l, optionally followed by r. `left` is `None` for the
    /// prefix form `|+ r`.
    MaybeNext {
        left: Option<Box<FormatNode>>,
        right: Box<FormatNode>,
        span: ByteSpan,
    },
    /// `l | r` — either alternative.
    Or {
        left: Box<FormatNode>,
        right: Box<FormatNode>,
        span: ByteSpan,
    },
    /// `...r` — r, zero or more times.
    Repeat { inner: Box<FormatNode>, span: ByteSpan },
}

impl FormatNode {
    pub fn span(&self) -> ByteSpan {
        match self {
            FormatNode::Type { span, .. } => *span,
            FormatNode::Literal { span, .. } => *span,
            FormatNode::AndNext { span, .. } => *span,
            FormatNode::MaybeNext { span, .. } => *span,
            FormatNode::Or { span, .. } => *span,
            FormatNode::Repeat { span, .. } => *span,
        }
    }

    /// Equality ignoring spans.
    pub fn structurally_eq(&self, other: &FormatNode) -> bool {
        match (self, other) {
            (FormatNode::Type { name: a, .. }, FormatNode::Type { name: b, .. }) => a == b,
            (FormatNode::Literal { value: a, .. }, FormatNode::Literal { value: b, .. }) => a == b,
            (
                FormatNode::AndNext {
                    left: al,
                    right: ar,
                    ..
                },
                FormatNode::AndNext {
                    left: bl,
                    right: br,
                    ..
                },
            )
            | (
                FormatNode::Or {
                    left: al,
                    right: ar,
                    ..
                },
                FormatNode::Or {
                    left: bl,
                    right: br,
                    ..
                },
            ) => al.structurally_eq(bl) && ar.structurally_eq(br),
            (
                FormatNode::MaybeNext {
                    left: al,
                    right: ar,
                    ..
                },
                FormatNode::MaybeNext {
                    left: bl,
                    right: br,
                    ..
                },
            ) => {
                match (al, bl) {
                    (None, None) => true,
                    (Some(a), Some(b)) => a.structurally_eq(b),
                    _ => false,
                } && ar.structurally_eq(br)
            }
            (FormatNode::Repeat { inner: a, .. }, FormatNode::Repeat { inner: b, .. }) => {
                a.structurally_eq(b)
            }
            _ => false,
        }
    }
}

/// One named overload of a macro's parameters. An empty format means the
/// variant accepts no arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub format: Option<FormatNode>,
}

impl Variant {
    pub fn structurally_eq(&self, other: &Variant) -> bool {
        match (&self.format, &other.format) {
            (None, None) => true,
            (Some(a), Some(b)) => a.structurally_eq(b),
            _ => false,
        }
    }
}

/// Variant keys that collide with prototype machinery in dynamic string
/// maps; rejected outright rather than worked around.
pub const RESERVED_VARIANT_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// An ordered variant-name → Variant mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    variants: Vec<(String, Variant)>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParametersKeyError {
    #[error("variant key `{0}` is reserved")]
    Reserved(String),
    #[error("variant key `{0}` appears more than once")]
    Duplicate(String),
}

impl Parameters {
    pub fn new(variants: Vec<(String, Variant)>) -> Result<Parameters, ParametersKeyError> {
        let mut seen = std::collections::HashSet::new();
        for (key, _) in &variants {
            if RESERVED_VARIANT_KEYS.contains(&key.as_str()) {
                return Err(ParametersKeyError::Reserved(key.clone()));
            }
            if !seen.insert(key.clone()) {
                return Err(ParametersKeyError::Duplicate(key.clone()));
            }
        }
        Ok(Parameters { variants })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variant)> {
        self.variants.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&Variant> {
        self.variants
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Equality ignoring every span.
    pub fn structurally_eq(&self, other: &Parameters) -> bool {
        self.variants.len() == other.variants.len()
            && self
                .variants
                .iter()
                .zip(other.variants.iter())
                .all(|((ak, av), (bk, bv))| ak == bk && av.structurally_eq(bv))
    }
}
