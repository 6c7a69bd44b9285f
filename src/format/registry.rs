//! The fixed registry of named parameter types.
//!
//! Each type is a predicate from a classified [`Argument`] to a match
//! quality: `Exact` (full rank), `Loose` (half rank plus a warning), or
//! `Fail` (the variant cannot use this argument). Variables, settings
//! accesses, and backquote expressions carry runtime values this crate
//! never evaluates, so value-shaped types accept them as exact matches.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::args::Argument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeCheck {
    Exact,
    Loose(String),
    Fail(String),
}

pub struct ParameterType {
    pub name: &'static str,
    check: fn(&Argument) -> TypeCheck,
}

impl ParameterType {
    pub fn check(&self, argument: &Argument) -> TypeCheck {
        (self.check)(argument)
    }
}

pub fn lookup(name: &str) -> Option<&'static ParameterType> {
    PARAMETER_TYPES.get(name)
}

pub fn type_names() -> impl Iterator<Item = &'static str> {
    PARAMETER_TYPES.values().map(|t| t.name)
}

/// True for arguments whose value only exists at runtime.
fn is_dynamic(argument: &Argument) -> bool {
    matches!(
        argument,
        Argument::Variable { .. }
            | Argument::SettingsSetupAccess { .. }
            | Argument::Expression { .. }
    )
}

fn fail(argument: &Argument, expected: &str) -> TypeCheck {
    TypeCheck::Fail(format!(
        "{} is not a valid `{expected}`",
        argument.kind_name()
    ))
}

fn check_bool(argument: &Argument) -> TypeCheck {
    match argument {
        Argument::True { .. } | Argument::False { .. } => TypeCheck::Exact,
        a if is_dynamic(a) => TypeCheck::Exact,
        Argument::String { text, .. } if text == "true" || text == "false" => TypeCheck::Loose(
            format!("string \"{text}\" will not be interpreted as a boolean"),
        ),
        a => fail(a, "bool"),
    }
}

fn check_number(argument: &Argument) -> TypeCheck {
    match argument {
        Argument::Number { .. } | Argument::NaN { .. } => TypeCheck::Exact,
        a if is_dynamic(a) => TypeCheck::Exact,
        Argument::String { text, .. } if text.trim().parse::<f64>().is_ok() => {
            TypeCheck::Loose(format!("string \"{text}\" will be passed as text, not a number"))
        }
        a => fail(a, "number"),
    }
}

fn check_string(argument: &Argument) -> TypeCheck {
    match argument {
        Argument::String { .. } => TypeCheck::Exact,
        a if is_dynamic(a) => TypeCheck::Exact,
        Argument::Bareword { value, .. } => {
            TypeCheck::Loose(format!("bareword `{value}` will be passed as a string"))
        }
        a => fail(a, "string"),
    }
}

/// `text` is the catch-all: every argument satisfies it.
fn check_text(_argument: &Argument) -> TypeCheck {
    TypeCheck::Exact
}

fn check_bareword(argument: &Argument) -> TypeCheck {
    match argument {
        Argument::Bareword { .. } => TypeCheck::Exact,
        a => fail(a, "bareword"),
    }
}

fn check_link(argument: &Argument) -> TypeCheck {
    match argument {
        Argument::Link(_) => TypeCheck::Exact,
        a => fail(a, "link"),
    }
}

fn check_link_no_setter(argument: &Argument) -> TypeCheck {
    match argument {
        Argument::Link(link) if link.setter.is_none() => TypeCheck::Exact,
        Argument::Link(_) => {
            TypeCheck::Fail("link setter is not allowed for this parameter".to_string())
        }
        a => fail(a, "linkNoSetter"),
    }
}

fn check_image(argument: &Argument) -> TypeCheck {
    match argument {
        Argument::Image(_) => TypeCheck::Exact,
        a => fail(a, "image"),
    }
}

fn check_image_no_setter(argument: &Argument) -> TypeCheck {
    match argument {
        Argument::Image(image) if image.setter.is_none() => TypeCheck::Exact,
        Argument::Image(_) => {
            TypeCheck::Fail("image setter is not allowed for this parameter".to_string())
        }
        a => fail(a, "imageNoSetter"),
    }
}

fn check_passage(argument: &Argument) -> TypeCheck {
    match argument {
        Argument::String { .. } => TypeCheck::Exact,
        Argument::Link(_) => TypeCheck::Exact,
        a if is_dynamic(a) => TypeCheck::Exact,
        Argument::Bareword { value, .. } => {
            TypeCheck::Loose(format!("passage name `{value}` should be quoted"))
        }
        a => fail(a, "passage"),
    }
}

fn check_passage_no_setter(argument: &Argument) -> TypeCheck {
    match argument {
        Argument::Link(link) if link.setter.is_some() => {
            TypeCheck::Fail("link setter is not allowed for this parameter".to_string())
        }
        a => check_passage(a),
    }
}

fn check_receiver(argument: &Argument) -> TypeCheck {
    match argument {
        Argument::String { text, .. } if looks_like_variable(text) => TypeCheck::Exact,
        Argument::Expression { .. } => TypeCheck::Exact,
        Argument::Variable { name, .. } => TypeCheck::Loose(format!(
            "`{name}` will be dereferenced; a receiver is usually a quoted variable name"
        )),
        a => fail(a, "receiver"),
    }
}

fn check_var(argument: &Argument) -> TypeCheck {
    match argument {
        Argument::Variable { .. } => TypeCheck::Exact,
        Argument::Expression { .. } => TypeCheck::Exact,
        Argument::String { text, .. } if looks_like_variable(text) => {
            TypeCheck::Loose(format!("quoted variable \"{text}\" will not be dereferenced"))
        }
        a => fail(a, "var"),
    }
}

fn looks_like_variable(text: &str) -> bool {
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    matches!(chars.next(), Some('$') | Some('_'))
        && chars.clone().count() > 0
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn keyword_check(
    argument: &Argument,
    expected: &str,
    exact: fn(&Argument) -> bool,
) -> TypeCheck {
    if exact(argument) {
        return TypeCheck::Exact;
    }
    match argument {
        a if is_dynamic(a) => TypeCheck::Exact,
        Argument::String { text, .. } if text == expected => TypeCheck::Loose(format!(
            "string \"{text}\" will not be interpreted as {expected}"
        )),
        a => fail(a, expected),
    }
}

fn check_null(argument: &Argument) -> TypeCheck {
    keyword_check(argument, "null", |a| matches!(a, Argument::Null { .. }))
}

fn check_undefined(argument: &Argument) -> TypeCheck {
    keyword_check(argument, "undefined", |a| {
        matches!(a, Argument::Undefined { .. })
    })
}

fn check_true(argument: &Argument) -> TypeCheck {
    keyword_check(argument, "true", |a| matches!(a, Argument::True { .. }))
}

fn check_false(argument: &Argument) -> TypeCheck {
    keyword_check(argument, "false", |a| matches!(a, Argument::False { .. }))
}

fn check_nan(argument: &Argument) -> TypeCheck {
    keyword_check(argument, "NaN", |a| matches!(a, Argument::NaN { .. }))
}

static PARAMETER_TYPES: Lazy<HashMap<&'static str, ParameterType>> = Lazy::new(|| {
    let types = [
        ParameterType { name: "bool", check: check_bool },
        ParameterType { name: "number", check: check_number },
        ParameterType { name: "string", check: check_string },
        ParameterType { name: "text", check: check_text },
        ParameterType { name: "bareword", check: check_bareword },
        ParameterType { name: "link", check: check_link },
        ParameterType { name: "linkNoSetter", check: check_link_no_setter },
        ParameterType { name: "image", check: check_image },
        ParameterType { name: "imageNoSetter", check: check_image_no_setter },
        ParameterType { name: "passage", check: check_passage },
        ParameterType { name: "passageNoSetter", check: check_passage_no_setter },
        ParameterType { name: "receiver", check: check_receiver },
        ParameterType { name: "var", check: check_var },
        ParameterType { name: "null", check: check_null },
        ParameterType { name: "undefined", check: check_undefined },
        ParameterType { name: "true", check: check_true },
        ParameterType { name: "false", check: check_false },
        ParameterType { name: "NaN", check: check_nan },
    ];

    types.into_iter().map(|t| (t.name, t)).collect()
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::ByteSpan;

    fn span() -> ByteSpan {
        ByteSpan::new(0, 1)
    }

    /// Test: every registered name resolves.
    #[test]
    fn test_lookup() {
        for name in ["bool", "number", "string", "text", "link", "image", "passage"] {
            assert!(lookup(name).is_some(), "missing type {name}");
        }
        assert!(lookup("nope").is_none());
    }

    /// Test: bool accepts booleans exactly, quoted booleans loosely, and
    /// rejects numbers.
    #[test]
    fn test_bool_check() {
        let bool_type = lookup("bool").unwrap();

        assert_eq!(bool_type.check(&Argument::True { span: span() }), TypeCheck::Exact);
        assert!(matches!(
            bool_type.check(&Argument::String { text: "true".to_string(), span: span() }),
            TypeCheck::Loose(_)
        ));
        assert!(matches!(
            bool_type.check(&Argument::Number { value: 1.0, span: span() }),
            TypeCheck::Fail(_)
        ));
    }

    /// Test: dynamic arguments satisfy value-shaped types exactly.
    #[test]
    fn test_dynamic_pass() {
        let number = lookup("number").unwrap();
        let variable = Argument::Variable {
            name: "$x".to_string(),
            span: span(),
        };

        assert_eq!(number.check(&variable), TypeCheck::Exact);
    }

    /// Test: bareword is syntactic — a variable does not satisfy it.
    #[test]
    fn test_bareword_is_syntactic() {
        let bareword = lookup("bareword").unwrap();
        let variable = Argument::Variable {
            name: "$x".to_string(),
            span: span(),
        };

        assert!(matches!(bareword.check(&variable), TypeCheck::Fail(_)));
    }
}
