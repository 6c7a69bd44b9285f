//! Whole-document diagnostics.
//!
//! Scans the document, checks every tag against the definitions table,
//! then parses and validates the arguments of each open macro. Tag-level
//! checks are sequential; per-macro argument work shares no mutable state
//! and fans out with rayon.

use itertools::Itertools;
use lsp_types::{Diagnostic, DiagnosticSeverity};
use rayon::prelude::*;
use ropey::Rope;

use crate::{
    args::parse_macro_arguments,
    config::Settings,
    definitions::CompiledDefinitions,
    errors::DiagnosticCode,
    passage::PassageIndex,
    range::MyRange,
    scan::{scan_macros_with_passages, MacroToken},
    suggest,
    validate::ChosenVariantInformation,
};

/// Scans the text and reports every diagnostic for it.
pub fn diagnostics(
    text: &str,
    definitions: &CompiledDefinitions,
    settings: &Settings,
) -> Vec<Diagnostic> {
    let passages = PassageIndex::new(text);
    let tokens = scan_macros_with_passages(text, definitions.table(), settings, &passages);
    diagnostics_with_tokens(text, &tokens, &passages, definitions, settings)
}

/// As [`diagnostics`], reusing an already-scanned token list and passage
/// index (see [`crate::document::Document`]).
pub fn diagnostics_with_tokens(
    text: &str,
    tokens: &[MacroToken],
    passages: &PassageIndex,
    definitions: &CompiledDefinitions,
    settings: &Settings,
) -> Vec<Diagnostic> {
    let rope = Rope::from_str(text);

    let mut diags = tag_diagnostics(tokens, definitions, settings);

    if settings.parse_arguments {
        let argument_diags: Vec<Diagnostic> = tokens
            .par_iter()
            .filter(|token| token.open && !token.synthetic)
            .flat_map(|token| {
                macro_argument_diagnostics(token, text, &rope, definitions, settings, passages)
            })
            .collect();
        diags.extend(argument_diags);
    }

    diags.sort_by_key(|d| (d.range.start.line, d.range.start.character));
    diags
}

fn diag(
    range: MyRange,
    severity: DiagnosticSeverity,
    code: DiagnosticCode,
    message: String,
) -> Diagnostic {
    Diagnostic {
        range: *range,
        severity: Some(severity),
        code: Some(code.into()),
        source: Some("twixt".into()),
        message,
        ..Default::default()
    }
}

/// Checks every scanned tag: recognition, pairing, deprecation,
/// self-close legality, and child-tag placement.
fn tag_diagnostics(
    tokens: &[MacroToken],
    definitions: &CompiledDefinitions,
    settings: &Settings,
) -> Vec<Diagnostic> {
    let table = definitions.table();
    let child_parents = table.child_parents();
    let known_names: Vec<&str> = table
        .names()
        .chain(child_parents.keys().copied())
        .collect();

    let mut diags = Vec::new();

    for token in tokens {
        if token.synthetic {
            continue;
        }
        let def = table.get(&token.name);

        if token.open
            && def.is_none()
            && !table.is_child(&token.name)
            && settings.unrecognized_diagnostics
        {
            let mut message = format!("unrecognized macro <<{}>>", token.name);
            if settings.suggestions {
                if let Some(best) =
                    suggest::nearest_names(&token.name, known_names.iter().copied(), 1).first()
                {
                    message.push_str(&format!("; did you mean <<{best}>>?"));
                }
            }
            diags.push(diag(
                token.range,
                DiagnosticSeverity::WARNING,
                DiagnosticCode::UnrecognizedMacro,
                message,
            ));
        }

        if token.open {
            if let Some(def) = def {
                if def.deprecated {
                    let mut message = format!("macro <<{}>> is deprecated", token.name);
                    if !def.deprecated_suggestions.is_empty() {
                        message.push_str(&format!(
                            "; consider {}",
                            def.deprecated_suggestions
                                .iter()
                                .map(|s| format!("<<{s}>>"))
                                .join(", ")
                        ));
                    }
                    diags.push(diag(
                        token.range,
                        DiagnosticSeverity::WARNING,
                        DiagnosticCode::DeprecatedMacro,
                        message,
                    ));
                }
            }
        }

        if token.end_variant {
            diags.push(diag(
                token.range,
                DiagnosticSeverity::WARNING,
                DiagnosticCode::DeprecatedEndClose,
                format!(
                    "<<end{}>> is deprecated; use <</{}>>",
                    token.name, token.name
                ),
            ));
        }

        if token.open && token.is_unmatched() && def.map(|d| d.container).unwrap_or(false) {
            diags.push(diag(
                token.range,
                DiagnosticSeverity::ERROR,
                DiagnosticCode::MalformedContainer,
                format!("container macro <<{}>> is never closed", token.name),
            ));
        }

        if !token.open && token.is_unmatched() {
            diags.push(diag(
                token.range,
                DiagnosticSeverity::ERROR,
                DiagnosticCode::IllegalClose,
                format!("<</{}>> has no matching opening tag", token.name),
            ));
        }

        if token.open && token.self_closed && settings.self_close_macros {
            match def {
                Some(d) if d.container && !d.self_close => {
                    diags.push(diag(
                        token.range,
                        DiagnosticSeverity::ERROR,
                        DiagnosticCode::IrrationalSelfClose,
                        format!("container macro <<{}>> does not support self-closing", token.name),
                    ));
                }
                Some(d) if !d.container && !d.self_close => {
                    diags.push(diag(
                        token.range,
                        DiagnosticSeverity::WARNING,
                        DiagnosticCode::IrrationalSelfClose,
                        format!(
                            "self-closing the non-container macro <<{}>> has no effect",
                            token.name
                        ),
                    ));
                }
                _ => {}
            }
        }

        if !token.open && token.args_span.is_some() {
            diags.push(diag(
                token.range,
                DiagnosticSeverity::WARNING,
                DiagnosticCode::UnexpectedArguments,
                format!("closing tag <</{}>> does not take arguments", token.name),
            ));
        }

        if token.open {
            if let Some(parents) = child_parents.get(token.name.as_str()) {
                let enclosed = tokens.iter().any(|outer| {
                    outer.open
                        && !outer.is_unmatched()
                        && parents.contains(&outer.name.as_str())
                        && outer.id < token.id
                        && outer.pair > token.id
                });
                if !enclosed {
                    diags.push(diag(
                        token.range,
                        DiagnosticSeverity::ERROR,
                        DiagnosticCode::ChildOutsideContainer,
                        format!(
                            "<<{}>> must appear inside {}",
                            token.name,
                            parents.iter().map(|p| format!("<<{p}>>")).join(" or ")
                        ),
                    ));
                }
            }
        }
    }

    diags
}

/// Parses and validates one open macro's arguments.
fn macro_argument_diagnostics(
    token: &MacroToken,
    text: &str,
    rope: &Rope,
    definitions: &CompiledDefinitions,
    settings: &Settings,
    passages: &PassageIndex,
) -> Vec<Diagnostic> {
    let Some(def) = definitions.table().get(&token.name) else {
        return Vec::new();
    };
    if def.skip_args {
        return Vec::new();
    }

    let passage_index = settings.passage_warnings.then_some(passages);
    let Ok(parsed) = parse_macro_arguments(token, text, passage_index) else {
        return Vec::new();
    };

    let base = token
        .args_span
        .map(|span| span.start)
        .unwrap_or(token.span.end);
    let arg_range = |index: usize| -> MyRange {
        parsed
            .arguments
            .get(index)
            .map(|a| a.span().shifted(base).to_range(rope))
            .unwrap_or(token.range)
    };

    let mut diags = Vec::new();

    for error in &parsed.errors {
        diags.push(diag(
            error.span.shifted(base).to_range(rope),
            DiagnosticSeverity::ERROR,
            DiagnosticCode::ArgumentParseFailure,
            error.message.clone(),
        ));
    }
    for warning in &parsed.warnings {
        diags.push(diag(
            warning.span.shifted(base).to_range(rope),
            DiagnosticSeverity::WARNING,
            DiagnosticCode::ParameterWarning,
            warning.message.clone(),
        ));
    }

    if !settings.validate_parameters {
        return diags;
    }
    let Some(compiled) = definitions.get(&token.name) else {
        return diags;
    };

    for issue in &compiled.issues {
        diags.push(diag(
            token.range,
            DiagnosticSeverity::ERROR,
            DiagnosticCode::ParameterError,
            format!("definition of <<{}>>: {}", token.name, issue.message),
        ));
    }

    let Some(parameters) = &compiled.parameters else {
        return diags;
    };
    if parameters.is_empty() || !parsed.errors.is_empty() {
        // No usable variants, or the argument text did not even lex —
        // validation would only pile on noise.
        return diags;
    }

    match parameters.validate(&parsed.arguments) {
        Ok(ChosenVariantInformation { variant_key, info }) => {
            let variant = variant_key.unwrap_or_default();
            for error in &info.errors {
                if error.message.starts_with("too many arguments") {
                    // One error spanning every unconsumed argument.
                    let start = arg_range(error.arg_index);
                    let end = arg_range(parsed.arguments.len().saturating_sub(1));
                    let range = MyRange(lsp_types::Range {
                        start: start.start,
                        end: end.end,
                    });
                    diags.push(diag(
                        range,
                        DiagnosticSeverity::ERROR,
                        DiagnosticCode::TooManyArguments,
                        format!("{} of macro <<{}>>", error.message, token.name),
                    ));
                } else {
                    diags.push(diag(
                        arg_range(error.arg_index),
                        DiagnosticSeverity::ERROR,
                        DiagnosticCode::ParameterError,
                        format!("variant `{variant}`: {}", error.message),
                    ));
                }
            }
            for warning in &info.warnings {
                diags.push(diag(
                    arg_range(warning.arg_index),
                    DiagnosticSeverity::WARNING,
                    DiagnosticCode::ParameterWarning,
                    warning.message.clone(),
                ));
            }
        }
        Err(fatal) => {
            diags.push(diag(
                token.range,
                DiagnosticSeverity::ERROR,
                DiagnosticCode::ExcessiveIterations,
                fatal.to_string(),
            ));
        }
    }

    diags
}
