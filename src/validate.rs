//! Validation of classified arguments against compiled parameter formats.
//!
//! `crawl` walks a [`FormatNode`] tree against the argument list,
//! producing a rank (how well the arguments fit), a consumed-argument
//! index, and positioned errors/warnings. `Parameters::validate` crawls
//! every variant and keeps the strictly best rank; ties keep the first
//! variant seen.
//!
//! `NotFoundFailure` is deliberately distinct from `Failure`: it means
//! "no argument was there at all", which optional contexts (`|+`, `...`)
//! treat as satisfied-by-absence rather than as malformed input.

use crate::args::Argument;
use crate::errors::FatalError;
use crate::format::{registry, FormatNode, Parameters, TypeCheck};

pub const CRAWL_ITERATION_LIMIT: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    Success,
    Failure,
    NotFoundFailure,
}

/// A message tied to the argument position it is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedMessage {
    pub message: String,
    pub arg_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrawlOutcome {
    pub status: CrawlStatus,
    pub rank: i32,
    pub arg_index: usize,
    pub errors: Vec<IndexedMessage>,
    pub warnings: Vec<IndexedMessage>,
}

impl CrawlOutcome {
    fn success(rank: i32, arg_index: usize, warnings: Vec<IndexedMessage>) -> CrawlOutcome {
        CrawlOutcome {
            status: CrawlStatus::Success,
            rank,
            arg_index,
            errors: Vec::new(),
            warnings,
        }
    }
}

/// The outcome of validating one variant (or the chosen one).
///
/// `rank` is `-1` only for the selection sentinel before any variant has
/// been crawled.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidateInformation {
    pub rank: i32,
    pub arg_index: usize,
    pub errors: Vec<IndexedMessage>,
    pub warnings: Vec<IndexedMessage>,
}

impl Default for ValidateInformation {
    fn default() -> Self {
        ValidateInformation {
            rank: -1,
            arg_index: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChosenVariantInformation {
    pub variant_key: Option<String>,
    pub info: ValidateInformation,
}

fn tick(budget: &mut usize) -> Result<(), FatalError> {
    *budget += 1;
    if *budget > CRAWL_ITERATION_LIMIT {
        return Err(FatalError::ExcessiveIterations {
            stage: "parameter validation",
            limit: CRAWL_ITERATION_LIMIT,
        });
    }
    Ok(())
}

pub fn crawl(
    node: &FormatNode,
    args: &[Argument],
    index: usize,
    budget: &mut usize,
) -> Result<CrawlOutcome, FatalError> {
    tick(budget)?;

    match node {
        FormatNode::Type { name, .. } => {
            let Some(argument) = args.get(index) else {
                return Ok(not_found(index, format!("missing argument; expected `{name}`")));
            };
            let Some(parameter_type) = registry::lookup(name) else {
                return Ok(failure(
                    index,
                    format!("unknown parameter type `{name}`"),
                ));
            };
            Ok(match parameter_type.check(argument) {
                TypeCheck::Exact => CrawlOutcome::success(2, index + 1, Vec::new()),
                TypeCheck::Loose(warning) => CrawlOutcome::success(
                    1,
                    index + 1,
                    vec![IndexedMessage {
                        message: warning,
                        arg_index: index,
                    }],
                ),
                TypeCheck::Fail(error) => failure(index, error),
            })
        }

        FormatNode::Literal { value, .. } => {
            let Some(argument) = args.get(index) else {
                return Ok(not_found(
                    index,
                    format!("missing argument; expected `\"{value}\"`"),
                ));
            };
            let text = match argument {
                Argument::String { text, .. } => Some(text.as_str()),
                Argument::Bareword { value, .. } => Some(value.as_str()),
                _ => None,
            };
            Ok(match text {
                Some(text) if text == value => CrawlOutcome::success(2, index + 1, Vec::new()),
                Some(text) if text.eq_ignore_ascii_case(value) => CrawlOutcome::success(
                    1,
                    index + 1,
                    vec![IndexedMessage {
                        message: format!("`{text}` differs from `{value}` only in case"),
                        arg_index: index,
                    }],
                ),
                _ => failure(
                    index,
                    format!(
                        "expected `{value}`, found {}",
                        argument.kind_name()
                    ),
                ),
            })
        }

        FormatNode::AndNext { left, right, .. } => {
            let l = crawl(left, args, index, budget)?;
            if l.status != CrawlStatus::Success {
                // Any failure of the left side, absence included, makes
                // the sequence malformed.
                return Ok(CrawlOutcome {
                    status: CrawlStatus::Failure,
                    ..l
                });
            }

            let r = crawl(right, args, l.arg_index, budget)?;
            Ok(CrawlOutcome {
                status: r.status,
                rank: l.rank + r.rank,
                arg_index: r.arg_index,
                errors: r.errors,
                warnings: [l.warnings, r.warnings].concat(),
            })
        }

        FormatNode::MaybeNext { left, right, .. } => {
            let mut rank = 0;
            let mut warnings = Vec::new();
            let mut next = index;

            if let Some(left) = left {
                let l = crawl(left, args, index, budget)?;
                match l.status {
                    CrawlStatus::NotFoundFailure => {
                        return Ok(CrawlOutcome::success(0, index, Vec::new()));
                    }
                    CrawlStatus::Failure => {
                        return Ok(CrawlOutcome {
                            status: CrawlStatus::Failure,
                            ..l
                        });
                    }
                    CrawlStatus::Success => {
                        rank += l.rank;
                        warnings.extend(l.warnings);
                        next = l.arg_index;
                    }
                }
            }

            let r = crawl(right, args, next, budget)?;
            Ok(match r.status {
                // Absence of the optional tail is satisfaction, not failure.
                CrawlStatus::NotFoundFailure => CrawlOutcome::success(rank, next, warnings),
                CrawlStatus::Failure => CrawlOutcome {
                    status: CrawlStatus::Failure,
                    rank: rank + r.rank,
                    arg_index: r.arg_index,
                    errors: r.errors,
                    warnings: [warnings, r.warnings].concat(),
                },
                CrawlStatus::Success => CrawlOutcome::success(
                    rank + r.rank,
                    r.arg_index,
                    [warnings, r.warnings].concat(),
                ),
            })
        }

        FormatNode::Or { left, right, .. } => {
            let l = crawl(left, args, index, budget)?;
            if l.status == CrawlStatus::Success {
                return Ok(l);
            }
            let r = crawl(right, args, index, budget)?;
            if r.status == CrawlStatus::Success {
                return Ok(r);
            }
            // Double failure surfaces the left branch verbatim, without
            // upgrading NotFoundFailure, so an enclosing optional still
            // sees "absent" rather than "malformed".
            Ok(l)
        }

        FormatNode::Repeat { inner, .. } => {
            let mut rank = 0;
            let mut warnings = Vec::new();
            let mut next = index;

            loop {
                let r = crawl(inner, args, next, budget)?;
                if r.status != CrawlStatus::Success {
                    break;
                }
                rank += r.rank;
                warnings.extend(r.warnings);
                next = r.arg_index;
            }

            // Zero-or-more: stopping is never an error.
            Ok(CrawlOutcome::success(rank, next, warnings))
        }
    }
}

fn not_found(index: usize, message: String) -> CrawlOutcome {
    CrawlOutcome {
        status: CrawlStatus::NotFoundFailure,
        rank: 0,
        arg_index: index,
        errors: vec![IndexedMessage {
            message,
            arg_index: index,
        }],
        warnings: Vec::new(),
    }
}

fn failure(index: usize, message: String) -> CrawlOutcome {
    CrawlOutcome {
        status: CrawlStatus::Failure,
        rank: 0,
        arg_index: index,
        errors: vec![IndexedMessage {
            message,
            arg_index: index,
        }],
        warnings: Vec::new(),
    }
}

impl Parameters {
    /// Crawls every variant and keeps the strictly greatest rank; ties
    /// keep the first-seen maximum. If the chosen variant produced no
    /// errors but consumed fewer arguments than supplied, one
    /// too-many-arguments error spanning the leftovers is appended.
    pub fn validate(&self, args: &[Argument]) -> Result<ChosenVariantInformation, FatalError> {
        let mut budget = 0usize;
        let mut chosen = ChosenVariantInformation::default();

        for (key, variant) in self.iter() {
            let outcome = match &variant.format {
                None => CrawlOutcome::success(0, 0, Vec::new()),
                Some(node) => crawl(node, args, 0, &mut budget)?,
            };

            if outcome.rank > chosen.info.rank {
                chosen = ChosenVariantInformation {
                    variant_key: Some(key.to_string()),
                    info: ValidateInformation {
                        rank: outcome.rank,
                        arg_index: outcome.arg_index,
                        errors: outcome.errors,
                        warnings: outcome.warnings,
                    },
                };
            }
        }

        if let Some(key) = &chosen.variant_key {
            if chosen.info.errors.is_empty() && chosen.info.arg_index < args.len() {
                chosen.info.errors.push(IndexedMessage {
                    message: format!("too many arguments for variant `{key}`"),
                    arg_index: chosen.info.arg_index,
                });
            }
        }

        Ok(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::parse_arguments;
    use crate::format::{compile_format, Variant};

    fn args(text: &str) -> Vec<Argument> {
        let parsed = parse_arguments(text, None);
        assert!(parsed.errors.is_empty(), "fixture should lex cleanly");
        parsed.arguments
    }

    fn crawl_format(format: &str, arg_text: &str) -> CrawlOutcome {
        let variant = compile_format(format).unwrap();
        let node = variant.format.expect("fixture format is non-empty");
        let mut budget = 0;
        crawl(&node, &args(arg_text), 0, &mut budget).unwrap()
    }

    fn params(variants: &[(&str, &str)]) -> Parameters {
        Parameters::new(
            variants
                .iter()
                .map(|(key, format)| (key.to_string(), compile_format(format).unwrap()))
                .collect(),
        )
        .unwrap()
    }

    /// Test: K exactly matched types yield rank 2K and no errors.
    #[test]
    fn test_exact_sequence_rank() {
        let outcome = crawl_format("number &+ bool &+ string", r#"4 true "hi""#);

        assert_eq!(outcome.status, CrawlStatus::Success);
        assert_eq!(outcome.rank, 6);
        assert_eq!(outcome.arg_index, 3);
        assert!(outcome.errors.is_empty());
    }

    /// Test: a loose match scores 1 and warns.
    #[test]
    fn test_loose_match_warns() {
        let outcome = crawl_format("bool", r#""true""#);

        assert_eq!(outcome.status, CrawlStatus::Success);
        assert_eq!(outcome.rank, 1);
        assert_eq!(outcome.warnings.len(), 1);
    }

    /// Test: `number |+ string` with zero arguments succeeds with rank 0
    /// and no errors.
    #[test]
    fn test_maybe_next_absent() {
        let outcome = crawl_format("number |+ string", "");

        assert_eq!(outcome.status, CrawlStatus::Success);
        assert_eq!(outcome.rank, 0);
        assert!(outcome.errors.is_empty());
    }

    /// Test: `number |+ string` with one number succeeds, rank 2,
    /// argIndex 1.
    #[test]
    fn test_maybe_next_tail_absent() {
        let outcome = crawl_format("number |+ string", "7");

        assert_eq!(outcome.status, CrawlStatus::Success);
        assert_eq!(outcome.rank, 2);
        assert_eq!(outcome.arg_index, 1);
    }

    /// Test: `number |+ string` with a bareword matching neither fails.
    #[test]
    fn test_maybe_next_mismatch_fails() {
        let outcome = crawl_format("number |+ string", "nope");

        // `nope` satisfies neither number nor (loosely) nothing — number
        // rejects it outright, which is a hard failure.
        assert_eq!(outcome.status, CrawlStatus::Failure);
        assert!(!outcome.errors.is_empty());
    }

    /// Test: a failing AndNext left side escalates absence to failure.
    #[test]
    fn test_and_next_escalates_not_found() {
        let outcome = crawl_format("number &+ bool", "");

        assert_eq!(outcome.status, CrawlStatus::Failure);
    }

    /// Test: Or picks the succeeding branch, either side.
    #[test]
    fn test_or_either_branch() {
        assert_eq!(crawl_format("number | string", "5").rank, 2);
        assert_eq!(crawl_format("number | string", r#""x""#).rank, 2);
    }

    /// Test: Or double failure surfaces the left branch's result
    /// verbatim — intentional first-alternative tie-break, not a bug.
    #[test]
    fn test_or_double_failure_keeps_left() {
        let outcome = crawl_format("number | bool", "[[link]]");

        assert_eq!(outcome.status, CrawlStatus::Failure);
        assert_eq!(outcome.errors.len(), 1);
        assert!(
            outcome.errors[0].message.contains("number"),
            "left branch error surfaces: {}",
            outcome.errors[0].message
        );
    }

    /// Test: Or of absent alternatives stays NotFoundFailure so an outer
    /// optional still sees "absent".
    #[test]
    fn test_or_absence_not_upgraded() {
        // Infix form: the Or is the optional head of the sequence.
        let outcome = crawl_format("(number | bool) |+ string", "");
        assert_eq!(outcome.status, CrawlStatus::Success);
        assert_eq!(outcome.rank, 0);

        // Prefix form: the whole Or is optional.
        assert_eq!(crawl_format("|+ (number | bool)", "").status, CrawlStatus::Success);
    }

    /// Test: Repeat accumulates rank and stops at the first failure
    /// without erroring.
    #[test]
    fn test_repeat_zero_or_more() {
        let outcome = crawl_format("...number", "1 2 3");
        assert_eq!(outcome.status, CrawlStatus::Success);
        assert_eq!(outcome.rank, 6);
        assert_eq!(outcome.arg_index, 3);

        let outcome = crawl_format("...number", "");
        assert_eq!(outcome.status, CrawlStatus::Success);
        assert_eq!(outcome.rank, 0);

        let outcome = crawl_format("...number", "1 2 stop");
        assert_eq!(outcome.status, CrawlStatus::Success);
        assert_eq!(outcome.rank, 4);
        assert_eq!(outcome.arg_index, 2);
    }

    /// Test: a repeat whose body succeeds without consuming arguments
    /// exhausts the iteration ceiling as a fatal error.
    #[test]
    fn test_repeat_ceiling_is_fatal() {
        let variant = compile_format("...(|+ number)").unwrap();
        let node = variant.format.unwrap();
        let mut budget = 0;

        let result = crawl(&node, &args(""), 0, &mut budget);
        assert!(matches!(
            result,
            Err(FatalError::ExcessiveIterations { .. })
        ));
    }

    /// Test: literal matching — exact, case-insensitive loose, mismatch.
    #[test]
    fn test_literal_matching() {
        assert_eq!(crawl_format("'at'", "at").rank, 2);

        let outcome = crawl_format("'at'", "AT");
        assert_eq!(outcome.rank, 1);
        assert_eq!(outcome.warnings.len(), 1);

        assert_eq!(crawl_format("'at'", "by").status, CrawlStatus::Failure);
    }

    /// Test: best-ranked variant wins; ties keep the first seen.
    #[test]
    fn test_variant_selection() {
        let parameters = params(&[("single", "number"), ("pair", "number &+ number")]);

        let chosen = parameters.validate(&args("1 2")).unwrap();
        assert_eq!(chosen.variant_key.as_deref(), Some("pair"));
        assert_eq!(chosen.info.rank, 4);

        let chosen = parameters.validate(&args("1")).unwrap();
        assert_eq!(chosen.variant_key.as_deref(), Some("single"));
        assert_eq!(chosen.info.rank, 2);
    }

    /// Test: tie between equally ranked variants keeps the first.
    #[test]
    fn test_tie_keeps_first() {
        let parameters = params(&[("a", "number"), ("b", "number")]);

        let chosen = parameters.validate(&args("3")).unwrap();
        assert_eq!(chosen.variant_key.as_deref(), Some("a"));
    }

    /// Test: unconsumed arguments after a clean match produce one
    /// too-many-arguments error.
    #[test]
    fn test_too_many_arguments() {
        let parameters = params(&[("single", "number")]);

        let chosen = parameters.validate(&args("1 2 3")).unwrap();
        assert_eq!(chosen.variant_key.as_deref(), Some("single"));
        assert_eq!(chosen.info.errors.len(), 1);
        assert!(chosen.info.errors[0].message.contains("too many arguments"));
        assert_eq!(chosen.info.errors[0].arg_index, 1);
    }

    /// Test: an empty Parameters yields the sentinel (no variant, rank
    /// −1).
    #[test]
    fn test_empty_parameters_sentinel() {
        let parameters = Parameters::new(Vec::new()).unwrap();

        let chosen = parameters.validate(&args("1")).unwrap();
        assert_eq!(chosen.variant_key, None);
        assert_eq!(chosen.info.rank, -1);
    }

    /// Test: an empty-format variant accepts zero arguments and flags
    /// any supplied ones.
    #[test]
    fn test_empty_variant() {
        let parameters = Parameters::new(vec![(
            "none".to_string(),
            Variant { format: None },
        )])
        .unwrap();

        let chosen = parameters.validate(&args("")).unwrap();
        assert!(chosen.info.errors.is_empty());

        let chosen = parameters.validate(&args("extra")).unwrap();
        assert_eq!(chosen.info.errors.len(), 1);
    }
}
