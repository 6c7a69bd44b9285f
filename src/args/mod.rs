//! Argument lexing and classification for open macro tags.

mod classify;
mod lexer;
mod types;

pub use classify::classify_arguments;
pub use lexer::lex_arguments;
pub use types::{
    Argument, ArgumentError, ArgumentItem, ArgumentWarning, Evaluatable, ImageAlign,
    ImageArgument, LinkArgument, LinkSyntax, ParsedArguments,
};

use crate::errors::FatalError;
use crate::passage::PassageIndex;
use crate::scan::MacroToken;

/// Lexes and classifies an argument substring.
pub fn parse_arguments(text: &str, passages: Option<&PassageIndex>) -> ParsedArguments {
    classify_arguments(&lex_arguments(text), passages)
}

/// Parses the arguments of an open macro tag.
///
/// Spans in the result are relative to the tag's argument substring; use
/// [`MacroToken::args_span`] to rebase them onto the document. Calling
/// this with a closing tag is API misuse and fatal.
pub fn parse_macro_arguments(
    token: &MacroToken,
    source: &str,
    passages: Option<&PassageIndex>,
) -> Result<ParsedArguments, FatalError> {
    if !token.open {
        return Err(FatalError::ArgumentsOnCloseTag {
            name: token.name.clone(),
        });
    }

    Ok(match token.args_text(source) {
        Some(text) => parse_arguments(text, passages),
        None => ParsedArguments::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::scan::scan_macros;
    use crate::test_utils::definitions_fixture;

    /// Test: parsing the arguments of a closing tag is a fatal error, not
    /// a diagnostic.
    #[test]
    fn test_close_tag_is_fatal() {
        let text = "<<if $x>>y<</if>>";
        let tokens = scan_macros(text, &definitions_fixture(), &Settings::default());

        let close = tokens.iter().find(|t| !t.open).unwrap();
        let result = parse_macro_arguments(close, text, None);

        assert!(matches!(
            result,
            Err(FatalError::ArgumentsOnCloseTag { ref name }) if name == "if"
        ));
    }

    /// Test: an open tag without argument text parses to empty arguments.
    #[test]
    fn test_empty_arguments() {
        let text = "<<break>>";
        let tokens = scan_macros(text, &definitions_fixture(), &Settings::default());

        let parsed = parse_macro_arguments(&tokens[0], text, None).unwrap();
        assert!(parsed.arguments.is_empty());
        assert!(parsed.errors.is_empty());
    }
}
