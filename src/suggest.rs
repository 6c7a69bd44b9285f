//! Fuzzy nearest-name ranking for "did you mean" hints.

use itertools::Itertools;
use nucleo_matcher::{
    pattern::{self, Normalization},
    Matcher,
};

/// Ranks candidate names against a query, best match first. Candidates
/// that do not match at all are dropped.
pub fn nearest_names<'a>(
    query: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    limit: usize,
) -> Vec<String> {
    let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);
    let pattern = pattern::Pattern::parse(
        query,
        pattern::CaseMatching::Smart,
        Normalization::Smart,
    );

    let mut buf = Vec::new();
    candidates
        .into_iter()
        .filter_map(|name| {
            pattern
                .score(nucleo_matcher::Utf32Str::new(name, &mut buf), &mut matcher)
                .filter(|score| *score > 0)
                .map(|score| (score, name))
        })
        .sorted_by(|(a, _), (b, _)| Ord::cmp(b, a))
        .map(|(_, name)| name.to_string())
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: the closest name ranks first and non-matches drop out.
    #[test]
    fn test_nearest_names() {
        let candidates = ["if", "print", "printx", "set", "silently"];

        let nearest = nearest_names("print", candidates, 2);
        assert_eq!(nearest.first().map(String::as_str), Some("print"));

        let nearest = nearest_names("zzz", candidates, 2);
        assert!(nearest.is_empty());
    }
}
