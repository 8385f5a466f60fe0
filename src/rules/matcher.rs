//! Keyword matcher — first rule, first keyword wins.
//!
//! Plain substring search, no scoring. The replacement is drawn from the OS
//! RNG because it stands in for a real error message and must not be
//! predictable from outside.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng};
use tracing::{debug, warn};

use crate::rules::model::{Rule, RuleRole};

/// The rule that fired and the replacement chosen for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub role: RuleRole,
    /// Position of the rule within its set.
    pub rule_index: usize,
    /// The keyword that was found in the text.
    pub keyword: String,
    /// Replacement text chosen for delivery.
    pub replacement: String,
}

/// Find the first rule in `rules` whose keywords occur in `text`.
pub fn find_match(role: RuleRole, text: &str, rules: &[Rule]) -> Option<RuleMatch> {
    find_match_with(role, text, rules, &mut OsRng)
}

/// Same as [`find_match`] with a caller-supplied cryptographic RNG.
pub fn find_match_with<R>(
    role: RuleRole,
    text: &str,
    rules: &[Rule],
    rng: &mut R,
) -> Option<RuleMatch>
where
    R: Rng + CryptoRng + ?Sized,
{
    for (index, rule) in rules.iter().enumerate() {
        let (Some(keywords), Some(replacements)) =
            (rule.keywords.as_list(), rule.replacement_texts.as_list())
        else {
            warn!(role = %role, index, "Rule is malformed (keywords/replacement_texts must be lists), skipped");
            continue;
        };

        if keywords.is_empty() || replacements.is_empty() {
            debug!(role = %role, index, "Rule has no keywords or replacements, skipped");
            continue;
        }

        let Some(keyword) = keywords
            .iter()
            .find(|k| !k.is_empty() && text.contains(k.as_str()))
        else {
            continue;
        };

        // Non-empty was checked above, so choose always yields.
        let replacement = replacements.choose(rng)?;

        return Some(RuleMatch {
            role,
            rule_index: index,
            keyword: keyword.clone(),
            replacement: replacement.clone(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::loader;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn first_matching_rule_wins() {
        let rules = vec![Rule::new(["a"], ["X"]), Rule::new(["a"], ["Y"])];
        for _ in 0..50 {
            let m = find_match(RuleRole::Reported, "banana", &rules).unwrap();
            assert_eq!(m.rule_index, 0);
            assert_eq!(m.replacement, "X");
        }
    }

    #[test]
    fn first_keyword_in_rule_order_wins() {
        let rules = vec![Rule::new(["later", "early"], ["R"])];
        let m = find_match(RuleRole::Silent, "early then later", &rules).unwrap();
        assert_eq!(m.keyword, "later");
    }

    #[test]
    fn malformed_rule_is_isolated() {
        let rules = loader::load(
            "k",
            r#"[{"keywords": "not-a-list", "replacement_texts": ["Y"]},
                {"keywords": ["b"], "replacement_texts": ["Z"]}]"#,
        );
        let m = find_match(RuleRole::Fallback, "b", &rules).unwrap();
        assert_eq!(m.rule_index, 1);
        assert_eq!(m.replacement, "Z");
    }

    #[test]
    fn empty_keywords_and_replacements_are_inert() {
        let rules = vec![
            Rule::new(Vec::<String>::new(), ["never"]),
            Rule::new(["text"], Vec::<String>::new()),
            Rule::new(["", "text"], ["hit"]),
        ];
        let m = find_match(RuleRole::Silent, "some text", &rules).unwrap();
        assert_eq!(m.rule_index, 2);
        assert_eq!(m.keyword, "text");
        assert_eq!(m.replacement, "hit");
    }

    #[test]
    fn empty_keyword_alone_never_matches() {
        let rules = vec![Rule::new([""], ["X"])];
        assert!(find_match(RuleRole::Silent, "anything", &rules).is_none());
    }

    #[test]
    fn no_match_returns_none() {
        let rules = vec![Rule::new(["missing"], ["X"])];
        assert!(find_match(RuleRole::Reported, "all good", &rules).is_none());
        assert!(find_match(RuleRole::Reported, "all good", &[]).is_none());
    }

    #[test]
    fn match_is_case_sensitive_substring() {
        let rules = vec![Rule::new(["Error"], ["X"])];
        assert!(find_match(RuleRole::Reported, "an error occurred", &rules).is_none());
        assert!(find_match(RuleRole::Reported, "RateLimitError: 429", &rules).is_some());
    }

    #[test]
    fn replacement_is_drawn_from_all_candidates() {
        let rules = vec![Rule::new(["x"], ["one", "two", "three"])];
        let mut rng = StdRng::seed_from_u64(7);
        let seen: HashSet<String> = (0..200)
            .filter_map(|_| find_match_with(RuleRole::Silent, "x", &rules, &mut rng))
            .map(|m| m.replacement)
            .collect();
        assert_eq!(seen.len(), 3);
    }
}
