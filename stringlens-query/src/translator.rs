// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Natural Language Query Translator
//!
//! Translates free-form queries into a [`FilterSet`] using an ordered list of
//! regex rules. Rules run against the lowercased query, in order. A rule that
//! matches assigns one or more filter keys; a later rule assigning the same key
//! replaces the earlier value, while rules on different keys accumulate.
//!
//! ## Example Queries
//!
//! - "all single word palindromic strings"
//! - "strings longer than 10 characters"
//! - "between 5 and 10 characters with the letter 'q'"
//! - "palindromes containing a vowel"
//!
//! The vowel and consonant rules are proxies: "vowel" becomes
//! `contains_character = a` and "consonant" becomes `contains_character = b`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use stringlens_core::{FilterKey, FilterSet};

/// Maximum query length accepted by callers, in characters
pub const MAX_QUERY_LENGTH: usize = 500;

/// Result of translating a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    /// Query as received (untrimmed, original case)
    pub original: String,
    /// Accumulated filters; empty when no rule matched
    pub filters: FilterSet,
    /// Names of the rules that fired, in evaluation order
    pub matched_rules: Vec<&'static str>,
}

impl Interpretation {
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

type Assign = fn(&Captures<'_>) -> Option<Vec<(FilterKey, String)>>;

struct Rule {
    name: &'static str,
    pattern: Regex,
    assign: Assign,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, assign: Assign) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("translator rule patterns are static"),
            assign,
        }
    }
}

static SHARED: Lazy<QueryTranslator> = Lazy::new(QueryTranslator::new);

/// Rule-based query translator
pub struct QueryTranslator {
    rules: Vec<Rule>,
}

impl QueryTranslator {
    /// Create a translator with the standard rule list
    pub fn new() -> Self {
        Self {
            rules: Self::build_rules(),
        }
    }

    /// Process-wide translator. Immutable once built.
    pub fn shared() -> &'static QueryTranslator {
        &SHARED
    }

    fn build_rules() -> Vec<Rule> {
        vec![
            // Palindrome
            Rule::new("palindrome", r"palindrom(?:e|ic)", |_| {
                Some(vec![(FilterKey::IsPalindrome, "true".to_string())])
            }),
            // Word count, phrased
            Rule::new("single_word", r"single word|one word", |_| {
                Some(vec![(FilterKey::WordCount, "1".to_string())])
            }),
            Rule::new("two_words", r"two words", |_| {
                Some(vec![(FilterKey::WordCount, "2".to_string())])
            }),
            Rule::new("three_words", r"three words", |_| {
                Some(vec![(FilterKey::WordCount, "3".to_string())])
            }),
            // Word count, numeric
            Rule::new("numeric_words", r"(\d+)\s*words?\b", |caps| {
                let n = number(caps, 1)?;
                Some(vec![(FilterKey::WordCount, n.to_string())])
            }),
            // Exclusive length bounds
            Rule::new("longer_than", r"longer\s+than\s+(\d+)", min_exclusive),
            Rule::new("more_than", r"more\s+than\s+(\d+)", min_exclusive),
            Rule::new("shorter_than", r"shorter\s+than\s+(\d+)", max_exclusive),
            Rule::new("less_than", r"less\s+than\s+(\d+)", max_exclusive),
            // Inclusive length bounds
            Rule::new("at_least", r"at\s+least\s+(\d+)", |caps| {
                let n = number(caps, 1)?;
                Some(vec![(FilterKey::MinLength, n.to_string())])
            }),
            Rule::new("at_most", r"at\s+most\s+(\d+)", |caps| {
                let n = number(caps, 1)?;
                Some(vec![(FilterKey::MaxLength, n.to_string())])
            }),
            // Length range
            Rule::new("between", r"between\s+(\d+)\s+and\s+(\d+)", |caps| {
                let min = number(caps, 1)?;
                let max = number(caps, 2)?;
                Some(vec![
                    (FilterKey::MinLength, min.to_string()),
                    (FilterKey::MaxLength, max.to_string()),
                ])
            }),
            // Character containment
            Rule::new(
                "contains_letter",
                r#"(?:contains|with|having|includes?)\s+(?:the\s+)?(?:letter|character)\s+['"]?([a-z])(?:['"]|\b)"#,
                |caps| {
                    let letter = caps.get(1)?.as_str().to_lowercase();
                    Some(vec![(FilterKey::ContainsCharacter, letter)])
                },
            ),
            // Vowel / consonant proxies
            Rule::new("vowel", r"(?:contains|with|having)\s+(?:a\s+)?vowel", |_| {
                Some(vec![(FilterKey::ContainsCharacter, "a".to_string())])
            }),
            Rule::new(
                "consonant",
                r"(?:contains|with|having)\s+(?:a\s+)?consonant",
                |_| Some(vec![(FilterKey::ContainsCharacter, "b".to_string())]),
            ),
        ]
    }

    /// Translate a query into filters
    pub fn translate(&self, query: &str) -> FilterSet {
        self.interpret(query).filters
    }

    /// Translate a query, keeping the original text and the rules that fired
    pub fn interpret(&self, query: &str) -> Interpretation {
        let lowered = query.to_lowercase();
        let mut matched_rules = Vec::new();

        let filters = self.rules.iter().fold(FilterSet::new(), |mut filters, rule| {
            let assignments = rule
                .pattern
                .captures(&lowered)
                .and_then(|caps| (rule.assign)(&caps));

            if let Some(assignments) = assignments {
                matched_rules.push(rule.name);
                for (key, value) in assignments {
                    filters.set(key, value);
                }
            }
            filters
        });

        tracing::debug!(
            query = %query,
            rules = ?matched_rules,
            filters = filters.len(),
            "Translated natural language query"
        );

        Interpretation {
            original: query.to_string(),
            filters,
            matched_rules,
        }
    }
}

impl Default for QueryTranslator {
    fn default() -> Self {
        Self::new()
    }
}

fn number(caps: &Captures<'_>, group: usize) -> Option<u64> {
    caps.get(group)?.as_str().parse().ok()
}

// "longer than N" admits N+1 and up
fn min_exclusive(caps: &Captures<'_>) -> Option<Vec<(FilterKey, String)>> {
    let n = number(caps, 1)? as i128;
    Some(vec![(FilterKey::MinLength, (n + 1).to_string())])
}

// "shorter than 0" yields -1, which filter validation rejects
fn max_exclusive(caps: &Captures<'_>) -> Option<Vec<(FilterKey, String)>> {
    let n = number(caps, 1)? as i128;
    Some(vec![(FilterKey::MaxLength, (n - 1).to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(query: &str) -> FilterSet {
        QueryTranslator::new().translate(query)
    }

    #[test]
    fn test_palindrome_keywords() {
        for query in ["palindrome", "all palindromic strings", "PALINDROMES please"] {
            assert_eq!(
                translate(query).get(FilterKey::IsPalindrome),
                Some("true"),
                "{}",
                query
            );
        }
    }

    #[test]
    fn test_accumulates_across_keys() {
        let filters = translate("palindrome with letter a");
        assert_eq!(filters.get(FilterKey::IsPalindrome), Some("true"));
        assert_eq!(filters.get(FilterKey::ContainsCharacter), Some("a"));
        assert_eq!(filters.len(), 2);
    }

    #[test]
    fn test_numeric_word_count_overrides_phrased() {
        let filters = translate("single word, 3 words");
        assert_eq!(filters.get(FilterKey::WordCount), Some("3"));
        assert_eq!(filters.len(), 1);
    }

    #[test]
    fn test_phrased_word_counts() {
        assert_eq!(translate("one word strings").get(FilterKey::WordCount), Some("1"));
        assert_eq!(translate("two words").get(FilterKey::WordCount), Some("2"));
        assert_eq!(translate("three words").get(FilterKey::WordCount), Some("3"));
    }

    #[test]
    fn test_range() {
        let filters = translate("between 5 and 10");
        assert_eq!(filters.get(FilterKey::MinLength), Some("5"));
        assert_eq!(filters.get(FilterKey::MaxLength), Some("10"));
    }

    #[test]
    fn test_range_overrides_single_bounds() {
        let filters = translate("at least 2, between 5 and 10");
        assert_eq!(filters.get(FilterKey::MinLength), Some("5"));
        assert_eq!(filters.get(FilterKey::MaxLength), Some("10"));
    }

    #[test]
    fn test_exclusive_and_inclusive_bounds_agree() {
        assert_eq!(
            translate("longer than 9").get(FilterKey::MinLength),
            translate("at least 10").get(FilterKey::MinLength)
        );
        assert_eq!(translate("more than 9").get(FilterKey::MinLength), Some("10"));
        assert_eq!(translate("shorter than 5").get(FilterKey::MaxLength), Some("4"));
        assert_eq!(translate("less than 5").get(FilterKey::MaxLength), Some("4"));
        assert_eq!(translate("at most 4").get(FilterKey::MaxLength), Some("4"));
    }

    #[test]
    fn test_inclusive_bound_overrides_exclusive() {
        let filters = translate("longer than 3 and at least 8");
        assert_eq!(filters.get(FilterKey::MinLength), Some("8"));
    }

    #[test]
    fn test_shorter_than_zero_goes_negative() {
        assert_eq!(translate("shorter than 0").get(FilterKey::MaxLength), Some("-1"));
    }

    #[test]
    fn test_character_containment_forms() {
        for query in [
            "contains the letter z",
            "with letter Z",
            "having the character 'z'",
            "includes letter \"z\"",
            "include the letter z please",
        ] {
            assert_eq!(
                translate(query).get(FilterKey::ContainsCharacter),
                Some("z"),
                "{}",
                query
            );
        }
    }

    #[test]
    fn test_character_containment_needs_single_letter() {
        assert!(translate("with letter zz").is_empty());
    }

    #[test]
    fn test_vowel_and_consonant_proxies() {
        assert_eq!(
            translate("strings with a vowel").get(FilterKey::ContainsCharacter),
            Some("a")
        );
        assert_eq!(
            translate("having consonant").get(FilterKey::ContainsCharacter),
            Some("b")
        );
    }

    #[test]
    fn test_vowel_overrides_explicit_letter() {
        let filters = translate("with the letter q, contains a vowel");
        assert_eq!(filters.get(FilterKey::ContainsCharacter), Some("a"));
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(translate("banana").is_empty());
        assert!(translate("show me everything").is_empty());
    }

    #[test]
    fn test_oversized_number_does_not_fire() {
        let filters = translate("at least 99999999999999999999999");
        assert!(filters.get(FilterKey::MinLength).is_none());
    }

    #[test]
    fn test_interpret_reports_rules() {
        let interpretation = QueryTranslator::shared().interpret("Single word palindromes");
        assert_eq!(interpretation.original, "Single word palindromes");
        assert_eq!(interpretation.matched_rules, vec!["palindrome", "single_word"]);
        assert!(!interpretation.is_empty());
    }
}
