//! Free-text answer matching.
//!
//! A guess is accepted when, after trimming and lower-casing, it equals the
//! country's common name, official name or one of its alternate spellings.
//! There is no fuzzy or partial matching.

use std::collections::HashSet;

use crate::provider::CountryFacts;

/// Trim surrounding whitespace and lower-case.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Every accepted spelling for a country, normalized.
pub fn accepted_names(facts: &CountryFacts) -> HashSet<String> {
    [&facts.common_name, &facts.official_name]
        .into_iter()
        .chain(facts.alt_spellings.iter())
        .map(|name| normalize(name))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Whether `guess` names the country described by `facts`.
pub fn is_correct(guess: &str, facts: &CountryFacts) -> bool {
    accepted_names(facts).contains(&normalize(guess))
}
