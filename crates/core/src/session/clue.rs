//! Clue text for a round.

use crate::provider::CountryFacts;

/// Clue revealing the first character of the country's common name.
pub fn clue_text(facts: &CountryFacts) -> String {
    match facts.common_name.trim().chars().next() {
        Some(first) => format!("The country's name starts with \"{}\"", first),
        None => "No clue is available for this country".to_string(),
    }
}
