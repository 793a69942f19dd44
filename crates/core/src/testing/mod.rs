//! Testing utilities and mock implementations.
//!
//! Mock implementations of the provider traits let the session engine and
//! the HTTP layer be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use geoquiz_core::testing::{fixtures, MockCountryFactsProvider, MockLocationProvider};
//!
//! let locations = MockLocationProvider::new();
//! locations.set_pool(fixtures::world_locations()).await;
//!
//! let facts = MockCountryFactsProvider::new();
//! facts.set_countries(fixtures::world_facts()).await;
//!
//! // Hand both to a SessionEngine...
//! ```

mod mock_country_facts;
mod mock_location_provider;

pub use mock_country_facts::MockCountryFactsProvider;
pub use mock_location_provider::MockLocationProvider;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::provider::{CountryFacts, LocationRecord};

    /// (city, code, provider country name, common name, official name, alt spellings)
    const WORLD: &[(&str, &str, &str, &str, &str, &[&str])] = &[
        ("Chicago", "US", "United States of America", "United States", "United States of America", &["US", "USA"]),
        ("Lisbon", "PT", "Portugal", "Portugal", "Portuguese Republic", &["PT", "Portuguesa"]),
        ("Paris", "FR", "France", "France", "French Republic", &["FR", "Republique francaise"]),
        ("Madrid", "ES", "Spain", "Spain", "Kingdom of Spain", &["ES", "Espana"]),
        ("Rome", "IT", "Italy", "Italy", "Italian Republic", &["IT", "Italia"]),
        ("Berlin", "DE", "Germany", "Germany", "Federal Republic of Germany", &["DE", "Deutschland"]),
        ("Tokyo", "JP", "Japan", "Japan", "Japan", &["JP", "Nippon", "Nihon"]),
        ("Lima", "PE", "Peru", "Peru", "Republic of Peru", &["PE", "Piruw"]),
        ("Quito", "EC", "Ecuador", "Ecuador", "Republic of Ecuador", &["EC"]),
        ("Cairo", "EG", "Egypt", "Egypt", "Arab Republic of Egypt", &["EG", "Misr"]),
        ("Nairobi", "KE", "Kenya", "Kenya", "Republic of Kenya", &["KE"]),
        ("Mumbai", "IN", "India", "India", "Republic of India", &["IN", "Bharat"]),
        ("Sydney", "AU", "Australia", "Australia", "Commonwealth of Australia", &["AU"]),
        ("Toronto", "CA", "Canada", "Canada", "Canada", &["CA"]),
        ("Santiago", "CL", "Chile", "Chile", "Republic of Chile", &["CL"]),
        ("Oslo", "NO", "Norway", "Norway", "Kingdom of Norway", &["NO", "Norge", "Noreg"]),
        ("Seoul", "KR", "South Korea", "South Korea", "Republic of Korea", &["KR", "Korea, Republic of"]),
        ("Hanoi", "VN", "Vietnam", "Vietnam", "Socialist Republic of Vietnam", &["VN", "Viet Nam"]),
        ("Lagos", "NG", "Nigeria", "Nigeria", "Federal Republic of Nigeria", &["NG"]),
        ("Warsaw", "PL", "Poland", "Poland", "Republic of Poland", &["PL", "Polska"]),
    ];

    /// Create a location record with plausible coordinates and population.
    pub fn location(name: &str, country_code: &str, country_name: &str) -> LocationRecord {
        LocationRecord {
            name: name.to_string(),
            country_code: country_code.to_string(),
            country_name: country_name.to_string(),
            population: Some(1_000_000 + name.len() as u64 * 10_000),
            latitude: 10.0 + name.len() as f64,
            longitude: -20.0 + country_code.len() as f64,
        }
    }

    /// Create country facts.
    pub fn country_facts(common_name: &str, official_name: &str, alt_spellings: &[&str]) -> CountryFacts {
        CountryFacts {
            common_name: common_name.to_string(),
            official_name: official_name.to_string(),
            alt_spellings: alt_spellings.iter().map(|s| s.to_string()).collect(),
            region: "Earth".to_string(),
            subregion: String::new(),
            capital: None,
            languages: vec![],
            currencies: vec![],
        }
    }

    /// One large city in each of twenty distinct countries.
    pub fn world_locations() -> Vec<LocationRecord> {
        WORLD
            .iter()
            .map(|(city, code, country, ..)| location(city, code, country))
            .collect()
    }

    /// Facts keyed by country code for every country in [`world_locations`].
    pub fn world_facts() -> Vec<(String, CountryFacts)> {
        WORLD
            .iter()
            .map(|(_, code, _, common, official, alts)| {
                (code.to_string(), country_facts(common, official, alts))
            })
            .collect()
    }

    /// Common name for a country code from [`world_facts`].
    pub fn common_name(country_code: &str) -> Option<&'static str> {
        WORLD
            .iter()
            .find(|(_, code, ..)| code.eq_ignore_ascii_case(country_code))
            .map(|(_, _, _, common, ..)| *common)
    }
}
