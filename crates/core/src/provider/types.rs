//! Records returned by the location and country-facts providers.

use serde::{Deserialize, Serialize};

/// A city returned by a location lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationRecord {
    /// City name.
    pub name: String,
    /// ISO-3166 alpha-2 country code.
    pub country_code: String,
    /// Country name as reported by the location provider.
    pub country_name: String,
    /// Population, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationRecord {
    /// Country code normalized for comparisons (upper case).
    pub fn normalized_country_code(&self) -> String {
        normalize_country_code(&self.country_code)
    }

    /// Flag image for the record's country.
    pub fn flag_url(&self) -> String {
        format!(
            "https://flagcdn.com/w160/{}.png",
            self.country_code.trim().to_lowercase()
        )
    }
}

/// Normalize a country code for set membership checks.
pub fn normalize_country_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Canonical naming and metadata for a country.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CountryFacts {
    /// Common name (e.g. "United States").
    pub common_name: String,
    /// Official name (e.g. "United States of America").
    pub official_name: String,
    /// Alternate spellings and abbreviations.
    #[serde(default)]
    pub alt_spellings: Vec<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub subregion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub currencies: Vec<String>,
}

/// Sort order for location lookups.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Largest population first.
    PopulationDesc,
}

impl SortOrder {
    /// GeoDB `sort` parameter value.
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::PopulationDesc => "-population",
        }
    }
}

/// Parameters of a single location lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocationQuery {
    /// Maximum number of records to return.
    pub result_limit: u32,
    /// Offset into the provider's result set.
    pub random_offset: u32,
    /// Only return locations at least this populous.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_population: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}
