//! REST Countries API client.
//!
//! No API key is required.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::CountryFacts;
use super::{CountryFactsProvider, ProviderError};
use crate::metrics::{PROVIDER_DURATION, PROVIDER_REQUESTS};

const DEFAULT_BASE_URL: &str = "https://restcountries.com/v3.1";

const FIELDS: &str = "name,altSpellings,region,subregion,capital,languages,currencies";

static COUNTRY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]{2,3}$").unwrap());

/// REST Countries client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountriesConfig {
    /// Base URL (default: https://restcountries.com/v3.1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for CountriesConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u32 {
    30
}

/// REST Countries client.
pub struct RestCountriesClient {
    client: Client,
    base_url: String,
}

impl RestCountriesClient {
    /// Create a new REST Countries client.
    pub fn new(config: CountriesConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self { client, base_url })
    }

    async fn fetch_country(&self, country_code: &str) -> Result<CountryFacts, ProviderError> {
        let code = country_code.trim();
        if !COUNTRY_CODE.is_match(code) {
            return Err(ProviderError::NotFound(format!(
                "Invalid country code '{}'",
                country_code
            )));
        }

        let url = format!("{}/alpha/{}", self.base_url, urlencoding::encode(code));

        debug!("REST Countries fetch: code={}", code);

        let response = self
            .client
            .get(&url)
            .query(&[("fields", FIELDS)])
            .send()
            .await?;

        let status = response.status();
        if status == 404 || status == 400 {
            return Err(ProviderError::NotFound(format!("Country {}", code)));
        }
        if status == 429 {
            return Err(ProviderError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: AlphaResponse = response.json().await.map_err(|e| {
            ProviderError::ParseError(format!("Failed to parse country response: {}", e))
        })?;

        body.into_first()
            .map(Into::into)
            .ok_or_else(|| ProviderError::NotFound(format!("Country {}", code)))
    }
}

#[async_trait]
impl CountryFactsProvider for RestCountriesClient {
    async fn fetch(&self, country_code: &str) -> Result<CountryFacts, ProviderError> {
        let start = Instant::now();
        let result = self.fetch_country(country_code).await;

        PROVIDER_DURATION
            .with_label_values(&["restcountries"])
            .observe(start.elapsed().as_secs_f64());
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) if e.is_not_found() => "not_found",
            Err(_) => "error",
        };
        PROVIDER_REQUESTS
            .with_label_values(&["restcountries", outcome])
            .inc();

        result
    }
}

// ============================================================================
// REST Countries Response Types (private)
// ============================================================================

/// `/alpha/{code}` answers with an array, or a bare object when `fields` is set.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AlphaResponse {
    Many(Vec<RcCountry>),
    One(Box<RcCountry>),
}

impl AlphaResponse {
    fn into_first(self) -> Option<RcCountry> {
        match self {
            AlphaResponse::Many(countries) => countries.into_iter().next(),
            AlphaResponse::One(country) => Some(*country),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RcCountry {
    name: RcName,
    #[serde(default)]
    alt_spellings: Vec<String>,
    #[serde(default)]
    region: String,
    #[serde(default)]
    subregion: String,
    #[serde(default)]
    capital: Vec<String>,
    #[serde(default)]
    languages: BTreeMap<String, String>,
    #[serde(default)]
    currencies: BTreeMap<String, RcCurrency>,
}

#[derive(Debug, Deserialize)]
struct RcName {
    common: String,
    official: String,
}

#[derive(Debug, Deserialize)]
struct RcCurrency {
    name: Option<String>,
}

impl From<RcCountry> for CountryFacts {
    fn from(country: RcCountry) -> Self {
        Self {
            common_name: country.name.common,
            official_name: country.name.official,
            alt_spellings: country.alt_spellings,
            region: country.region,
            subregion: country.subregion,
            capital: country.capital.into_iter().next(),
            languages: country.languages.into_values().collect(),
            currencies: country
                .currencies
                .into_iter()
                .map(|(code, currency)| currency.name.unwrap_or(code))
                .collect(),
        }
    }
}
