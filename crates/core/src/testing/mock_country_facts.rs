//! Mock country facts provider for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::provider::{normalize_country_code, CountryFacts, CountryFactsProvider, ProviderError};

/// Mock implementation of the CountryFactsProvider trait.
///
/// Unknown country codes are reported as [`ProviderError::NotFound`].
#[derive(Debug)]
pub struct MockCountryFactsProvider {
    /// Facts by upper-case country code.
    countries: Arc<RwLock<HashMap<String, CountryFacts>>>,
    /// Codes requested, in order.
    requested: Arc<RwLock<Vec<String>>>,
    /// If set, the next fetch will fail with this error.
    next_error: Arc<RwLock<Option<ProviderError>>>,
}

impl Default for MockCountryFactsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCountryFactsProvider {
    /// Create a new mock that knows no countries.
    pub fn new() -> Self {
        Self {
            countries: Arc::new(RwLock::new(HashMap::new())),
            requested: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Add facts for one country.
    pub async fn add_country(&self, country_code: &str, facts: CountryFacts) {
        self.countries
            .write()
            .await
            .insert(normalize_country_code(country_code), facts);
    }

    /// Replace all known countries.
    pub async fn set_countries(&self, countries: Vec<(String, CountryFacts)>) {
        let mut map = self.countries.write().await;
        map.clear();
        for (code, facts) in countries {
            map.insert(normalize_country_code(&code), facts);
        }
    }

    /// Codes requested so far.
    pub async fn requested_codes(&self) -> Vec<String> {
        self.requested.read().await.clone()
    }

    /// Get the number of fetches performed.
    pub async fn fetch_count(&self) -> usize {
        self.requested.read().await.len()
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: ProviderError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl CountryFactsProvider for MockCountryFactsProvider {
    async fn fetch(&self, country_code: &str) -> Result<CountryFacts, ProviderError> {
        self.requested.write().await.push(country_code.to_string());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        self.countries
            .read()
            .await
            .get(&normalize_country_code(country_code))
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("Country {} not found", country_code)))
    }
}
