//! GeoDB Cities API client (served through RapidAPI).
//!
//! Requires a RapidAPI key. The free tier allows roughly one request per
//! second, so 429 responses are expected under load.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{LocationQuery, LocationRecord};
use super::{LocationProvider, ProviderError};
use crate::metrics::{PROVIDER_DURATION, PROVIDER_REQUESTS};

const DEFAULT_BASE_URL: &str = "https://wft-geo-db.p.rapidapi.com";
const DEFAULT_HOST: &str = "wft-geo-db.p.rapidapi.com";

/// GeoDB client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoDbConfig {
    /// RapidAPI key (required).
    pub api_key: String,
    /// Base URL (default: https://wft-geo-db.p.rapidapi.com).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Value of the `X-RapidAPI-Host` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// GeoDB Cities client.
pub struct GeoDbClient {
    client: Client,
    base_url: String,
    host: String,
    api_key: String,
}

impl GeoDbClient {
    /// Create a new GeoDB client.
    pub fn new(config: GeoDbConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "GeoDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            host: config.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            api_key: config.api_key,
        })
    }

    fn query_params(query: &LocationQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", query.result_limit.to_string()),
            ("offset", query.random_offset.to_string()),
        ];
        if let Some(min_population) = query.min_population {
            params.push(("minPopulation", min_population.to_string()));
        }
        if let Some(sort) = query.sort_order {
            params.push(("sort", sort.as_param().to_string()));
        }
        params
    }

    async fn fetch_cities(&self, query: &LocationQuery) -> Result<Vec<LocationRecord>, ProviderError> {
        let url = format!("{}/v1/geo/cities", self.base_url);

        debug!(
            "GeoDB city lookup: limit={}, offset={}, min_population={:?}",
            query.result_limit, query.random_offset, query.min_population
        );

        let response = self
            .client
            .get(&url)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.host)
            .query(&Self::query_params(query))
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            return Err(ProviderError::NotConfigured(
                "Invalid GeoDB API key".to_string(),
            ));
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

        let body: GeoDbCitiesResponse = response.json().await.map_err(|e| {
            ProviderError::ParseError(format!("Failed to parse city lookup response: {}", e))
        })?;

        Ok(body.data.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl LocationProvider for GeoDbClient {
    async fn lookup(&self, query: &LocationQuery) -> Result<Vec<LocationRecord>, ProviderError> {
        let start = Instant::now();
        let result = self.fetch_cities(query).await;

        PROVIDER_DURATION
            .with_label_values(&["geodb"])
            .observe(start.elapsed().as_secs_f64());
        PROVIDER_REQUESTS
            .with_label_values(&["geodb", if result.is_ok() { "success" } else { "error" }])
            .inc();

        result
    }
}

// ============================================================================
// GeoDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct GeoDbCitiesResponse {
    #[serde(default)]
    data: Vec<GeoDbCity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeoDbCity {
    name: String,
    country_code: String,
    country: String,
    population: Option<u64>,
    latitude: f64,
    longitude: f64,
}

impl From<GeoDbCity> for LocationRecord {
    fn from(city: GeoDbCity) -> Self {
        Self {
            name: city.name,
            country_code: city.country_code,
            country_name: city.country,
            population: city.population,
            latitude: city.latitude,
            longitude: city.longitude,
        }
    }
}
