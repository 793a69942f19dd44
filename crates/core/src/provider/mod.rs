//! External data providers for the quiz.
//!
//! The session engine only depends on the two capability traits defined
//! here. `GeoDbClient` and `RestCountriesClient` are the production
//! backends; test doubles live in [`crate::testing`].

mod geodb;
mod restcountries;
mod types;

pub use geodb::{GeoDbClient, GeoDbConfig};
pub use restcountries::{CountriesConfig, RestCountriesClient};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to a data provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed (transport, timeout, body decoding).
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (unknown country code).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether the provider definitively reported the resource as unknown.
    ///
    /// Every other variant means the provider is unavailable for now.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}

/// Source of candidate locations.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Run one lookup. An empty result is not an error.
    async fn lookup(&self, query: &LocationQuery) -> Result<Vec<LocationRecord>, ProviderError>;
}

/// Source of country naming and metadata.
#[async_trait]
pub trait CountryFactsProvider: Send + Sync {
    /// Fetch facts for an ISO-3166 alpha-2 country code.
    async fn fetch(&self, country_code: &str) -> Result<CountryFacts, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_not_found_is_not_found() {
        assert!(ProviderError::NotFound("XX".to_string()).is_not_found());
        assert!(!ProviderError::RateLimitExceeded.is_not_found());
        assert!(!ProviderError::ApiError {
            status: 500,
            message: "boom".to_string()
        }
        .is_not_found());
        assert!(!ProviderError::ParseError("bad json".to_string()).is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::ApiError {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 502 - bad gateway");
    }
}
