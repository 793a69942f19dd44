//! Mock location provider for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::provider::{LocationProvider, LocationQuery, LocationRecord, ProviderError};

/// Mock implementation of the LocationProvider trait.
///
/// Provides controllable behavior for testing:
/// - Scripted results, consumed one per lookup
/// - A fallback pool paged through by the query's offset and limit
/// - Error injection and artificial latency
/// - Query recording for assertions
///
/// # Example
///
/// ```rust,ignore
/// use geoquiz_core::testing::{MockLocationProvider, fixtures};
///
/// let provider = MockLocationProvider::new();
/// provider.push_results(vec![fixtures::location("Lima", "PE", "Peru")]).await;
///
/// let records = provider.lookup(&query).await?;
/// assert_eq!(records[0].country_code, "PE");
/// ```
#[derive(Debug)]
pub struct MockLocationProvider {
    /// Results returned by the next lookups, in order.
    scripted: Arc<RwLock<VecDeque<Vec<LocationRecord>>>>,
    /// Records served once the script is exhausted.
    pool: Arc<RwLock<Vec<LocationRecord>>>,
    /// Recorded queries.
    queries: Arc<RwLock<Vec<LocationQuery>>>,
    /// If set, the next lookup will fail with this error.
    next_error: Arc<RwLock<Option<ProviderError>>>,
    /// Latency added to every lookup.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl Default for MockLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLocationProvider {
    /// Create a new mock that returns nothing.
    pub fn new() -> Self {
        Self {
            scripted: Arc::new(RwLock::new(VecDeque::new())),
            pool: Arc::new(RwLock::new(Vec::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Results Configuration
    // =========================================================================

    /// Queue the result of one future lookup.
    pub async fn push_results(&self, records: Vec<LocationRecord>) {
        self.scripted.write().await.push_back(records);
    }

    /// Replace the fallback pool.
    ///
    /// A lookup returns up to `result_limit` records starting at
    /// `random_offset` (modulo the pool size), wrapping around.
    pub async fn set_pool(&self, records: Vec<LocationRecord>) {
        *self.pool.write().await = records;
    }

    /// Add latency to every lookup.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Remove any configured latency.
    pub async fn clear_delay(&self) {
        *self.delay.write().await = None;
    }

    // =========================================================================
    // Query Recording
    // =========================================================================

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<LocationQuery> {
        self.queries.read().await.clone()
    }

    /// Get the number of lookups performed.
    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next lookup to fail with the given error.
    pub async fn set_next_error(&self, error: ProviderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    fn page(pool: &[LocationRecord], query: &LocationQuery) -> Vec<LocationRecord> {
        if pool.is_empty() {
            return Vec::new();
        }
        let start = query.random_offset as usize % pool.len();
        let take = (query.result_limit as usize).min(pool.len());
        pool.iter()
            .cycle()
            .skip(start)
            .take(take)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LocationProvider for MockLocationProvider {
    async fn lookup(&self, query: &LocationQuery) -> Result<Vec<LocationRecord>, ProviderError> {
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.queries.write().await.push(query.clone());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        if let Some(records) = self.scripted.write().await.pop_front() {
            return Ok(records);
        }

        let pool = self.pool.read().await;
        Ok(Self::page(&pool, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn query(limit: u32, offset: u32) -> LocationQuery {
        LocationQuery {
            result_limit: limit,
            random_offset: offset,
            min_population: None,
            sort_order: None,
        }
    }

    #[tokio::test]
    async fn test_empty_by_default() {
        let provider = MockLocationProvider::new();
        assert!(provider.lookup(&query(10, 0)).await.unwrap().is_empty());
        assert_eq!(provider.query_count().await, 1);
    }

    #[tokio::test]
    async fn test_scripted_results_take_priority() {
        let provider = MockLocationProvider::new();
        provider.set_pool(fixtures::world_locations()).await;
        provider
            .push_results(vec![fixtures::location("Quito", "EC", "Ecuador")])
            .await;

        let first = provider.lookup(&query(5, 0)).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name, "Quito");

        let second = provider.lookup(&query(5, 0)).await.unwrap();
        assert_eq!(second.len(), 5);
    }

    #[tokio::test]
    async fn test_pool_pages_wrap_around() {
        let provider = MockLocationProvider::new();
        let pool = fixtures::world_locations();
        provider.set_pool(pool.clone()).await;

        let records = provider.lookup(&query(3, pool.len() as u32 - 1)).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], pool[pool.len() - 1]);
        assert_eq!(records[1], pool[0]);
    }

    #[tokio::test]
    async fn test_error_injection_is_one_shot() {
        let provider = MockLocationProvider::new();
        provider.set_next_error(ProviderError::RateLimitExceeded).await;

        assert!(provider.lookup(&query(1, 0)).await.is_err());
        assert!(provider.lookup(&query(1, 0)).await.is_ok());
    }
}
