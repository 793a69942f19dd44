//! Candidate selection.
//!
//! Turns a difficulty tier into location lookups and keeps asking until a
//! location in an unused country turns up or the attempt budget runs out.

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::types::DifficultyTier;
use crate::config::SelectionConfig;
use crate::metrics::{SELECTION_ATTEMPTS, SELECTION_EXHAUSTED};
use crate::provider::{
    normalize_country_code, LocationProvider, LocationQuery, LocationRecord, ProviderError,
    SortOrder,
};

/// Outcome of a selection run that did not hit a provider failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Found(LocationRecord),
    /// The attempt budget ran out without an unused country.
    NotFound { attempts: u32 },
}

/// Picks one location whose country has not been used yet.
///
/// Selection is side-effect free: the caller records the chosen country.
pub struct CandidateSelector {
    provider: Arc<dyn LocationProvider>,
    config: SelectionConfig,
    rng: Mutex<StdRng>,
}

impl CandidateSelector {
    /// Create a selector; `seed` fixes the random offsets and picks.
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        config: SelectionConfig,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            provider,
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Build the lookup for one attempt at `tier`.
    pub async fn query_for(&self, tier: DifficultyTier) -> LocationQuery {
        let mut rng = self.rng.lock().await;
        match tier {
            DifficultyTier::Easy => LocationQuery {
                result_limit: self.config.easy_batch_size,
                random_offset: rng.random_range(0..self.config.easy_offset_range.max(1)),
                min_population: Some(self.config.easy_min_population),
                sort_order: Some(SortOrder::PopulationDesc),
            },
            DifficultyTier::Medium => LocationQuery {
                result_limit: 1,
                random_offset: rng.random_range(0..self.config.medium_offset_range.max(1)),
                min_population: None,
                sort_order: None,
            },
            DifficultyTier::Hard => LocationQuery {
                result_limit: 1,
                random_offset: rng.random_range(0..self.config.hard_offset_range.max(1)),
                min_population: None,
                sort_order: None,
            },
        }
    }

    /// Find a location for `tier` whose country is not in `excluded`.
    ///
    /// A provider failure aborts the run and is returned as-is; it is never
    /// reported as [`Selection::NotFound`].
    pub async fn select_candidate(
        &self,
        tier: DifficultyTier,
        excluded: &HashSet<String>,
    ) -> Result<Selection, ProviderError> {
        let excluded: HashSet<String> = excluded.iter().map(|c| normalize_country_code(c)).collect();

        for attempt in 1..=self.config.max_attempts {
            let query = self.query_for(tier).await;
            let records = self.provider.lookup(&query).await?;
            let returned = records.len();

            let unused: Vec<LocationRecord> = records
                .into_iter()
                .filter(|r| !excluded.contains(&r.normalized_country_code()))
                .collect();

            debug!(
                "Selection attempt {}/{} for {}: offset={}, {} returned, {} unused",
                attempt,
                self.config.max_attempts,
                tier,
                query.random_offset,
                returned,
                unused.len()
            );

            if unused.is_empty() {
                continue;
            }

            let index = self.rng.lock().await.random_range(0..unused.len());
            let chosen = unused.into_iter().nth(index);
            if let Some(record) = chosen {
                SELECTION_ATTEMPTS
                    .with_label_values(&[tier.as_str()])
                    .observe(attempt as f64);
                return Ok(Selection::Found(record));
            }
        }

        warn!(
            "No unused country found for {} after {} attempts ({} countries excluded)",
            tier,
            self.config.max_attempts,
            excluded.len()
        );
        SELECTION_EXHAUSTED.with_label_values(&[tier.as_str()]).inc();

        Ok(Selection::NotFound {
            attempts: self.config.max_attempts,
        })
    }
}
