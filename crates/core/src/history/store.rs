//! Score history storage trait and types.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::session::DifficultyTier;

/// Final score of the last completed session, per tier.
///
/// Tiers that were never completed are absent.
pub type ScoreHistory = BTreeMap<DifficultyTier, u32>;

/// Error type for score history operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// The persisted record could not be decoded.
    #[error("Corrupt score history record: {0}")]
    Corrupt(String),
}

/// Trait for score history storage backends.
pub trait ScoreHistoryStore: Send + Sync {
    /// Overwrite the stored score for `tier`.
    fn record_final_score(&self, tier: DifficultyTier, score: u32) -> Result<(), HistoryError>;

    /// The full persisted mapping.
    fn history(&self) -> Result<ScoreHistory, HistoryError>;
}
