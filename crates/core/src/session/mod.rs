//! Quiz session engine.
//!
//! A session runs through a fixed number of rounds:
//! - **Selection**: pick a location in a country not yet used this session
//! - **Enrichment**: fetch the country's names and facts
//! - **Resolution**: a guess or skip is scored, then the player advances
//!
//! [`SessionEngine`] owns the state machine; the other submodules hold the
//! individual rules.

pub mod clue;
mod engine;
pub mod matcher;
mod scoring;
mod selector;
mod types;

pub use engine::SessionEngine;
pub use scoring::{ScoreKeeper, DEFAULT_ROUNDS_PER_SESSION};
pub use selector::{CandidateSelector, Selection};
pub use types::*;

use thiserror::Error;

use crate::history::HistoryError;

/// Errors returned by session operations.
///
/// A failed operation leaves the session exactly as it was.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A data provider failed; retrying later may succeed.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// No location in an unused country was found.
    #[error("no unused location found after {attempts} attempts")]
    CandidateExhausted { attempts: u32 },

    /// Operation not valid in the current phase.
    #[error("cannot {operation} while session is {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: SessionPhase,
    },

    /// A round is already being acquired for this session.
    #[error("a round is already being acquired")]
    Busy,

    /// The session was reset while this operation was waiting on a provider.
    #[error("result discarded: session was reset while the round was being acquired")]
    StaleResult,

    /// Score history could not be read or written.
    #[error("score history error: {0}")]
    History(#[from] HistoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionError::InvalidTransition {
            operation: "skip",
            phase: SessionPhase::Complete,
        };
        assert_eq!(err.to_string(), "cannot skip while session is complete");

        let err = SessionError::CandidateExhausted { attempts: 10 };
        assert_eq!(
            err.to_string(),
            "no unused location found after 10 attempts"
        );
    }
}
