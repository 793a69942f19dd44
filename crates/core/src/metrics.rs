//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Sessions (started, completed, final scores)
//! - Rounds (started, resolved by outcome, clues)
//! - Candidate selection (attempts, exhaustion, stale results)
//! - External providers (GeoDB, REST Countries)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Session Metrics
// =============================================================================

/// Sessions started by tier.
pub static SESSIONS_STARTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("geoquiz_sessions_started_total", "Total sessions started"),
        &["tier"],
    )
    .unwrap()
});

/// Sessions completed by tier.
pub static SESSIONS_COMPLETED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "geoquiz_sessions_completed_total",
            "Total sessions played through to the final round",
        ),
        &["tier"],
    )
    .unwrap()
});

/// Final score distribution by tier.
pub static FINAL_SCORE: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("geoquiz_final_score", "Final score of completed sessions")
            .buckets(vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0]),
        &["tier"],
    )
    .unwrap()
});

// =============================================================================
// Round Metrics
// =============================================================================

/// Rounds started by tier.
pub static ROUNDS_STARTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("geoquiz_rounds_started_total", "Total rounds started"),
        &["tier"],
    )
    .unwrap()
});

/// Rounds resolved by tier and outcome.
pub static ROUNDS_RESOLVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("geoquiz_rounds_resolved_total", "Total rounds resolved"),
        &["tier", "outcome"], // "correct", "incorrect", "skipped"
    )
    .unwrap()
});

/// Clues revealed by tier (first reveal per round only).
pub static CLUES_REVEALED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("geoquiz_clues_revealed_total", "Total clues revealed"),
        &["tier"],
    )
    .unwrap()
});

// =============================================================================
// Candidate Selection Metrics
// =============================================================================

/// Lookup attempts needed per successful selection.
pub static SELECTION_ATTEMPTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "geoquiz_selection_attempts",
            "Lookup attempts needed to find an unused country",
        )
        .buckets(vec![1.0, 2.0, 3.0, 5.0, 8.0, 10.0]),
        &["tier"],
    )
    .unwrap()
});

/// Selections that ran out of attempts.
pub static SELECTION_EXHAUSTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "geoquiz_selection_exhausted_total",
            "Selections that exhausted their attempt budget",
        ),
        &["tier"],
    )
    .unwrap()
});

/// Acquisition results discarded because the session was reset meanwhile.
pub static STALE_RESULTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "geoquiz_stale_results_total",
        "Round acquisitions discarded after a session reset",
    )
    .unwrap()
});

// =============================================================================
// External Provider Metrics
// =============================================================================

/// Provider request duration in seconds.
pub static PROVIDER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "geoquiz_provider_request_duration_seconds",
            "Duration of external provider requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["provider"],
    )
    .unwrap()
});

/// Provider requests by provider and result.
pub static PROVIDER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "geoquiz_provider_requests_total",
            "Total external provider requests",
        ),
        &["provider", "result"], // "success", "not_found", "error"
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Sessions
        Box::new(SESSIONS_STARTED.clone()),
        Box::new(SESSIONS_COMPLETED.clone()),
        Box::new(FINAL_SCORE.clone()),
        // Rounds
        Box::new(ROUNDS_STARTED.clone()),
        Box::new(ROUNDS_RESOLVED.clone()),
        Box::new(CLUES_REVEALED.clone()),
        // Selection
        Box::new(SELECTION_ATTEMPTS.clone()),
        Box::new(SELECTION_EXHAUSTED.clone()),
        Box::new(STALE_RESULTS.clone()),
        // Providers
        Box::new(PROVIDER_DURATION.clone()),
        Box::new(PROVIDER_REQUESTS.clone()),
    ]
}
