//! Session engine implementation.
//!
//! Drives one playthrough through its phases:
//! `NotStarted -> InRound -> RoundResolved -> InRound ... -> Complete`.
//!
//! Provider calls are the only suspension points. The state lock is never
//! held across them; instead an in-flight flag blocks concurrent
//! acquisitions and a generation counter lets `reset` invalidate any result
//! that is still on its way.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::clue::clue_text;
use super::matcher;
use super::scoring::ScoreKeeper;
use super::selector::{CandidateSelector, Selection};
use super::types::{
    DifficultyTier, Resolution, Round, RoundOutcome, RoundView, SessionPhase, SessionSnapshot,
    SessionState, VisitAnswer, VisitPreference,
};
use super::SessionError;
use crate::config::GameConfig;
use crate::history::{ScoreHistory, ScoreHistoryStore};
use crate::metrics::{
    CLUES_REVEALED, FINAL_SCORE, ROUNDS_RESOLVED, ROUNDS_STARTED, SESSIONS_COMPLETED,
    SESSIONS_STARTED, STALE_RESULTS,
};
use crate::provider::{normalize_country_code, CountryFactsProvider, LocationProvider};

#[derive(Debug, Default)]
struct EngineInner {
    state: SessionState,
    /// Bumped by every reset; acquisitions started under an older value are stale.
    generation: u64,
    /// A selection/enrichment call is outstanding.
    acquiring: bool,
}

impl EngineInner {
    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.acquiring {
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    fn ensure_phase(
        &self,
        expected: SessionPhase,
        operation: &'static str,
    ) -> Result<(), SessionError> {
        if self.state.phase != expected {
            return Err(self.invalid(operation));
        }
        Ok(())
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            operation,
            phase: self.state.phase,
        }
    }

    fn tier(&self, operation: &'static str) -> Result<DifficultyTier, SessionError> {
        self.state.tier.ok_or_else(|| self.invalid(operation))
    }

    /// Close an acquisition started under `generation`.
    fn finish_acquisition(&mut self, generation: u64) -> Result<(), SessionError> {
        if self.generation != generation {
            STALE_RESULTS.inc();
            warn!(
                "Discarding round acquired for generation {} (session is now at {})",
                generation, self.generation
            );
            return Err(SessionError::StaleResult);
        }
        self.acquiring = false;
        Ok(())
    }

    fn begin_round(&mut self, round: Round) {
        self.state
            .used_country_codes
            .insert(round.location.normalized_country_code());
        self.state.round = Some(round);
        self.state.phase = SessionPhase::InRound;
    }
}

/// Orchestrates one playthrough at a time.
///
/// All operations take `&self`, so an engine can be shared behind an `Arc`
/// by a presentation layer that serves concurrent requests.
pub struct SessionEngine {
    selector: CandidateSelector,
    facts: Arc<dyn CountryFactsProvider>,
    history: Arc<dyn ScoreHistoryStore>,
    rounds_per_session: u32,
    inner: Mutex<EngineInner>,
}

impl SessionEngine {
    /// Create an engine in the `NotStarted` phase.
    pub fn new(
        config: &GameConfig,
        locations: Arc<dyn LocationProvider>,
        facts: Arc<dyn CountryFactsProvider>,
        history: Arc<dyn ScoreHistoryStore>,
    ) -> Self {
        Self {
            selector: CandidateSelector::new(locations, config.selection.clone(), config.seed),
            facts,
            history,
            rounds_per_session: config.rounds_per_session,
            inner: Mutex::new(EngineInner::default()),
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Start a playthrough at `tier` and acquire its first round.
    ///
    /// On failure the engine stays `NotStarted`.
    pub async fn start_session(&self, tier: DifficultyTier) -> Result<SessionSnapshot, SessionError> {
        let generation = {
            let mut inner = self.inner.lock().await;
            inner.ensure_idle()?;
            inner.ensure_phase(SessionPhase::NotStarted, "start a session")?;
            inner.acquiring = true;
            inner.generation
        };

        info!("Starting {} session", tier);
        let acquired = self.acquire_round(tier, &HashSet::new()).await;

        let mut inner = self.inner.lock().await;
        inner.finish_acquisition(generation)?;
        let round = acquired?;

        inner.state = SessionState::new(tier, self.rounds_per_session);
        inner.begin_round(round);

        SESSIONS_STARTED.with_label_values(&[tier.as_str()]).inc();
        ROUNDS_STARTED.with_label_values(&[tier.as_str()]).inc();

        Ok(self.snapshot_of(&inner.state))
    }

    /// Resolve the current round with a free-text guess.
    pub async fn submit_guess(&self, guess: &str) -> Result<RoundOutcome, SessionError> {
        self.resolve_round(Some(guess), "submit a guess").await
    }

    /// Resolve the current round without guessing. Always scores 0.
    pub async fn skip(&self) -> Result<RoundOutcome, SessionError> {
        self.resolve_round(None, "skip").await
    }

    /// Reveal the clue for the current round.
    ///
    /// Repeated calls return the same text and do not change scoring further.
    pub async fn reveal_clue(&self) -> Result<String, SessionError> {
        let mut inner = self.inner.lock().await;
        inner.ensure_phase(SessionPhase::InRound, "reveal a clue")?;
        let tier = inner.tier("reveal a clue")?;

        let phase = inner.state.phase;
        let Some(round) = inner.state.round.as_mut() else {
            return Err(SessionError::InvalidTransition {
                operation: "reveal a clue",
                phase,
            });
        };

        if !round.clue_revealed {
            round.clue_revealed = true;
            CLUES_REVEALED.with_label_values(&[tier.as_str()]).inc();
            debug!("Clue revealed for {}", round.location.name);
        }

        Ok(clue_text(&round.answer_facts()))
    }

    /// Leave a resolved round: finish the session after the last round,
    /// otherwise acquire the next one.
    ///
    /// When no next round can be acquired the engine stays `RoundResolved`
    /// and `advance` may be retried.
    pub async fn advance(&self) -> Result<SessionSnapshot, SessionError> {
        let (tier, excluded, generation) = {
            let mut inner = self.inner.lock().await;
            inner.ensure_idle()?;
            inner.ensure_phase(SessionPhase::RoundResolved, "advance")?;
            let tier = inner.tier("advance")?;

            if inner.state.keeper.is_session_complete() {
                let score = inner.state.keeper.score();
                self.history.record_final_score(tier, score)?;
                inner.state.phase = SessionPhase::Complete;

                SESSIONS_COMPLETED.with_label_values(&[tier.as_str()]).inc();
                FINAL_SCORE
                    .with_label_values(&[tier.as_str()])
                    .observe(score as f64);
                info!("{} session complete with score {}", tier, score);

                return Ok(self.snapshot_of(&inner.state));
            }

            inner.acquiring = true;
            (
                tier,
                inner.state.used_country_codes.clone(),
                inner.generation,
            )
        };

        let acquired = self.acquire_round(tier, &excluded).await;

        let mut inner = self.inner.lock().await;
        inner.finish_acquisition(generation)?;
        let round = acquired?;
        inner.begin_round(round);

        ROUNDS_STARTED.with_label_values(&[tier.as_str()]).inc();

        Ok(self.snapshot_of(&inner.state))
    }

    /// Record whether the player would like to visit the just-resolved location.
    pub async fn record_visit_preference(
        &self,
        answer: VisitAnswer,
    ) -> Result<SessionSnapshot, SessionError> {
        let mut inner = self.inner.lock().await;
        // the resolved round is about to be replaced
        inner.ensure_idle()?;
        inner.ensure_phase(SessionPhase::RoundResolved, "record a visit preference")?;

        let state = &mut inner.state;
        let round = match state.round.as_mut() {
            Some(round) if !round.preference_recorded => round,
            _ => {
                return Err(SessionError::InvalidTransition {
                    operation: "record another visit preference",
                    phase: state.phase,
                })
            }
        };

        round.preference_recorded = true;
        state.visit_preferences.push(VisitPreference {
            location_name: round.location.name.clone(),
            country_name: round.correct_answer().to_string(),
            answer,
        });

        Ok(self.snapshot_of(&inner.state))
    }

    /// Drop all session state and return to `NotStarted`.
    ///
    /// Valid in every phase. Any acquisition still in flight is discarded
    /// when it completes. Score history is not touched.
    pub async fn reset(&self) -> SessionSnapshot {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.acquiring = false;
        inner.state = SessionState::default();

        info!("Session reset (generation {})", inner.generation);
        self.snapshot_of(&inner.state)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock().await;
        self.snapshot_of(&inner.state)
    }

    pub async fn phase(&self) -> SessionPhase {
        self.inner.lock().await.state.phase
    }

    /// Persisted final scores per tier.
    pub fn history(&self) -> Result<ScoreHistory, SessionError> {
        Ok(self.history.history()?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn resolve_round(
        &self,
        guess: Option<&str>,
        operation: &'static str,
    ) -> Result<RoundOutcome, SessionError> {
        let mut inner = self.inner.lock().await;
        inner.ensure_phase(SessionPhase::InRound, operation)?;
        let tier = inner.tier(operation)?;

        let phase = inner.state.phase;
        let state = &mut inner.state;
        let Some(round) = state.round.as_mut() else {
            return Err(SessionError::InvalidTransition { operation, phase });
        };

        let (correct, resolution) = match guess {
            Some(text) => {
                let correct = matcher::is_correct(text, &round.answer_facts());
                let resolution = Resolution::Guessed {
                    guess: text.trim().to_string(),
                    correct,
                };
                (correct, resolution)
            }
            None => (false, Resolution::Skipped),
        };

        let points = state.keeper.resolve_guess(correct, round.clue_revealed);
        round.answered = true;
        round.correct = Some(correct);
        round.points_awarded = points;
        round.resolution = Some(resolution.clone());
        state.phase = SessionPhase::RoundResolved;

        let outcome_label = match resolution {
            Resolution::Skipped => "skipped",
            Resolution::Guessed { correct: true, .. } => "correct",
            Resolution::Guessed { correct: false, .. } => "incorrect",
        };
        ROUNDS_RESOLVED
            .with_label_values(&[tier.as_str(), outcome_label])
            .inc();
        debug!(
            "Round {} resolved as {} (+{} points)",
            state.keeper.questions_answered(),
            outcome_label,
            points
        );

        Ok(Self::outcome_of(round, &state.keeper))
    }

    /// Select a candidate and enrich it with country facts.
    async fn acquire_round(
        &self,
        tier: DifficultyTier,
        excluded: &HashSet<String>,
    ) -> Result<Round, SessionError> {
        let record = match self.selector.select_candidate(tier, excluded).await {
            Ok(Selection::Found(record)) => record,
            Ok(Selection::NotFound { attempts }) => {
                return Err(SessionError::CandidateExhausted { attempts })
            }
            Err(e) => return Err(SessionError::ProviderUnavailable(e.to_string())),
        };

        let code = normalize_country_code(&record.country_code);
        let facts = match self.facts.fetch(&code).await {
            Ok(facts) => Some(facts),
            Err(e) if e.is_not_found() => {
                warn!(
                    "No country facts for {} ({}), falling back to location data",
                    code, record.country_name
                );
                None
            }
            Err(e) => return Err(SessionError::ProviderUnavailable(e.to_string())),
        };

        debug!("Acquired {} in {}", record.name, code);
        Ok(Round::new(record, facts))
    }

    fn outcome_of(round: &Round, keeper: &ScoreKeeper) -> RoundOutcome {
        RoundOutcome {
            resolution: round.resolution.clone().unwrap_or(Resolution::Skipped),
            correct: round.correct.unwrap_or(false),
            points_awarded: round.points_awarded,
            correct_answer: round.correct_answer().to_string(),
            clue: round
                .clue_revealed
                .then(|| clue_text(&round.answer_facts())),
            facts: round.facts.clone(),
            score: keeper.score(),
            questions_answered: keeper.questions_answered(),
            session_complete: keeper.is_session_complete(),
        }
    }

    fn snapshot_of(&self, state: &SessionState) -> SessionSnapshot {
        let show_map = state.tier.map(|t| t.shows_map()).unwrap_or(false);

        let round = state.round.as_ref().map(|round| RoundView {
            city: round.location.name.clone(),
            population: round.location.population,
            flag_url: round.location.flag_url(),
            show_map,
            latitude: show_map.then_some(round.location.latitude),
            longitude: show_map.then_some(round.location.longitude),
            clue_revealed: round.clue_revealed,
            clue: round
                .clue_revealed
                .then(|| clue_text(&round.answer_facts())),
            answered: round.answered,
            outcome: round
                .answered
                .then(|| Self::outcome_of(round, &state.keeper)),
        });

        SessionSnapshot {
            phase: state.phase,
            tier: state.tier,
            score: state.keeper.score(),
            questions_answered: state.keeper.questions_answered(),
            rounds_per_session: self.rounds_per_session,
            countries_used: state.used_country_codes.len(),
            round,
            visit_preferences: state.visit_preferences.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::SqliteScoreHistoryStore;
    use crate::provider::ProviderError;
    use crate::testing::{fixtures, MockCountryFactsProvider, MockLocationProvider};

    struct Harness {
        engine: SessionEngine,
        locations: Arc<MockLocationProvider>,
        facts: Arc<MockCountryFactsProvider>,
    }

    async fn harness() -> Harness {
        let locations = Arc::new(MockLocationProvider::new());
        locations.set_pool(fixtures::world_locations()).await;
        let facts = Arc::new(MockCountryFactsProvider::new());
        facts.set_countries(fixtures::world_facts()).await;
        let history = Arc::new(SqliteScoreHistoryStore::in_memory().unwrap());

        let config = GameConfig {
            seed: Some(1),
            ..GameConfig::default()
        };
        let engine = SessionEngine::new(
            &config,
            Arc::clone(&locations) as Arc<dyn LocationProvider>,
            Arc::clone(&facts) as Arc<dyn CountryFactsProvider>,
            history,
        );

        Harness {
            engine,
            locations,
            facts,
        }
    }

    #[tokio::test]
    async fn test_start_session_enters_round() {
        let h = harness().await;
        let snapshot = h.engine.start_session(DifficultyTier::Easy).await.unwrap();

        assert_eq!(snapshot.phase, SessionPhase::InRound);
        assert_eq!(snapshot.tier, Some(DifficultyTier::Easy));
        assert_eq!(snapshot.countries_used, 1);
        assert_eq!(snapshot.questions_answered, 0);

        let round = snapshot.round.unwrap();
        assert!(!round.answered);
        assert!(round.show_map);
        assert!(round.latitude.is_some());
        assert!(round.outcome.is_none());
    }

    #[tokio::test]
    async fn test_hard_round_hides_coordinates() {
        let h = harness().await;
        let snapshot = h.engine.start_session(DifficultyTier::Hard).await.unwrap();
        let round = snapshot.round.unwrap();
        assert!(!round.show_map);
        assert!(round.latitude.is_none());
        assert!(round.longitude.is_none());
    }

    #[tokio::test]
    async fn test_start_twice_is_invalid() {
        let h = harness().await;
        h.engine.start_session(DifficultyTier::Easy).await.unwrap();
        let err = h.engine.start_session(DifficultyTier::Hard).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                phase: SessionPhase::InRound,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_start_exhausted_stays_not_started() {
        let h = harness().await;
        h.locations.set_pool(vec![]).await;

        let err = h.engine.start_session(DifficultyTier::Medium).await.unwrap_err();
        assert!(matches!(err, SessionError::CandidateExhausted { attempts: 10 }));
        assert_eq!(h.engine.phase().await, SessionPhase::NotStarted);

        // recoverable by retrying
        h.locations.set_pool(fixtures::world_locations()).await;
        h.engine.start_session(DifficultyTier::Medium).await.unwrap();
    }

    #[tokio::test]
    async fn test_start_provider_failure_is_unavailable() {
        let h = harness().await;
        h.locations
            .set_next_error(ProviderError::RateLimitExceeded)
            .await;

        let err = h.engine.start_session(DifficultyTier::Easy).await.unwrap_err();
        assert!(matches!(err, SessionError::ProviderUnavailable(_)));
        assert_eq!(h.engine.phase().await, SessionPhase::NotStarted);
    }

    #[tokio::test]
    async fn test_facts_outage_is_unavailable() {
        let h = harness().await;
        h.facts
            .set_next_error(ProviderError::ApiError {
                status: 503,
                message: "down".to_string(),
            })
            .await;

        let err = h.engine.start_session(DifficultyTier::Easy).await.unwrap_err();
        assert!(matches!(err, SessionError::ProviderUnavailable(_)));
        assert_eq!(h.engine.snapshot().await.countries_used, 0);
    }

    #[tokio::test]
    async fn test_unknown_country_falls_back_to_location_name() {
        let h = harness().await;
        h.facts.set_countries(vec![]).await;
        h.locations
            .set_pool(vec![fixtures::location("Reykjavik", "IS", "Iceland")])
            .await;

        h.engine.start_session(DifficultyTier::Medium).await.unwrap();
        assert_eq!(
            h.engine.reveal_clue().await.unwrap(),
            "The country's name starts with \"I\""
        );

        let outcome = h.engine.submit_guess(" iceland ").await.unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.correct_answer, "Iceland");
        assert!(outcome.facts.is_none());
    }

    #[tokio::test]
    async fn test_guess_scoring() {
        let h = harness().await;
        h.locations
            .set_pool(vec![fixtures::location("Chicago", "US", "United States of America")])
            .await;
        h.engine.start_session(DifficultyTier::Easy).await.unwrap();

        let outcome = h.engine.submit_guess("USA").await.unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.points_awarded, 2);
        assert_eq!(outcome.score, 2);
        assert_eq!(outcome.questions_answered, 1);
        assert_eq!(outcome.correct_answer, "United States");
        assert!(outcome.clue.is_none());
        assert_eq!(h.engine.phase().await, SessionPhase::RoundResolved);
    }

    #[tokio::test]
    async fn test_clue_costs_one_point_once() {
        let h = harness().await;
        h.locations
            .set_pool(vec![fixtures::location("Lisbon", "PT", "Portugal")])
            .await;
        h.engine.start_session(DifficultyTier::Easy).await.unwrap();

        let first = h.engine.reveal_clue().await.unwrap();
        let second = h.engine.reveal_clue().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "The country's name starts with \"P\"");

        let outcome = h.engine.submit_guess("portugal").await.unwrap();
        assert_eq!(outcome.points_awarded, 1);
        assert_eq!(outcome.clue.as_deref(), Some(first.as_str()));
    }

    #[tokio::test]
    async fn test_clue_unavailable_after_resolution() {
        let h = harness().await;
        h.engine.start_session(DifficultyTier::Easy).await.unwrap();
        h.engine.skip().await.unwrap();

        let err = h.engine.reveal_clue().await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_skip_scores_zero_and_counts() {
        let h = harness().await;
        h.engine.start_session(DifficultyTier::Easy).await.unwrap();

        let outcome = h.engine.skip().await.unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.resolution, Resolution::Skipped);
        assert_eq!(outcome.points_awarded, 0);
        assert_eq!(outcome.questions_answered, 1);
    }

    #[tokio::test]
    async fn test_guess_twice_is_invalid() {
        let h = harness().await;
        h.engine.start_session(DifficultyTier::Easy).await.unwrap();
        h.engine.submit_guess("nowhere").await.unwrap();

        let err = h.engine.submit_guess("elsewhere").await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                phase: SessionPhase::RoundResolved,
                ..
            }
        ));
        assert_eq!(h.engine.snapshot().await.questions_answered, 1);
    }

    #[tokio::test]
    async fn test_operations_before_start_are_invalid() {
        let h = harness().await;
        assert!(h.engine.submit_guess("France").await.is_err());
        assert!(h.engine.skip().await.is_err());
        assert!(h.engine.reveal_clue().await.is_err());
        assert!(h.engine.advance().await.is_err());
        assert!(h
            .engine
            .record_visit_preference(VisitAnswer::Yes)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_visit_preference_once_per_round() {
        let h = harness().await;
        h.engine.start_session(DifficultyTier::Easy).await.unwrap();

        // not before the round is resolved
        assert!(h
            .engine
            .record_visit_preference(VisitAnswer::Yes)
            .await
            .is_err());

        h.engine.submit_guess("Atlantis").await.unwrap();
        let snapshot = h
            .engine
            .record_visit_preference(VisitAnswer::No)
            .await
            .unwrap();
        assert_eq!(snapshot.visit_preferences.len(), 1);
        assert_eq!(snapshot.visit_preferences[0].answer, VisitAnswer::No);

        assert!(h
            .engine
            .record_visit_preference(VisitAnswer::Yes)
            .await
            .is_err());
        assert_eq!(h.engine.snapshot().await.visit_preferences.len(), 1);
    }

    #[tokio::test]
    async fn test_advance_failure_keeps_round_resolved() {
        let h = harness().await;
        h.engine.start_session(DifficultyTier::Easy).await.unwrap();
        h.engine.skip().await.unwrap();

        h.locations
            .set_next_error(ProviderError::RateLimitExceeded)
            .await;
        let err = h.engine.advance().await.unwrap_err();
        assert!(matches!(err, SessionError::ProviderUnavailable(_)));

        let snapshot = h.engine.snapshot().await;
        assert_eq!(snapshot.phase, SessionPhase::RoundResolved);
        assert_eq!(snapshot.countries_used, 1);

        let snapshot = h.engine.advance().await.unwrap();
        assert_eq!(snapshot.phase, SessionPhase::InRound);
        assert_eq!(snapshot.countries_used, 2);
    }

    #[tokio::test]
    async fn test_reset_returns_to_not_started() {
        let h = harness().await;
        h.engine.start_session(DifficultyTier::Easy).await.unwrap();
        h.engine.submit_guess("x").await.unwrap();

        let snapshot = h.engine.reset().await;
        assert_eq!(snapshot.phase, SessionPhase::NotStarted);
        assert_eq!(snapshot.countries_used, 0);
        assert_eq!(snapshot.questions_answered, 0);
        assert!(snapshot.tier.is_none());
        assert!(snapshot.round.is_none());

        h.engine.start_session(DifficultyTier::Hard).await.unwrap();
        assert_eq!(h.engine.snapshot().await.tier, Some(DifficultyTier::Hard));
    }
}
