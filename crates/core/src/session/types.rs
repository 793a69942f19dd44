//! Session and round data types.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::scoring::ScoreKeeper;
use crate::provider::{CountryFacts, LocationRecord};

// ============================================================================
// Difficulty
// ============================================================================

/// Difficulty tier of a playthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    /// Large cities only.
    Easy,
    Medium,
    /// Any city, no map.
    Hard,
}

impl DifficultyTier {
    pub const ALL: [DifficultyTier; 3] = [
        DifficultyTier::Easy,
        DifficultyTier::Medium,
        DifficultyTier::Hard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyTier::Easy => "easy",
            DifficultyTier::Medium => "medium",
            DifficultyTier::Hard => "hard",
        }
    }

    /// Whether a map of the location may be shown.
    pub fn shows_map(&self) -> bool {
        !matches!(self, DifficultyTier::Hard)
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(DifficultyTier::Easy),
            "medium" => Ok(DifficultyTier::Medium),
            "hard" => Ok(DifficultyTier::Hard),
            other => Err(format!("unknown difficulty tier: {}", other)),
        }
    }
}

// ============================================================================
// Phase
// ============================================================================

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    NotStarted,
    InRound,
    RoundResolved,
    Complete,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::NotStarted => "not_started",
            SessionPhase::InRound => "in_round",
            SessionPhase::RoundResolved => "round_resolved",
            SessionPhase::Complete => "complete",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Visit preferences
// ============================================================================

/// Answer to "would you like to visit this place?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitAnswer {
    Yes,
    No,
}

/// A recorded post-round visit preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitPreference {
    pub location_name: String,
    pub country_name: String,
    pub answer: VisitAnswer,
}

// ============================================================================
// Round
// ============================================================================

/// How a round was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Resolution {
    Guessed { guess: String, correct: bool },
    Skipped,
}

/// One location-guessing cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub location: LocationRecord,
    pub facts: Option<CountryFacts>,
    pub clue_revealed: bool,
    pub answered: bool,
    pub correct: Option<bool>,
    pub resolution: Option<Resolution>,
    pub points_awarded: u32,
    pub preference_recorded: bool,
}

impl Round {
    pub fn new(location: LocationRecord, facts: Option<CountryFacts>) -> Self {
        Self {
            location,
            facts,
            clue_revealed: false,
            answered: false,
            correct: None,
            resolution: None,
            points_awarded: 0,
            preference_recorded: false,
        }
    }

    /// Display name of the country being guessed.
    ///
    /// Falls back to the location provider's country name when no facts were
    /// available for the round.
    pub fn correct_answer(&self) -> &str {
        self.facts
            .as_ref()
            .map(|f| f.common_name.as_str())
            .unwrap_or(&self.location.country_name)
    }

    /// Facts to match guesses against.
    pub fn answer_facts(&self) -> CountryFacts {
        match &self.facts {
            Some(facts) => facts.clone(),
            None => CountryFacts {
                common_name: self.location.country_name.clone(),
                official_name: self.location.country_name.clone(),
                ..CountryFacts::default()
            },
        }
    }
}

// ============================================================================
// Session state
// ============================================================================

/// All state of one playthrough.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub tier: Option<DifficultyTier>,
    pub used_country_codes: HashSet<String>,
    pub keeper: ScoreKeeper,
    pub visit_preferences: Vec<VisitPreference>,
    pub phase: SessionPhase,
    pub round: Option<Round>,
}

impl SessionState {
    /// Fresh state for a playthrough at `tier`, still without a round.
    pub fn new(tier: DifficultyTier, rounds_per_session: u32) -> Self {
        Self {
            tier: Some(tier),
            keeper: ScoreKeeper::new(rounds_per_session),
            ..Self::default()
        }
    }
}

// ============================================================================
// Views handed to the presentation layer
// ============================================================================

/// What the player sees about the current round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundView {
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    pub flag_url: String,
    pub show_map: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub clue_revealed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clue: Option<String>,
    pub answered: bool,
    /// Only present once the round is resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RoundOutcome>,
}

/// Result of resolving a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub resolution: Resolution,
    pub correct: bool,
    pub points_awarded: u32,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facts: Option<CountryFacts>,
    pub score: u32,
    pub questions_answered: u32,
    pub session_complete: bool,
}

/// Read-only snapshot of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<DifficultyTier>,
    pub score: u32,
    pub questions_answered: u32,
    pub rounds_per_session: u32,
    pub countries_used: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundView>,
    #[serde(default)]
    pub visit_preferences: Vec<VisitPreference>,
}
