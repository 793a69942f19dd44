//! Running score and round count for a playthrough.

/// Rounds in a playthrough unless configured otherwise.
pub const DEFAULT_ROUNDS_PER_SESSION: u32 = 10;

/// Tracks score and answered questions, and decides when a session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreKeeper {
    score: u32,
    questions_answered: u32,
    round_target: u32,
}

impl Default for ScoreKeeper {
    fn default() -> Self {
        Self::new(DEFAULT_ROUNDS_PER_SESSION)
    }
}

impl ScoreKeeper {
    pub fn new(round_target: u32) -> Self {
        Self {
            score: 0,
            questions_answered: 0,
            round_target,
        }
    }

    /// Points for a resolved round.
    ///
    /// | correct | clue used | points |
    /// |---------|-----------|--------|
    /// | yes     | no        | 2      |
    /// | yes     | yes       | 1      |
    /// | no      | either    | 0      |
    pub const fn points_for(correct: bool, clue_used: bool) -> u32 {
        match (correct, clue_used) {
            (true, false) => 2,
            (true, true) => 1,
            (false, _) => 0,
        }
    }

    /// Apply the outcome of one round. Call exactly once per round; a skip
    /// is resolved as incorrect.
    pub fn resolve_guess(&mut self, correct: bool, clue_used: bool) -> u32 {
        let points = Self::points_for(correct, clue_used);
        self.score += points;
        self.questions_answered += 1;
        points
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn questions_answered(&self) -> u32 {
        self.questions_answered
    }

    pub fn round_target(&self) -> u32 {
        self.round_target
    }

    pub fn is_session_complete(&self) -> bool {
        self.questions_answered >= self.round_target
    }
}
