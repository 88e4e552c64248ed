//! Candidate scoring.
//!
//! Every weight lives in `ScoreWeights` so it can be tuned from config.json
//! and asserted on in tests independently of the control flow.

use serde::{Deserialize, Serialize};

use crate::ocr::preprocess::StrategyKind;

/// Which acceptance gate and bonus table to score with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// Only exact 4-digit + 3-letter text is scored.
    #[default]
    Strict,
    /// Any 6-8 character text mixing letters and digits is scored.
    Generic,
}

/// Named score constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Strict mode: text matches the canonical 4 digits + 3 letters
    pub exact_format: i32,
    /// Generic mode: text has exactly 7 characters
    pub plate_length: i32,
    /// Generic mode: at least 3 letters and at least 3 digits
    pub mixed_composition: i32,
    /// Strict mode strategy bonuses
    pub region_bonus: i32,
    pub enlarged_bonus: i32,
    pub enhanced_bonus: i32,
    /// Generic mode strategy bonuses
    pub generic_region_bonus: i32,
    pub generic_enlarged_bonus: i32,
    pub generic_enhanced_bonus: i32,
    /// Cleaned text needed no positional correction
    pub uncorrected_bonus: i32,
    /// Generic mode: corrected text still contains I or O
    pub ambiguity_penalty: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            exact_format: 50,
            plate_length: 10,
            mixed_composition: 15,
            region_bonus: 10,
            enlarged_bonus: 8,
            enhanced_bonus: 5,
            generic_region_bonus: 5,
            generic_enlarged_bonus: 3,
            generic_enhanced_bonus: 5,
            uncorrected_bonus: 15,
            ambiguity_penalty: 2,
        }
    }
}

/// Letters that stay error-prone even after correction.
const AMBIGUOUS_LETTERS: [char; 2] = ['I', 'O'];

const GENERIC_MIN_LEN: usize = 6;
const GENERIC_MAX_LEN: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    mode: ScoringMode,
    weights: ScoreWeights,
}

impl ScoringEngine {
    pub fn new(mode: ScoringMode, weights: ScoreWeights) -> Self {
        Self { mode, weights }
    }

    /// Minimum format test a corrected string must pass to be scored at all.
    pub fn passes_gate(&self, corrected: &str) -> bool {
        match self.mode {
            ScoringMode::Strict => is_exact_plate(corrected),
            ScoringMode::Generic => {
                let len = corrected.chars().count();
                (GENERIC_MIN_LEN..=GENERIC_MAX_LEN).contains(&len)
                    && corrected.chars().any(|c| c.is_ascii_uppercase())
                    && corrected.chars().any(|c| c.is_ascii_digit())
            }
        }
    }

    /// Bonus for the strategy that produced the image variant.
    pub fn strategy_bonus(&self, strategy: StrategyKind) -> i32 {
        let w = &self.weights;
        match (self.mode, strategy) {
            (_, StrategyKind::Original) => 0,
            (ScoringMode::Strict, StrategyKind::Region) => w.region_bonus,
            (ScoringMode::Strict, StrategyKind::Enlarged) => w.enlarged_bonus,
            (ScoringMode::Strict, StrategyKind::Enhanced) => w.enhanced_bonus,
            (ScoringMode::Generic, StrategyKind::Region) => w.generic_region_bonus,
            (ScoringMode::Generic, StrategyKind::Enlarged) => w.generic_enlarged_bonus,
            (ScoringMode::Generic, StrategyKind::Enhanced) => w.generic_enhanced_bonus,
        }
    }

    /// Scores one candidate, or returns `None` if it fails the format gate.
    pub fn score(&self, cleaned: &str, corrected: &str, strategy: StrategyKind) -> Option<i32> {
        if !self.passes_gate(corrected) {
            return None;
        }

        let w = &self.weights;
        let mut score = match self.mode {
            ScoringMode::Strict => w.exact_format,
            ScoringMode::Generic => {
                let mut base = 0;
                if corrected.chars().count() == 7 {
                    base += w.plate_length;
                }
                let letters = corrected.chars().filter(|c| c.is_ascii_uppercase()).count();
                let digits = corrected.chars().filter(|c| c.is_ascii_digit()).count();
                if letters >= 3 && digits >= 3 {
                    base += w.mixed_composition;
                }
                base
            }
        };

        score += self.strategy_bonus(strategy);

        if cleaned == corrected {
            score += w.uncorrected_bonus;
        }

        if self.mode == ScoringMode::Generic && corrected.contains(AMBIGUOUS_LETTERS) {
            score -= w.ambiguity_penalty;
        }

        Some(score)
    }
}

/// True for exactly 4 ASCII digits followed by 3 ASCII upper-case letters.
pub fn is_exact_plate(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 7
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4..].iter().all(u8::is_ascii_uppercase)
}
