//! Scored candidates and best-candidate selection.

use serde::Serialize;

use crate::ocr::preprocess::StrategyKind;

/// One OCR-derived, corrected, scored guess at the plate text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Line as emitted by the OCR engine (diagnostics only)
    pub raw_text: String,
    /// Upper-cased letters and digits of `raw_text`
    pub cleaned_text: String,
    /// `cleaned_text` after positional correction
    pub corrected_text: String,
    pub strategy: StrategyKind,
    pub config_id: String,
    /// OCR confidence of the source line (diagnostics only)
    pub confidence: f32,
    pub score: i32,
}

impl Candidate {
    /// True if positional correction changed the text.
    pub fn was_corrected(&self) -> bool {
        self.cleaned_text != self.corrected_text
    }
}

/// Returns the highest-scoring candidate with a positive score.
///
/// Only a strictly higher score replaces the current best, so among equal
/// scores the first candidate in enumeration order wins. A best score of
/// zero or less means no plate was found.
pub fn select_best(candidates: &[Candidate]) -> Option<&Candidate> {
    let mut best: Option<&Candidate> = None;
    for candidate in candidates {
        let floor = best.map_or(0, |current| current.score);
        if candidate.score > floor {
            best = Some(candidate);
        }
    }
    best
}
