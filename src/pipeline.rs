//! Photograph → plate verdict.
//!
//! One `PlatePipeline` is built per run and shared by every image; each
//! call owns its variants and candidates and drops them when it returns.

use anyhow::Result;
use chrono::NaiveDateTime;
use image::DynamicImage;
use serde::Serialize;
use std::path::Path;

use crate::config::AppConfig;
use crate::error::PlateError;
use crate::log;
use crate::ocr::{
    generate_strategies, recognize_variants, CandidateExtractor, ExtractedText, RecognitionConfig,
    StrategySettings, TextRecognizer,
};
use crate::plate::{
    correct_ocr_errors, select_best, Candidate, NormalizedPlate, PlateFormatNormalizer,
    ScoringEngine,
};
use crate::restriction::{RestrictionEvaluator, RestrictionVerdict};

/// Result record for one input image.
#[derive(Debug, Clone, Serialize)]
pub struct PlateReport {
    pub source_id: String,
    /// Corrected text of the winning candidate
    pub recognized_text: Option<String>,
    pub normalized_plate: Option<NormalizedPlate>,
    pub verdict: Option<RestrictionVerdict>,
    /// Cleaned OCR text, when positional correction changed it
    pub corrected_from: Option<String>,
    /// Candidates that passed the scoring gate
    pub candidate_count: usize,
}

impl PlateReport {
    fn empty(source_id: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            recognized_text: None,
            normalized_plate: None,
            verdict: None,
            corrected_from: None,
            candidate_count: 0,
        }
    }

    /// True if a plate string was recovered.
    pub fn is_detected(&self) -> bool {
        self.recognized_text.is_some()
    }
}

pub struct PlatePipeline<R: TextRecognizer> {
    recognizer: R,
    strategies: StrategySettings,
    configs: Vec<RecognitionConfig>,
    extractor: CandidateExtractor,
    scorer: ScoringEngine,
    normalizer: PlateFormatNormalizer,
    evaluator: RestrictionEvaluator,
}

impl<R: TextRecognizer> PlatePipeline<R> {
    pub fn new(recognizer: R, config: &AppConfig) -> Result<Self> {
        let engine = &config.engine;
        Ok(Self {
            recognizer,
            strategies: config.strategies.clone(),
            configs: engine.recognition_configs(),
            extractor: CandidateExtractor::new(&engine.denylist)?,
            scorer: ScoringEngine::new(engine.scoring_mode, engine.weights.clone()),
            normalizer: PlateFormatNormalizer::new(engine.format_policy)?,
            evaluator: RestrictionEvaluator::new(engine.format_policy, config.restriction.time_policy)?,
        })
    }

    /// Corrects and scores extracted text, keeping enumeration order.
    ///
    /// Text that fails the scoring gate is dropped.
    pub fn score_candidates(&self, texts: Vec<ExtractedText>) -> Vec<Candidate> {
        texts
            .into_iter()
            .filter_map(|text| {
                let corrected = correct_ocr_errors(&text.cleaned);
                let score = self.scorer.score(&text.cleaned, &corrected, text.strategy)?;
                Some(Candidate {
                    raw_text: text.raw,
                    cleaned_text: text.cleaned,
                    corrected_text: corrected,
                    strategy: text.strategy,
                    config_id: text.config_id,
                    confidence: text.confidence,
                    score,
                })
            })
            .collect()
    }

    /// All scored candidates for one image.
    pub fn candidates(&self, image: &DynamicImage) -> Vec<Candidate> {
        let variants = generate_strategies(image, &self.strategies);
        let texts = recognize_variants(&self.recognizer, &variants, &self.configs, &self.extractor);
        self.score_candidates(texts)
    }

    /// Builds the report from an already-scored candidate set.
    pub fn decide(
        &self,
        source_id: &str,
        candidates: &[Candidate],
        at: NaiveDateTime,
    ) -> Result<PlateReport, PlateError> {
        let best = select_best(candidates).ok_or(PlateError::NoValidFormat)?;

        if best.was_corrected() {
            log(&format!(
                "Corrected from {} → {}",
                best.cleaned_text, best.corrected_text
            ));
        }
        log(&format!(
            "{}: best candidate {} (score {}, {}/{}, confidence {:.0})",
            source_id, best.corrected_text, best.score, best.strategy, best.config_id, best.confidence
        ));

        let normalized = self.normalizer.normalize(&best.corrected_text);
        let verdict = match &normalized {
            Some(plate) => self.evaluator.evaluate_plate(plate, at),
            None => self.evaluator.evaluate(&best.corrected_text, at),
        };

        Ok(PlateReport {
            source_id: source_id.to_string(),
            recognized_text: Some(best.corrected_text.clone()),
            normalized_plate: normalized,
            verdict: Some(verdict),
            corrected_from: best.was_corrected().then(|| best.cleaned_text.clone()),
            candidate_count: candidates.len(),
        })
    }

    /// Runs the full pipeline on a decoded image.
    ///
    /// "No plate detected" is an ordinary report with every field absent.
    pub fn process_image(
        &self,
        source_id: &str,
        image: &DynamicImage,
        at: NaiveDateTime,
    ) -> PlateReport {
        let candidates = self.candidates(image);
        log(&format!("{}: {} candidate(s)", source_id, candidates.len()));
        match self.decide(source_id, &candidates, at) {
            Ok(report) => report,
            Err(e) => {
                log(&format!("{}: {}", source_id, e));
                PlateReport::empty(source_id)
            }
        }
    }

    /// Decodes and processes one image file.
    pub fn process_path(&self, path: &Path, at: NaiveDateTime) -> Result<PlateReport, PlateError> {
        let image = load_image(path)?;
        Ok(self.process_image(&path.display().to_string(), &image, at))
    }
}

/// Decodes an image, rejecting empty ones.
pub fn load_image(path: &Path) -> Result<DynamicImage, PlateError> {
    let image = image::open(path).map_err(|e| PlateError::ImageUnreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if image.width() == 0 || image.height() == 0 {
        return Err(PlateError::ImageUnreadable {
            path: path.to_path_buf(),
            message: "image has no pixels".to_string(),
        });
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{RawLine, StrategyKind};
    use crate::plate::{FormatPolicy, PlateSchema, ScoringMode};
    use crate::restriction::Status;
    use chrono::NaiveDate;
    use image::GrayImage;

    struct NoText;

    impl TextRecognizer for NoText {
        fn recognize_text(
            &self,
            _image: &GrayImage,
            _config: &RecognitionConfig,
        ) -> Result<Vec<RawLine>, PlateError> {
            Ok(Vec::new())
        }
    }

    fn monday(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn text(raw: &str, strategy: StrategyKind, config_id: &str) -> ExtractedText {
        ExtractedText {
            raw: raw.to_string(),
            cleaned: crate::ocr::extract::clean_text(raw),
            strategy,
            config_id: config_id.to_string(),
            confidence: 80.0,
        }
    }

    fn pipeline_with(edit: impl FnOnce(&mut AppConfig)) -> PlatePipeline<NoText> {
        let mut config = AppConfig::default();
        edit(&mut config);
        PlatePipeline::new(NoText, &config).unwrap()
    }

    #[test]
    fn test_score_candidates_corrects_and_gates() {
        let pipeline = pipeline_with(|_| {});
        let candidates = pipeline.score_candidates(vec![
            text("12S4 ABC", StrategyKind::Original, "psm8-whitelist"),
            text("ABC 1234", StrategyKind::Original, "psm7-whitelist"),
            text("1234 ABC", StrategyKind::Region, "psm7-whitelist"),
        ]);

        // L3N4 text fails the strict scoring gate
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].cleaned_text, "12S4ABC");
        assert_eq!(candidates[0].corrected_text, "1254ABC");
        assert_eq!(candidates[0].score, 50);
        assert_eq!(candidates[1].score, 75);
    }

    #[test]
    fn test_decide_canonical_round_trip() {
        let pipeline = pipeline_with(|_| {});
        let candidates = pipeline.score_candidates(vec![text("1234 ABC", StrategyKind::Original, "psm8-whitelist")]);
        let report = pipeline.decide("placa.jpg", &candidates, monday(10)).unwrap();

        let plate = report.normalized_plate.unwrap();
        assert_eq!(plate.text(), "1234 ABC");
        assert_eq!(plate.schema(), PlateSchema::N4L3);
        assert_eq!(report.recognized_text.as_deref(), Some("1234ABC"));
        assert_eq!(report.verdict.unwrap().overall_status, Status::Permitted);
        assert!(report.corrected_from.is_none());
    }

    #[test]
    fn test_decide_reports_correction() {
        let pipeline = pipeline_with(|_| {});
        let candidates = pipeline.score_candidates(vec![text("123Z A8C", StrategyKind::Enlarged, "psm6-whitelist")]);
        let report = pipeline.decide("placa.jpg", &candidates, monday(10)).unwrap();

        assert_eq!(report.recognized_text.as_deref(), Some("1232ABC"));
        assert_eq!(report.corrected_from.as_deref(), Some("123ZA8C"));
        assert_eq!(report.verdict.unwrap().overall_status, Status::Restricted);
    }

    #[test]
    fn test_decide_without_candidates_is_no_valid_format() {
        let pipeline = pipeline_with(|_| {});
        let result = pipeline.decide("empty.jpg", &[], monday(10));
        assert!(matches!(result, Err(PlateError::NoValidFormat)));
    }

    #[test]
    fn test_generic_mode_keeps_unnormalizable_text() {
        let pipeline = pipeline_with(|c| {
            c.engine.scoring_mode = ScoringMode::Generic;
            c.engine.format_policy = FormatPolicy::Permissive;
        });
        let candidates = pipeline.score_candidates(vec![text("1232 AB", StrategyKind::Original, "psm8-whitelist")]);
        let report = pipeline.decide("placa.jpg", &candidates, monday(22)).unwrap();

        // Six characters: recognized but not a supported schema
        assert_eq!(report.recognized_text.as_deref(), Some("1232AB"));
        assert!(report.normalized_plate.is_none());
        let verdict = report.verdict.unwrap();
        assert_eq!(verdict.last_digit, Some(2));
        assert_eq!(verdict.overall_status, Status::RestrictedOutOfHours);
    }

    #[test]
    fn test_process_image_without_text_is_empty_report() {
        let pipeline = pipeline_with(|_| {});
        let image = DynamicImage::ImageLuma8(GrayImage::new(60, 30));
        let report = pipeline.process_image("blank.png", &image, monday(10));

        assert_eq!(report.source_id, "blank.png");
        assert!(!report.is_detected());
        assert!(report.normalized_plate.is_none());
        assert!(report.verdict.is_none());
    }

    #[test]
    fn test_unreadable_file_is_fatal_for_that_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        let pipeline = pipeline_with(|_| {});
        let err = pipeline.process_path(&path, monday(10)).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, PlateError::ImageUnreadable { .. }));
    }
}
