pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use engine::{
    OcrSettings, RawLine, RecognitionConfig, RecognitionProfile, TesseractRecognizer,
    TextRecognizer,
};
pub use extract::{CandidateExtractor, ExtractedText};
pub use preprocess::{generate_strategies, ImageVariant, StrategyKind, StrategySettings};
pub use setup::ensure_tesseract;

use crate::error::PlateError;
use crate::log;

/// High-level function: variants → cleaned OCR text.
///
/// Runs one recognition call per (variant, config) pair concurrently and
/// merges the results in fixed order (for each variant, for each config),
/// regardless of which calls finish first. A failed or timed-out call
/// contributes nothing.
pub fn recognize_variants<R: TextRecognizer + ?Sized>(
    recognizer: &R,
    variants: &[ImageVariant],
    configs: &[RecognitionConfig],
    extractor: &CandidateExtractor,
) -> Vec<ExtractedText> {
    let per_call: Vec<Vec<ExtractedText>> = std::thread::scope(|scope| {
        let handles: Vec<_> = variants
            .iter()
            .flat_map(|variant| configs.iter().map(move |config| (variant, config)))
            .map(|(variant, config)| {
                scope.spawn(move || recognize_one(recognizer, variant, config, extractor))
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    log("OCR call panicked, ignoring its output");
                    Vec::new()
                })
            })
            .collect()
    });

    per_call.into_iter().flatten().collect()
}

fn recognize_one<R: TextRecognizer + ?Sized>(
    recognizer: &R,
    variant: &ImageVariant,
    config: &RecognitionConfig,
    extractor: &CandidateExtractor,
) -> Vec<ExtractedText> {
    let outcome = recognizer
        .recognize_text(&variant.image, config)
        .and_then(|lines| {
            let extracted = extractor.extract(&lines, variant.kind, &config.id);
            if extracted.is_empty() {
                Err(PlateError::NoTextRecognized)
            } else {
                Ok(extracted)
            }
        });

    match outcome {
        Ok(extracted) => extracted,
        Err(e) => {
            log(&format!("OCR {}/{}: {}", variant.kind, config.id, e));
            Vec::new()
        }
    }
}
