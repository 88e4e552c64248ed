pub mod correct;
pub mod format;
pub mod score;
pub mod select;

pub use correct::correct_ocr_errors;
pub use format::{FormatPolicy, NormalizedPlate, PlateFormatNormalizer, PlateSchema};
pub use score::{ScoreWeights, ScoringEngine, ScoringMode};
pub use select::{select_best, Candidate};
