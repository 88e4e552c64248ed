//! Error kinds raised while turning one photograph into a plate verdict.
//!
//! Only `ImageUnreadable` is fatal, and only for the image it names. The
//! other kinds are absorbed by the pipeline and logged.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::ocr::preprocess::StrategyKind;

#[derive(Debug, Error)]
pub enum PlateError {
    /// One strategy variant could not be produced; the strategy is skipped.
    #[error("Preprocessing unavailable for strategy '{0}'")]
    PreprocessingUnavailable(StrategyKind),

    /// An OCR call returned nothing usable.
    #[error("No text recognized")]
    NoTextRecognized,

    /// Every candidate failed schema validation.
    #[error("No candidate matched a supported plate format")]
    NoValidFormat,

    /// The input could not be decoded at all.
    #[error("Failed to read image {}: {message}", path.display())]
    ImageUnreadable { path: PathBuf, message: String },

    #[error("Tesseract failed: {0}")]
    OcrFailed(String),

    #[error("Tesseract timed out after {} ms", .0.as_millis())]
    OcrTimeout(Duration),
}

impl PlateError {
    /// True for errors that end processing of the current image.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PlateError::ImageUnreadable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unreadable_image_is_fatal() {
        let unreadable = PlateError::ImageUnreadable {
            path: PathBuf::from("broken.jpg"),
            message: "truncated".to_string(),
        };
        assert!(unreadable.is_fatal());
        assert!(!PlateError::NoTextRecognized.is_fatal());
        assert!(!PlateError::NoValidFormat.is_fatal());
        assert!(!PlateError::OcrTimeout(Duration::from_secs(5)).is_fatal());
        assert!(!PlateError::PreprocessingUnavailable(StrategyKind::Region).is_fatal());
    }

    #[test]
    fn test_messages_name_the_cause() {
        let err = PlateError::ImageUnreadable {
            path: PathBuf::from("images/placa1.jpg"),
            message: "unsupported format".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to read image images/placa1.jpg: unsupported format"
        );
        assert_eq!(
            PlateError::OcrTimeout(Duration::from_millis(1500)).to_string(),
            "Tesseract timed out after 1500 ms"
        );
        assert_eq!(
            PlateError::PreprocessingUnavailable(StrategyKind::Region).to_string(),
            "Preprocessing unavailable for strategy 'region'"
        );
    }
}
