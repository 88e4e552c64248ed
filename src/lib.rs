//! Plate Restriction
//!
//! Recovers a license-plate string from a photograph and decides whether the
//! vehicle may circulate at a given day and time under the digit-of-day
//! restriction scheme.
//!
//! Pipeline: strategy variants → Tesseract (one call per variant × recognition
//! config) → candidate extraction → positional correction → scoring →
//! best-candidate selection → format normalization → restriction verdict.

pub mod batch;
pub mod config;
pub mod error;
pub mod ocr;
pub mod paths;
pub mod pipeline;
pub mod plate;
pub mod report;
pub mod restriction;

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

pub use error::PlateError;
pub use pipeline::{PlatePipeline, PlateReport};
pub use restriction::{RestrictionEvaluator, RestrictionVerdict, Status, TimePolicy};

/// Active log file. `None` means console only.
static LOG_FILE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Sets (or clears) the file that `log` appends to.
pub fn set_log_file(path: Option<PathBuf>) {
    if let Some(dir) = path.as_ref().and_then(|p| p.parent()) {
        let _ = std::fs::create_dir_all(dir);
    }
    if let Ok(mut current) = LOG_FILE.lock() {
        *current = path;
    }
}

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);

    let path = match LOG_FILE.lock() {
        Ok(guard) => guard.clone(),
        Err(_) => None,
    };
    if let Some(log_path) = path {
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            let _ = file.write_all(line.as_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_log_appends_to_file() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("logs").join("test.log");

        set_log_file(Some(log_path.clone()));
        log("first message");
        log("second message");
        set_log_file(None);
        log("console only");

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("first message"));
        assert!(content.contains("second message"));
        assert!(!content.contains("console only"));
    }
}
