pub mod discover;
pub mod queue;
pub mod worker;

pub use discover::{collect_inputs, discover_images};
pub use worker::run_batch;

use serde::Serialize;
use std::path::PathBuf;

use crate::pipeline::PlateReport;

/// Outcome for one file of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRecord {
    pub path: PathBuf,
    /// Present when the image was decoded and scanned
    pub report: Option<PlateReport>,
    /// Present when the image could not be read
    pub error: Option<String>,
}

impl BatchRecord {
    pub fn scanned(path: PathBuf, report: PlateReport) -> Self {
        Self {
            path,
            report: Some(report),
            error: None,
        }
    }

    pub fn failed(path: PathBuf, error: String) -> Self {
        Self {
            path,
            report: None,
            error: Some(error),
        }
    }

    pub fn is_detected(&self) -> bool {
        self.report.as_ref().is_some_and(PlateReport::is_detected)
    }
}

/// Batch-level counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub detected: usize,
    pub no_plate: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_records(records: &[BatchRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            if record.error.is_some() {
                summary.failed += 1;
            } else if record.is_detected() {
                summary.detected += 1;
            } else {
                summary.no_plate += 1;
            }
        }
        summary
    }

    /// Detected images as a percentage of all images.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.detected as f64 / self.total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(text: Option<&str>) -> PlateReport {
        PlateReport {
            source_id: "x.jpg".to_string(),
            recognized_text: text.map(str::to_string),
            normalized_plate: None,
            verdict: None,
            corrected_from: None,
            candidate_count: 0,
        }
    }

    #[test]
    fn test_summary_counts() {
        let records = vec![
            BatchRecord::scanned(PathBuf::from("a.jpg"), report(Some("1234ABC"))),
            BatchRecord::scanned(PathBuf::from("b.jpg"), report(None)),
            BatchRecord::failed(PathBuf::from("c.jpg"), "truncated".to_string()),
            BatchRecord::scanned(PathBuf::from("d.jpg"), report(Some("5678XYZ"))),
        ];

        let summary = BatchSummary::from_records(&records);
        assert_eq!(
            summary,
            BatchSummary {
                total: 4,
                detected: 2,
                no_plate: 1,
                failed: 1,
            }
        );
        assert_eq!(summary.success_rate(), 50.0);
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_records(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.success_rate(), 0.0);
    }
}
